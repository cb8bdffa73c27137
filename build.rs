fn main() {
    // Embed Windows resources (version info)
    #[cfg(windows)]
    {
        let mut res = winres::WindowsResource::new();
        res.set("ProductName", "DustOff");
        res.set("FileDescription", "Installed application and memory housekeeping");
        res.set("CompanyName", "DustOff Contributors");
        res.set("OriginalFilename", "dustoff.exe");
        res.set("FileVersion", env!("CARGO_PKG_VERSION"));
        res.set("ProductVersion", env!("CARGO_PKG_VERSION"));
        if let Err(e) = res.compile() {
            println!("cargo:warning=failed to embed Windows resources: {e}");
        }
    }
}
