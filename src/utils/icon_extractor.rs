//! Icon extraction from executables
//!
//! Extracts icons with the Shell32 `ExtractIconExW` API and converts them to
//! top-down RGBA pixel buffers by reading the icon's color and mask bitmaps
//! with `GetDIBits`.
//!
//! # Handle Discipline
//!
//! Every handle obtained during a conversion (the icon, its color and mask
//! bitmaps, and the memory device context) is owned by an RAII guard and
//! released exactly once on every exit path.

use crate::error::Result;
use image::{ExtendedColorType, ImageFormat};
use std::io::Cursor;
use std::path::Path;

/// Edge length of the generated placeholder icon
pub const ICON_SIZE: u32 = 32;

/// A decoded icon: top-down rows of RGBA8 pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl IconImage {
    /// Wrap an RGBA8 buffer; `None` if empty or the length does not match
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || rgba.len() != pixel_len(width, height) {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba,
        })
    }

    /// Combine an icon's color and AND-mask bits (top-down 32 bpp BGRA, as
    /// returned by `GetDIBits`)
    ///
    /// Color bits that carry any alpha keep it as straight alpha. Otherwise
    /// transparency comes from the mask, where a set (white) pixel is
    /// transparent. Transparent pixels are written as all zero.
    pub fn from_icon_bits(
        width: u32,
        height: u32,
        color_bgra: &[u8],
        mask_bgra: &[u8],
    ) -> Option<Self> {
        let len = pixel_len(width, height);
        if width == 0 || height == 0 || color_bgra.len() != len || mask_bgra.len() != len {
            return None;
        }

        let has_alpha = color_bgra.iter().skip(3).step_by(4).any(|&a| a != 0);

        let mut rgba = Vec::with_capacity(len);
        for (px, mask) in color_bgra.chunks_exact(4).zip(mask_bgra.chunks_exact(4)) {
            let alpha = if has_alpha {
                px[3]
            } else if mask[..3].iter().any(|&c| c != 0) {
                0
            } else {
                255
            };

            if alpha == 0 {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            } else {
                rgba.extend_from_slice(&[px[2], px[1], px[0], alpha]);
            }
        }

        Self::from_rgba(width, height, rgba)
    }

    /// Generated grey tile used when no platform icon is available
    pub fn placeholder() -> Self {
        let size = ICON_SIZE as usize;
        let mut rgba = vec![0u8; size * size * 4];

        for y in 0..size {
            for x in 0..size {
                let idx = (y * size + x) * 4;
                let shade = if x == 0 || x == size - 1 || y == 0 || y == size - 1 {
                    64 // Border
                } else {
                    128
                };
                rgba[idx..idx + 4].copy_from_slice(&[shade, shade, shade, 255]);
            }
        }

        Self {
            width: ICON_SIZE,
            height: ICON_SIZE,
            rgba,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes, top row first
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::with_capacity(8192);
        image::write_buffer_with_format(
            &mut Cursor::new(&mut png_bytes),
            &self.rgba,
            self.width,
            self.height,
            ExtendedColorType::Rgba8,
            ImageFormat::Png,
        )?;
        Ok(png_bytes)
    }
}

fn pixel_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Filesystem and icon-extraction operations used by the resolver
pub trait IconSource {
    /// Whether the path exists
    fn exists(&self, path: &Path) -> bool;

    /// Extract the icon at `index`; `None` on any failure
    fn extract(&self, path: &Path, index: i32) -> Option<IconImage>;

    /// Image shown when extraction is impossible
    fn fallback(&self) -> IconImage {
        IconImage::placeholder()
    }
}

/// The host's filesystem and shell
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIconSource;

impl IconSource for SystemIconSource {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn extract(&self, path: &Path, index: i32) -> Option<IconImage> {
        #[cfg(windows)]
        {
            windows_gdi::extract_icon(path, index)
        }

        #[cfg(not(windows))]
        {
            tracing::debug!(
                "Icon extraction not supported on this platform: {:?},{}",
                path, index
            );
            None
        }
    }

    fn fallback(&self) -> IconImage {
        #[cfg(windows)]
        {
            windows_gdi::stock_application_icon().unwrap_or_else(IconImage::placeholder)
        }

        #[cfg(not(windows))]
        {
            IconImage::placeholder()
        }
    }
}

#[cfg(windows)]
mod windows_gdi {
    use super::{IconImage, pixel_len};
    use crate::error::{DustOffError, Result, StringError};
    use std::path::Path;
    use tracing::{debug, warn};
    use windows::Win32::Graphics::Gdi::{
        BI_RGB, BITMAP, BITMAPINFO, BITMAPINFOHEADER, CreateCompatibleDC, DIB_RGB_COLORS,
        DeleteDC, DeleteObject, GetDIBits, GetObjectW, HBITMAP, HDC,
    };
    use windows::Win32::UI::Shell::{
        ExtractIconExW, SHGSI_ICON, SHGSI_LARGEICON, SHGetStockIconInfo, SHSTOCKICONINFO,
        SIID_APPLICATION,
    };
    use windows::Win32::UI::WindowsAndMessaging::{DestroyIcon, GetIconInfo, HICON, ICONINFO};
    use windows::core::PCWSTR;

    /// Owned `HICON`, destroyed on drop
    struct OwnedIcon(HICON);

    impl Drop for OwnedIcon {
        #[expect(unsafe_code, reason = "Windows FFI for DestroyIcon")]
        fn drop(&mut self) {
            if !self.0.is_invalid() {
                unsafe {
                    let _ = DestroyIcon(self.0);
                }
            }
        }
    }

    /// Owned `HBITMAP`, deleted on drop (null handles are skipped)
    struct OwnedBitmap(HBITMAP);

    impl Drop for OwnedBitmap {
        #[expect(unsafe_code, reason = "Windows FFI for DeleteObject")]
        fn drop(&mut self) {
            if !self.0.is_invalid() {
                unsafe {
                    let _ = DeleteObject(self.0.into());
                }
            }
        }
    }

    /// Memory DC from `CreateCompatibleDC`, deleted on drop
    struct MemoryDc(HDC);

    impl Drop for MemoryDc {
        #[expect(unsafe_code, reason = "Windows FFI for DeleteDC")]
        fn drop(&mut self) {
            unsafe {
                let _ = DeleteDC(self.0);
            }
        }
    }

    fn api_error(what: &str) -> DustOffError {
        let error = windows::core::Error::from_thread();
        debug!("{what} failed: {error}");
        DustOffError::IconError(Box::new(error))
    }

    /// Extract and convert one icon
    ///
    /// # Safety
    ///
    /// `wide_path` is null-terminated and outlives the call. `ExtractIconExW`
    /// writes at most one handle into `large`, which is immediately owned by
    /// `OwnedIcon`.
    #[expect(unsafe_code, reason = "Windows FFI for ExtractIconExW")]
    pub(super) fn extract_icon(path: &Path, index: i32) -> Option<IconImage> {
        use std::os::windows::ffi::OsStrExt;

        let wide_path: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        let mut large = HICON::default();
        let extracted = unsafe {
            ExtractIconExW(
                PCWSTR(wide_path.as_ptr()),
                index,
                Some(&raw mut large),
                None, // We only need large icon
                1,
            )
        };
        let icon = OwnedIcon(large);

        if extracted == 0 || extracted == u32::MAX || icon.0.is_invalid() {
            debug!("No icon at {:?},{}", path, index);
            return None;
        }

        match hicon_to_image(&icon) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Icon conversion failed for {:?},{}: {}", path, index, e);
                None
            }
        }
    }

    /// The shell's stock application icon
    #[expect(unsafe_code, reason = "Windows FFI for SHGetStockIconInfo")]
    pub(super) fn stock_application_icon() -> Option<IconImage> {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "size_of::<SHSTOCKICONINFO>() is a compile-time constant that fits in u32"
        )]
        let mut info = SHSTOCKICONINFO {
            cbSize: std::mem::size_of::<SHSTOCKICONINFO>() as u32,
            ..Default::default()
        };

        if let Err(e) =
            unsafe { SHGetStockIconInfo(SIID_APPLICATION, SHGSI_ICON | SHGSI_LARGEICON, &raw mut info) }
        {
            warn!("SHGetStockIconInfo failed, using generated fallback: {e}");
            return None;
        }

        let icon = OwnedIcon(info.hIcon);
        hicon_to_image(&icon).ok()
    }

    /// Width and height of a bitmap
    #[expect(unsafe_code, reason = "Windows FFI for GetObjectW")]
    fn bitmap_size(bitmap: HBITMAP) -> Result<(i32, i32)> {
        let mut info = BITMAP::default();

        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_possible_wrap,
            reason = "size_of::<BITMAP>() is a compile-time constant that fits in i32"
        )]
        let written = unsafe {
            GetObjectW(
                bitmap.into(),
                std::mem::size_of::<BITMAP>() as i32,
                Some((&raw mut info).cast()),
            )
        };

        if written == 0 {
            return Err(api_error("GetObjectW"));
        }
        Ok((info.bmWidth, info.bmHeight))
    }

    /// Read a bitmap as top-down 32 bpp BGRA rows
    ///
    /// # Safety
    ///
    /// `bitmap` is a live handle that is not selected into any DC. The
    /// destination buffer holds exactly `width * height * 4` bytes for the
    /// 32 bpp `BITMAPINFO` passed alongside it.
    #[expect(unsafe_code, reason = "Windows FFI for GetDIBits")]
    #[expect(
        clippy::cast_sign_loss,
        reason = "callers check width and height are positive"
    )]
    fn read_bits(dc: &MemoryDc, bitmap: HBITMAP, width: i32, height: i32) -> Result<Vec<u8>> {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "size_of::<BITMAPINFOHEADER>() is a compile-time constant that fits in u32"
        )]
        let header_size = std::mem::size_of::<BITMAPINFOHEADER>() as u32;

        let mut bmi = BITMAPINFO::default();
        bmi.bmiHeader.biSize = header_size;
        bmi.bmiHeader.biWidth = width;
        bmi.bmiHeader.biHeight = -height; // Negative for top-down DIB
        bmi.bmiHeader.biPlanes = 1;
        bmi.bmiHeader.biBitCount = 32;
        bmi.bmiHeader.biCompression = BI_RGB.0;

        let mut buffer = vec![0u8; pixel_len(width as u32, height as u32)];
        let lines = unsafe {
            GetDIBits(
                dc.0,
                bitmap,
                0,
                height as u32,
                Some(buffer.as_mut_ptr().cast()),
                &raw mut bmi,
                DIB_RGB_COLORS,
            )
        };

        if lines == 0 {
            return Err(api_error("GetDIBits"));
        }
        Ok(buffer)
    }

    /// Read an icon's color and mask bitmaps into an RGBA image
    ///
    /// # Safety
    ///
    /// `GetIconInfo` hands back both bitmaps, which are owned by guards from
    /// the moment the call returns.
    #[expect(unsafe_code, reason = "Windows FFI for GetIconInfo and CreateCompatibleDC")]
    #[expect(
        clippy::cast_sign_loss,
        reason = "width and height are checked positive before conversion"
    )]
    fn hicon_to_image(icon: &OwnedIcon) -> Result<IconImage> {
        let mut icon_info = ICONINFO::default();
        unsafe { GetIconInfo(icon.0, &raw mut icon_info)? };

        let color = OwnedBitmap(icon_info.hbmColor);
        let mask = OwnedBitmap(icon_info.hbmMask);

        let memory = MemoryDc(unsafe { CreateCompatibleDC(None) });
        if memory.0.is_invalid() {
            return Err(api_error("CreateCompatibleDC"));
        }

        let image = if color.0.is_invalid() {
            // Monochrome icon: AND mask on top of the XOR bitmap, both in hbmMask
            let (width, stacked) = bitmap_size(mask.0)?;
            let height = stacked / 2;
            check_size(width, height)?;

            let bits = read_bits(&memory, mask.0, width, height * 2)?;
            let (and_mask, xor) = bits.split_at(pixel_len(width as u32, height as u32));
            IconImage::from_icon_bits(width as u32, height as u32, xor, and_mask)
        } else {
            let (width, height) = bitmap_size(color.0)?;
            check_size(width, height)?;

            let color_bits = read_bits(&memory, color.0, width, height)?;
            let mask_bits = if mask.0.is_invalid() {
                vec![0u8; color_bits.len()]
            } else {
                read_bits(&memory, mask.0, width, height)?
            };
            IconImage::from_icon_bits(width as u32, height as u32, &color_bits, &mask_bits)
        };

        image.ok_or_else(|| {
            DustOffError::IconError(StringError::new("icon pixel buffer size mismatch"))
        })
    }

    fn check_size(width: i32, height: i32) -> Result<()> {
        if width <= 0 || height <= 0 {
            return Err(DustOffError::IconError(StringError::new(format!(
                "icon has invalid size {width}x{height}"
            ))));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_opaque_square() {
        let icon = IconImage::placeholder();
        assert_eq!(icon.width(), ICON_SIZE);
        assert_eq!(icon.height(), ICON_SIZE);
        assert_eq!(icon.rgba().len(), 32 * 32 * 4);
        assert!(icon.rgba().iter().skip(3).step_by(4).all(|&a| a == 255));
    }

    #[test]
    fn from_rgba_validates_length() {
        assert!(IconImage::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(IconImage::from_rgba(2, 2, vec![0; 15]).is_none());
        assert!(IconImage::from_rgba(0, 2, Vec::new()).is_none());
    }

    const WHITE: [u8; 4] = [255, 255, 255, 0];
    const BLACK: [u8; 4] = [0, 0, 0, 0];

    #[test]
    fn color_alpha_is_kept_and_channels_swapped() {
        let color = [1, 2, 3, 200, 10, 20, 30, 100];
        let mask = [BLACK, BLACK].concat();
        let icon = IconImage::from_icon_bits(2, 1, &color, &mask).unwrap();
        assert_eq!(icon.rgba(), &[3, 2, 1, 200, 30, 20, 10, 100]);
    }

    #[test]
    fn color_alpha_wins_over_mask() {
        // Alpha-carrying icons ship a mask too; the alpha channel is authoritative
        let color = [5, 6, 7, 0, 8, 9, 10, 255];
        let mask = [BLACK, WHITE].concat();
        let icon = IconImage::from_icon_bits(2, 1, &color, &mask).unwrap();
        assert_eq!(icon.rgba(), &[0, 0, 0, 0, 10, 9, 8, 255]);
    }

    #[test]
    fn mask_supplies_transparency_without_alpha() {
        let color = [5, 6, 7, 0, 8, 9, 10, 0];
        let mask = [WHITE, BLACK].concat();
        let icon = IconImage::from_icon_bits(2, 1, &color, &mask).unwrap();
        assert_eq!(icon.rgba(), &[0, 0, 0, 0, 10, 9, 8, 255]);
    }

    #[test]
    fn clear_mask_without_alpha_is_opaque() {
        let color = [5, 6, 7, 0, 8, 9, 10, 0];
        let mask = [BLACK, BLACK].concat();
        let icon = IconImage::from_icon_bits(2, 1, &color, &mask).unwrap();
        assert!(icon.rgba().iter().skip(3).step_by(4).all(|&a| a == 255));
    }

    #[test]
    fn icon_bits_reject_mismatched_buffers() {
        let color = [0u8; 8];
        assert!(IconImage::from_icon_bits(2, 1, &color, &[0u8; 4]).is_none());
        assert!(IconImage::from_icon_bits(2, 2, &color, &color).is_none());
        assert!(IconImage::from_icon_bits(0, 1, &[], &[]).is_none());
    }

    #[test]
    fn png_encoding_produces_valid_png() {
        let png = IconImage::placeholder().to_png().unwrap();
        // PNG files start with: 137 80 78 71 13 10 26 10
        assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    }

    #[test]
    fn missing_file_extracts_nothing() {
        let source = SystemIconSource;
        let path = Path::new("definitely/not/here/app.exe");
        assert!(!source.exists(path));
        assert!(source.extract(path, 0).is_none());
    }

    #[test]
    fn system_fallback_is_non_empty() {
        let icon = SystemIconSource.fallback();
        assert!(icon.width() > 0 && icon.height() > 0);
    }

    #[cfg(windows)]
    #[test]
    fn extracts_notepad_icon() {
        let windir = std::env::var("WINDIR").unwrap_or_else(|_| "C:\\Windows".to_string());
        let notepad = std::path::PathBuf::from(windir).join("System32").join("notepad.exe");
        if notepad.exists() {
            let icon = SystemIconSource.extract(&notepad, 0).unwrap();
            assert!(icon.width() > 0);
            assert_eq!(
                icon.rgba().len(),
                icon.width() as usize * icon.height() as usize * 4
            );
        }
    }
}
