//! Command line arguments
//!
//! Global flags select the configuration file and verbose logging; each
//! subcommand carries its own output options.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dustoff")]
#[command(about = "Installed application inventory and memory housekeeping for Windows")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to %APPDATA%\DustOff\config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log to stderr at debug level instead of the log file
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List installed applications and their running processes
    Apps(AppsArgs),

    /// List running processes grouped by executable name
    Processes(ProcessesArgs),

    /// Trim the working set of every accessible process
    Reclaim,

    /// Extract an icon and save it as PNG
    Icon(IconArgs),
}

#[derive(Parser)]
pub struct AppsArgs {
    /// Output as JSON instead of table
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Only show applications with running processes
    #[arg(long, default_value_t = false)]
    pub running: bool,
}

#[derive(Parser)]
pub struct ProcessesArgs {
    /// Output as JSON instead of table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct IconArgs {
    /// Icon location, optionally with an index (`C:\app.exe,1`)
    pub path: String,

    /// Destination PNG file
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Fail instead of writing the fallback icon
    #[arg(long, default_value_t = false)]
    pub no_fallback: bool,
}
