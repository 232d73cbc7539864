//! sphere2cube CLI - Command-line interface
//!
//! Converts equirectangular panoramas into cube-face tile pyramids using the
//! sphere2cube library.

mod commands;
mod error;
mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sphere2cube::logging::{default_log_dir, default_log_file, init_logging};

use commands::convert::ConvertArgs;
use commands::info::InfoArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "sphere2cube")]
#[command(version = sphere2cube::VERSION)]
#[command(about = "Split equirectangular panoramas into cube-face tile pyramids", long_about = None)]
struct Cli {
    /// Directory for the session log file
    #[arg(long, global = true, default_value_os_t = default_log_dir().to_path_buf())]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a panorama into tiles
    Convert(ConvertArgs),
    /// Show source dimensions and the pyramid a conversion would produce
    Info(InfoArgs),
}

fn main() {
    let cli = Cli::parse();

    let guard = match init_logging(&cli.log_dir, default_log_file()) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e).exit(),
    };

    let result = match cli.command {
        Command::Convert(args) => commands::convert::run(args),
        Command::Info(args) => commands::info::run(args),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        // Flush the log file before exiting
        drop(guard);
        e.exit();
    }
}
