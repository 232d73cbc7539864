//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::io;
use std::process;

use sphere2cube::converter::ConvertError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(io::Error),
    /// Invalid command-line values
    Config(String),
    /// Conversion failed
    Convert(ConvertError),
    /// Reading source dimensions failed
    Inspect(ConvertError),
}

impl CliError {
    /// Exit code: 2 for bad input files or arguments, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Convert(e) | CliError::Inspect(e) if e.is_bad_input() => 2,
            _ => 1,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Convert(e) | CliError::Inspect(e) if e.is_bad_input() => {
                eprintln!();
                eprintln!("Supported inputs:");
                eprintln!("  1. Layered documents: .psd or .psb, 8 bits per channel, RGB");
                eprintln!("  2. Image files: .png, .jpg, .tif, .bmp, .gif, .webp");
            }
            CliError::LoggingInit(_) => {
                eprintln!();
                eprintln!("Use --log-dir to choose a writable log directory.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Convert(e) => write!(f, "Conversion failed: {}", e),
            CliError::Inspect(e) => write!(f, "Failed to read source: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Convert(e) | CliError::Inspect(e) => Some(e),
            CliError::Config(_) => None,
        }
    }
}

impl From<ConvertError> for CliError {
    fn from(e: ConvertError) -> Self {
        CliError::Convert(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sphere2cube::config::ConfigError;

    #[test]
    fn test_config_error_exit_code() {
        assert_eq!(CliError::Config("bad".to_string()).exit_code(), 2);
    }

    #[test]
    fn test_io_failure_exit_code() {
        let err = CliError::Convert(ConvertError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "denied",
        )));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_display_wraps_source() {
        let err = CliError::from(ConvertError::Config(ConfigError::NoFaces));
        assert_eq!(
            err.to_string(),
            "Conversion failed: Invalid configuration: At least one face must be selected"
        );
    }
}
