//! Command-line interface definitions and parsing

use clap::{ArgAction, Parser};
use log::LevelFilter;
use qhs::SessionConfig;
use std::time::Duration;

/// Report Qualcomm QHS and SoC features of a Bluetooth controller
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// HCI device index (hciN)
    #[arg(short, long, default_value_t = 0)]
    pub device: u16,

    /// Per-command timeout in milliseconds, 0 waits forever
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Increase logging verbosity (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print flags as +/-/? instead of colors
    #[arg(long)]
    pub no_color: bool,

    /// Also read the local QLL (LE) feature set
    #[arg(long)]
    pub qll: bool,
}

impl Cli {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            command_timeout: match self.timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["qhs-util"]).unwrap();
        assert_eq!(cli.device, 0);
        assert_eq!(
            cli.session_config().command_timeout,
            Some(Duration::from_millis(1000))
        );
        assert_eq!(cli.log_level(), LevelFilter::Warn);
        assert!(!cli.no_color);
        assert!(!cli.qll);
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "qhs-util",
            "-d",
            "1",
            "--timeout-ms",
            "0",
            "-vv",
            "--no-color",
        ])
        .unwrap();
        assert_eq!(cli.device, 1);
        assert_eq!(cli.session_config().command_timeout, None);
        assert_eq!(cli.log_level(), LevelFilter::Debug);
        assert!(cli.no_color);

        assert!(Cli::try_parse_from(["qhs-util", "-d", "hci0"]).is_err());
    }
}
