//! CLI interface for vol-spike
//!
//! Provides subcommands for:
//! - `run`: Start the monitor loop
//! - `status`: Show tracked instruments, baselines and cooldowns
//! - `export`: Dump persisted detailed histories
//! - `config`: Show effective configuration

mod export;
mod run;
mod status;

pub use export::ExportArgs;
pub use run::RunArgs;
pub use status::StatusArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vol-spike")]
#[command(about = "Volume spike monitor with median baselines and alert cooldowns")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the monitor loop
    Run(RunArgs),
    /// Show persisted monitor state
    Status(StatusArgs),
    /// Export persisted detailed histories
    Export(ExportArgs),
    /// Show effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ExportFormat;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::parse_from([
            "vol-spike",
            "-c",
            "custom.toml",
            "run",
            "--threshold",
            "4.5",
            "--webhook",
            "https://discord.test/hook",
            "--once",
        ]);

        assert_eq!(cli.config, "custom.toml");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.threshold, Some(dec!(4.5)));
                assert_eq!(args.webhook.as_deref(), Some("https://discord.test/hook"));
                assert!(args.once);
                assert!(args.state.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_format() {
        let cli = Cli::parse_from(["vol-spike", "export", "--format", "parquet", "-o", "/tmp/out"]);

        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.format, Some(ExportFormat::Parquet));
                assert_eq!(args.output.unwrap().to_str(), Some("/tmp/out"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::parse_from(["vol-spike", "config"]);
        assert_eq!(cli.config, "config.toml");
        assert!(matches!(cli.command, Commands::Config));
    }
}
