use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tokio::time::Duration;

use crate::config::{Config, ConfigIO};
use crate::device::types::Target;
use crate::dispatch::Dispatcher;
use crate::error::CliError;
use crate::store::DeviceStore;
use crate::transport::BleTransport;

pub mod commands;

#[derive(Debug, Parser)]
#[command(
    name = "beanctl",
    version,
    about = "Discover, select, and connect to LightBlue Bean accessories"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan for nearby devices
    Scan {
        /// Scan duration in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Connect to a device by name or address
    Connect {
        /// Device name
        #[arg(short, long)]
        name: Option<String>,

        /// Device address
        #[arg(short, long)]
        address: Option<String>,

        /// Scan duration in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with default values
    Init,
    /// Print the effective configuration
    Show,
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config_io = ConfigIO::new(cli.config.clone())?;

    // One store and one dispatcher per invocation, passed by reference to the
    // command handlers.
    let dispatcher = Dispatcher::new();
    let store = DeviceStore::new();
    store.attach(&dispatcher);

    match cli.command {
        Command::Scan { timeout } => {
            let config = config_io.read().await?;
            let timeout = resolve_timeout(timeout, &config)?;
            let mut transport = BleTransport::new().await?;
            commands::scan(&mut transport, &dispatcher, &store, timeout).await
        },
        Command::Connect { name, address, timeout } => {
            let config = config_io.read().await?;
            let timeout = resolve_timeout(timeout, &config)?;
            // Flags win over config file values.
            let target = Target::new(
                name.or(config.device_name),
                address.or(config.device_address),
            );
            let mut transport = BleTransport::new().await?;
            commands::connect(&mut transport, &dispatcher, &store, &target, timeout).await
        },
        Command::Config { command } => match command {
            ConfigCommand::Init => commands::config_init(&config_io).await,
            ConfigCommand::Show => commands::config_show(&config_io).await,
        },
    }
}

fn resolve_timeout(flag: Option<u64>, config: &Config) -> Result<Duration, CliError> {
    let secs = flag.unwrap_or(config.scan_timeout_secs);
    if secs == 0 {
        return Err(CliError::InvalidArgument(
            "timeout must be at least 1 second".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scan_with_timeout() {
        let cli = Cli::try_parse_from(["beanctl", "scan", "--timeout", "20"]).unwrap();
        assert!(matches!(cli.command, Command::Scan { timeout: Some(20) }));
    }

    #[test]
    fn parses_connect_flags() {
        let cli = Cli::try_parse_from(["beanctl", "connect", "-n", "bean1", "-a", "aa:bb"]).unwrap();
        match cli.command {
            Command::Connect { name, address, timeout } => {
                assert_eq!(name.as_deref(), Some("bean1"));
                assert_eq!(address.as_deref(), Some("aa:bb"));
                assert_eq!(timeout, None);
            },
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_global_options() {
        let cli = Cli::try_parse_from([
            "beanctl", "-vv", "--config", "/tmp/beanctl.json", "config", "show",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/beanctl.json")));
        assert!(matches!(
            cli.command,
            Command::Config { command: ConfigCommand::Show }
        ));
    }

    #[test]
    fn rejects_missing_subcommand() {
        assert!(Cli::try_parse_from(["beanctl"]).is_err());
    }

    #[test]
    fn timeout_resolution_prefers_flag_over_config() {
        let config = Config { scan_timeout_secs: 30, ..Config::default() };
        assert_eq!(resolve_timeout(Some(5), &config).unwrap(), Duration::from_secs(5));
        assert_eq!(resolve_timeout(None, &config).unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = Config::default();
        assert!(matches!(
            resolve_timeout(Some(0), &config),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
