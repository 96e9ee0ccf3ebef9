// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::telemetry::setup_tracing;
use crate::{address, demo, handle, status};
use anyhow::Result;
use clap::{command, ArgAction, Parser, Subcommand};
use snb_config::validation::{ValidAddress, ValidUrl};
use snb_config::{load_config, AppConfig};
use tracing::{debug, info, instrument, Level};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "secret-board")]
#[command(version = VERSION)]
#[command(about = "Store a number on chain encrypted with FHE and decrypt it back with your wallet", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `secret-board -vvv` will
    /// give you trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,

    /// Set the Open Telemetry collector grpc endpoint. Eg. http://localhost:4317
    #[arg(long = "otel", global = true)]
    pub otel: Option<ValidUrl>,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        let config = self.load_config()?;

        setup_tracing(&config, self.log_level())?;
        info!(version = VERSION, "secret-board starting");
        debug!("Config loaded from: {:?}", config.config_file());

        match self.command {
            Commands::Address => address::execute(&config)?,
            Commands::Status { user } => status::execute(&config, user.map(Into::into)).await?,
            Commands::Handle { user } => handle::execute(&config, user.map(Into::into)).await?,
            Commands::Demo { value, delay } => demo::execute(&config, &value, delay).await?,
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        let config = load_config(self.config.clone(), self.otel.clone().map(Into::into))?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the address of the configured wallet
    Address,

    /// Check whether an account has stored a value on the board
    Status {
        /// Account to check. Defaults to the configured wallet
        #[arg(long)]
        user: Option<ValidAddress>,
    },

    /// Print the encrypted handle stored for an account
    Handle {
        /// Account whose handle to read. Defaults to the configured wallet
        #[arg(long)]
        user: Option<ValidAddress>,
    },

    /// Run the store, wait and decrypt cycle against an in-process mock deployment
    Demo {
        /// The number to store, 0 to 4294967295
        value: String,

        /// Seconds to wait for permissions to sync. Defaults to `workflow.sync_delay_secs`
        #[arg(long)]
        delay: Option<u64>,
    },
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
    fn test_log_level() {
        let cli = Cli::try_parse_from(["secret-board", "address"]).unwrap();
        assert_eq!(cli.log_level(), Level::WARN);

        let cli = Cli::try_parse_from(["secret-board", "-vv", "address"]).unwrap();
        assert_eq!(cli.log_level(), Level::DEBUG);

        let cli = Cli::try_parse_from(["secret-board", "address", "--quiet"]).unwrap();
        assert_eq!(cli.log_level(), Level::ERROR);

        assert!(Cli::try_parse_from(["secret-board", "-v", "--quiet", "address"]).is_err());
    }

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from([
            "secret-board",
            "status",
            "--user",
            "0x9c5f39ca7544a021d7C106c3F0d6518bF0c7bF9B",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Status { user: Some(_) }));

        assert!(Cli::try_parse_from(["secret-board", "handle", "--user", "0x12"]).is_err());

        let cli = Cli::try_parse_from(["secret-board", "demo", "888", "--delay", "0"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Demo { ref value, delay: Some(0) } if value == "888"
        ));
    }
}
