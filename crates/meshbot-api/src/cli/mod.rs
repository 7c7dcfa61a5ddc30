//! CLI command definitions for the `meshbot` binary.

pub mod classes;
pub mod config;
pub mod run;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use meshbot_types::config::GlobalConfig;

/// Run chat bots on a mesh radio node.
#[derive(Parser)]
#[command(name = "meshbot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// JSON output: log lines for `run`, machine-readable output otherwise.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for debug, -vv for trace). `RUST_LOG` wins.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of `<data dir>/config.toml`.
    #[arg(long, global = true, env = "MESHBOT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to the node, run the bots and serve the dashboard API.
    Run(RunArgs),

    /// Print the effective configuration.
    Config,

    /// List the built-in bot classes.
    Classes,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Node address (overrides `[node] address`).
    #[arg(long)]
    pub address: Option<String>,

    /// Node gateway port (overrides `[node] port`).
    #[arg(long)]
    pub port: Option<u16>,

    /// Dashboard bind host.
    #[arg(long)]
    pub ui_host: Option<String>,

    /// Dashboard bind port.
    #[arg(long)]
    pub ui_port: Option<u16>,

    /// Create the test channel at startup.
    #[arg(long)]
    pub create_test_channel: bool,

    /// Name of the test channel.
    #[arg(long)]
    pub test_channel_name: Option<String>,

    /// Start every bot at startup.
    #[arg(long)]
    pub start_bots: bool,

    /// Run against an in-memory link instead of a node. Sent messages are
    /// echoed back as inbound traffic.
    #[arg(long)]
    pub loopback: bool,
}

impl RunArgs {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply(&self, config: &mut GlobalConfig) {
        if let Some(address) = &self.address {
            config.node.address = address.clone();
        }
        if let Some(port) = self.port {
            config.node.port = port;
        }
        if let Some(host) = &self.ui_host {
            config.ui.host = host.clone();
        }
        if let Some(port) = self.ui_port {
            config.ui.port = port;
        }
        if let Some(name) = &self.test_channel_name {
            config.test_channel = name.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "meshbot",
            "-vv",
            "run",
            "--address",
            "192.168.1.20",
            "--ui-port",
            "8080",
            "--create-test-channel",
            "--test-channel-name",
            "lab",
            "--start-bots",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.create_test_channel);
        assert!(args.start_bots);
        assert!(!args.loopback);

        let mut config = GlobalConfig::default();
        args.apply(&mut config);
        assert_eq!(config.node.address, "192.168.1.20");
        assert_eq!(config.node.port, 4403);
        assert_eq!(config.ui.host, "127.0.0.1");
        assert_eq!(config.ui.port, 8080);
        assert_eq!(config.test_channel, "lab");
    }

    #[test]
    fn no_overrides_keeps_config() {
        let mut config = GlobalConfig::default();
        RunArgs::default().apply(&mut config);
        assert_eq!(config, GlobalConfig::default());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["meshbot", "classes", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Classes));
    }
}
