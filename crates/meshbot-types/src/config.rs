//! Global configuration types for meshbot.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! node connection, the dashboard bind address, dispatch behavior, logging,
//! and the set of bots created at startup.

use serde::{Deserialize, Serialize};

use crate::channel::PRIMARY_CHANNEL_NAME;

/// Top-level configuration.
///
/// Loaded from `~/.meshbot/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub node: NodeConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Bots created at startup.
    #[serde(default = "default_bots")]
    pub bots: Vec<BotInstanceConfig>,

    /// Channel created by `--create-test-channel`.
    #[serde(default = "default_test_channel")]
    pub test_channel: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            ui: UiConfig::default(),
            dispatch: DispatchConfig::default(),
            logging: LoggingConfig::default(),
            bots: default_bots(),
            test_channel: default_test_channel(),
        }
    }
}

fn default_bots() -> Vec<BotInstanceConfig> {
    vec![
        BotInstanceConfig {
            class: "HelloWorldBot".to_string(),
            name: "HelloBot".to_string(),
            channel: PRIMARY_CHANNEL_NAME.to_string(),
        },
        BotInstanceConfig {
            class: "TestBot".to_string(),
            name: "TestBot".to_string(),
            channel: PRIMARY_CHANNEL_NAME.to_string(),
        },
    ]
}

fn default_test_channel() -> String {
    "test".to_string()
}

/// Connection settings for the mesh node gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_node_address")]
    pub address: String,

    #[serde(default = "default_node_port")]
    pub port: u16,

    /// Initial delay before reconnecting after a dropped connection.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Upper bound for the reconnect backoff.
    #[serde(default = "default_max_reconnect_delay_secs")]
    pub max_reconnect_delay_secs: u64,
}

fn default_node_address() -> String {
    "10.0.0.5".to_string()
}

fn default_node_port() -> u16 {
    4403
}

fn default_reconnect_delay_secs() -> u64 {
    1
}

fn default_max_reconnect_delay_secs() -> u64 {
    30
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            address: default_node_address(),
            port: default_node_port(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            max_reconnect_delay_secs: default_max_reconnect_delay_secs(),
        }
    }
}

/// Dashboard (HTTP API) bind address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_ui_host")]
    pub host: String,

    #[serde(default = "default_ui_port")]
    pub port: u16,
}

fn default_ui_host() -> String {
    "127.0.0.1".to_string()
}

fn default_ui_port() -> u16 {
    5000
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            host: default_ui_host(),
            port: default_ui_port(),
        }
    }
}

/// What a bot does with a prefixed command it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCommandPolicy {
    /// Stay silent; other bots on the channel may own the command.
    #[default]
    Ignore,
    /// Reply with an "unknown command" notice.
    Notify,
}

/// Command dispatch and lifecycle tuning shared by all bots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_command_prefix")]
    pub command_prefix: char,

    #[serde(default)]
    pub unknown_command: UnknownCommandPolicy,

    /// Send handler failures back to the channel.
    #[serde(default)]
    pub relay_errors: bool,

    /// Handlers running longer than this are abandoned.
    #[serde(default = "default_handler_timeout_secs")]
    pub handler_timeout_secs: u64,

    /// How long `stop()` waits for a run-loop to exit.
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Announce start/stop on the bot's channel.
    #[serde(default = "default_announce_lifecycle")]
    pub announce_lifecycle: bool,
}

fn default_command_prefix() -> char {
    '/'
}

fn default_handler_timeout_secs() -> u64 {
    30
}

fn default_shutdown_timeout_ms() -> u64 {
    2_000
}

fn default_announce_lifecycle() -> bool {
    true
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            unknown_command: UnknownCommandPolicy::default(),
            relay_errors: false,
            handler_timeout_secs: default_handler_timeout_secs(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            announce_lifecycle: default_announce_lifecycle(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines on the console instead of human-readable output.
    #[serde(default)]
    pub json: bool,

    /// Directory for daily rolling log files. Disabled when unset.
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[serde(default)]
    pub otel: bool,
}

/// A bot to create at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotInstanceConfig {
    /// Registered bot class name.
    pub class: String,
    /// Unique bot name.
    pub name: String,
    /// Channel name; created if missing.
    #[serde(default = "default_bot_channel")]
    pub channel: String,
}

fn default_bot_channel() -> String {
    PRIMARY_CHANNEL_NAME.to_string()
}
