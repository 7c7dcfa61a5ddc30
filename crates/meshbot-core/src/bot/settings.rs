use std::time::Duration;

use meshbot_types::config::{DispatchConfig, UnknownCommandPolicy};

/// Dispatch and lifecycle tuning for one bot, resolved from `DispatchConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct BotSettings {
    pub prefix: char,
    pub unknown_command: UnknownCommandPolicy,
    pub relay_errors: bool,
    pub handler_timeout: Duration,
    pub shutdown_timeout: Duration,
    pub announce_lifecycle: bool,
}

impl From<&DispatchConfig> for BotSettings {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            prefix: config.command_prefix,
            unknown_command: config.unknown_command,
            relay_errors: config.relay_errors,
            handler_timeout: Duration::from_secs(config.handler_timeout_secs),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
            announce_lifecycle: config.announce_lifecycle,
        }
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}
