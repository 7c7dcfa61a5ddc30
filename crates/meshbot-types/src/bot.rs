use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::channel::ChannelRef;
use crate::error::SupervisorError;

/// Longest bot name accepted by the supervisor.
pub const MAX_BOT_NAME_LEN: usize = 32;

/// Bot lifecycle states.
///
/// - Created: constructed, run-loop never started
/// - Running: run-loop active, receiving routed messages
/// - Stopped: run-loop exited (by request, or after a fatal error)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotState {
    Created,
    Running,
    Stopped,
}

impl BotState {
    /// Whether `start()` may move a bot out of this state.
    pub fn can_start(&self) -> bool {
        matches!(self, BotState::Created | BotState::Stopped)
    }
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotState::Created => write!(f, "created"),
            BotState::Running => write!(f, "running"),
            BotState::Stopped => write!(f, "stopped"),
        }
    }
}

impl FromStr for BotState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(BotState::Created),
            "running" => Ok(BotState::Running),
            "stopped" => Ok(BotState::Stopped),
            other => Err(format!("invalid bot state: '{other}'")),
        }
    }
}

impl Default for BotState {
    fn default() -> Self {
        BotState::Created
    }
}

/// Snapshot of a bot managed by the supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotDescriptor {
    /// Process-wide unique name.
    pub name: String,
    /// Registered class the bot was created from.
    pub class_name: String,
    /// Channel the bot is bound to.
    pub channel: ChannelRef,
    /// Current lifecycle state.
    pub state: BotState,
    /// When the current (or last) run started.
    pub started_at: Option<DateTime<Utc>>,
    /// Cause of the last fatal run-loop error, if the bot stopped on its own.
    pub last_error: Option<String>,
}

/// Request to create a bot on a channel addressed by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBotRequest {
    pub class_name: String,
    pub name: String,
    /// Channel name; created on the node if it does not exist yet.
    pub channel: String,
    /// Start the bot right after creation.
    #[serde(default)]
    pub start: bool,
}

/// Check that a bot name is usable as a process-wide key.
///
/// Names are trimmed, must be non-empty, at most [`MAX_BOT_NAME_LEN`]
/// characters, and free of whitespace (they appear in chat output and URLs).
///
/// # Examples
///
/// ```
/// use meshbot_types::bot::validate_bot_name;
///
/// assert_eq!(validate_bot_name(" HelloBot ").unwrap(), "HelloBot");
/// assert!(validate_bot_name("two words").is_err());
/// ```
pub fn validate_bot_name(name: &str) -> Result<String, SupervisorError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SupervisorError::InvalidName("name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_BOT_NAME_LEN {
        return Err(SupervisorError::InvalidName(format!(
            "'{trimmed}' is longer than {MAX_BOT_NAME_LEN} characters"
        )));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(SupervisorError::InvalidName(format!(
            "'{trimmed}' must not contain whitespace"
        )));
    }
    Ok(trimmed.to_string())
}
