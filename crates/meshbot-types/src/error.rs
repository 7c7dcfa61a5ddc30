use std::time::Duration;

use thiserror::Error;

/// Errors from the node transport.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    #[error("not connected to node")]
    NotConnected,

    #[error("link closed")]
    Closed,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors from channel management on the node.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("invalid channel name: {0}")]
    InvalidName(String),

    #[error("channel '{0}' not found")]
    NotFound(String),

    #[error("no free channel slot (node supports {max})")]
    NoFreeSlot { max: u32 },

    #[error("link error: {0}")]
    Link(#[from] LinkError),
}

/// Errors from command registration and command handlers.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command '{0}' is already registered")]
    DuplicateCommand(String),

    #[error("invalid command name: {0}")]
    InvalidName(String),

    #[error("unknown command '{0}'")]
    NotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("handler timed out after {0:?}")]
    TimedOut(Duration),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("send failed: {0}")]
    Link(#[from] LinkError),

    #[error("{0}")]
    Failed(String),
}

/// Errors from a single bot's lifecycle.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("bot '{0}' is already running")]
    AlreadyRunning(String),

    #[error("bot '{name}' did not stop within {timeout:?}")]
    ShutdownTimeout { name: String, timeout: Duration },

    #[error("run-loop failed: {0}")]
    RunLoop(String),

    #[error("command setup failed: {0}")]
    Command(#[from] CommandError),

    #[error("send failed: {0}")]
    Link(#[from] LinkError),
}

/// Errors from supervisor-level operations (create/start/stop by name).
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("bot class '{0}' is already registered")]
    DuplicateClass(String),

    #[error("unknown bot class '{0}'")]
    UnknownClass(String),

    #[error("bot name '{0}' is already taken")]
    DuplicateName(String),

    #[error("bot '{0}' not found")]
    NotFound(String),

    #[error("invalid bot name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Bot(#[from] BotError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supervisor_error_display() {
        let err = SupervisorError::DuplicateName("HelloBot".to_string());
        assert_eq!(err.to_string(), "bot name 'HelloBot' is already taken");
    }

    #[test]
    fn test_bot_error_transparent_in_supervisor_error() {
        let err: SupervisorError = BotError::AlreadyRunning("E1".to_string()).into();
        assert_eq!(err.to_string(), "bot 'E1' is already running");
    }

    #[test]
    fn test_shutdown_timeout_display() {
        let err = BotError::ShutdownTimeout {
            name: "slow".to_string(),
            timeout: Duration::from_millis(50),
        };
        assert!(err.to_string().contains("slow"));
        assert!(err.to_string().contains("50ms"));
    }

    #[test]
    fn test_command_error_from_link_error() {
        let err: CommandError = LinkError::NotConnected.into();
        assert_eq!(err.to_string(), "send failed: not connected to node");
    }
}
