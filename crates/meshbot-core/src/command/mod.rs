//! Command parsing, registration, and handler plumbing.

pub mod handler;
pub mod parser;
pub mod registry;

use meshbot_types::message::InboundMessage;

pub use handler::CommandHandler;
pub use parser::{ParsedCommand, parse_command};
pub use registry::{CommandEntry, CommandRegistry};

/// Everything a handler gets to know about the message that invoked it.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Lowercased command name.
    pub command: String,
    pub args: Vec<String>,
    /// Raw text after the command token.
    pub rest: String,
    pub message: InboundMessage,
}

impl Invocation {
    pub fn new(parsed: ParsedCommand, message: InboundMessage) -> Self {
        Self {
            command: parsed.name,
            args: parsed.args,
            rest: parsed.rest,
            message,
        }
    }

    /// Node id of the sender.
    pub fn from_id(&self) -> &str {
        &self.message.from_id
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}
