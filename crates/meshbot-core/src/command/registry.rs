//! Per-bot command table.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use meshbot_types::error::CommandError;

use super::Invocation;
use super::handler::CommandHandler;
use crate::bot::BotContext;

/// A registered command.
#[derive(Clone)]
pub struct CommandEntry {
    pub name: String,
    pub help: String,
    pub handler: Arc<dyn CommandHandler>,
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

/// Command names mapped to handlers, kept in registration order.
#[derive(Debug, Default, Clone)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command handled by an async function or closure.
    ///
    /// Names are case-insensitive and may contain letters, digits, `-`, and `_`.
    /// A leading command prefix (`/help`) is stripped.
    pub fn register<F, Fut>(
        &mut self,
        name: &str,
        help: impl Into<String>,
        handler: F,
    ) -> Result<(), CommandError>
    where
        F: Fn(BotContext, Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
    {
        self.register_handler(name, help, handler)
    }

    /// Register any [`CommandHandler`] implementation.
    pub fn register_handler<H>(
        &mut self,
        name: &str,
        help: impl Into<String>,
        handler: H,
    ) -> Result<(), CommandError>
    where
        H: CommandHandler + 'static,
    {
        let name = normalize_name(name)?;
        if self.index.contains_key(&name) {
            return Err(CommandError::DuplicateCommand(name));
        }

        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(CommandEntry {
            name,
            help: help.into(),
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// Look up a command by name (case-insensitive).
    pub fn resolve(&self, name: &str) -> Result<&CommandEntry, CommandError> {
        self.index
            .get(&name.to_lowercase())
            .map(|&i| &self.entries[i])
            .ok_or_else(|| CommandError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// Commands in registration order.
    pub fn list(&self) -> &[CommandEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Help text listing every command, one per line.
    pub fn render_help(&self, bot_name: &str, prefix: char) -> String {
        let mut help = format!("{bot_name} Commands:\n");
        for entry in &self.entries {
            help.push_str(&format!("{prefix}{} - {}\n", entry.name, entry.help));
        }
        help
    }
}

fn normalize_name(name: &str) -> Result<String, CommandError> {
    let name = name
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_punctuation() && c != '_' && c != '-');
    if name.is_empty() {
        return Err(CommandError::InvalidName(
            "command name cannot be empty".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CommandError::InvalidName(name.to_string()));
    }
    Ok(name.to_lowercase())
}
