//! Command-line parsing for inbound text.

/// A prefixed command split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lowercased command name without the prefix.
    pub name: String,
    /// Whitespace-separated arguments.
    pub args: Vec<String>,
    /// Everything after the command token, trimmed, with inner spacing kept.
    pub rest: String,
}

/// Parse `text` as a command if it starts with `prefix`.
///
/// Returns `None` for plain chatter and for a bare prefix.
///
/// ```
/// use meshbot_core::command::parse_command;
///
/// let parsed = parse_command("  /Echo  hello   world ", '/').unwrap();
/// assert_eq!(parsed.name, "echo");
/// assert_eq!(parsed.args, vec!["hello", "world"]);
/// assert_eq!(parsed.rest, "hello   world");
///
/// assert!(parse_command("hello", '/').is_none());
/// ```
pub fn parse_command(text: &str, prefix: char) -> Option<ParsedCommand> {
    let body = text.trim().strip_prefix(prefix)?;

    let (token, rest) = match body.find(char::is_whitespace) {
        Some(split) => (&body[..split], body[split..].trim()),
        None => (body, ""),
    };
    if token.is_empty() {
        return None;
    }

    Some(ParsedCommand {
        name: token.to_lowercase(),
        args: rest.split_whitespace().map(str::to_string).collect(),
        rest: rest.to_string(),
    })
}
