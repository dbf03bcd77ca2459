//! Command parser - Splits prefixed text into a command word and arguments

/// A prefixed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub word: String,
    pub args: Vec<String>,
}

/// Parses message content against the configured command prefix
#[derive(Debug, Clone)]
pub struct CommandParser {
    command_prefix: String,
}

impl CommandParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// `None` unless the content starts with the prefix
    pub fn parse(&self, text: &str) -> Option<ParsedCommand> {
        let rest = text.strip_prefix(self.command_prefix.as_str())?;

        // The prefix must be glued to the command word
        if rest.starts_with(char::is_whitespace) {
            return None;
        }

        let mut parts = rest.split_whitespace();
        let word = parts.next().unwrap_or_default().to_string();
        let args = parts.map(|s| s.to_string()).collect();

        Some(ParsedCommand { word, args })
    }
}
