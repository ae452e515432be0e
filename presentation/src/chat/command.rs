//! Line-level parsing for the chat loop.

/// A slash command typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// `/load [model]`; without a name the startup model is reloaded
    Load(Option<String>),
    Unload,
    Cancel,
    Models,
    State,
    Help,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    /// Parse a line starting with `/`. Returns `None` for ordinary prompts.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('/') {
            return None;
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (line, None),
        };

        let command = match name {
            "/load" | "/l" => ReplCommand::Load(arg.map(str::to_string)),
            "/unload" => ReplCommand::Unload,
            "/cancel" | "/stop" => ReplCommand::Cancel,
            "/models" => ReplCommand::Models,
            "/state" | "/status" => ReplCommand::State,
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            other => ReplCommand::Unknown(other.to_string()),
        };
        Some(command)
    }
}

/// Joins continuation lines into one prompt.
///
/// A line ending in `\` continues on the next line; the backslash is
/// replaced by a line break in the assembled prompt.
#[derive(Debug, Default)]
pub struct PromptBuffer {
    pending: String,
}

impl PromptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one input line. Returns the complete prompt once a line without
    /// a trailing `\` arrives.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim_end_matches(['\r', '\n']);
        match line.strip_suffix('\\') {
            Some(head) => {
                self.pending.push_str(head);
                self.pending.push('\n');
                None
            }
            None => {
                self.pending.push_str(line);
                Some(std::mem::take(&mut self.pending))
            }
        }
    }

    /// Whether a prompt is being continued.
    pub fn is_continuing(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
