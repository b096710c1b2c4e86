//! Command parsing and free-text link detection.
//!
//! Both are pure functions over message text; the transport decides which
//! messages reach them.

/// A recognised slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/youtube [url]`; the argument is the first token after the command.
    Youtube(Option<String>),
    /// `/audio [url]`.
    Audio(Option<String>),
    /// Any other slash command, lowercased without the leading `/`.
    Unknown(String),
}

/// Commands advertised to clients, as `(name, description)`.
pub const COMMANDS: &[(&str, &str)] = &[
    ("start", "Show the welcome message"),
    ("help", "Show the command list"),
    ("youtube", "Stream a YouTube video"),
    ("audio", "Extract audio from YouTube"),
];

/// Parse `text` as a slash command.
///
/// Returns `None` when the text is not a command. The `/cmd@botname` form is
/// accepted; deciding whether the mention targets this bot is the
/// transport's job.
#[must_use]
pub fn parse_command(text: &str) -> Option<Command> {
    let body = text.trim_start().strip_prefix('/')?;
    if body.starts_with(char::is_whitespace) {
        return None;
    }
    let mut tokens = body.split_whitespace();
    let head = tokens.next()?;
    let name = head
        .split_once('@')
        .map_or(head, |(name, _)| name)
        .to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }
    let arg = tokens.next().map(str::to_string);

    Some(match name.as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "youtube" => Command::Youtube(arg),
        "audio" => Command::Audio(arg),
        _ => Command::Unknown(name),
    })
}

/// Return the `@botname` a command is addressed to, if any.
#[must_use]
pub fn command_mention(text: &str) -> Option<&str> {
    let body = text.trim_start().strip_prefix('/')?;
    let head = body.split_whitespace().next()?;
    head.split_once('@')
        .map(|(_, mention)| mention)
        .filter(|m| !m.is_empty())
}

/// Find a link the media source accepts in free text.
///
/// `is_link` is the source's validity check. The whole (trimmed) message is
/// tried first, then each whitespace separated token in order.
pub fn detect_link(text: &str, is_link: impl Fn(&str) -> bool) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with('/') {
        return None;
    }
    if is_link(trimmed) {
        return Some(trimmed);
    }
    trimmed.split_whitespace().find(|token| is_link(token))
}
