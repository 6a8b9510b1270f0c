//! Parsing of interactive input lines.
//!
//! Pure functions only, so every command form is covered by unit tests.

/// A command typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Join(String),
    Leave,
    /// Answer the given question, or the currently shown one when `None`
    Answer(Option<String>),
    Dismiss,
    Sync,
    Ping,
    Stats,
    Status,
    Help,
    Quit,
}

/// Parse one input line.
///
/// # Returns
///
/// The command, or a message to show the user when the line is not a
/// valid command.
pub fn parse_command(line: &str) -> Result<CliCommand, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Err(format!(
            "Unknown input '{}'. Commands start with '/'; type /help for a list.",
            line
        ));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or("");
    let argument = parts.next().map(str::to_string);
    if parts.next().is_some() {
        return Err(format!("Too many arguments for /{}", name));
    }

    match (name, argument) {
        ("join", Some(session)) => Ok(CliCommand::Join(session)),
        ("join", None) => Err("Usage: /join <session>".to_string()),
        ("leave", None) => Ok(CliCommand::Leave),
        ("answer", question_id) => Ok(CliCommand::Answer(question_id)),
        ("dismiss", None) => Ok(CliCommand::Dismiss),
        ("sync", None) => Ok(CliCommand::Sync),
        ("ping", None) => Ok(CliCommand::Ping),
        ("stats", None) => Ok(CliCommand::Stats),
        ("status", None) => Ok(CliCommand::Status),
        ("help", None) => Ok(CliCommand::Help),
        ("quit" | "exit", None) => Ok(CliCommand::Quit),
        (
            "leave" | "dismiss" | "sync" | "ping" | "stats" | "status" | "help" | "quit" | "exit",
            Some(_),
        ) => Err(format!("/{} takes no arguments", name)),
        _ => Err(format!("Unknown command '/{}'; type /help for a list.", name)),
    }
}
