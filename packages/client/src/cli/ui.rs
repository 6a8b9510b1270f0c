//! UI utilities for the client.

use std::io::Write;

/// Prompt label: `participant@session>` while in a session, `participant>` otherwise
pub fn prompt(participant_id: &str, session_key: Option<&str>) -> String {
    match session_key {
        Some(key) => format!("{}@{}> ", participant_id, key),
        None => format!("{}> ", participant_id),
    }
}

/// Redisplay the prompt after printing asynchronous output
pub fn redisplay_prompt(prompt: &str) {
    print!("{}", prompt);
    std::io::stdout().flush().ok();
}
