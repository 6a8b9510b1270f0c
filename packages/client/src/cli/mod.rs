//! Interactive command-line client.

mod command;
mod formatter;
mod runner;
mod ui;

pub use command::{CliCommand, parse_command};
pub use formatter::MessageFormatter;
pub use runner::{ClientOptions, run_client};
