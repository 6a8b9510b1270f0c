//! Classroom session client.
//!
//! Joins a live classroom session over WebSocket, shows quiz prompts as they
//! arrive (deduplicated across push, polling and catch-up), and keeps
//! measuring network quality in the background. A student who quits while in
//! a session is reconnected to it on the next start.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin classpulse-client -- --participant-id stu-1 --name Alice --session S1
//! cargo run --bin classpulse-client -- -p inst-1 -n Bob --role instructor
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use classpulse_client::{
    EngineConfig,
    cli::{ClientOptions, run_client},
    domain::{ParticipantId, ParticipantIdentity, Role},
    infrastructure::gateway::DEFAULT_REQUEST_TIMEOUT,
};
use classpulse_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "classpulse-client")]
#[command(about = "Realtime classroom session client with quiz delivery and network quality", long_about = None)]
struct Args {
    /// Participant ID (student or instructor ID)
    #[arg(short = 'p', long)]
    participant_id: String,

    /// Display name shown to the instructor
    #[arg(short = 'n', long)]
    name: String,

    /// Email address sent with the connection
    #[arg(short = 'e', long)]
    email: Option<String>,

    /// Role: student, instructor or admin
    #[arg(short = 'r', long, default_value = "student")]
    role: String,

    /// Session to join on start
    #[arg(short = 's', long)]
    session: Option<String>,

    /// HTTP API base URL
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    api_url: String,

    /// Realtime channel base URL
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
    ws_url: String,

    /// File that remembers the active session across restarts
    #[arg(long, default_value = ".classpulse-state.json")]
    state_file: PathBuf,

    /// Seconds between latency probes
    #[arg(long, default_value_t = 3)]
    probe_interval: u64,

    /// Seconds between latency reports
    #[arg(long, default_value_t = 5)]
    report_interval: u64,

    /// Seconds between heartbeats
    #[arg(long, default_value_t = 15)]
    heartbeat_interval: u64,

    /// Seconds between active-quiz polls (0 disables polling)
    #[arg(long, default_value_t = 10)]
    poll_interval: u64,

    /// Number of RTT samples kept for statistics
    #[arg(long, default_value_t = 30)]
    window: usize,
}

fn identity(args: &Args) -> Result<ParticipantIdentity, String> {
    let participant_id =
        ParticipantId::new(args.participant_id.clone()).map_err(|e| e.to_string())?;
    let role = args.role.parse::<Role>().map_err(|e| e.to_string())?;

    let identity = ParticipantIdentity::new(participant_id, args.name.trim(), role);
    Ok(match &args.email {
        Some(email) => identity.with_email(email.trim()),
        None => identity,
    })
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let identity = match identity(&args) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!("Invalid arguments: {}", e);
            std::process::exit(1);
        }
    };

    let config = EngineConfig::default()
        .with_probe_interval(Duration::from_secs(args.probe_interval))
        .with_report_interval(Duration::from_secs(args.report_interval))
        .with_heartbeat_interval(Duration::from_secs(args.heartbeat_interval))
        .with_poll_interval(Some(Duration::from_secs(args.poll_interval)))
        .with_window_capacity(args.window);

    let options = ClientOptions {
        identity,
        api_url: args.api_url,
        ws_url: args.ws_url,
        state_file: args.state_file,
        session: args.session,
        http_timeout: DEFAULT_REQUEST_TIMEOUT,
        config,
    };

    // Run the client
    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
