//! Interactive client loop.
//!
//! Wires the engine to real infrastructure (WebSocket, HTTP, state file),
//! reads commands from a rustyline thread and prints engine events as they
//! arrive.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use classpulse_shared::time::{SystemClock, now_millis};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    config::EngineConfig,
    domain::{ParticipantIdentity, SessionKey},
    engine::{Engine, EngineDeps, EngineEvent},
    error::ClientError,
    infrastructure::{
        gateway::HttpClassroomApi, repository::FileKeyValueStore, transport::WebSocketConnector,
    },
};

use super::{
    command::{CliCommand, parse_command},
    formatter::MessageFormatter,
    ui::{prompt, redisplay_prompt},
};

/// Everything the client needs to start.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub identity: ParticipantIdentity,
    /// HTTP API base, e.g. `http://127.0.0.1:8080`
    pub api_url: String,
    /// Realtime channel base, e.g. `ws://127.0.0.1:8080/ws`
    pub ws_url: String,
    pub state_file: PathBuf,
    /// Session to join right after start
    pub session: Option<String>,
    pub http_timeout: Duration,
    pub config: EngineConfig,
}

enum Flow {
    Continue,
    Quit,
}

/// Run the interactive client until `/quit`, Ctrl+C or Ctrl+D.
pub async fn run_client(options: ClientOptions) -> Result<(), ClientError> {
    let api = Arc::new(
        HttpClassroomApi::new(&options.api_url, options.http_timeout)
            .map_err(|e| ClientError::InvalidArgument(e.to_string()))?,
    );
    let deps = EngineDeps {
        connector: Arc::new(WebSocketConnector::new(options.ws_url.clone())),
        latency_api: api.clone(),
        quiz_api: api,
        storage: Arc::new(FileKeyValueStore::new(options.state_file.clone())),
        clock: Arc::new(SystemClock),
    };

    let participant_id = options.identity.participant_id.to_string();
    let (engine, mut events) = Engine::start(options.identity.clone(), deps, options.config);

    println!(
        "\nYou are '{}' ({}). Type /help for commands. Press Ctrl+C to exit.\n",
        options.identity.display_name, options.identity.role
    );

    if let Some(session) = options.session {
        let session_key = SessionKey::new(session)?;
        if let Err(e) = engine.join(session_key).await {
            tracing::warn!("{}", e);
        }
    }

    let current_prompt = Arc::new(Mutex::new(prompt(&participant_id, None)));
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    spawn_readline(current_prompt.clone(), input_tx);

    loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else {
                    break;
                };
                match parse_command(&line) {
                    Ok(command) => {
                        if let Flow::Quit = execute(&engine, command).await? {
                            break;
                        }
                    }
                    Err(message) => println!("{}", message),
                }
            }
            Some(event) = events.recv() => {
                print!("{}", MessageFormatter::format_event(&event, now_millis()));
                if let EngineEvent::QuizSurfaced { .. } = event {
                    println!("Type /answer to record your answer.");
                }
            }
        }

        let session = engine.connected_session_key();
        let label = prompt(&participant_id, session.as_ref().map(SessionKey::as_str));
        redisplay_prompt(&label);
        if let Ok(mut shared) = current_prompt.lock() {
            *shared = label;
        }
    }

    engine.shutdown().await?;
    tracing::info!("Client session ended normally");
    Ok(())
}

async fn execute(engine: &Engine, command: CliCommand) -> Result<Flow, ClientError> {
    match command {
        CliCommand::Join(session) => match SessionKey::new(session) {
            Ok(session_key) => {
                if let Err(e) = engine.join(session_key).await {
                    println!("{}", e);
                }
            }
            Err(e) => println!("{}", e),
        },
        CliCommand::Leave => engine.leave().await?,
        CliCommand::Answer(question_id) => {
            let question_id =
                question_id.or_else(|| engine.current_quiz().map(|quiz| quiz.question_id));
            match question_id {
                Some(id) => {
                    if !engine.mark_question_answered(id.clone()).await? {
                        println!("{} was already answered.", id);
                    }
                }
                None => println!("No quiz is shown. Usage: /answer <questionId>"),
            }
        }
        CliCommand::Dismiss => engine.clear_quiz().await?,
        CliCommand::Sync => {
            let outcome = engine.catch_up().await?;
            print!("{}", MessageFormatter::format_sync_result(outcome));
        }
        CliCommand::Ping => match engine.ping_once().await {
            Ok(rtt) => println!("rtt {:.0}ms", rtt),
            Err(e) => println!("{}", e),
        },
        CliCommand::Stats => {
            print!(
                "{}",
                MessageFormatter::format_stats(engine.network_stats().as_ref())
            );
        }
        CliCommand::Status => {
            print!(
                "{}",
                MessageFormatter::format_status(
                    &engine.connection_state(),
                    engine.current_quiz().as_ref()
                )
            );
        }
        CliCommand::Help => print!("{}", MessageFormatter::format_help()),
        CliCommand::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}

/// Read lines on a blocking thread (rustyline is synchronous).
fn spawn_readline(current_prompt: Arc<Mutex<String>>, input_tx: mpsc::UnboundedSender<String>) {
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            let label = current_prompt
                .lock()
                .map(|label| label.clone())
                .unwrap_or_else(|_| "> ".to_string());

            match rl.readline(&label) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });
}
