//! Engine facade.
//!
//! [`Engine`] is a cloneable handle. Every operation becomes a command on one
//! ordered channel, processed by a single engine task that owns the presence
//! channel, the quiz deduplicator and the latency probe. Read-only state is
//! published through `watch` channels, and notifications go out on the event
//! stream returned by [`Engine::start`].

use std::{sync::Arc, time::Duration};

use classpulse_shared::time::Clock;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Instant, Interval, MissedTickBehavior},
};

use crate::{
    config::EngineConfig,
    domain::{
        ConnectionState, Connector, KeyValueStore, LatencyApi, OfferOutcome, ParticipantIdentity,
        QualityBand, QualityStats, QuizApi, QuizDeduplicator, QuizEvent, QuizSource,
        RosterUpdate, SessionKey,
    },
    error::ClientError,
};

use super::{
    presence::{JoinOutcome, PresenceChannel, PresenceSignal},
    probe::LatencyProbe,
    socket::ChannelEvent,
};

/// External collaborators the engine talks to.
#[derive(Clone)]
pub struct EngineDeps {
    pub connector: Arc<dyn Connector>,
    pub latency_api: Arc<dyn LatencyApi>,
    pub quiz_api: Arc<dyn QuizApi>,
    pub storage: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
}

/// Read-only projection of the engine state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineSnapshot {
    pub connection: ConnectionState,
    pub current_quiz: Option<QuizEvent>,
    pub last_surfaced_question_id: Option<String>,
    pub answered_count: usize,
}

/// Notifications emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Joined {
        session_key: SessionKey,
    },
    Left {
        session_key: Option<SessionKey>,
    },
    QuizSurfaced {
        quiz: QuizEvent,
        source: QuizSource,
    },
    /// A question was answered; cached per-session statistics are stale.
    StatsInvalidated {
        session_key: Option<SessionKey>,
        question_id: String,
    },
    /// Opening the channel failed. The caller may retry with `join`.
    ConnectionFailed {
        session_key: SessionKey,
        reason: String,
    },
    /// Non-fatal transport error; the connection stays up.
    ConnectionError {
        reason: String,
    },
    /// The server side closed the channel without a `leave`.
    ConnectionLost {
        session_key: SessionKey,
    },
    MeetingEnded {
        session_key: SessionKey,
    },
    Roster(RosterUpdate),
}

enum Command {
    Join {
        session_key: SessionKey,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    Leave {
        reply: oneshot::Sender<()>,
    },
    MarkAnswered {
        question_id: String,
        reply: oneshot::Sender<bool>,
    },
    ClearQuiz {
        reply: oneshot::Sender<()>,
    },
    Offer {
        quiz: QuizEvent,
        source: QuizSource,
        reply: oneshot::Sender<OfferOutcome>,
    },
    CatchUp {
        reply: oneshot::Sender<Option<OfferOutcome>>,
    },
    PingOnce {
        reply: oneshot::Sender<Result<f64, ClientError>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running engine.
#[derive(Clone)]
pub struct Engine {
    commands: mpsc::UnboundedSender<Command>,
    snapshot_rx: watch::Receiver<EngineSnapshot>,
    stats_rx: watch::Receiver<Option<QualityStats>>,
}

impl Engine {
    /// Spawn the engine task.
    ///
    /// If storage holds a session key from a previous run and the identity
    /// auto-rejoins, the engine reconnects to it before processing commands.
    /// The task ends on [`Engine::shutdown`] or when every handle is dropped.
    pub fn start(
        identity: ParticipantIdentity,
        deps: EngineDeps,
        config: EngineConfig,
    ) -> (Engine, mpsc::UnboundedReceiver<EngineEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (channel_tx, channel_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(EngineSnapshot::default());

        let presence = PresenceChannel::new(
            identity.clone(),
            deps.connector,
            deps.storage,
            config.heartbeat_interval,
            channel_tx,
        );
        let probe = LatencyProbe::new(deps.latency_api, deps.clock, config.clone());
        let stats_rx = probe.subscribe();

        let actor = EngineActor {
            identity,
            config,
            presence,
            probe,
            quiz_api: deps.quiz_api,
            dedup: QuizDeduplicator::new(),
            current_quiz: None,
            poll: None,
            events: event_tx,
            snapshot_tx,
            channel_rx,
        };
        tokio::spawn(actor.run(command_rx));

        (
            Engine {
                commands: command_tx,
                snapshot_rx,
                stats_rx,
            },
            event_rx,
        )
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ClientError> {
        let (reply, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| ClientError::EngineStopped)?;
        reply_rx.await.map_err(|_| ClientError::EngineStopped)
    }

    /// Connect to `session_key`. No-op if already connected to it.
    pub async fn join(&self, session_key: SessionKey) -> Result<(), ClientError> {
        self.request(|reply| Command::Join { session_key, reply })
            .await?
    }

    /// Disconnect, forget the session durably and reset dedup state.
    pub async fn leave(&self) -> Result<(), ClientError> {
        self.request(|reply| Command::Leave { reply }).await
    }

    /// Record an answer. Returns `false` if it was already recorded.
    pub async fn mark_question_answered(
        &self,
        question_id: impl Into<String>,
    ) -> Result<bool, ClientError> {
        let question_id = question_id.into();
        self.request(|reply| Command::MarkAnswered { question_id, reply })
            .await
    }

    /// Hide the current prompt. Fallbacks will not surface it again until
    /// the next connection opens.
    pub async fn clear_quiz(&self) -> Result<(), ClientError> {
        self.request(|reply| Command::ClearQuiz { reply }).await
    }

    /// Offer a quiz from a producer outside the engine.
    pub async fn offer_external_quiz(&self, quiz: QuizEvent) -> Result<OfferOutcome, ClientError> {
        self.request(|reply| Command::Offer {
            quiz,
            source: QuizSource::External,
            reply,
        })
        .await
    }

    /// Fetch the active quiz once, e.g. when the user returns to the client.
    ///
    /// `None` means there was nothing to offer (not connected, no active
    /// quiz, or the fetch failed).
    pub async fn catch_up(&self) -> Result<Option<OfferOutcome>, ClientError> {
        self.request(|reply| Command::CatchUp { reply }).await
    }

    /// One out-of-band RTT measurement in milliseconds.
    pub async fn ping_once(&self) -> Result<f64, ClientError> {
        self.request(|reply| Command::PingOnce { reply }).await?
    }

    /// Tear everything down and stop the engine task.
    ///
    /// The durable session key is kept, so the next start can rejoin.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    pub fn connected_session_key(&self) -> Option<SessionKey> {
        self.snapshot_rx
            .borrow()
            .connection
            .connected_session_key()
            .cloned()
    }

    pub fn current_quiz(&self) -> Option<QuizEvent> {
        self.snapshot_rx.borrow().current_quiz.clone()
    }

    pub fn network_quality(&self) -> Option<QualityBand> {
        self.stats_rx.borrow().map(|stats| stats.band)
    }

    pub fn network_stats(&self) -> Option<QualityStats> {
        *self.stats_rx.borrow()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.snapshot_rx.borrow().connection.clone()
    }

    pub fn snapshots(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshot_rx.clone()
    }
}

struct EngineActor {
    identity: ParticipantIdentity,
    config: EngineConfig,
    presence: PresenceChannel,
    probe: LatencyProbe,
    quiz_api: Arc<dyn QuizApi>,
    dedup: QuizDeduplicator,
    current_quiz: Option<QuizEvent>,
    poll: Option<Interval>,
    events: mpsc::UnboundedSender<EngineEvent>,
    snapshot_tx: watch::Sender<EngineSnapshot>,
    channel_rx: mpsc::UnboundedReceiver<ChannelEvent>,
}

async fn next_poll(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

impl EngineActor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.rejoin_on_load().await;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        self.teardown().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                    None => {
                        self.teardown().await;
                        break;
                    }
                },
                Some(event) = self.channel_rx.recv() => self.handle_channel_event(event).await,
                _ = next_poll(&mut self.poll) => self.poll_active_quiz().await,
            }
        }

        tracing::debug!("Engine task stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Join { session_key, reply } => {
                let result = self.join(session_key).await;
                let _ = reply.send(result);
            }
            Command::Leave { reply } => {
                self.leave().await;
                let _ = reply.send(());
            }
            Command::MarkAnswered { question_id, reply } => {
                let _ = reply.send(self.mark_answered(question_id));
            }
            Command::ClearQuiz { reply } => {
                self.clear_quiz();
                let _ = reply.send(());
            }
            Command::Offer {
                quiz,
                source,
                reply,
            } => {
                let _ = reply.send(self.offer(quiz, source));
            }
            Command::CatchUp { reply } => {
                let outcome = self.fetch_active_quiz(QuizSource::CatchUp).await;
                let _ = reply.send(outcome);
            }
            Command::PingOnce { reply } => {
                let _ = reply.send(self.probe.ping_once().await);
            }
            // Handled in `run`
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    async fn rejoin_on_load(&mut self) {
        let Some(session_key) = self.presence.rejoin_candidate() else {
            return;
        };

        tracing::info!("Rejoining session {} from a previous run", session_key);
        if let Err(e) = self.join(session_key).await {
            tracing::warn!("Automatic rejoin failed: {}", e);
        }
    }

    async fn join(&mut self, session_key: SessionKey) -> Result<(), ClientError> {
        match self.presence.join(session_key.clone()).await {
            Ok(JoinOutcome::AlreadyOpen) => Ok(()),
            Ok(JoinOutcome::Opened) => {
                self.on_opened(session_key).await;
                Ok(())
            }
            Err(e) => {
                self.stop_session_timers().await;
                self.drop_open_quiz();
                self.emit(EngineEvent::ConnectionFailed {
                    session_key,
                    reason: e.to_string(),
                });
                self.publish();
                Err(ClientError::ConnectionError(e.to_string()))
            }
        }
    }

    async fn on_opened(&mut self, session_key: SessionKey) {
        // A prompt still shown for this session stays guarded; anything else
        // may surface again on the new connection.
        if !self
            .current_quiz
            .as_ref()
            .is_some_and(|quiz| quiz.source_session_key == session_key)
        {
            self.drop_open_quiz();
        }

        match self
            .quiz_api
            .answered_question_ids(&session_key, &self.identity.participant_id)
            .await
        {
            Ok(ids) => {
                let added = self.dedup.rehydrate(ids);
                tracing::debug!("Rehydrated {} answered question(s)", added);
            }
            Err(e) => tracing::debug!("Could not fetch answered questions: {}", e),
        }

        self.probe.start(&self.identity, &session_key).await;
        self.poll = self.config.poll_interval.map(start_poll);

        self.emit(EngineEvent::Joined { session_key });
        self.publish();
    }

    async fn leave(&mut self) {
        let session_key = self.presence.state().session_key().cloned();
        self.presence.leave().await;
        self.stop_session_timers().await;
        self.dedup.reset();
        self.current_quiz = None;

        if let Some(key) = &session_key {
            tracing::info!("Left session {}", key);
        }
        self.emit(EngineEvent::Left { session_key });
        self.publish();
    }

    fn mark_answered(&mut self, question_id: String) -> bool {
        let newly_answered = self.dedup.mark_answered(question_id.clone());
        if self
            .current_quiz
            .as_ref()
            .is_some_and(|quiz| quiz.question_id == question_id)
        {
            self.current_quiz = None;
        }

        self.emit(EngineEvent::StatsInvalidated {
            session_key: self.presence.connected_session_key().cloned(),
            question_id,
        });
        self.publish();
        newly_answered
    }

    fn clear_quiz(&mut self) {
        if self.current_quiz.take().is_some() {
            self.publish();
        }
    }

    fn offer(&mut self, quiz: QuizEvent, source: QuizSource) -> OfferOutcome {
        let outcome = match self.presence.connected_session_key() {
            None => OfferOutcome::NotConnected,
            Some(key) if *key != quiz.source_session_key => OfferOutcome::SessionMismatch,
            Some(_) => self.dedup.offer(&quiz),
        };

        if outcome.is_surfaced() {
            tracing::info!("Quiz {} surfaced via {}", quiz.question_id, source);
            self.current_quiz = Some(quiz.clone());
            self.emit(EngineEvent::QuizSurfaced { quiz, source });
            self.publish();
        } else {
            tracing::debug!(
                "Quiz {} from {} not surfaced: {:?}",
                quiz.question_id,
                source,
                outcome
            );
        }
        outcome
    }

    async fn fetch_active_quiz(&mut self, source: QuizSource) -> Option<OfferOutcome> {
        let session_key = self.presence.connected_session_key()?.clone();

        match self
            .quiz_api
            .active_quiz(&session_key, &self.identity.participant_id)
            .await
        {
            Ok(Some(quiz)) => Some(self.offer(quiz, source)),
            Ok(None) => None,
            Err(e) => {
                tracing::debug!("Active quiz fetch ({}) failed: {}", source, e);
                None
            }
        }
    }

    async fn poll_active_quiz(&mut self) {
        self.fetch_active_quiz(QuizSource::Poll).await;
    }

    async fn handle_channel_event(&mut self, event: ChannelEvent) {
        match self.presence.handle_event(event) {
            PresenceSignal::Quiz(quiz) => {
                self.offer(quiz, QuizSource::Push);
            }
            PresenceSignal::MeetingEnded(session_key) => {
                tracing::info!("Meeting for session {} ended", session_key);
                self.emit(EngineEvent::MeetingEnded { session_key });
                self.leave().await;
            }
            PresenceSignal::Roster(update) => self.emit(EngineEvent::Roster(update)),
            PresenceSignal::TransportError(reason) => {
                self.emit(EngineEvent::ConnectionError { reason });
            }
            PresenceSignal::ConnectionLost(session_key) => {
                self.stop_session_timers().await;
                self.drop_open_quiz();
                self.emit(EngineEvent::ConnectionLost { session_key });
                self.publish();
            }
            PresenceSignal::Ignored => {}
        }
    }

    fn drop_open_quiz(&mut self) {
        self.current_quiz = None;
        self.dedup.forget_surfaced();
    }

    async fn stop_session_timers(&mut self) {
        self.poll = None;
        if self.probe.is_running() {
            self.probe.stop().await;
        }
    }

    async fn teardown(&mut self) {
        self.stop_session_timers().await;
        self.presence.disconnect().await;
        self.current_quiz = None;
        self.publish();
    }

    fn emit(&self, event: EngineEvent) {
        // The receiver may have been dropped by a consumer that only polls.
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(EngineSnapshot {
            connection: self.presence.state().clone(),
            current_quiz: self.current_quiz.clone(),
            last_surfaced_question_id: self.dedup.last_surfaced().map(str::to_string),
            answered_count: self.dedup.answered_count(),
        });
    }
}

/// First poll happens one period after opening.
fn start_poll(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
