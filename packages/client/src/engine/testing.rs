//! In-crate fakes for engine tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use classpulse_shared::time::{Clock, ManualClock};
use tokio::sync::mpsc;

use crate::domain::{
    ChannelAddress, Connector, GatewayError, LatencyApi, LatencyReport, ParticipantId,
    ParticipantIdentity, ProbeEcho, QuizApi, QuizEvent, Role, SessionKey, Transport,
    TransportError,
};

pub fn session(key: &str) -> SessionKey {
    SessionKey::new(key.to_string()).unwrap()
}

pub fn identity(role: Role) -> ParticipantIdentity {
    ParticipantIdentity::new(
        ParticipantId::new("stu-1".to_string()).unwrap(),
        "Alice",
        role,
    )
    .with_email("alice@example.com")
}

pub fn quiz(id: &str, session_key: &str) -> QuizEvent {
    QuizEvent {
        question_id: id.to_string(),
        text: format!("question {id}"),
        options: vec!["A".to_string(), "B".to_string()],
        time_limit_seconds: 30,
        source_session_key: session(session_key),
    }
}

pub fn quiz_message(id: &str) -> String {
    format!(
        r#"{{"type":"quiz","questionId":"{id}","question":"question {id}","options":["A","B"],"timeLimit":30}}"#
    )
}

// ========================================
// Transport
// ========================================

/// Scripted transport; the test drives it through the paired [`RemoteEnd`].
pub struct FakeTransport {
    inbound: mpsc::UnboundedReceiver<Result<String, TransportError>>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

/// The "server side" of a [`FakeTransport`].
#[derive(Clone)]
pub struct RemoteEnd {
    inbound: Arc<Mutex<Option<mpsc::UnboundedSender<Result<String, TransportError>>>>>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl FakeTransport {
    pub fn pair() -> (FakeTransport, RemoteEnd) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        (
            FakeTransport {
                inbound: rx,
                sent: sent.clone(),
                closed: closed.clone(),
            },
            RemoteEnd {
                inbound: Arc::new(Mutex::new(Some(tx))),
                sent,
                closed,
            },
        )
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Send("closed".to_string()));
        }
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        self.inbound.recv().await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl RemoteEnd {
    pub fn push(&self, text: &str) {
        if let Some(tx) = self.inbound.lock().unwrap().as_ref() {
            let _ = tx.send(Ok(text.to_string()));
        }
    }

    pub fn push_error(&self, reason: &str) {
        if let Some(tx) = self.inbound.lock().unwrap().as_ref() {
            let _ = tx.send(Err(TransportError::Receive(reason.to_string())));
        }
    }

    /// End the inbound stream, as if the server dropped the connection.
    pub fn disconnect(&self) {
        self.inbound.lock().unwrap().take();
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeConnector {
    remotes: Mutex<Vec<RemoteEnd>>,
    addresses: Mutex<Vec<ChannelAddress>>,
    fail: AtomicBool,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_connections(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn connect_count(&self) -> usize {
        self.addresses.lock().unwrap().len()
    }

    pub fn addresses(&self) -> Vec<ChannelAddress> {
        self.addresses.lock().unwrap().clone()
    }

    pub fn remote(&self, index: usize) -> RemoteEnd {
        self.remotes.lock().unwrap()[index].clone()
    }

    pub fn last_remote(&self) -> RemoteEnd {
        self.remotes.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, address: &ChannelAddress) -> Result<Box<dyn Transport>, TransportError> {
        self.addresses.lock().unwrap().push(address.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Connect("connection refused".to_string()));
        }

        let (transport, remote) = FakeTransport::pair();
        self.remotes.lock().unwrap().push(remote);
        Ok(Box::new(transport))
    }
}

// ========================================
// Gateways
// ========================================

/// Latency API that answers after advancing a manual clock by a fixed RTT.
pub struct FakeLatencyApi {
    clock: Arc<ManualClock>,
    rtt_ms: AtomicI64,
    fail_probes: AtomicBool,
    probes: AtomicUsize,
    reports: Mutex<Vec<LatencyReport>>,
}

impl FakeLatencyApi {
    pub fn new(clock: Arc<ManualClock>, rtt_ms: i64) -> Self {
        Self {
            clock,
            rtt_ms: AtomicI64::new(rtt_ms),
            fail_probes: AtomicBool::new(false),
            probes: AtomicUsize::new(0),
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn set_rtt(&self, rtt_ms: i64) {
        self.rtt_ms.store(rtt_ms, Ordering::SeqCst);
    }

    pub fn fail_probes(&self, fail: bool) {
        self.fail_probes.store(fail, Ordering::SeqCst);
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn reports(&self) -> Vec<LatencyReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

#[async_trait]
impl LatencyApi for FakeLatencyApi {
    async fn probe(
        &self,
        _session_key: &SessionKey,
        _participant_id: &ParticipantId,
        _client_timestamp: i64,
    ) -> Result<ProbeEcho, GatewayError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.fail_probes.load(Ordering::SeqCst) {
            return Err(GatewayError::Request("timed out".to_string()));
        }
        self.clock.advance(self.rtt_ms.load(Ordering::SeqCst));
        Ok(ProbeEcho {
            server_timestamp: self.clock.now_millis(),
            connection_quality: None,
        })
    }

    async fn report(&self, report: LatencyReport) -> Result<(), GatewayError> {
        self.reports.lock().unwrap().push(report);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeQuizApi {
    answered: Mutex<Vec<String>>,
    active: Mutex<Option<QuizEvent>>,
    fail: AtomicBool,
    answered_requests: AtomicUsize,
    active_requests: AtomicUsize,
}

impl FakeQuizApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_answered(&self, ids: &[&str]) {
        *self.answered.lock().unwrap() = ids.iter().map(|id| id.to_string()).collect();
    }

    pub fn set_active(&self, quiz: Option<QuizEvent>) {
        *self.active.lock().unwrap() = quiz;
    }

    pub fn fail_requests(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn answered_requests(&self) -> usize {
        self.answered_requests.load(Ordering::SeqCst)
    }

    pub fn active_requests(&self) -> usize {
        self.active_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuizApi for FakeQuizApi {
    async fn answered_question_ids(
        &self,
        _session_key: &SessionKey,
        _participant_id: &ParticipantId,
    ) -> Result<Vec<String>, GatewayError> {
        self.answered_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Status(503));
        }
        Ok(self.answered.lock().unwrap().clone())
    }

    async fn active_quiz(
        &self,
        _session_key: &SessionKey,
        _participant_id: &ParticipantId,
    ) -> Result<Option<QuizEvent>, GatewayError> {
        self.active_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Status(503));
        }
        Ok(self.active.lock().unwrap().clone())
    }
}
