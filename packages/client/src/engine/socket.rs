//! Per-socket task: heartbeat and inbound forwarding.
//!
//! Each realtime connection runs in its own task that owns the
//! [`Transport`]. Everything it observes is forwarded to the engine as a
//! [`ChannelEvent`] tagged with the socket's id, so the engine can drop
//! events from sockets it has already replaced.

use std::time::Duration;

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::domain::{HEARTBEAT_PING, SocketId, Transport};

/// How long `close` waits for the socket task to send its close frame.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Something observed on one socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Message { socket: SocketId, text: String },
    Error { socket: SocketId, reason: String },
    /// The peer closed the connection or the stream ended.
    Closed { socket: SocketId },
}

impl ChannelEvent {
    pub fn socket(&self) -> SocketId {
        match self {
            ChannelEvent::Message { socket, .. }
            | ChannelEvent::Error { socket, .. }
            | ChannelEvent::Closed { socket } => *socket,
        }
    }
}

/// Owner handle for a running socket task. Dropping it aborts the task.
pub struct SocketHandle {
    id: SocketId,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SocketHandle {
    pub fn spawn(
        id: SocketId,
        transport: Box<dyn Transport>,
        heartbeat_interval: Duration,
        events: mpsc::UnboundedSender<ChannelEvent>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(socket_loop(
            id,
            transport,
            heartbeat_interval,
            events,
            shutdown_rx,
        ));

        Self {
            id,
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }

    pub fn id(&self) -> SocketId {
        self.id
    }

    /// Close the connection deliberately. No `Closed` event is emitted.
    pub async fn close(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if tokio::time::timeout(CLOSE_TIMEOUT, &mut self.task)
            .await
            .is_err()
        {
            tracing::debug!("{} did not close in time, aborting", self.id);
            self.task.abort();
        }
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn socket_loop(
    id: SocketId,
    mut transport: Box<dyn Transport>,
    heartbeat_interval: Duration,
    events: mpsc::UnboundedSender<ChannelEvent>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    // First tick completes immediately, so the initial ping goes out on open.
    let mut heartbeat = tokio::time::interval(heartbeat_interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown_rx => {
                if let Err(e) = transport.close().await {
                    tracing::debug!("{} close failed: {}", id, e);
                }
                tracing::debug!("{} closed", id);
                return;
            }

            _ = heartbeat.tick() => {
                if let Err(e) = transport.send(HEARTBEAT_PING.to_string()).await {
                    tracing::warn!("{} heartbeat failed: {}", id, e);
                    let _ = events.send(ChannelEvent::Error {
                        socket: id,
                        reason: e.to_string(),
                    });
                }
            }

            inbound = transport.recv() => match inbound {
                Some(Ok(text)) => {
                    if events.send(ChannelEvent::Message { socket: id, text }).is_err() {
                        return;
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!("{} receive error: {}", id, e);
                    let _ = events.send(ChannelEvent::Error {
                        socket: id,
                        reason: e.to_string(),
                    });
                }
                None => {
                    tracing::info!("{} closed by peer", id);
                    let _ = events.send(ChannelEvent::Closed { socket: id });
                    return;
                }
            }
        }
    }
}
