//! Latency probe.
//!
//! ## 責務
//!
//! - 一定間隔で latency エンドポイントに probe を送り、RTT を測定する
//! - 直近 N 件のサンプルから [`QualityStats`] を算出し、watch チャネルで公開する
//! - 一定間隔で統計をサーバーに報告する
//!
//! ## タイミング
//!
//! - probe: 開始直後と `probe_interval` ごと
//! - report: 開始直後（サンプル 0 件）、`report_interval` ごと、
//!   最初のサンプル取得から `first_report_delay` 後、および停止時
//!
//! 失敗した probe はサンプルにせず、失敗した report は破棄します（リトライなし）。

use std::{pin::Pin, sync::Arc};

use classpulse_shared::time::Clock;
use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
    time::{MissedTickBehavior, Sleep},
};

use crate::{
    config::EngineConfig,
    domain::{
        LatencyApi, LatencyReport, LatencySample, LatencyWindow, ParticipantIdentity,
        QualityStats, SessionKey,
    },
    error::ClientError,
};

/// Who and where the probe is measuring for.
#[derive(Debug, Clone)]
struct ProbeTarget {
    identity: ParticipantIdentity,
    session_key: SessionKey,
}

struct RunningProbe {
    target: ProbeTarget,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

/// Periodic RTT sampler. At most one sampling task runs at a time.
pub struct LatencyProbe {
    api: Arc<dyn LatencyApi>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    stats_tx: Arc<watch::Sender<Option<QualityStats>>>,
    running: Option<RunningProbe>,
}

impl LatencyProbe {
    pub fn new(api: Arc<dyn LatencyApi>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        let (stats_tx, _) = watch::channel(None);
        Self {
            api,
            clock,
            config,
            stats_tx: Arc::new(stats_tx),
            running: None,
        }
    }

    /// Latest stats; `None` while stopped or before the first sample.
    pub fn subscribe(&self) -> watch::Receiver<Option<QualityStats>> {
        self.stats_tx.subscribe()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start sampling for `session_key`, restarting if already running.
    pub async fn start(&mut self, identity: &ParticipantIdentity, session_key: &SessionKey) {
        self.stop().await;

        let target = ProbeTarget {
            identity: identity.clone(),
            session_key: session_key.clone(),
        };
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let context = ProbeContext {
            api: self.api.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
            stats_tx: self.stats_tx.clone(),
            target: target.clone(),
        };
        let task = tokio::spawn(probe_loop(context, shutdown_rx));

        tracing::info!("Latency probe started for session {}", session_key);
        self.running = Some(RunningProbe {
            target,
            shutdown_tx: Some(shutdown_tx),
            task,
        });
    }

    /// Stop sampling and flush one final report.
    ///
    /// Waits at most `flush_timeout` for the report, then aborts the task.
    pub async fn stop(&mut self) {
        let Some(mut running) = self.running.take() else {
            return;
        };

        if let Some(tx) = running.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if tokio::time::timeout(self.config.flush_timeout, &mut running.task)
            .await
            .is_err()
        {
            tracing::warn!("Final latency report did not finish in time, aborting");
            running.task.abort();
        }

        self.stats_tx.send_replace(None);
        tracing::info!(
            "Latency probe stopped for session {}",
            running.target.session_key
        );
    }

    /// One out-of-band measurement. The sample is not added to the window.
    pub async fn ping_once(&self) -> Result<f64, ClientError> {
        let running = self.running.as_ref().ok_or(ClientError::ProbeNotRunning)?;
        measure(self.api.as_ref(), self.clock.as_ref(), &running.target)
            .await
            .map(|sample| sample.rtt_ms)
            .map_err(|e| ClientError::ConnectionError(e.to_string()))
    }
}

impl Drop for LatencyProbe {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.task.abort();
        }
    }
}

struct ProbeContext {
    api: Arc<dyn LatencyApi>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    stats_tx: Arc<watch::Sender<Option<QualityStats>>>,
    target: ProbeTarget,
}

async fn measure(
    api: &dyn LatencyApi,
    clock: &dyn Clock,
    target: &ProbeTarget,
) -> Result<LatencySample, crate::domain::GatewayError> {
    let sent_at = clock.now_millis();
    api.probe(
        &target.session_key,
        &target.identity.participant_id,
        sent_at,
    )
    .await?;
    let received_at = clock.now_millis();
    Ok(LatencySample::new(
        (received_at - sent_at).max(0) as f64,
        received_at,
    ))
}

async fn send_report(context: &ProbeContext, stats: Option<&QualityStats>) {
    let report = LatencyReport::new(
        context.target.session_key.clone(),
        context.target.identity.participant_id.clone(),
        context.target.identity.display_name.clone(),
        context.target.identity.role,
        stats,
    );
    let samples = report.samples_count;

    match context.api.report(report).await {
        Ok(()) => tracing::debug!("Latency report sent ({} samples)", samples),
        Err(e) => tracing::warn!("Latency report dropped: {}", e),
    }
}

async fn wait_follow_up(follow_up: &mut Option<Pin<Box<Sleep>>>) {
    match follow_up {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn probe_loop(context: ProbeContext, mut shutdown_rx: oneshot::Receiver<()>) {
    let mut window = LatencyWindow::new(context.config.window_capacity);

    let mut probe_ticker = tokio::time::interval(context.config.probe_interval);
    probe_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut report_ticker = tokio::time::interval(context.config.report_interval);
    report_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut follow_up: Option<Pin<Box<Sleep>>> = None;
    let mut first_sample_seen = false;

    loop {
        // Report before probe, so the report on start carries no samples.
        tokio::select! {
            biased;

            _ = &mut shutdown_rx => {
                send_report(&context, window.stats().as_ref()).await;
                return;
            }

            _ = report_ticker.tick() => {
                send_report(&context, window.stats().as_ref()).await;
            }

            _ = wait_follow_up(&mut follow_up) => {
                follow_up = None;
                send_report(&context, window.stats().as_ref()).await;
            }

            _ = probe_ticker.tick() => {
                match measure(context.api.as_ref(), context.clock.as_ref(), &context.target).await {
                    Ok(sample) => {
                        tracing::debug!("RTT sample: {:.0}ms", sample.rtt_ms);
                        window.push(sample);
                        context.stats_tx.send_replace(window.stats());

                        if !first_sample_seen {
                            first_sample_seen = true;
                            follow_up = Some(Box::pin(tokio::time::sleep(
                                context.config.first_report_delay,
                            )));
                        }
                    }
                    Err(e) => tracing::debug!("Latency probe skipped: {}", e),
                }
            }
        }
    }
}
