use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::config::Config;
use crate::metrics::Metrics;
use crate::models::{
    risk_label, Draft, RiskAssessment, ScoreRequest, ScoreResponse, SCANNING_LABEL,
    UNAVAILABLE_LABEL,
};
use crate::session::SessionContext;
use crate::signals::SignalCollector;

/// Continuously re-scores the in-progress draft. Each edit cancels any
/// armed debounce timer; a complete draft re-arms it, and when it fires a
/// single scoring request goes out carrying the draft and signal state
/// captured at that moment. At most one request is in flight; any newer
/// edit supersedes it and its response is dropped on arrival.
pub struct RiskEstimator {
    draft_tx: mpsc::UnboundedSender<Draft>,
    state: Arc<RwLock<RiskAssessment>>,
    handle: JoinHandle<()>,
}

impl RiskEstimator {
    pub fn spawn(
        api: Arc<ApiClient>,
        signals: SignalCollector,
        session: Arc<SessionContext>,
        config: &Config,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (draft_tx, draft_rx) = mpsc::unbounded_channel();
        let state = Arc::new(RwLock::new(RiskAssessment::waiting()));

        let handle = tokio::spawn(run_estimator(
            draft_rx,
            api,
            signals,
            session,
            state.clone(),
            Duration::from_millis(config.debounce_ms),
            metrics,
        ));

        RiskEstimator {
            draft_tx,
            state,
            handle,
        }
    }

    /// Called on every change to amount, recipient, note or signals.
    pub fn on_draft_change(&self, draft: Draft) {
        let _ = self.draft_tx.send(draft);
    }

    pub fn assessment(&self) -> RiskAssessment {
        self.state.read().clone()
    }

    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for RiskEstimator {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run_estimator(
    mut draft_rx: mpsc::UnboundedReceiver<Draft>,
    api: Arc<ApiClient>,
    signals: SignalCollector,
    session: Arc<SessionContext>,
    state: Arc<RwLock<RiskAssessment>>,
    debounce: Duration,
    metrics: Arc<Metrics>,
) {
    let (score_tx, mut score_rx) = mpsc::unbounded_channel::<(u64, Option<ScoreResponse>)>();
    let mut signal_rx = signals.subscribe();
    let mut signals_open = true;

    // Single-slot queue: one armed deadline, at most one request in
    // flight. `seq` bumps on every trigger, so a response is applied only
    // if nothing changed after its request was captured.
    let mut armed: Option<(Draft, Instant)> = None;
    let mut current = Draft::default();
    let mut seq: u64 = 0;

    loop {
        let deadline = armed.as_ref().map(|(_, at)| *at);

        tokio::select! {
            changed = draft_rx.recv() => {
                let Some(draft) = changed else { break };
                seq += 1;
                armed = None;
                current = draft.clone();
                if draft.is_complete() {
                    armed = Some((draft, Instant::now() + debounce));
                } else {
                    let mut assessment = state.write();
                    *assessment = RiskAssessment::waiting();
                    assessment.computed_at = seq;
                }
            }

            changed = signal_rx.recv(), if signals_open => {
                match changed {
                    Err(broadcast::error::RecvError::Closed) => {
                        signals_open = false;
                    }
                    // A fresh signal snapshot re-scores the current draft.
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        if current.is_complete() {
                            seq += 1;
                            armed = Some((current.clone(), Instant::now() + debounce));
                        }
                    }
                }
            }

            _ = wait_until(deadline), if deadline.is_some() => {
                let Some((draft, _)) = armed.take() else { continue };
                let request = ScoreRequest::capture(&draft, &signals.snapshot());
                state.write().label = SCANNING_LABEL.to_string();
                metrics.risk_checks.inc();
                debug!(user = %session.user.id, seq, amount = request.amount, "issuing risk check");

                let api = api.clone();
                let tx = score_tx.clone();
                let request_seq = seq;
                tokio::spawn(async move {
                    let result = match api.check_risk(&request).await {
                        Ok(response) => Some(response),
                        Err(e) => {
                            warn!("risk check failed: {e}");
                            None
                        }
                    };
                    let _ = tx.send((request_seq, result));
                });
            }

            Some((response_seq, response)) = score_rx.recv() => {
                if response_seq != seq {
                    metrics.risk_stale_dropped.inc();
                    debug!(response_seq, latest = seq, "dropping superseded risk response");
                    continue;
                }

                let mut assessment = state.write();
                match response {
                    Some(scored) => {
                        let score = scored.risk_score.min(100);
                        assessment.score = Some(score);
                        assessment.is_fraud = scored.is_fraud;
                        assessment.label = risk_label(score).to_string();
                        assessment.computed_at = response_seq;
                    }
                    None => {
                        // Scoring failure is non-fatal: keep whatever score
                        // we had and never block submission over it.
                        metrics.risk_check_failures.inc();
                        assessment.label = match assessment.score {
                            Some(score) => risk_label(score).to_string(),
                            None => UNAVAILABLE_LABEL.to_string(),
                        };
                    }
                }
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
