use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::history::HistoryStore;
use crate::metrics::Metrics;
use crate::models::PushEvent;
use crate::session::SessionContext;

/// Subscribes to the pushed reconciliation channel for one session and
/// merges authoritative updates into local state: balance pushes replace
/// the displayed balance (last write wins), relevant transaction inserts
/// trigger a full history re-fetch. Handlers are idempotent, so the
/// at-least-once channel may deliver duplicates freely.
pub struct ReconciliationListener {
    handle: JoinHandle<()>,
}

impl ReconciliationListener {
    pub fn start(
        session: Arc<SessionContext>,
        history: Arc<HistoryStore>,
        config: &Config,
        metrics: Arc<Metrics>,
    ) -> Self {
        let url = config.events_url.clone();
        let reconnect_delay = Duration::from_millis(config.reconnect_delay_ms);

        let handle = tokio::spawn(run_listener(url, reconnect_delay, session, history, metrics));

        ReconciliationListener { handle }
    }

    /// Tears the subscription down synchronously; no event for this
    /// identity is processed after this returns.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for ReconciliationListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run_listener(
    url: String,
    reconnect_delay: Duration,
    session: Arc<SessionContext>,
    history: Arc<HistoryStore>,
    metrics: Arc<Metrics>,
) {
    loop {
        match connect_async(&url).await {
            Ok((stream, _)) => {
                info!(user = %session.user.id, "connected to reconciliation stream");
                let (_, mut read) = stream.split();

                while let Some(message) = read.next().await {
                    match message {
                        Ok(Message::Text(text)) => {
                            handle_event(&text, &session, &history, &metrics).await;
                        }
                        Ok(Message::Close(_)) => {
                            warn!("reconciliation stream closed, reconnecting...");
                            break;
                        }
                        Err(e) => {
                            error!("reconciliation stream error: {e}");
                            break;
                        }
                        _ => {}
                    }
                }
            }
            Err(e) => {
                error!("reconciliation connect failed: {e}");
            }
        }

        metrics.stream_reconnects.inc();
        sleep(reconnect_delay).await;
    }
}

async fn handle_event(
    text: &str,
    session: &Arc<SessionContext>,
    history: &Arc<HistoryStore>,
    metrics: &Arc<Metrics>,
) {
    let event = match serde_json::from_str::<PushEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            // Unknown event classes flow past without tearing us down.
            debug!("ignoring unrecognized push event: {e}");
            return;
        }
    };

    match event {
        PushEvent::BalanceUpdated { user_id, balance } => {
            if user_id != session.user.id {
                return;
            }
            metrics.balance_events.inc();
            session.set_balance(balance);
            info!(balance, "balance reconciled from push");
        }
        PushEvent::TransactionInserted { record } => {
            if !record.involves(&session.user) {
                return;
            }
            metrics.transaction_events.inc();
            debug!(amount = record.amount, "relevant transaction pushed, re-fetching history");
            if let Err(e) = history.refresh().await {
                warn!("history refresh failed: {e}");
            }
        }
    }
}
