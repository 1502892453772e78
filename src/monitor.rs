use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::config::Config;
use crate::models::TransactionRecord;

/// Restartable periodic poller behind the fraud-monitor feed. Each
/// start() opens a new generation; responses issued under an older
/// generation are discarded, so a stop/start cycle can never apply a
/// straggler from the previous incarnation.
pub struct MonitorPoller {
    api: Arc<ApiClient>,
    poll_interval: Duration,
    feed: Arc<RwLock<Vec<TransactionRecord>>>,
    generation: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl MonitorPoller {
    pub fn new(api: Arc<ApiClient>, config: &Config) -> Self {
        MonitorPoller {
            api,
            poll_interval: Duration::from_millis(config.monitor_poll_interval_ms),
            feed: Arc::new(RwLock::new(Vec::new())),
            generation: Arc::new(AtomicU64::new(0)),
            handle: None,
        }
    }

    pub fn start(&mut self) {
        self.stop();

        let current = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let api = self.api.clone();
        let feed = self.feed.clone();
        let generation = self.generation.clone();
        let poll_interval = self.poll_interval;

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            loop {
                ticker.tick().await;

                let result = api.recent_transactions().await;
                if generation.load(Ordering::SeqCst) != current {
                    debug!("discarding monitor response from a stale generation");
                    break;
                }

                match result {
                    Ok(records) => *feed.write() = records,
                    Err(e) => warn!("monitor poll failed: {e}"),
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        // Bump first so an already-resolved poll cannot land after abort.
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn feed(&self) -> Vec<TransactionRecord> {
        self.feed.read().clone()
    }
}

impl Drop for MonitorPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
