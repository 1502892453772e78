use parking_lot::RwLock;
use std::sync::Arc;

use crate::client::ApiClient;
use crate::error::Result;
use crate::metrics::Metrics;
use crate::models::TransactionRecord;
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Sent,
    Received,
}

/// The session user's transaction list. Reconciliation triggers a full
/// re-fetch instead of patching records in place, so joined and derived
/// fields always come back consistent.
pub struct HistoryStore {
    api: Arc<ApiClient>,
    session: Arc<SessionContext>,
    entries: RwLock<Vec<TransactionRecord>>,
    metrics: Arc<Metrics>,
}

impl HistoryStore {
    pub fn new(
        api: Arc<ApiClient>,
        session: Arc<SessionContext>,
        metrics: Arc<Metrics>,
    ) -> Arc<Self> {
        Arc::new(HistoryStore {
            api,
            session,
            entries: RwLock::new(Vec::new()),
            metrics,
        })
    }

    pub async fn refresh(&self) -> Result<()> {
        let entries = self.api.user_history(&self.session.user.id).await?;
        self.metrics.history_refreshes.inc();
        *self.entries.write() = entries;
        Ok(())
    }

    pub fn entries(&self) -> Vec<TransactionRecord> {
        self.entries.read().clone()
    }

    pub fn direction(&self, record: &TransactionRecord) -> TransferDirection {
        if record.recipient_id == self.session.user.pay_id {
            TransferDirection::Received
        } else {
            TransferDirection::Sent
        }
    }
}
