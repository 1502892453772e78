use parking_lot::RwLock;
use std::sync::Arc;

use crate::models::SessionUser;

/// Explicit session scope shared by the estimator, executor and
/// reconciliation listener. The displayed balance is written only by
/// reconciliation; a completed payment never touches it locally.
pub struct SessionContext {
    pub user: SessionUser,
    balance: RwLock<Option<f64>>,
}

impl SessionContext {
    pub fn new(user: SessionUser) -> Arc<Self> {
        Arc::new(SessionContext {
            user,
            balance: RwLock::new(None),
        })
    }

    /// None until the first authoritative push arrives.
    pub fn balance(&self) -> Option<f64> {
        *self.balance.read()
    }

    /// Last write wins; only the reconciliation listener calls this.
    pub fn set_balance(&self, balance: f64) {
        *self.balance.write() = Some(balance);
    }
}
