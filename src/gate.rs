use std::sync::Arc;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::config::Config;
use crate::metrics::Metrics;
use crate::models::{
    Draft, ExecuteRequest, RiskAssessment, SignalSnapshot, TransactionOutcome, TxStatus,
};
use crate::session::SessionContext;

/// Shown when the local gate blocks; must read distinctly from a
/// server-side rejection.
pub const HIGH_RISK_MESSAGE: &str = "High Fraud Risk Detected";
/// Shown for transport failures and malformed responses. Raw errors never
/// reach the user.
pub const GENERIC_REJECTION_MESSAGE: &str = "Transaction rejected by the payment service";

/// Decides locally whether a payment may go out at all, then delegates to
/// the remote executor. Always produces a typed outcome; never throws
/// across the state-machine boundary, never mutates the balance.
pub struct PaymentGate {
    api: Arc<ApiClient>,
    session: Arc<SessionContext>,
    block_threshold: u8,
    metrics: Arc<Metrics>,
}

impl PaymentGate {
    pub fn new(
        api: Arc<ApiClient>,
        session: Arc<SessionContext>,
        config: &Config,
        metrics: Arc<Metrics>,
    ) -> Self {
        PaymentGate {
            api,
            session,
            block_threshold: config.risk_block_threshold,
            metrics,
        }
    }

    /// The caller guarantees the draft is complete; the UI disables
    /// submission otherwise. Makes exactly zero or one network call.
    pub async fn execute(
        &self,
        draft: &Draft,
        signals: &SignalSnapshot,
        risk: &RiskAssessment,
    ) -> TransactionOutcome {
        let amount = draft.amount.unwrap_or_default();
        let recipient_id = draft.recipient_id.clone().unwrap_or_default();

        // Advisory fast-fail only; the remote executor re-checks on its
        // side regardless of what we decide here.
        if let Some(score) = risk.score {
            if score > self.block_threshold {
                self.metrics.payments_blocked.inc();
                warn!(score, recipient = %recipient_id, "payment blocked by local risk gate");
                return TransactionOutcome {
                    status: TxStatus::Failed,
                    amount,
                    recipient_id,
                    transaction_id: None,
                    message: HIGH_RISK_MESSAGE.to_string(),
                };
            }
        }

        let request = ExecuteRequest {
            amount,
            recipient_id: recipient_id.clone(),
            note: draft.note.clone(),
            latitude: signals.latitude,
            longitude: signals.longitude,
            device_id: signals.device_id.clone(),
            session_user_id: self.session.user.id.clone(),
        };

        match self.api.execute(&request).await {
            Ok(response) => {
                info!(status = ?response.status, recipient = %recipient_id, "executor responded");
                response.into_outcome()
            }
            Err(e) => {
                warn!("payment execution failed: {e}");
                TransactionOutcome {
                    status: TxStatus::Failed,
                    amount,
                    recipient_id,
                    transaction_id: None,
                    message: GENERIC_REJECTION_MESSAGE.to_string(),
                }
            }
        }
    }
}
