use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::{sleep, Duration};
use tracing::info;

use crate::config::Config;
use crate::gate::{PaymentGate, GENERIC_REJECTION_MESSAGE};
use crate::metrics::Metrics;
use crate::models::{Draft, RiskAssessment, SignalSnapshot, TransactionOutcome, TxStatus};

/// UI-visible lifecycle of one execution attempt. Success and Failed are
/// terminal for the attempt and leave only via explicit dismissal.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentPhase {
    Idle,
    Processing,
    Success {
        outcome: TransactionOutcome,
        message: String,
    },
    Failed {
        outcome: TransactionOutcome,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("draft is incomplete")]
    InvalidDraft,
    #[error("a payment attempt is already in progress")]
    Busy,
    #[error("previous attempt must be dismissed first")]
    UndismissedOutcome,
    #[error("no failed attempt to retry")]
    NothingToRetry,
    #[error("no terminal outcome to dismiss")]
    NothingToDismiss,
}

/// Where the UI goes after a dismissal. Leaving the form after success is
/// an external navigation concern; the machine only reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    BackToForm,
    LeaveForm,
}

#[derive(Clone)]
struct Attempt {
    draft: Draft,
    signals: SignalSnapshot,
    risk: RiskAssessment,
}

/// Idle -> Processing -> Success | Failed. At most one attempt runs at a
/// time; retry re-runs the stored attempt unchanged.
pub struct PaymentFlow {
    gate: Arc<PaymentGate>,
    phase: RwLock<PaymentPhase>,
    attempt: RwLock<Option<Attempt>>,
    min_processing: Duration,
    metrics: Arc<Metrics>,
}

impl PaymentFlow {
    pub fn new(gate: Arc<PaymentGate>, config: &Config, metrics: Arc<Metrics>) -> Self {
        PaymentFlow {
            gate,
            phase: RwLock::new(PaymentPhase::Idle),
            attempt: RwLock::new(None),
            min_processing: Duration::from_millis(config.min_processing_ms),
            metrics,
        }
    }

    pub fn phase(&self) -> PaymentPhase {
        self.phase.read().clone()
    }

    /// The risk input freezes here: scoring updates that land while the
    /// attempt is processing never reach the gate, and retry reuses the
    /// same snapshot.
    pub async fn submit(
        &self,
        draft: Draft,
        signals: SignalSnapshot,
        risk: RiskAssessment,
    ) -> Result<PaymentPhase, FlowError> {
        if !draft.is_complete() {
            return Err(FlowError::InvalidDraft);
        }

        {
            let mut phase = self.phase.write();
            match &*phase {
                PaymentPhase::Idle => *phase = PaymentPhase::Processing,
                PaymentPhase::Processing => return Err(FlowError::Busy),
                PaymentPhase::Success { .. } | PaymentPhase::Failed { .. } => {
                    return Err(FlowError::UndismissedOutcome)
                }
            }
        }

        *self.attempt.write() = Some(Attempt {
            draft,
            signals,
            risk,
        });
        self.metrics.payments_submitted.inc();

        Ok(self.run_attempt().await)
    }

    /// Re-invokes the gate and executor with the identical draft; no
    /// re-prompting, no new risk snapshot.
    pub async fn retry(&self) -> Result<PaymentPhase, FlowError> {
        {
            let mut phase = self.phase.write();
            match &*phase {
                PaymentPhase::Failed { .. } => *phase = PaymentPhase::Processing,
                PaymentPhase::Processing => return Err(FlowError::Busy),
                _ => return Err(FlowError::NothingToRetry),
            }
        }

        self.metrics.payments_submitted.inc();
        Ok(self.run_attempt().await)
    }

    pub fn dismiss(&self) -> Result<Dismissal, FlowError> {
        let dismissal = {
            let mut phase = self.phase.write();
            let dismissal = match &*phase {
                PaymentPhase::Success { .. } => Dismissal::LeaveForm,
                PaymentPhase::Failed { .. } => Dismissal::BackToForm,
                _ => return Err(FlowError::NothingToDismiss),
            };
            *phase = PaymentPhase::Idle;
            dismissal
        };

        *self.attempt.write() = None;
        Ok(dismissal)
    }

    async fn run_attempt(&self) -> PaymentPhase {
        let attempt = self.attempt.read().clone();
        let Some(attempt) = attempt else {
            // Nothing stored to run; unwind to Idle rather than hang.
            let phase = PaymentPhase::Idle;
            *self.phase.write() = phase.clone();
            return phase;
        };

        // Floor on visible processing time so instant resolutions don't
        // flicker; genuine latency beyond the floor is never masked.
        let (_, outcome) = tokio::join!(
            sleep(self.min_processing),
            self.gate
                .execute(&attempt.draft, &attempt.signals, &attempt.risk),
        );

        let next = self.settle(outcome);
        *self.phase.write() = next.clone();
        next
    }

    fn settle(&self, outcome: TransactionOutcome) -> PaymentPhase {
        match outcome.status {
            TxStatus::Success => {
                self.metrics.payments_succeeded.inc();
                let message = format!("Paid {} to {}", outcome.amount, outcome.recipient_id);
                info!(%message, transaction = ?outcome.transaction_id, "payment settled");
                PaymentPhase::Success { outcome, message }
            }
            TxStatus::Failed | TxStatus::Fraud => {
                self.metrics.payments_failed.inc();
                let message = if outcome.message.is_empty() {
                    GENERIC_REJECTION_MESSAGE.to_string()
                } else {
                    outcome.message.clone()
                };
                info!(%message, "payment rejected");
                PaymentPhase::Failed { outcome, message }
            }
        }
    }
}
