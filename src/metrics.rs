use prometheus::IntCounter;
use tracing::info;

use crate::error::Result;

pub struct Metrics {
    pub risk_checks: IntCounter,
    pub risk_check_failures: IntCounter,
    pub risk_stale_dropped: IntCounter,
    pub payments_submitted: IntCounter,
    pub payments_blocked: IntCounter,
    pub payments_succeeded: IntCounter,
    pub payments_failed: IntCounter,
    pub balance_events: IntCounter,
    pub transaction_events: IntCounter,
    pub stream_reconnects: IntCounter,
    pub history_refreshes: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        Ok(Metrics {
            risk_checks: IntCounter::new("pay_risk_checks_total", "Scoring requests issued")?,
            risk_check_failures: IntCounter::new(
                "pay_risk_check_failures_total",
                "Scoring requests that failed",
            )?,
            risk_stale_dropped: IntCounter::new(
                "pay_risk_stale_dropped_total",
                "Superseded scoring responses discarded",
            )?,
            payments_submitted: IntCounter::new(
                "pay_payments_submitted_total",
                "Payment attempts started",
            )?,
            payments_blocked: IntCounter::new(
                "pay_payments_blocked_total",
                "Payments blocked by the local risk gate",
            )?,
            payments_succeeded: IntCounter::new(
                "pay_payments_succeeded_total",
                "Payments that reached SUCCESS",
            )?,
            payments_failed: IntCounter::new(
                "pay_payments_failed_total",
                "Payments that reached FAILED",
            )?,
            balance_events: IntCounter::new(
                "pay_balance_events_total",
                "Balance reconciliation events applied",
            )?,
            transaction_events: IntCounter::new(
                "pay_transaction_events_total",
                "Transaction reconciliation events applied",
            )?,
            stream_reconnects: IntCounter::new(
                "pay_stream_reconnects_total",
                "Reconciliation stream reconnect attempts",
            )?,
            history_refreshes: IntCounter::new(
                "pay_history_refreshes_total",
                "Full history re-fetches",
            )?,
        })
    }

    pub fn report(&self) {
        info!(
            "Metrics snapshot - risk checks: {} ({} failed, {} stale), payments: {} submitted / {} blocked / {} ok / {} failed",
            self.risk_checks.get(),
            self.risk_check_failures.get(),
            self.risk_stale_dropped.get(),
            self.payments_submitted.get(),
            self.payments_blocked.get(),
            self.payments_succeeded.get(),
            self.payments_failed.get(),
        );
    }
}
