use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::config::Config;
use crate::error::Result;
use crate::flow::{Dismissal, FlowError, PaymentFlow, PaymentPhase};
use crate::gate::PaymentGate;
use crate::history::HistoryStore;
use crate::metrics::Metrics;
use crate::models::{Draft, RiskAssessment, SessionUser, TransactionRecord};
use crate::monitor::MonitorPoller;
use crate::reconcile::ReconciliationListener;
use crate::risk::RiskEstimator;
use crate::session::SessionContext;
use crate::signals::SignalCollector;

/// Wires the payment client together for one authenticated session:
/// signal collection, the debounced risk estimator, the gated executor
/// with its state machine, the reconciliation listener and the monitor
/// feed. Lifecycle is explicit: start() on sign-in, sign_out() tears
/// every subscription down with the session.
pub struct PayEngine {
    api: Arc<ApiClient>,
    signals: SignalCollector,
    session: Arc<SessionContext>,
    estimator: RiskEstimator,
    flow: Arc<PaymentFlow>,
    history: Arc<HistoryStore>,
    listener: ReconciliationListener,
    monitor: Mutex<MonitorPoller>,
    metrics: Arc<Metrics>,
}

impl PayEngine {
    pub fn start(config: Config, user: SessionUser) -> Result<Self> {
        info!(user = %user.id, "starting payment engine");

        let metrics = Arc::new(Metrics::new()?);
        let api = Arc::new(ApiClient::new(&config)?);
        let signals = SignalCollector::collect(&config)?;
        let session = SessionContext::new(user);

        let estimator = RiskEstimator::spawn(
            api.clone(),
            signals.clone(),
            session.clone(),
            &config,
            metrics.clone(),
        );

        let gate = Arc::new(PaymentGate::new(
            api.clone(),
            session.clone(),
            &config,
            metrics.clone(),
        ));
        let flow = Arc::new(PaymentFlow::new(gate, &config, metrics.clone()));

        let history = HistoryStore::new(api.clone(), session.clone(), metrics.clone());
        let listener =
            ReconciliationListener::start(session.clone(), history.clone(), &config, metrics.clone());

        let monitor = Mutex::new(MonitorPoller::new(api.clone(), &config));

        // Warm the history view; reconciliation keeps it fresh afterwards.
        {
            let history = history.clone();
            tokio::spawn(async move {
                if let Err(e) = history.refresh().await {
                    warn!("initial history fetch failed: {e}");
                }
            });
        }

        Ok(PayEngine {
            api,
            signals,
            session,
            estimator,
            flow,
            history,
            listener,
            monitor,
            metrics,
        })
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn signals(&self) -> &SignalCollector {
        &self.signals
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Feeds an edit into the risk pipeline.
    pub fn edit_draft(&self, draft: Draft) {
        self.estimator.on_draft_change(draft);
    }

    pub fn assessment(&self) -> RiskAssessment {
        self.estimator.assessment()
    }

    pub fn phase(&self) -> PaymentPhase {
        self.flow.phase()
    }

    /// Submits the draft with the signal and risk state captured right
    /// now; both stay frozen for the attempt, including retries.
    pub async fn submit(&self, draft: Draft) -> std::result::Result<PaymentPhase, FlowError> {
        self.flow
            .submit(draft, self.signals.snapshot(), self.estimator.assessment())
            .await
    }

    pub async fn retry(&self) -> std::result::Result<PaymentPhase, FlowError> {
        self.flow.retry().await
    }

    pub fn dismiss(&self) -> std::result::Result<Dismissal, FlowError> {
        self.flow.dismiss()
    }

    pub fn start_monitor(&self) {
        self.monitor.lock().start();
    }

    pub fn stop_monitor(&self) {
        self.monitor.lock().stop();
    }

    pub fn monitor_feed(&self) -> Vec<TransactionRecord> {
        self.monitor.lock().feed()
    }

    pub fn report_metrics(&self) {
        self.metrics.report();
    }

    /// Ends the session. Subscriptions die here, synchronously, so no
    /// event for this identity is delivered after sign-out returns.
    pub fn sign_out(&self) {
        self.listener.stop();
        self.estimator.shutdown();
        self.monitor.lock().stop();
        info!(user = %self.session.user.id, "session closed");
    }
}
