//! Client core for peer-to-peer payments with inline fraud-risk
//! assessment: a debounced risk estimator over the in-progress draft, a
//! locally gated remote executor, a deterministic transaction state
//! machine, and a reconciliation listener that merges authoritative
//! pushed updates into session state.

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod flow;
pub mod gate;
pub mod history;
pub mod metrics;
pub mod models;
pub mod monitor;
pub mod reconcile;
pub mod risk;
pub mod session;
pub mod signals;

pub use app::PayEngine;
pub use config::Config;
pub use error::{Result, SentinelError};
pub use flow::{Dismissal, FlowError, PaymentFlow, PaymentPhase};
pub use models::{
    Draft, RiskAssessment, SessionUser, SignalSnapshot, TransactionOutcome, TransactionRecord,
    TxStatus,
};
