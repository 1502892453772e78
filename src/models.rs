use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Assessment label while no valid draft exists.
pub const WAITING_LABEL: &str = "Waiting for input";
/// Assessment label while a scoring request is in flight.
pub const SCANNING_LABEL: &str = "Scanning transaction";
/// Assessment label when scoring failed and no earlier score exists.
pub const UNAVAILABLE_LABEL: &str = "Scan unavailable";

/// An in-progress payment being edited by the user. Incomplete until both
/// a positive amount and a non-empty recipient are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub amount: Option<f64>,
    pub recipient_id: Option<String>,
    pub note: Option<String>,
}

impl Draft {
    pub fn new(amount: f64, recipient_id: impl Into<String>) -> Self {
        Draft {
            amount: Some(amount),
            recipient_id: Some(recipient_id.into()),
            note: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.amount, Some(a) if a > 0.0)
            && matches!(&self.recipient_id, Some(r) if !r.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationStatus {
    Detecting,
    Verified,
    Denied,
    Unsupported,
}

/// Environmental context attached to every scoring and execution call.
/// (0, 0) coordinates mean "no fix", never a verified location.
#[derive(Debug, Clone)]
pub struct SignalSnapshot {
    pub device_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_status: LocationStatus,
    pub time_synced: bool,
}

/// Latest known risk verdict for the draft. `computed_at` is the request
/// sequence the score came from; an assessment never describes a draft it
/// was not computed for.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub score: Option<u8>,
    pub label: String,
    pub is_fraud: bool,
    pub computed_at: u64,
}

impl RiskAssessment {
    pub fn waiting() -> Self {
        RiskAssessment {
            score: None,
            label: WAITING_LABEL.to_string(),
            is_fraud: false,
            computed_at: 0,
        }
    }
}

/// Coarse band for a 0-100 risk score.
pub fn risk_label(score: u8) -> &'static str {
    if score < 30 {
        "Safe"
    } else if score < 70 {
        "Moderate"
    } else {
        "High Risk"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxStatus {
    Success,
    Failed,
    Fraud,
}

/// Terminal result of one execution attempt. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionOutcome {
    pub status: TxStatus,
    pub amount: f64,
    pub recipient_id: String,
    pub transaction_id: Option<String>,
    pub message: String,
}

/// Authenticated party the session runs under.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub pay_id: String,
    pub display_name: String,
}

// Wire types. The payment service speaks camelCase JSON.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub recipient_id: String,
    pub amount: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub device_id: String,
}

impl ScoreRequest {
    /// Captures the draft and signal state at request time. The caller
    /// guarantees the draft is complete.
    pub fn capture(draft: &Draft, signals: &SignalSnapshot) -> Self {
        ScoreRequest {
            recipient_id: draft.recipient_id.clone().unwrap_or_default(),
            amount: draft.amount.unwrap_or_default(),
            latitude: signals.latitude,
            longitude: signals.longitude,
            device_id: signals.device_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub risk_score: u8,
    pub is_fraud: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub amount: f64,
    pub recipient_id: String,
    pub note: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub device_id: String,
    pub session_user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub status: TxStatus,
    pub message: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub amount: f64,
    pub recipient_id: String,
    #[serde(default)]
    pub risk_score: Option<u8>,
}

impl ExecuteResponse {
    /// The remote side is authoritative; its verdict passes through verbatim.
    pub fn into_outcome(self) -> TransactionOutcome {
        TransactionOutcome {
            status: self.status,
            amount: self.amount,
            recipient_id: self.recipient_id,
            transaction_id: self.transaction_id,
            message: self.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub amount: f64,
    pub sender_id: String,
    pub recipient_id: String,
    pub status: TxStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub counterparty_name: Option<String>,
}

impl TransactionRecord {
    /// A record is relevant to a user when they initiated it or receive it.
    pub fn involves(&self, user: &SessionUser) -> bool {
        self.sender_id == user.id || self.recipient_id == user.pay_id
    }
}

/// Events pushed over the reconciliation channel. Delivery is
/// at-least-once; handlers must tolerate duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PushEvent {
    BalanceUpdated { user_id: String, balance: f64 },
    TransactionInserted { record: TransactionRecord },
}
