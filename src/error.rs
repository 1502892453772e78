use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api returned status {0}")]
    Api(u16),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SentinelError>;
