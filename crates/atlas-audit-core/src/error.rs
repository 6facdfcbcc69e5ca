use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid ignore pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("Asset store error: {0}")]
    Store(String),
    #[error("Another scan or batch operation is already in flight")]
    Busy,
    #[error("No scan result available; run a scan first")]
    NoReport,
}

pub type Result<T> = std::result::Result<T, AuditError>;
