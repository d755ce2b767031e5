/// Failure to produce a page of records.
/// Classified so callers can decide whether a retry is worth offering.
#[derive(Clone, Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("source returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("invalid page token: {0}")]
    InvalidToken(String),
    #[error("source not configured: {0}")]
    NotConfigured(String),
    #[error("store error: {0}")]
    Store(String),
}

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Short classification string for logs and error bodies.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Status { .. } => "status",
            Self::Malformed(_) => "malformed",
            Self::InvalidToken(_) => "invalid_token",
            Self::NotConfigured(_) => "not_configured",
            Self::Store(_) => "store",
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 if body.contains("token") => Self::InvalidToken(body),
            _ => Self::Status { status, body },
        }
    }
}
