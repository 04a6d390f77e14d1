use thiserror::Error;

pub type Result<T> = std::result::Result<T, BingoError>;

#[derive(Error, Debug)]
pub enum BingoError {
    #[error("Key derivation failed: {0}")]
    Derivation(String),

    #[error("Malformed address: {0}")]
    MalformedAddress(String),

    #[error("Truncated ticket: row {row} declares {declared} bytes, {remaining} remaining")]
    TruncatedTicket {
        row: usize,
        declared: usize,
        remaining: usize,
    },

    #[error("Malformed ticket row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Ledger rejected request: {0}")]
    Ledger(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BingoError {
    pub fn derivation(msg: impl Into<String>) -> Self {
        Self::Derivation(msg.into())
    }

    pub fn malformed_address(msg: impl Into<String>) -> Self {
        Self::MalformedAddress(msg.into())
    }

    pub fn malformed_row(row: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            row,
            reason: reason.into(),
        }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::Ledger(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Errors a polling loop may retry on the next tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::InvalidResponse(_) | Self::Timeout(_)
        )
    }
}

// conversion from reqwest::Error
impl From<reqwest::Error> for BingoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BingoError::Timeout(err.to_string())
        } else if err.is_decode() {
            BingoError::InvalidResponse(err.to_string())
        } else {
            BingoError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(BingoError::network("connection reset").is_transient());
        assert!(BingoError::invalid_response("empty body").is_transient());
        assert!(BingoError::Timeout("30s".to_string()).is_transient());

        assert!(!BingoError::ledger("nonce too low").is_transient());
        assert!(!BingoError::config("missing seed").is_transient());
        assert!(!BingoError::internal("bug").is_transient());
    }
}
