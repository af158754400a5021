use thiserror::Error;

/// Errors surfaced by the swap client.
///
/// `QuoteUnavailable` may be transient and is the only variant a caller
/// should consider retrying. Everything else points at bad input, bad
/// configuration or a bug.
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unsupported chain id {0}")]
    UnsupportedChain(u64),

    #[error("no quote for {token_in} -> {token_out}: {reason}")]
    QuoteUnavailable {
        token_in: String,
        token_out: String,
        reason: String,
    },

    #[error("failed to encode swap call: {0}")]
    EncodingError(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("config error: {0}")]
    Config(String),
}

impl SwapError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        SwapError::InvalidParameter(msg.into())
    }

    pub fn rpc(err: impl std::fmt::Display) -> Self {
        SwapError::Rpc(err.to_string())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, SwapError::QuoteUnavailable { .. } | SwapError::Rpc(_))
    }
}

pub type Result<T> = std::result::Result<T, SwapError>;
