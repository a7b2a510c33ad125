//! Errors shared by the common utilities

use alloy::transports::{RpcError, TransportError, TransportErrorKind};

/// JSON-RPC error codes which upstream providers use to signal rate limiting.
const RATE_LIMIT_CODES: [i64; 2] = [429, -32005];

/// Error type for the common utilities.
///
/// RPC failures are classified on construction so callers can tell a rate limited
/// or timed out upstream apart from one that is simply unavailable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Generic error
    #[error("Error: {0}")]
    Generic(String),
    /// The upstream node returned an error or malformed data
    #[error("RPC error: {0}")]
    RpcError(String),
    /// The upstream node is rate limiting us
    #[error("Rate limited: {0}")]
    RateLimited(String),
    /// The upstream node did not answer in time
    #[error("Timed out: {0}")]
    Timeout(String),
    /// A value could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl Error {
    /// Classifies a transport error returned by an alloy provider.
    pub fn from_transport(context: &str, err: TransportError) -> Self {
        let message = format!("{context}: {err}");
        let rate_limited = match &err {
            RpcError::Transport(TransportErrorKind::HttpError(http)) => http.status == 429,
            RpcError::ErrorResp(payload) => RATE_LIMIT_CODES.contains(&payload.code),
            _ => false,
        };

        if rate_limited || is_rate_limit_message(&message) {
            Self::RateLimited(message)
        } else if message.to_lowercase().contains("timed out") {
            Self::Timeout(message)
        } else {
            Self::RpcError(message)
        }
    }

    /// Whether retrying the operation that produced this error could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ParseError(_))
    }
}

fn is_rate_limit_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("rate limit") || message.contains("too many requests")
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::transports::HttpError;

    #[test]
    fn test_http_429_is_rate_limited() {
        let err = RpcError::Transport(TransportErrorKind::HttpError(HttpError {
            status: 429,
            body: String::new(),
        }));
        assert!(matches!(Error::from_transport("eth_getStorageAt", err), Error::RateLimited(_)));
    }

    #[test]
    fn test_http_500_is_rpc_error() {
        let err = RpcError::Transport(TransportErrorKind::HttpError(HttpError {
            status: 500,
            body: "internal error".to_string(),
        }));
        assert!(matches!(Error::from_transport("eth_getCode", err), Error::RpcError(_)));
    }

    #[test]
    fn test_rate_limit_message_is_rate_limited() {
        let err = TransportErrorKind::custom_str("Too Many Requests, slow down");
        assert!(matches!(Error::from_transport("eth_blockNumber", err), Error::RateLimited(_)));
    }

    #[test]
    fn test_timed_out_message_is_timeout() {
        let err = TransportErrorKind::custom_str("operation timed out");
        assert!(matches!(Error::from_transport("eth_blockNumber", err), Error::Timeout(_)));
    }

    #[test]
    fn test_parse_errors_are_not_retryable() {
        assert!(!Error::ParseError("bad".to_string()).is_retryable());
        assert!(Error::RpcError("bad".to_string()).is_retryable());
        assert!(Error::RateLimited("slow".to_string()).is_retryable());
    }
}
