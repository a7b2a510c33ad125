use slotscope_common::error::Error as CommonError;

/// Error type for the storage module.
///
/// Every variant maps to exactly one HTTP status, see [`Error::status_code`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The request is malformed and will never succeed as is
    #[error("{0}")]
    Validation(String),
    /// There is no contract code at the requested address
    #[error("{0}")]
    NotFound(String),
    /// The upstream node is rate limiting us
    #[error("Upstream rate limited: {0}")]
    UpstreamRateLimited(String),
    /// The upstream node did not answer in time
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),
    /// The upstream node failed or returned malformed data
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The HTTP status code this error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::UpstreamRateLimited(_) => 429,
            Error::UpstreamTimeout(_) => 504,
            Error::UpstreamUnavailable(_) | Error::Internal(_) => 500,
        }
    }

    /// Whether an upstream call that failed with this error may be attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::UpstreamRateLimited(_) | Error::UpstreamTimeout(_) | Error::UpstreamUnavailable(_)
        )
    }

    /// Ranks errors so the most specific upstream failure is the one reported when several
    /// chunks fail for different reasons.
    fn specificity(&self) -> u8 {
        match self {
            Error::Validation(_) | Error::NotFound(_) => 5,
            Error::UpstreamRateLimited(_) => 4,
            Error::UpstreamTimeout(_) => 3,
            Error::UpstreamUnavailable(_) => 2,
            Error::Internal(_) => 1,
        }
    }

    /// Picks the most specific error out of `errors`, or `None` if there are none.
    pub fn most_specific<'a>(errors: impl IntoIterator<Item = &'a Error>) -> Option<Error> {
        errors.into_iter().max_by_key(|e| e.specificity()).cloned()
    }
}

impl From<CommonError> for Error {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::RateLimited(msg) => Error::UpstreamRateLimited(msg),
            CommonError::Timeout(msg) => Error::UpstreamTimeout(msg),
            CommonError::RpcError(msg) | CommonError::ParseError(msg) => {
                Error::UpstreamUnavailable(msg)
            }
            CommonError::Generic(msg) => Error::Internal(msg),
        }
    }
}

impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Internal(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Validation("bad".to_string()).status_code(), 400);
        assert_eq!(Error::NotFound("gone".to_string()).status_code(), 404);
        assert_eq!(Error::UpstreamRateLimited("slow".to_string()).status_code(), 429);
        assert_eq!(Error::UpstreamTimeout("late".to_string()).status_code(), 504);
        assert_eq!(Error::UpstreamUnavailable("down".to_string()).status_code(), 500);
        assert_eq!(Error::Internal("oops".to_string()).status_code(), 500);
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = Error::Validation("Invalid contract address format".to_string());
        assert_eq!(err.to_string(), "Invalid contract address format");
    }

    #[test]
    fn test_most_specific() {
        let errors = vec![
            Error::UpstreamUnavailable("a".to_string()),
            Error::UpstreamRateLimited("b".to_string()),
            Error::UpstreamTimeout("c".to_string()),
        ];
        assert_eq!(
            Error::most_specific(&errors),
            Some(Error::UpstreamRateLimited("b".to_string()))
        );
        assert_eq!(Error::most_specific(&[]), None);
    }

    #[test]
    fn test_from_common_error() {
        assert!(matches!(
            Error::from(CommonError::Timeout("t".to_string())),
            Error::UpstreamTimeout(_)
        ));
        assert!(matches!(
            Error::from(CommonError::ParseError("p".to_string())),
            Error::UpstreamUnavailable(_)
        ));
        assert!(!Error::Validation("v".to_string()).is_retryable());
        assert!(Error::UpstreamTimeout("t".to_string()).is_retryable());
    }
}
