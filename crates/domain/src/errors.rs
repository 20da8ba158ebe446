use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("Invalid host name: {0}")]
    InvalidHostName(String),

    #[error("Query timed out")]
    Timeout,

    #[error("Name error: {0}")]
    NameError(String),

    #[error("Response header error: {0}")]
    ResponseHeader(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResolveError {
    /// Errors that a PTR probe may swallow: the literal address is already
    /// known, so a rejected or empty reverse answer is not fatal.
    pub fn is_ptr_recoverable(&self) -> bool {
        matches!(
            self,
            ResolveError::NameError(_) | ResolveError::ResponseHeader(_)
        )
    }
}

impl From<std::io::Error> for ResolveError {
    fn from(e: std::io::Error) -> Self {
        ResolveError::Io(e.to_string())
    }
}
