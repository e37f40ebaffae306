use std::fmt;

/// API errors with user-friendly messages.
#[derive(Debug)]
pub enum ApiError {
    /// Network-level failure (connection, timeout, DNS)
    Network(String),
    /// HTTP error response (4xx, 5xx)
    HttpStatus(u16, String),
    /// Failed to parse response
    Parse(String),
    /// Storage/persistence failure
    Storage(String),
}

impl ApiError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(details) if details.contains("timed out") => {
                "Wikipedia took too long to answer. Press r to retry.".into()
            }
            Self::Network(details) => format!("Could not reach Wikipedia: {details}"),
            Self::HttpStatus(429, _) => "Wikipedia is rate limiting us. Slow down.".into(),
            Self::HttpStatus(404, _) => "No articles published for that day.".into(),
            Self::HttpStatus(500..=599, _) => "Wikipedia is having trouble. Try again later.".into(),
            Self::HttpStatus(code, reason) => format!("HTTP error {code}: {reason}"),
            Self::Parse(details) => format!("Unexpected response: {details}"),
            Self::Storage(details) => format!("Storage error: {details}"),
        }
    }

    /// Returns true if this error should cause the program to exit.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network("request timed out".into())
        } else if err.is_connect() {
            Self::Network("connection failed".into())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::HttpStatus(
                status.as_u16(),
                status.canonical_reason().unwrap_or("").into(),
            )
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<crate::storage::StorageError> for ApiError {
    fn from(err: crate::storage::StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}
