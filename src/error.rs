//! Error types for the Sesame chat client.
//!
//! Remote failures, persistence failures and attachment read failures all
//! surface as [`Error`]. None of them is fatal to the chat: the send path turns
//! remote errors into an error-flagged reply, and the store treats unreadable
//! state as absent.

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

type Source = Arc<dyn error::Error + Send + Sync>;

/// The class of a non-success reply from the Gemini API.
///
/// Derived from the HTTP status; the API's own status string (for example
/// `RESOURCE_EXHAUSTED`) is kept alongside on [`Error::Api`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    DeadlineExceeded,
    ResourceExhausted,
    Internal,
    Unavailable,
    Other,
}

impl ApiErrorKind {
    /// Classify an HTTP status code.
    pub fn from_status_code(status_code: u16) -> Self {
        match status_code {
            400 => ApiErrorKind::InvalidArgument,
            401 => ApiErrorKind::Unauthenticated,
            403 => ApiErrorKind::PermissionDenied,
            404 => ApiErrorKind::NotFound,
            408 | 504 => ApiErrorKind::DeadlineExceeded,
            429 => ApiErrorKind::ResourceExhausted,
            500 => ApiErrorKind::Internal,
            502 | 503 => ApiErrorKind::Unavailable,
            _ => ApiErrorKind::Other,
        }
    }

    /// Whether sending the same request again later could succeed.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ApiErrorKind::DeadlineExceeded
                | ApiErrorKind::ResourceExhausted
                | ApiErrorKind::Internal
                | ApiErrorKind::Unavailable
        )
    }

    fn describe(self) -> &'static str {
        match self {
            ApiErrorKind::InvalidArgument => "invalid request",
            ApiErrorKind::Unauthenticated => "authentication failed",
            ApiErrorKind::PermissionDenied => "permission denied",
            ApiErrorKind::NotFound => "not found",
            ApiErrorKind::DeadlineExceeded => "deadline exceeded",
            ApiErrorKind::ResourceExhausted => "quota exceeded",
            ApiErrorKind::Internal => "server error",
            ApiErrorKind::Unavailable => "service unavailable",
            ApiErrorKind::Other => "request failed",
        }
    }
}

/// The main error type for the Sesame chat client.
#[derive(Clone, Debug)]
pub enum Error {
    /// The API answered with a non-success status.
    Api {
        kind: ApiErrorKind,
        status_code: u16,
        /// Status string from the error envelope, if any.
        status: Option<String>,
        message: String,
        /// Seconds to wait, from the `retry-after` header.
        retry_after: Option<u64>,
    },

    /// The client is missing something it needs to talk to the API.
    Config { message: String },

    /// No reply arrived within the configured timeout.
    Timeout {
        message: String,
        after: Option<Duration>,
    },

    /// The request never produced an HTTP response.
    Transport {
        message: String,
        source: Option<Source>,
    },

    /// A body or persisted value could not be encoded or decoded.
    Serialization {
        message: String,
        source: Option<Source>,
    },

    /// Reading or writing local files failed.
    Io {
        message: String,
        source: Arc<io::Error>,
    },

    /// Input was rejected before anything was sent.
    Validation { message: String },

    /// A base URL or endpoint could not be parsed.
    Url {
        message: String,
        source: Option<url::ParseError>,
    },
}

impl Error {
    /// An API failure, classified by its HTTP status.
    pub fn api(
        status_code: u16,
        status: Option<String>,
        message: impl Into<String>,
        retry_after: Option<u64>,
    ) -> Self {
        Error::Api {
            kind: ApiErrorKind::from_status_code(status_code),
            status_code,
            status,
            message: message.into(),
            retry_after,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>, after: Option<Duration>) -> Self {
        Error::Timeout {
            message: message.into(),
            after,
        }
    }

    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        Error::Transport {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    pub fn serialization<E>(message: impl Into<String>, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        Error::Serialization {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// The API error class, for errors that came back from the API.
    pub fn kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The HTTP status, for errors that came back from the API.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// How long the API asked us to wait before trying again.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::Api {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        self.kind() == Some(ApiErrorKind::ResourceExhausted)
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Config { .. })
            || self.kind() == Some(ApiErrorKind::Unauthenticated)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
            || self.kind() == Some(ApiErrorKind::DeadlineExceeded)
    }

    /// Whether a later attempt with the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api { kind, .. } => kind.is_transient(),
            Error::Timeout { .. } | Error::Transport { .. } => true,
            _ => false,
        }
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, Error::Serialization { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api {
                kind,
                status_code,
                status,
                message,
                retry_after,
            } => {
                write!(f, "Gemini API {} ({}", kind.describe(), status_code)?;
                if let Some(status) = status {
                    write!(f, " {}", status)?;
                }
                write!(f, "): {}", message)?;
                if let Some(secs) = retry_after {
                    write!(f, "; retry after {}s", secs)?;
                }
                Ok(())
            }
            Error::Config { message } => write!(f, "Configuration error: {}", message),
            Error::Timeout { message, after } => match after {
                Some(after) => write!(f, "Timed out after {:.1}s: {}", after.as_secs_f64(), message),
                None => write!(f, "Timed out: {}", message),
            },
            Error::Transport { message, .. } => write!(f, "Transport error: {}", message),
            Error::Serialization { message, .. } => write!(f, "Serialization error: {}", message),
            Error::Io { message, source } => write!(f, "{}: {}", message, source),
            Error::Validation { message } => write!(f, "Invalid input: {}", message),
            Error::Url { message, .. } => write!(f, "Invalid URL: {}", message),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Transport { source, .. } | Error::Serialization { source, .. } => source
                .as_deref()
                .map(|source| source as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source.as_ref()),
            Error::Url { source, .. } => source
                .as_ref()
                .map(|source| source as &(dyn error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io("I/O failure", err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(err.to_string(), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Url {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// A specialized Result type for Sesame operations.
pub type Result<T> = std::result::Result<T, Error>;
