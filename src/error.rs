//! Error types for the koine client.
//!
//! Every failure the client can observe is classified into one of the
//! variants below, independent of which retry attempt produced it.  The UI
//! boundary turns any of them into a single string with
//! [`Error::user_message`].

use std::error;
use std::fmt;
use std::sync::Arc;

use crate::retry::is_retryable_status;

/// Fallback used when the server supplies a detail we cannot display, or for
/// a status code without a dedicated message.
pub const GENERIC_MESSAGE: &str = "An error occurred";

/// Fallback used when the error never reached the HTTP layer at all.
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred";

/// The main error type for the koine client.
#[derive(Clone, Debug)]
pub enum Error {
    /// The server rejected the bearer credential (HTTP 401).
    Unauthorized {
        /// Detail reported by the server, if any.
        detail: Option<String>,
    },

    /// The client-side deadline elapsed before a response arrived.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// Duration of the timeout in seconds.
        duration: Option<f64>,
    },

    /// No response was reachable.
    Network {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// A 408, 429 or 5xx response.  Retried when the status is retryable.
    Server {
        /// HTTP status code.
        status_code: u16,
        /// Detail reported by the server, if any.
        detail: Option<String>,
    },

    /// A 4xx response other than 401, 408 and 429.  Never retried.
    Client {
        /// HTTP status code.
        status_code: u16,
        /// Detail reported by the server, if any.
        detail: Option<String>,
    },

    /// A malformed stream frame.
    Protocol {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// An explicit `error` frame sent by the chat service.
    StreamFatal {
        /// The message carried by the frame.
        message: String,
    },

    /// Error during JSON serialization or deserialization.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// HTTP client construction or request-building error.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// A URL parsing or manipulation error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },

    /// Error during validation of caller-supplied parameters.
    Validation {
        /// Human-readable error message.
        message: String,
        /// Parameter that failed validation.
        param: Option<String>,
    },
}

impl Error {
    /// Creates a new unauthorized error.
    pub fn unauthorized(detail: Option<String>) -> Self {
        Error::Unauthorized { detail }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a new network error.
    pub fn network(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Network {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new server error.
    pub fn server(status_code: u16, detail: Option<String>) -> Self {
        Error::Server {
            status_code,
            detail,
        }
    }

    /// Creates a new client error.
    pub fn client(status_code: u16, detail: Option<String>) -> Self {
        Error::Client {
            status_code,
            detail,
        }
    }

    /// Creates a new protocol error.
    pub fn protocol(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Protocol {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new stream-fatal error.
    pub fn stream_fatal(message: impl Into<String>) -> Self {
        Error::StreamFatal {
            message: message.into(),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// Classifies a non-success HTTP status.
    pub fn from_status(status_code: u16, detail: Option<String>) -> Self {
        match status_code {
            401 => Error::unauthorized(detail),
            408 | 429 | 500..=599 => Error::server(status_code, detail),
            _ => Error::client(status_code, detail),
        }
    }

    /// Returns true if this error means the credential was rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if this error is a network error.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network { .. })
    }

    /// Returns true if this error is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Server { .. })
    }

    /// Returns true if this error is a client error.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Client { .. })
    }

    /// Returns true if this error is a protocol error.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol { .. })
    }

    /// Returns true if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Returns true if the identical request should be re-sent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Server { status_code, .. } => is_retryable_status(*status_code),
            _ => false,
        }
    }

    /// Returns the status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Unauthorized { .. } => Some(401),
            Error::Server { status_code, .. } | Error::Client { status_code, .. } => {
                Some(*status_code)
            }
            _ => None,
        }
    }

    /// Returns the server-supplied detail, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Error::Unauthorized { detail }
            | Error::Server { detail, .. }
            | Error::Client { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Renders this error as the one string shown to the user.
    pub fn user_message(&self) -> String {
        if let Some(detail) = self.detail() {
            return detail.to_string();
        }
        match self {
            Error::Timeout { .. } => "Request timeout. Please try again.".to_string(),
            Error::Network { .. } => "Network error. Please check your connection.".to_string(),
            Error::StreamFatal { message } => message.clone(),
            Error::Unauthorized { .. } | Error::Server { .. } | Error::Client { .. } => self
                .status_code()
                .and_then(status_message)
                .unwrap_or(GENERIC_MESSAGE)
                .to_string(),
            _ => UNEXPECTED_MESSAGE.to_string(),
        }
    }
}

/// Maps a status code to its human-readable message.
pub fn status_message(status_code: u16) -> Option<&'static str> {
    let message = match status_code {
        400 => "Invalid request",
        401 => "Please log in to continue",
        403 => "Access denied",
        404 => "Resource not found",
        408 => "Request timeout",
        429 => "Too many requests. Please try again later.",
        500 => "Server error. Please try again.",
        502 => "Bad gateway. Please try again.",
        503 => "Service unavailable. Please try again later.",
        504 => "Gateway timeout. Please try again.",
        _ => return None,
    };
    Some(message)
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unauthorized { detail } => match detail {
                Some(detail) => write!(f, "Unauthorized: {detail}"),
                None => write!(f, "Unauthorized"),
            },
            Error::Timeout { message, duration } => {
                if let Some(duration) = duration {
                    write!(f, "Timeout error: {message} ({duration} seconds)")
                } else {
                    write!(f, "Timeout error: {message}")
                }
            }
            Error::Network { message, .. } => {
                write!(f, "Network error: {message}")
            }
            Error::Server {
                status_code,
                detail,
            } => match detail {
                Some(detail) => write!(f, "Server error {status_code}: {detail}"),
                None => write!(f, "Server error {status_code}"),
            },
            Error::Client {
                status_code,
                detail,
            } => match detail {
                Some(detail) => write!(f, "Client error {status_code}: {detail}"),
                None => write!(f, "Client error {status_code}"),
            },
            Error::Protocol { message, .. } => {
                write!(f, "Protocol error: {message}")
            }
            Error::StreamFatal { message } => {
                write!(f, "Chat service error: {message}")
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::HttpClient { message, .. } => {
                write!(f, "HTTP client error: {message}")
            }
            Error::Url { message, .. } => {
                write!(f, "URL error: {message}")
            }
            Error::Validation { message, param } => {
                if let Some(param) = param {
                    write!(f, "Validation error: {message} (parameter: {param})")
                } else {
                    write!(f, "Validation error: {message}")
                }
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Network { source, .. }
            | Error::Protocol { source, .. }
            | Error::Serialization { source, .. }
            | Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

/// A specialized Result type for koine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(Error::from_status(401, None).is_unauthorized());
        for status in [408, 429, 500, 501, 502, 503, 504] {
            assert!(Error::from_status(status, None).is_server_error(), "{status}");
        }
        for status in [400, 403, 404, 422] {
            assert!(Error::from_status(status, None).is_client_error(), "{status}");
        }
    }

    #[test]
    fn only_listed_statuses_retry() {
        assert!(Error::server(503, None).is_retryable());
        assert!(Error::server(408, None).is_retryable());
        assert!(!Error::server(501, None).is_retryable());
        assert!(!Error::client(404, None).is_retryable());
        assert!(!Error::unauthorized(None).is_retryable());
        assert!(!Error::timeout("deadline", Some(30.0)).is_retryable());
    }

    #[test]
    fn detail_wins_over_status_table() {
        let err = Error::client(400, Some("Email already registered".to_string()));
        assert_eq!(err.user_message(), "Email already registered");
    }

    #[test]
    fn status_table_messages() {
        assert_eq!(Error::client(404, None).user_message(), "Resource not found");
        assert_eq!(
            Error::server(503, None).user_message(),
            "Service unavailable. Please try again later."
        );
        assert_eq!(
            Error::unauthorized(None).user_message(),
            "Please log in to continue"
        );
        assert_eq!(Error::client(418, None).user_message(), GENERIC_MESSAGE);
    }

    #[test]
    fn transport_messages() {
        assert_eq!(
            Error::timeout("deadline", None).user_message(),
            "Request timeout. Please try again."
        );
        assert_eq!(
            Error::network("refused", None).user_message(),
            "Network error. Please check your connection."
        );
        assert_eq!(
            Error::validation("bad", None).user_message(),
            UNEXPECTED_MESSAGE
        );
    }
}
