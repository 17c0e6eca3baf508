use crate::types::Scheme;

/// Closed set of reasons a connection or login attempt can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionErrorKind {
    #[error("Host name could not be resolved")]
    InvalidHostname,

    #[error("Connection refused")]
    ConnectionRefused,

    #[error("Connection timed out")]
    Timeout,

    #[error("Wrong protocol, the server answers on {correct_scheme}")]
    WrongProtocol { correct_scheme: Scheme },

    #[error("Invalid username or password")]
    Unauthorized,

    #[error("Access forbidden")]
    Forbidden,

    #[error("Server error")]
    ServerError,

    #[error("Could not connect to the server")]
    Unclassified,
}

impl ConnectionErrorKind {
    /// Failures that say nothing about the URL scheme being wrong.
    pub fn is_decisive(&self) -> bool {
        matches!(
            self,
            Self::InvalidHostname | Self::ConnectionRefused | Self::Timeout
        )
    }

    /// Stable identifier for message lookup.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::InvalidHostname => "invalid_hostname",
            Self::ConnectionRefused => "connection_refused",
            Self::Timeout => "timeout",
            Self::WrongProtocol { .. } => "wrong_protocol",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::ServerError => "server_error",
            Self::Unclassified => "unclassified",
        }
    }

    /// Kind for an HTTP status that is not a success, if it has one.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            s if s >= 500 => Some(Self::ServerError),
            _ => None,
        }
    }
}

/// Errors that can occur talking to a RomM server.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Connection(ConnectionErrorKind),

    #[error("Server error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidUrl(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Map any client error onto the connection taxonomy.
    pub fn kind(&self) -> ConnectionErrorKind {
        match self {
            Self::Connection(kind) => *kind,
            Self::Http(e) => crate::transport::classify_reqwest(e),
            Self::Status { status, .. } => ConnectionErrorKind::from_status(*status)
                .unwrap_or(ConnectionErrorKind::Unclassified),
            _ => ConnectionErrorKind::Unclassified,
        }
    }
}

impl From<ConnectionErrorKind> for ClientError {
    fn from(kind: ConnectionErrorKind) -> Self {
        Self::Connection(kind)
    }
}
