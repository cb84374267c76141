use serde::{Deserialize, Serialize};
use std::fmt;

/// Underlying reason for a transport-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportCause {
    Connect,
    Timeout,
    Cancelled,
    Other,
}

impl fmt::Display for TransportCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportCause::Connect => write!(f, "connect"),
            TransportCause::Timeout => write!(f, "timeout"),
            TransportCause::Cancelled => write!(f, "cancelled"),
            TransportCause::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parsing error: {message}")]
    ParseError {
        /// `METHOD /path` or document section the error was found in
        location: Option<String>,
        message: String,
    },

    #[error("Validation error: {message}")]
    ValidationError {
        parameter: Option<String>,
        message: String,
    },

    #[error("Transport error ({cause}): {message}")]
    TransportError {
        cause: TransportCause,
        message: String,
    },

    #[error("Upstream error: HTTP {status}")]
    UpstreamError { status: u16, body: String },
}

/// Coarse error classification exposed to plugin adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Parse,
    Validation,
    Transport,
    Upstream,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Config => write!(f, "config"),
            ErrorKind::Parse => write!(f, "parse"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Upstream => write!(f, "upstream"),
        }
    }
}

/// Serializable error object returned to the host application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for EngineError {
    fn from(err: serde_yaml::Error) -> Self {
        EngineError::parse(err.to_string())
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        let cause = if err.is_timeout() {
            TransportCause::Timeout
        } else if err.is_connect() {
            TransportCause::Connect
        } else {
            TransportCause::Other
        };
        EngineError::TransportError {
            cause,
            message: err.to_string(),
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Shortcut method to create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        EngineError::ConfigError(msg.into())
    }

    /// Shortcut method to create a parsing error without location
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        EngineError::ParseError {
            location: None,
            message: msg.into(),
        }
    }

    /// Parsing error attached to a path/method or document section
    pub fn parse_at<L: Into<String>, S: Into<String>>(location: L, msg: S) -> Self {
        let location = location.into();
        EngineError::ParseError {
            message: format!("{}: {}", location, msg.into()),
            location: Some(location),
        }
    }

    /// Shortcut method to create a validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        EngineError::ValidationError {
            parameter: None,
            message: msg.into(),
        }
    }

    pub fn missing_parameter<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        EngineError::ValidationError {
            message: format!("missing required parameter '{}'", name),
            parameter: Some(name),
        }
    }

    pub fn missing_credential<S: AsRef<str>>(scheme: S) -> Self {
        EngineError::ConfigError(format!("missing credential for scheme {}", scheme.as_ref()))
    }

    /// Shortcut method to create a transport error
    pub fn transport<S: Into<String>>(cause: TransportCause, msg: S) -> Self {
        EngineError::TransportError {
            cause,
            message: msg.into(),
        }
    }

    pub fn cancelled() -> Self {
        EngineError::transport(TransportCause::Cancelled, "request cancelled by caller")
    }

    pub fn upstream<S: Into<String>>(status: u16, body: S) -> Self {
        EngineError::UpstreamError {
            status,
            body: body.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::ConfigError(_) => ErrorKind::Config,
            EngineError::ParseError { .. } => ErrorKind::Parse,
            EngineError::ValidationError { .. } => ErrorKind::Validation,
            EngineError::TransportError { .. } => ErrorKind::Transport,
            EngineError::UpstreamError { .. } => ErrorKind::Upstream,
        }
    }

    /// Convert into the error object handed back to plugin adapters
    pub fn classify(&self) -> ClassifiedError {
        let (status, cause) = match self {
            EngineError::TransportError { cause, .. } => (None, Some(cause.to_string())),
            EngineError::UpstreamError { status, body } => {
                (Some(*status), (!body.is_empty()).then(|| body.clone()))
            }
            _ => (None, None),
        };
        ClassifiedError {
            kind: self.kind(),
            message: self.to_string(),
            status,
            cause,
        }
    }
}
