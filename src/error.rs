use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("No signal found: {0}")]
    NoSignalFound(String),

    #[error("Image decode failed: {0}")]
    DecodeError(String),

    #[error("Image encode failed: {0}")]
    EncodeError(String),

    #[error("Tool is busy: {0}")]
    Busy(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Clipboard error: {0}")]
    ClipboardError(String),
}

impl ToolError {
    /// Errors for which SEO and speed tools substitute a heuristic report.
    pub fn has_fallback(&self) -> bool {
        matches!(self, ToolError::NetworkError(_))
    }

    /// `NoSignalFound` is a reportable empty result, not a failure of the run.
    pub fn is_failure(&self) -> bool {
        !matches!(self, ToolError::NoSignalFound(_))
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ToolError::NoSignalFound(_) => ErrorSeverity::Notice,
            ToolError::InvalidInput(_) => ErrorSeverity::Low,
            ToolError::Busy(_) => ErrorSeverity::Low,
            ToolError::ClipboardError(_) => ErrorSeverity::Low,
            ToolError::ConfigurationError(_) => ErrorSeverity::High,
            ToolError::IoError(_) => ErrorSeverity::High,
            _ => ErrorSeverity::Medium,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::InvalidInput(_) => "invalid_input",
            ToolError::NetworkError(_) => "network",
            ToolError::NoSignalFound(_) => "no_signal",
            ToolError::DecodeError(_) => "decode",
            ToolError::EncodeError(_) => "encode",
            ToolError::Busy(_) => "busy",
            ToolError::ConfigurationError(_) => "configuration",
            ToolError::IoError(_) => "io",
            ToolError::SerializationError(_) => "serialization",
            ToolError::ClipboardError(_) => "clipboard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Notice,
    Low,
    Medium,
    High,
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        ToolError::NetworkError(err.to_string())
    }
}

impl From<url::ParseError> for ToolError {
    fn from(err: url::ParseError) -> Self {
        ToolError::InvalidInput(err.to_string())
    }
}

impl From<JoinError> for ToolError {
    fn from(err: JoinError) -> Self {
        ToolError::EncodeError(err.to_string())
    }
}
