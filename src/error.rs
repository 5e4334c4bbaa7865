//! Error types for formmail.

use thiserror::Error;

/// Errors that can occur while dispatching a submission.
///
/// Every variant is terminal for the current `send_message` call. Nothing is
/// retried internally; the form handler decides what to show the end user.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Plugin settings are missing or unusable (e.g., no recipients).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An uploaded file could not be read for attaching.
    #[error("Attachment error ({path}): {message}")]
    Attachment {
        /// Temporary path of the uploaded file
        path: String,
        message: String,
    },

    /// The mail transport or the template renderer failed.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl DispatchError {
    /// Create an attachment error for a file path.
    pub fn attachment(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Attachment {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a transport (or rendering) error.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<tera::Error> for DispatchError {
    fn from(err: tera::Error) -> Self {
        // tera nests the useful message in the source chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Transport(format!("template rendering failed: {}", message))
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::error::Error> for DispatchError {
    fn from(err: lettre::error::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::transport::smtp::Error> for DispatchError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::address::AddressError> for DispatchError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::Transport(format!("invalid address: {}", err))
    }
}
