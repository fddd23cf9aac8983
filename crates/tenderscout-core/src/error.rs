use tenderscout_api::ApiError;
use thiserror::Error;

/// All the ways a tender read or the local setup can fail
///
/// A response that lost the race to a newer request is not in here: that is
/// `Fetched::Superseded`, and it never counts as a failure.
#[derive(Error, Debug)]
pub enum Error {
    /// No response at all (connection refused, reset, timed out)
    #[error("Network error: {0}")]
    TransientNetworkFailure(String),

    /// The service answered with a non-success status
    #[error("Request rejected (status {status}): {}", .message.as_deref().unwrap_or("no message"))]
    RemoteRejection { status: u16, message: Option<String> },

    /// A credentialed read was attempted without a token
    #[error("No credential token available")]
    MissingCredential,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Text suitable for showing next to the view that failed
    ///
    /// Only the server's own message is passed through; everything else
    /// collapses to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::RemoteRejection {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NetworkError(e) => Error::TransientNetworkFailure(e.to_string()),
            ApiError::Rejected { status, message } => Error::RemoteRejection { status, message },
            ApiError::AuthRequired => Error::MissingCredential,
            ApiError::ParseError(e) => Error::SerializationError(e),
        }
    }
}
