use thiserror::Error;

/// Every way a workflow operation can fail.
///
/// All variants surface to the user the same way (an error alert); the
/// distinction matters for tests and logs, and for whether the network was
/// touched at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A required field was missing or malformed; no request was sent.
    #[error("{0}")]
    LocalValidation(String),

    /// The backend answered with `success: false`.
    #[error("{0}")]
    RemoteOperation(String),

    /// Network, HTTP status or body parsing failure.
    #[error("{0}")]
    Transport(String),

    /// The triggering lifecycle already has a request outstanding.
    #[error("{0} is already in progress")]
    Busy(&'static str),

    /// A success payload was missing fields the client relies on.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::LocalValidation(message.into())
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteOperation(message.into())
    }

    /// True when the failure happened before any network call.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::LocalValidation(_) | Self::Busy(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
