//! Outcome codes surfaced across the negotiation boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a negotiation operation or a backend hook.
///
/// Negotiation never panics and never returns `Err`; every outcome is one of
/// these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// The requested configuration was applied.
    Ok,
    /// The backend made a successful round-trip but changed nothing.
    Declined,
    /// A requested monitor or mode could not be resolved, or there is no saved
    /// configuration to restore.
    ErrorInvalidArgument,
    /// No backend is attached, or it returned no data.
    ErrorNotImplemented,
}

impl Status {
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// Converts to a `Result` for callers that prefer `?`.
    ///
    /// [`Status::Declined`] maps to an error: callers must treat it as
    /// "nothing happened".
    pub fn into_result(self) -> Result<(), StatusError> {
        match self {
            Status::Ok => Ok(()),
            Status::Declined => Err(StatusError::Declined),
            Status::ErrorInvalidArgument => Err(StatusError::InvalidArgument),
            Status::ErrorNotImplemented => Err(StatusError::NotImplemented),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Ok => "ok",
            Status::Declined => "declined",
            Status::ErrorInvalidArgument => "invalid argument",
            Status::ErrorNotImplemented => "not implemented",
        })
    }
}

/// Error form of the non-`Ok` [`Status`] codes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StatusError {
    #[error("the display backend declined to change the configuration")]
    Declined,
    #[error("the requested monitor or mode could not be resolved")]
    InvalidArgument,
    #[error("no display backend is available or it returned no data")]
    NotImplemented,
}

impl From<StatusError> for Status {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::Declined => Status::Declined,
            StatusError::InvalidArgument => Status::ErrorInvalidArgument,
            StatusError::NotImplemented => Status::ErrorNotImplemented,
        }
    }
}
