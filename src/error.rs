use crate::policy::Violation;
use thiserror::Error;

/// Errors raised while building pools, generating candidates or
/// persisting history.
#[derive(Debug, Error)]
pub enum Error {
    /// The request cannot be satisfied by the configured pool or wordlist.
    #[error("{0}")]
    Configuration(String),

    /// Every attempt was rejected by the policy or the no-repeat history.
    #[error(
        "No acceptable candidate after {attempts} attempts; widen the character classes, \
         shorten the required length, add wordlist entries or allow repeats"
    )]
    ExhaustedSearchSpace {
        attempts: usize,
        /// Attempts that passed the policy but repeated an earlier value.
        repeats: usize,
        /// Violations of the most recent policy rejection, empty when the
        /// last candidate failed only as a repeat.
        last_violations: Vec<Violation>,
    },

    #[error("History error: {0}")]
    History(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
