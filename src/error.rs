//! Error taxonomy. Classifier failures never leave the risk client; they are
//! turned into the fallback decision there.

use thiserror::Error;

pub type GateResult<T> = Result<T, GateError>;

/// Feature payload rejected at the service boundary.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("payload must be a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field `{0}` is out of range")]
    OutOfRange(&'static str),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Why a classifier call did not produce a decision.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier timed out")]
    Timeout,
    #[error("classifier transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("classifier returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("classifier reply has `{0}` out of range")]
    OutOfRange(&'static str),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("payload encryption failed")]
    Crypto,
    #[error("payload encoding: {0}")]
    Encoding(String),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("no session record `{0}`")]
    UnknownRecord(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Encoding(e.to_string())
    }
}

impl From<base64::DecodeError> for StoreError {
    fn from(e: base64::DecodeError) -> Self {
        StoreError::Encoding(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("session already finalized as {0}")]
    SessionFinalized(&'static str),
    #[error("no challenge is open")]
    NoActiveChallenge,
    #[error("no dismissed challenge to reopen")]
    NothingToReopen,
    #[error("http client: {0}")]
    Client(String),
}
