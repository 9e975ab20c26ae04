//! Error types raised by the acquisition, prediction and binding stages.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// A payload could not be produced from, or parsed back into, bytes + MIME.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("invalid MIME type {0:?}")]
    InvalidMime(String),
    #[error("payload does not start with `data:`")]
    MissingScheme,
    #[error("payload has no `;base64,` marker")]
    MissingBase64Marker,
    #[error("payload body is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// The content of a single file handle could not be read.
#[derive(Debug, Error)]
#[error("could not read {name}: {source}")]
pub struct ReadError {
    pub name: String,
    #[source]
    pub source: io::Error,
}

/// Why one file was left out of a new batch.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("could not encode {name}: {source}")]
    Encoding {
        name: String,
        #[source]
        source: EncodingError,
    },
}

impl AcquireError {
    /// Display name of the file that was dropped.
    pub fn file_name(&self) -> &str {
        match self {
            AcquireError::Read(err) => &err.name,
            AcquireError::Encoding { name, .. } => name,
        }
    }
}

/// Failure of one inference round trip.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("could not reach the inference service: {0}")]
    Transport(String),
    #[error("inference service answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("inference service did not answer within {0:?}")]
    Timeout(Duration),
    #[error("inference service sent an unusable response: {0}")]
    Malformed(String),
}

impl PredictionError {
    /// True when the service answered but the body broke the response contract.
    pub fn is_malformed(&self) -> bool {
        matches!(self, PredictionError::Malformed(_))
    }
}

/// The binder was handed a score list that does not line up with the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot bind {scores} scores to {images} images")]
pub struct BindError {
    pub images: usize,
    pub scores: usize,
}

/// A user-visible notification produced by a core transition.
#[derive(Debug, Error)]
pub enum Notice {
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error("prediction failed: {0}")]
    Prediction(#[from] PredictionError),
    #[error("internal error: {0}")]
    Internal(#[from] BindError),
}
