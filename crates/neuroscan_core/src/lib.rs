//! Client core for the NeuroScan tumor classifier.
//!
//! Acquires scan images (files, drops or built-in samples), encodes them as
//! data URLs, sends them to a remote inference endpoint and pairs each score
//! with its image. [`Session`] holds the state a view renders.

pub mod bind;
pub mod catalog;
pub mod config;
pub mod encoding;
pub mod error;
pub mod predict;
pub mod session;
pub mod source;

pub use bind::{POSITIVE_THRESHOLD, ResultItem, bind};
pub use catalog::{SAMPLE_BATCH_SIZE, SampleCatalog};
pub use config::ClientConfig;
pub use encoding::{DecodedPayload, decode, detect_mime, encode};
pub use error::{AcquireError, BindError, EncodingError, Notice, PredictionError, ReadError};
pub use predict::{
    HttpInferenceClient, InferenceClient, PredictionRequest, PredictionResponse, validate_response,
};
pub use session::{
    AcquisitionTag, PendingPrediction, Phase, RequestTag, Session, Settlement, UiState,
};
pub use source::{
    Acquisition, Batch, BatchId, FileHandle, ImageItem, MemoryFile, PathFile, read_files,
};
