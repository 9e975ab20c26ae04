//! The upload-to-prediction state machine.
//!
//! [`Session`] owns the single [`UiState`] and is the only thing that changes
//! it. The view reads the state and calls one of the intent methods:
//! [`Session::files_provided`], [`Session::files_dropped`],
//! [`Session::sample_requested`] and [`Session::predict_requested`].
//!
//! A prediction has two halves so that the network call can run outside the
//! UI thread: `predict_requested` hands out a [`PendingPrediction`], and the
//! caller reports the outcome through [`Session::prediction_settled`]. Each
//! pending request is tagged with the batch it was built from; an outcome for
//! any other batch is discarded.
//!
//! File reads are split the same way. [`Session::begin_acquisition`] reserves
//! the identity of the batch the read will produce, and
//! [`Session::install_files`] drops the result when a newer batch went live
//! in the meantime.

use crate::bind::{ResultItem, bind};
use crate::catalog::{SAMPLE_BATCH_SIZE, SampleCatalog};
use crate::error::{Notice, PredictionError};
use crate::predict::{InferenceClient, PredictionRequest, PredictionResponse, validate_response};
use crate::source::{Acquisition, Batch, BatchId, FileHandle, ImageItem, read_files};
use rand::Rng;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing acquired yet.
    #[default]
    Idle,
    /// A prediction request is in flight.
    Loading,
    /// A batch is live and can be sent.
    Ready,
    /// Results for the live batch are available.
    ResultsShown,
}

/// Everything the view needs to render. Replaced wholesale on each transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub batch: Option<Batch>,
    pub results: Option<Vec<ResultItem>>,
    pub phase: Phase,
}

/// Names the batch a prediction request was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag {
    batch: BatchId,
}

impl RequestTag {
    pub fn batch(&self) -> BatchId {
        self.batch
    }
}

/// Reserved identity for a file read that is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionTag {
    batch: BatchId,
}

impl AcquisitionTag {
    pub fn batch(&self) -> BatchId {
        self.batch
    }
}

/// A request the caller must send and then report through
/// [`Session::prediction_settled`].
#[derive(Debug, Clone)]
pub struct PendingPrediction {
    pub tag: RequestTag,
    pub request: PredictionRequest,
}

/// What [`Session::prediction_settled`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Results were bound to the live batch.
    Shown,
    /// The call failed; a notice was recorded and the batch is ready again.
    Failed,
    /// The outcome belonged to a batch that is no longer live.
    Discarded,
}

/// Where a file list came from; only used for logging.
#[derive(Debug, Clone, Copy)]
enum Origin {
    Picker,
    Drop,
}

#[derive(Debug)]
pub struct Session {
    state: UiState,
    catalog: SampleCatalog,
    next_batch: u64,
    in_flight: Option<RequestTag>,
    notices: Vec<Notice>,
}

impl Session {
    /// A session with no batch yet.
    pub fn new(catalog: SampleCatalog) -> Self {
        Self {
            state: UiState::default(),
            catalog,
            next_batch: 0,
            in_flight: None,
            notices: Vec::new(),
        }
    }

    /// A session that already shows a sample batch, as at application start.
    pub fn start<R: Rng + ?Sized>(catalog: SampleCatalog, rng: &mut R) -> Self {
        let mut session = Self::new(catalog);
        session.sample_requested(rng);
        session
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn catalog(&self) -> &SampleCatalog {
        &self.catalog
    }

    /// Whether a request is still out, possibly for a batch that was replaced.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether a predict intent would issue a request right now.
    pub fn can_predict(&self) -> bool {
        self.in_flight.is_none() && self.state.batch.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// Notifications recorded since the last call, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Replace the batch with three random draws from the sample catalog.
    pub fn sample_requested<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let tag = self.begin_acquisition();
        let items = self.catalog.draw(rng, SAMPLE_BATCH_SIZE);
        tracing::debug!("drew {} sample images", items.len());
        self.install_batch(tag, items);
    }

    /// Read files chosen in a file picker and make them the live batch.
    pub async fn files_provided<F: FileHandle>(&mut self, files: &[F]) {
        self.acquire(files, Origin::Picker).await;
    }

    /// Read files dropped onto the view and make them the live batch.
    pub async fn files_dropped<F: FileHandle>(&mut self, files: &[F]) {
        self.acquire(files, Origin::Drop).await;
    }

    async fn acquire<F: FileHandle>(&mut self, files: &[F], origin: Origin) {
        if files.is_empty() {
            tracing::debug!("ignoring empty file list from {origin:?}");
            return;
        }
        let tag = self.begin_acquisition();
        let acquisition = read_files(files).await;
        self.install_files(tag, acquisition);
    }

    /// Reserve the identity of the next batch before its files are read.
    ///
    /// Tags are handed out in increasing order, so a read that starts later
    /// always wins over one that started earlier.
    pub fn begin_acquisition(&mut self) -> AcquisitionTag {
        let batch = BatchId(self.next_batch);
        self.next_batch += 1;
        AcquisitionTag { batch }
    }

    /// Install the outcome of [`read_files`] performed elsewhere.
    ///
    /// Returns `false` and changes nothing when the acquisition covered zero
    /// files or a batch acquired after `tag` is already live. Otherwise every
    /// file that could not be read becomes a notice and the rest form the
    /// batch, even if that leaves it empty.
    pub fn install_files(&mut self, tag: AcquisitionTag, acquisition: Acquisition) -> bool {
        if acquisition.requested == 0 {
            return false;
        }
        if self.state.batch.as_ref().is_some_and(|b| b.id() >= tag.batch) {
            tracing::debug!("discarding read for {:?}, a newer batch is live", tag.batch);
            return false;
        }
        self.notices.extend(acquisition.failures.into_iter().map(Notice::from));
        self.install_batch(tag, acquisition.items);
        true
    }

    fn install_batch(&mut self, tag: AcquisitionTag, items: Vec<ImageItem>) {
        let id = tag.batch;
        if let Some(request) = self.in_flight {
            tracing::debug!(
                "batch {:?} replaced while its request is in flight",
                request.batch
            );
        }
        tracing::debug!("batch {id:?} is live with {} images", items.len());
        self.state = UiState {
            batch: Some(Batch::new(id, items)),
            results: None,
            phase: Phase::Ready,
        };
    }

    /// Start a prediction for the live batch.
    ///
    /// Returns `None` without side effects when there is no batch, the batch
    /// is empty, or another request is still in flight.
    pub fn predict_requested(&mut self) -> Option<PendingPrediction> {
        if let Some(tag) = self.in_flight {
            tracing::debug!("predict ignored, request for {:?} in flight", tag.batch);
            return None;
        }
        let batch = match &self.state.batch {
            Some(batch) if !batch.is_empty() => batch,
            _ => {
                tracing::debug!("predict ignored, no images to send");
                return None;
            }
        };
        let tag = RequestTag { batch: batch.id() };
        let request = PredictionRequest::from_batch(batch);
        self.in_flight = Some(tag);

        let prev = std::mem::take(&mut self.state);
        self.state = UiState {
            phase: Phase::Loading,
            ..prev
        };
        Some(PendingPrediction { tag, request })
    }

    /// Apply the outcome of a request handed out by [`Self::predict_requested`].
    pub fn prediction_settled(
        &mut self,
        tag: RequestTag,
        outcome: Result<PredictionResponse, PredictionError>,
    ) -> Settlement {
        if self.in_flight != Some(tag) {
            tracing::warn!("ignoring outcome for unknown request {:?}", tag.batch);
            return Settlement::Discarded;
        }
        self.in_flight = None;

        let prev = std::mem::take(&mut self.state);
        let Some(batch) = prev.batch.as_ref().filter(|b| b.id() == tag.batch) else {
            tracing::debug!("discarding stale outcome for {:?}", tag.batch);
            self.state = prev;
            return Settlement::Discarded;
        };

        let bound = outcome
            .and_then(|response| {
                validate_response(batch.len(), &response)?;
                Ok(response.scores)
            })
            .map_err(Notice::from)
            .and_then(|scores| bind(batch.items(), &scores).map_err(Notice::from));

        match bound {
            Ok(results) => {
                tracing::info!("received {} results for {:?}", results.len(), tag.batch);
                self.state = UiState {
                    results: Some(results),
                    phase: Phase::ResultsShown,
                    ..prev
                };
                Settlement::Shown
            }
            Err(notice) => {
                tracing::warn!("prediction for {:?} failed: {notice}", tag.batch);
                self.notices.push(notice);
                self.state = UiState {
                    phase: Phase::Ready,
                    ..prev
                };
                Settlement::Failed
            }
        }
    }

    /// Run a whole prediction round trip against `client`.
    ///
    /// Returns `None` when the predict intent was ignored.
    pub async fn predict<C: InferenceClient>(&mut self, client: &C) -> Option<Settlement> {
        let pending = self.predict_requested()?;
        let outcome = client.predict(&pending.request).await;
        Some(self.prediction_settled(pending.tag, outcome))
    }
}
