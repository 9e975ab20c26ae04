//! Session bookkeeping for the view, independent of egui.

use neuroscan_core::{
    Acquisition, AcquisitionTag, Notice, PredictionError, PredictionResponse, RequestTag, Session,
};

/// Completed background work, handed back to the UI thread.
pub(crate) enum Event {
    FilesRead(AcquisitionTag, Acquisition),
    PredictionSettled(RequestTag, Result<PredictionResponse, PredictionError>),
}

/// The session plus what the view tracks about work still running.
pub(crate) struct Desk {
    pub(crate) session: Session,
    pub(crate) status: String,
    pending_reads: usize,
}

impl Desk {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            session,
            status: String::new(),
            pending_reads: 0,
        }
    }

    pub(crate) fn is_reading(&self) -> bool {
        self.pending_reads > 0
    }

    /// Register a file read of `count` handles that is about to start.
    pub(crate) fn begin_read(&mut self, count: usize) -> AcquisitionTag {
        self.pending_reads += 1;
        self.status = format!("Reading {count} image(s)...");
        self.session.begin_acquisition()
    }

    pub(crate) fn apply(&mut self, event: Event) {
        match event {
            Event::FilesRead(tag, acquisition) => {
                self.pending_reads = self.pending_reads.saturating_sub(1);
                if !self.session.install_files(tag, acquisition) {
                    tracing::debug!("read for {:?} was superseded", tag.batch());
                }
                if !self.is_reading() {
                    self.status.clear();
                }
            }
            Event::PredictionSettled(tag, outcome) => {
                self.session.prediction_settled(tag, outcome);
            }
        }
    }

    /// Replace the status line with any notices recorded since the last call.
    pub(crate) fn refresh_status(&mut self) {
        let notices = self.session.drain_notices();
        if !notices.is_empty() {
            self.status = notice_summary(&notices);
        }
    }
}

/// One status line for a set of notices.
pub(crate) fn notice_summary(notices: &[Notice]) -> String {
    match notices {
        [] => String::new(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use neuroscan_core::{
        AcquireError, MemoryFile, Phase, ReadError, SampleCatalog, Settlement, read_files,
    };
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;
    use std::io;

    fn read_failure(name: &str) -> Notice {
        Notice::Acquire(AcquireError::Read(ReadError {
            name: name.to_string(),
            source: io::Error::other("gone"),
        }))
    }

    fn sampled_desk() -> Desk {
        let mut rng = StdRng::seed_from_u64(5);
        Desk::new(Session::start(SampleCatalog::builtin(), &mut rng))
    }

    fn read(name: &'static str) -> Acquisition {
        block_on(read_files(&[MemoryFile::new(name, b"scan".to_vec())]))
    }

    fn live_names(desk: &Desk) -> Vec<String> {
        let batch = desk.session.state().batch.as_ref().unwrap();
        batch
            .items()
            .iter()
            .map(|item| item.display_name().to_string())
            .collect()
    }

    #[rstest]
    #[case(0, "")]
    #[case(1, "could not read a.png: gone")]
    #[case(3, "could not read a.png: gone (and 2 more)")]
    fn summary_mentions_first_notice(#[case] count: usize, #[case] expected: &str) {
        let notices: Vec<_> = (0..count).map(|_| read_failure("a.png")).collect();
        assert_eq!(notice_summary(&notices), expected);
    }

    #[test]
    fn prediction_notice_reads_naturally() {
        let notice = Notice::Prediction(PredictionError::Transport("refused".into()));
        assert_eq!(
            notice_summary(&[notice]),
            "prediction failed: could not reach the inference service: refused"
        );
    }

    #[test]
    fn reading_stays_on_until_every_read_is_back() {
        let mut desk = Desk::new(Session::new(SampleCatalog::builtin()));
        let first = desk.begin_read(1);
        let second = desk.begin_read(1);
        assert!(desk.is_reading());

        desk.apply(Event::FilesRead(second, read("second.png")));
        assert!(desk.is_reading());
        assert_eq!(desk.status, "Reading 1 image(s)...");

        desk.apply(Event::FilesRead(first, read("first.png")));
        assert!(!desk.is_reading());
        assert!(desk.status.is_empty());
        assert_eq!(live_names(&desk), ["second.png"]);
    }

    #[test]
    fn sample_click_during_a_read_keeps_the_samples() {
        let mut desk = sampled_desk();
        let tag = desk.begin_read(1);
        desk.session.sample_requested(&mut StdRng::seed_from_u64(8));

        desk.apply(Event::FilesRead(tag, read("late.png")));

        assert_eq!(live_names(&desk), ["Sample 1", "Sample 2", "Sample 3"]);
        assert!(!desk.is_reading());
    }

    #[test]
    fn quiet_events_leave_the_status_line_alone() {
        let mut desk = sampled_desk();
        desk.status = "Using http://localhost/predict (30 s timeout)".to_string();
        let pending = desk.session.predict_requested().unwrap();

        desk.apply(Event::PredictionSettled(
            pending.tag,
            Ok(PredictionResponse {
                scores: vec![0.1, 0.6, 0.9],
            }),
        ));
        desk.refresh_status();

        assert_eq!(desk.session.state().phase, Phase::ResultsShown);
        assert_eq!(desk.status, "Using http://localhost/predict (30 s timeout)");
    }

    #[test]
    fn failed_prediction_shows_up_in_the_status_line_once() {
        let mut desk = sampled_desk();
        let pending = desk.session.predict_requested().unwrap();

        desk.apply(Event::PredictionSettled(
            pending.tag,
            Err(PredictionError::Transport("refused".into())),
        ));
        desk.refresh_status();
        assert_eq!(
            desk.status,
            "prediction failed: could not reach the inference service: refused"
        );

        desk.status.clear();
        desk.refresh_status();
        assert!(desk.status.is_empty());
        let repeat = Ok(PredictionResponse { scores: vec![] });
        assert_eq!(
            desk.session.prediction_settled(pending.tag, repeat),
            Settlement::Discarded
        );
    }
}
