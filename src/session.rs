//! Selection and results for one interactive run.
//!
//! A [`Session`] owns the selected files and the results of the last batch.
//! `&mut self` on [`Session::process`] rules out starting a second batch
//! while one is running.

use crate::document::ProcessingResult;
use crate::error::{BatchError, ValidationError};
use crate::pipeline::extract::Extractor;
use crate::progress::BatchProgressCallback;
use crate::validate::{partition_candidates, FileCandidate};
use serde::Serialize;
use tracing::debug;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing selected.
    Empty,
    /// Files selected, not yet processed.
    Ready,
    /// Every selected file was processed.
    Completed,
    /// The batch stopped at `file`. Results before it are kept.
    Failed { file: Option<String>, message: String },
}

#[derive(Debug)]
pub struct Session {
    max_file_size: u64,
    selected: Vec<FileCandidate>,
    results: Vec<ProcessingResult>,
    state: SessionState,
}

impl Session {
    pub fn new(max_file_size: u64) -> Self {
        Self {
            max_file_size,
            selected: Vec::new(),
            results: Vec::new(),
            state: SessionState::Empty,
        }
    }

    /// Validate `candidates` and make the accepted ones the selection.
    ///
    /// Returns one error per rejected file. When nothing is accepted the
    /// previous selection is left as it was.
    pub fn select(
        &mut self,
        candidates: impl IntoIterator<Item = FileCandidate>,
    ) -> Vec<ValidationError> {
        let (accepted, rejected) = partition_candidates(candidates, self.max_file_size);
        debug!(
            "Selection: {} accepted, {} rejected",
            accepted.len(),
            rejected.len()
        );
        if !accepted.is_empty() {
            self.selected = accepted;
            self.state = SessionState::Ready;
        }
        rejected
    }

    /// Drop the selection, keeping results of the last batch.
    pub fn clear_selection(&mut self) {
        self.selected.clear();
        if self.state == SessionState::Ready {
            self.state = SessionState::Empty;
        }
    }

    /// Back to the initial state: no selection, no results.
    pub fn reset(&mut self) {
        self.selected.clear();
        self.results.clear();
        self.state = SessionState::Empty;
    }

    /// Run the selected files through `extractor`, replacing earlier results.
    ///
    /// Stops at the first failing file. Whatever was produced before it stays
    /// available through [`results`](Self::results). With nothing selected,
    /// returns [`BatchError::NothingSelected`] and leaves earlier results alone.
    pub async fn process(
        &mut self,
        extractor: &Extractor,
        progress: &dyn BatchProgressCallback,
    ) -> Result<&[ProcessingResult], BatchError> {
        if self.selected.is_empty() {
            return Err(BatchError::NothingSelected);
        }
        self.results.clear();
        let outcome =
            crate::batch::run_batch(extractor, &self.selected, progress, &mut self.results).await;

        match outcome {
            Ok(()) => {
                self.state = SessionState::Completed;
                Ok(&self.results)
            }
            Err(e) => {
                self.state = SessionState::Failed {
                    file: e.failed_file().map(str::to_string),
                    message: e.to_string(),
                };
                Err(e)
            }
        }
    }

    pub fn selected(&self) -> &[FileCandidate] {
        &self.selected
    }

    pub fn results(&self) -> &[ProcessingResult] {
        &self.results
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_FILE_SIZE)
    }
}
