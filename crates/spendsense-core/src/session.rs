//! Upload → loading → dashboard/error lifecycle of one user session
//!
//! At most one invocation is in flight per session. `reset` invalidates the
//! in-flight ticket, so a result that arrives afterwards is dropped instead
//! of overwriting the fresh state.

use thiserror::Error;
use tracing::{debug, warn};

use crate::ai::{InferenceBackend, InferenceGateway};
use crate::error::Result;
use crate::ingest::UploadedFile;
use crate::models::DashboardData;
use crate::pipeline::AnalysisPipeline;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Waiting for a file
    Upload,
    /// An invocation is in flight
    Loading,
    Dashboard(DashboardData),
    /// Message shown to the user
    Error(String),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Upload => "upload",
            SessionState::Loading => "loading",
            SessionState::Dashboard(_) => "dashboard",
            SessionState::Error(_) => "error",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action} while in {state} state")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    #[error("no file selected")]
    NoFileSelected,
}

/// Identifies one invocation; only the current ticket may complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationTicket(u64);

#[derive(Debug)]
pub struct AnalysisSession {
    state: SessionState,
    selected_file: Option<UploadedFile>,
    generation: u64,
    in_flight: Option<InvocationTicket>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Upload,
            selected_file: None,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn selected_file(&self) -> Option<&UploadedFile> {
        self.selected_file.as_ref()
    }

    pub fn dashboard(&self) -> Option<&DashboardData> {
        match &self.state {
            SessionState::Dashboard(data) => Some(data),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> TransitionError {
        TransitionError::InvalidState {
            action,
            state: self.state.name(),
        }
    }

    /// Choose the file for the next invocation. From the error state this
    /// also returns to upload.
    pub fn select_file(&mut self, file: UploadedFile) -> std::result::Result<(), TransitionError> {
        match self.state {
            SessionState::Upload | SessionState::Error(_) => {
                self.state = SessionState::Upload;
                self.selected_file = Some(file);
                Ok(())
            }
            _ => Err(self.invalid("select a file")),
        }
    }

    /// Start an invocation on the selected file
    pub fn begin(&mut self) -> std::result::Result<(InvocationTicket, UploadedFile), TransitionError> {
        if self.state != SessionState::Upload {
            return Err(self.invalid("start an analysis"));
        }
        let file = self
            .selected_file
            .clone()
            .ok_or(TransitionError::NoFileSelected)?;

        self.generation += 1;
        let ticket = InvocationTicket(self.generation);
        self.in_flight = Some(ticket);
        self.state = SessionState::Loading;
        debug!(ticket = ticket.0, "Analysis started");
        Ok((ticket, file))
    }

    /// Apply the outcome of an invocation
    ///
    /// Returns false when the ticket is stale and the result was discarded.
    pub fn complete(&mut self, ticket: InvocationTicket, result: Result<DashboardData>) -> bool {
        if self.in_flight != Some(ticket) {
            debug!(ticket = ticket.0, "Discarding result of abandoned analysis");
            return false;
        }
        self.in_flight = None;

        match result {
            Ok(data) => self.state = SessionState::Dashboard(data),
            Err(e) => {
                warn!(error = %e, "Analysis failed");
                self.selected_file = None;
                self.state = SessionState::Error(e.user_message());
            }
        }
        true
    }

    /// Back to upload, dropping file, dashboard and any in-flight invocation
    pub fn reset(&mut self) {
        self.state = SessionState::Upload;
        self.selected_file = None;
        self.in_flight = None;
    }

    /// Run a full invocation on the selected file
    pub async fn run<B: InferenceBackend>(
        &mut self,
        gateway: &InferenceGateway<B>,
    ) -> std::result::Result<&SessionState, TransitionError> {
        let (ticket, file) = self.begin()?;
        let result = AnalysisPipeline::new(gateway).run(&file).await;
        self.complete(ticket, result);
        Ok(&self.state)
    }
}
