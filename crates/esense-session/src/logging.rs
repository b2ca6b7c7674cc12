//! Structured submission logging.
//!
//! Provides consistent, structured logging for submission lifecycles with
//! tracing spans and contextual information.

use tracing::{debug, error, info, warn, Span};

/// Logger for one submission of one controller.
///
/// Every event carries the controller name and the epoch the submission was
/// started under, which is what ties a late response to its request.
#[derive(Debug, Clone)]
pub struct SubmissionLogger {
    controller: &'static str,
    epoch: u64,
}

impl SubmissionLogger {
    pub fn new(controller: &'static str, epoch: u64) -> Self {
        Self { controller, epoch }
    }

    /// Log that a request is about to be sent.
    pub fn log_start(&self, images: usize) {
        info!(
            controller = self.controller,
            epoch = self.epoch,
            images,
            "Submission started"
        );
    }

    /// Log a successful response.
    pub fn log_completion(&self, message: &str) {
        info!(
            controller = self.controller,
            epoch = self.epoch,
            "Submission completed: {}", message
        );
    }

    /// Log a data problem that does not fail the submission.
    pub fn log_warning(&self, message: &str) {
        warn!(
            controller = self.controller,
            epoch = self.epoch,
            "Submission warning: {}", message
        );
    }

    /// Log a failed submission.
    pub fn log_failure(&self, message: &str) {
        error!(
            controller = self.controller,
            epoch = self.epoch,
            "Submission failed: {}", message
        );
    }

    /// Log a response that arrived after the controller moved on.
    pub fn log_discarded(&self) {
        debug!(
            controller = self.controller,
            epoch = self.epoch,
            "Discarding response for superseded submission"
        );
    }

    /// Create a tracing span for this submission.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "submission",
            controller = self.controller,
            epoch = self.epoch
        )
    }
}
