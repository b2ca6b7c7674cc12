//! Inference session controllers.
//!
//! Each controller owns one state slot and enforces at most one request in
//! flight. Reset or reselection while a request is pending releases interest
//! in its response; the late response is dropped instead of applied.

pub mod batch;
pub mod error;
pub mod logging;
pub mod single;
pub mod state;

#[cfg(test)]
mod test_support;

pub use batch::{BatchInferenceController, BatchOutcome, BatchState};
pub use error::{ErrorCategory, SessionError, SessionResult};
pub use logging::SubmissionLogger;
pub use single::{SingleInferenceController, SingleState};
pub use state::{ControllerState, Phase, SubmitOutcome, ABANDONED};
