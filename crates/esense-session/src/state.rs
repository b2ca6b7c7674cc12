//! Controller state machine shared by the single and batch controllers.
//!
//! ```text
//! Idle -> Selected -> Submitting -> Succeeded | Failed
//!   ^        |            |              |
//!   +--------+--- reset --+--------------+
//! ```
//!
//! Every transition installs a whole new state. An epoch counter is bumped
//! on every select, reset and submit; a completion carrying an older epoch is
//! dropped so a stale response can never overwrite newer state.
//!
//! A submission that is dropped before its response arrives (timeout, a lost
//! `select!` branch, task abort) moves the controller to `Failed`, so the
//! controller never stays stuck in `Submitting`.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{SessionError, SessionResult};

/// Lifecycle state of one controller.
///
/// `S` is the selection (one image or a list), `R` the parsed result. The
/// selection is kept after completion so the same input can be resubmitted.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerState<S, R> {
    Idle,
    Selected(S),
    Submitting(S),
    Succeeded {
        selection: S,
        result: R,
        completed_at: DateTime<Utc>,
    },
    Failed {
        selection: S,
        error: SessionError,
    },
}

/// Tag of a [`ControllerState`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Selected,
    Submitting,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Selected => "selected",
            Phase::Submitting => "submitting",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<S, R> ControllerState<S, R> {
    pub fn phase(&self) -> Phase {
        match self {
            ControllerState::Idle => Phase::Idle,
            ControllerState::Selected(_) => Phase::Selected,
            ControllerState::Submitting(_) => Phase::Submitting,
            ControllerState::Succeeded { .. } => Phase::Succeeded,
            ControllerState::Failed { .. } => Phase::Failed,
        }
    }

    pub fn selection(&self) -> Option<&S> {
        match self {
            ControllerState::Idle => None,
            ControllerState::Selected(selection) | ControllerState::Submitting(selection) => {
                Some(selection)
            }
            ControllerState::Succeeded { selection, .. }
            | ControllerState::Failed { selection, .. } => Some(selection),
        }
    }

    pub fn result(&self) -> Option<&R> {
        match self {
            ControllerState::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SessionError> {
        match self {
            ControllerState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, ControllerState::Submitting(_))
    }
}

/// What happened to a submission once its response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The response was applied; the state is now `Succeeded` or `Failed`.
    Completed,
    /// The controller moved on while the request was in flight; the response
    /// was dropped.
    Superseded,
}

/// State plus epoch, kept behind the controller's mutex.
#[derive(Debug)]
pub(crate) struct StateSlot<S, R> {
    state: ControllerState<S, R>,
    epoch: u64,
}

impl<S: Clone, R> StateSlot<S, R> {
    pub(crate) fn new() -> Self {
        Self {
            state: ControllerState::Idle,
            epoch: 0,
        }
    }

    pub(crate) fn state(&self) -> &ControllerState<S, R> {
        &self.state
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn select(&mut self, selection: S) {
        self.epoch += 1;
        self.state = ControllerState::Selected(selection);
    }

    pub(crate) fn reset(&mut self) {
        self.epoch += 1;
        self.state = ControllerState::Idle;
    }

    /// Move to `Submitting`, returning the epoch to present at completion and
    /// the selection to send.
    ///
    /// Rejected without any change while idle (validation) or while a
    /// request is already in flight.
    pub(crate) fn begin(
        &mut self,
        nothing_selected: &str,
        validate: impl FnOnce(&S) -> SessionResult<()>,
    ) -> SessionResult<(u64, S)> {
        let selection = match &self.state {
            ControllerState::Idle => return Err(SessionError::validation(nothing_selected)),
            ControllerState::Submitting(_) => return Err(SessionError::InFlight),
            ControllerState::Selected(selection)
            | ControllerState::Succeeded { selection, .. }
            | ControllerState::Failed { selection, .. } => selection.clone(),
        };
        validate(&selection)?;

        self.epoch += 1;
        self.state = ControllerState::Submitting(selection.clone());
        Ok((self.epoch, selection))
    }

    /// Apply a response if it still belongs to the current epoch.
    pub(crate) fn finish(&mut self, epoch: u64, outcome: SessionResult<R>) -> SubmitOutcome {
        if epoch != self.epoch {
            return SubmitOutcome::Superseded;
        }

        let selection = match std::mem::replace(&mut self.state, ControllerState::Idle) {
            ControllerState::Submitting(selection) => selection,
            other => {
                self.state = other;
                return SubmitOutcome::Superseded;
            }
        };

        self.state = match outcome {
            Ok(result) => ControllerState::Succeeded {
                selection,
                result,
                completed_at: Utc::now(),
            },
            Err(error) => ControllerState::Failed { selection, error },
        };
        SubmitOutcome::Completed
    }

    /// Fail a submission whose future went away, if it is still current.
    ///
    /// Returns `true` when the state changed.
    pub(crate) fn abandon(&mut self, epoch: u64) -> bool {
        let outcome = self.finish(epoch, Err(SessionError::Transport(ABANDONED.to_string())));
        outcome == SubmitOutcome::Completed
    }
}

/// Message held by a submission that was dropped before it completed.
pub const ABANDONED: &str = "submission abandoned";

/// Something that keeps a [`StateSlot`] behind a lock.
pub(crate) trait SlotHolder<S, R> {
    fn with_slot<T>(&self, f: impl FnOnce(&mut StateSlot<S, R>) -> T) -> T;
}

impl<S: Clone, R> SlotHolder<S, R> for Mutex<StateSlot<S, R>> {
    fn with_slot<T>(&self, f: impl FnOnce(&mut StateSlot<S, R>) -> T) -> T {
        let mut slot = self.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *slot)
    }
}

/// A submission between `begin` and `finish`.
///
/// Dropping it without calling [`PendingSubmission::finish`] abandons the
/// submission.
pub(crate) struct PendingSubmission<'a, H, S, R>
where
    H: SlotHolder<S, R>,
    S: Clone,
{
    holder: &'a H,
    epoch: u64,
    armed: bool,
    _slot: PhantomData<fn() -> (S, R)>,
}

impl<'a, H, S, R> PendingSubmission<'a, H, S, R>
where
    H: SlotHolder<S, R>,
    S: Clone,
{
    /// See [`StateSlot::begin`].
    pub(crate) fn begin(
        holder: &'a H,
        nothing_selected: &str,
        validate: impl FnOnce(&S) -> SessionResult<()>,
    ) -> SessionResult<(Self, S)> {
        let (epoch, selection) =
            holder.with_slot(|slot| slot.begin(nothing_selected, validate))?;
        let pending = Self {
            holder,
            epoch,
            armed: true,
            _slot: PhantomData,
        };
        Ok((pending, selection))
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Apply the response. See [`StateSlot::finish`].
    pub(crate) fn finish(mut self, outcome: SessionResult<R>) -> SubmitOutcome {
        self.armed = false;
        let epoch = self.epoch;
        self.holder.with_slot(|slot| slot.finish(epoch, outcome))
    }
}

impl<H, S, R> Drop for PendingSubmission<'_, H, S, R>
where
    H: SlotHolder<S, R>,
    S: Clone,
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let epoch = self.epoch;
        if self.holder.with_slot(|slot| slot.abandon(epoch)) {
            warn!(epoch, "Submission dropped before its response arrived");
        }
    }
}
