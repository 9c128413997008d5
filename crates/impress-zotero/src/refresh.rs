//! Refresh tasks and the mirror lifecycle state machine
//!
//! `NotInitialized → Pending → Ready`, then `Ready → Pending → Ready` for
//! every later refresh. While a refresh runs, further requests fold into a
//! single queued follow-up task instead of starting a second execution.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, Result};

/// A unit of resynchronization work
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "camelCase")]
pub enum RefreshTask {
    /// Reload everything from the remote and rebuild the index
    Full,
    /// Rebuild the search index for the target library
    SearchIndex {
        #[serde(default)]
        force: bool,
    },
}

impl RefreshTask {
    pub fn search_index() -> Self {
        RefreshTask::SearchIndex { force: false }
    }

    /// Combine two requests into the one task that covers both.
    ///
    /// `Full` absorbs anything; two index rebuilds force if either did.
    pub fn merge(self, other: RefreshTask) -> RefreshTask {
        match (self, other) {
            (RefreshTask::Full, _) | (_, RefreshTask::Full) => RefreshTask::Full,
            (RefreshTask::SearchIndex { force: a }, RefreshTask::SearchIndex { force: b }) => {
                RefreshTask::SearchIndex { force: a || b }
            }
        }
    }
}

impl fmt::Display for RefreshTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshTask::Full => write!(f, "full"),
            RefreshTask::SearchIndex { force: true } => write!(f, "searchIndex(force)"),
            RefreshTask::SearchIndex { force: false } => write!(f, "searchIndex"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MirrorStatus {
    NotInitialized,
    Pending,
    Ready,
}

impl fmt::Display for MirrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorStatus::NotInitialized => write!(f, "not initialized"),
            MirrorStatus::Pending => write!(f, "pending"),
            MirrorStatus::Ready => write!(f, "ready"),
        }
    }
}

/// What the caller of [`RefreshState::request`] must do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Nothing was running; start this task now
    Start(RefreshTask),
    /// Folded into the queued follow-up; wait on the running refresh
    Queued,
}

/// Status plus the single-slot follow-up task
#[derive(Debug)]
pub struct RefreshState {
    status: MirrorStatus,
    next: Option<RefreshTask>,
}

impl Default for RefreshState {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshState {
    pub fn new() -> Self {
        Self {
            status: MirrorStatus::NotInitialized,
            next: None,
        }
    }

    pub fn status(&self) -> MirrorStatus {
        self.status
    }

    pub fn queued(&self) -> Option<RefreshTask> {
        self.next
    }

    /// Enter `Pending` for the initial load; only legal before initialization
    pub fn begin_initialize(&mut self) -> Result<()> {
        match self.status {
            MirrorStatus::NotInitialized => {
                self.status = MirrorStatus::Pending;
                Ok(())
            }
            other => Err(MirrorError::InvalidState(format!(
                "initialize called while {}",
                other
            ))),
        }
    }

    pub fn request(&mut self, task: RefreshTask) -> Result<Admission> {
        match self.status {
            MirrorStatus::NotInitialized => Err(MirrorError::InvalidState(format!(
                "refresh({}) requested before initialize",
                task
            ))),
            MirrorStatus::Ready => {
                self.status = MirrorStatus::Pending;
                Ok(Admission::Start(task))
            }
            MirrorStatus::Pending => {
                self.next = Some(match self.next {
                    Some(queued) => queued.merge(task),
                    None => task,
                });
                Ok(Admission::Queued)
            }
        }
    }

    /// A task finished: hand back the queued follow-up, or settle in `Ready`
    pub fn finish(&mut self) -> Option<RefreshTask> {
        match self.next.take() {
            Some(next) => Some(next),
            None => {
                if self.status == MirrorStatus::Pending {
                    self.status = MirrorStatus::Ready;
                }
                None
            }
        }
    }

    /// Back to `NotInitialized`, dropping any queued task
    pub fn reset(&mut self) {
        self.status = MirrorStatus::NotInitialized;
        self.next = None;
    }
}
