//! Optimistic toggles (like/unlike, follow/unfollow).
//!
//! The flag and count flip the moment the user presses; the mutation runs
//! afterwards. Success keeps the flip and remembers the created record's id
//! for the reverse mutation, failure restores the exact pre-press state.
//! Presses while a mutation is in flight are ignored, and a press whose
//! future is dropped before the mutation settles is rolled back.

use std::sync::{Mutex, MutexGuard};

use crate::{AppResult, notice::Notices};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToggleState {
    pub active: bool,
    pub count: u32,
    /// Id of the record the reverse mutation deletes.
    pub record_id: Option<String>,
}

#[async_trait::async_trait]
pub trait ToggleMutation: Send + Sync {
    /// Creates the record; returns its id.
    async fn activate(&self) -> AppResult<String>;
    async fn deactivate(&self, record_id: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Committed,
    RolledBack,
    /// Another toggle was still in flight.
    Ignored,
}

/// A started toggle, holding what a rollback restores. Dropping it before
/// [`Pending::settle`] (a cancelled press) rolls the toggle back.
#[derive(Debug)]
pub struct Pending<'a> {
    toggle: &'a Toggle,
    before: ToggleState,
    activating: bool,
    settled: bool,
}

impl Pending<'_> {
    pub fn activating(&self) -> bool {
        self.activating
    }

    pub fn record_id(&self) -> Option<&str> {
        self.before.record_id.as_deref()
    }

    /// Finishes the toggle with the mutation's result (`Some(id)` after an
    /// activation). On error the pre-toggle state comes back whole.
    pub fn settle(mut self, result: AppResult<Option<String>>) -> AppResult<()> {
        self.settled = true;
        let mut inner = self.toggle.lock();
        inner.in_flight = false;
        match result {
            Ok(record_id) => {
                inner.state.record_id = if self.activating { record_id } else { None };
                Ok(())
            }
            Err(err) => {
                inner.state = std::mem::take(&mut self.before);
                Err(err)
            }
        }
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::debug!(activating = self.activating, "toggle cancelled, restoring previous state");
        let mut inner = self.toggle.lock();
        inner.in_flight = false;
        inner.state = std::mem::take(&mut self.before);
    }
}

#[derive(Debug)]
struct Inner {
    state: ToggleState,
    in_flight: bool,
}

#[derive(Debug)]
pub struct Toggle {
    inner: Mutex<Inner>,
}

impl Toggle {
    pub fn new(state: ToggleState) -> Self {
        Self {
            inner: Mutex::new(Inner { state, in_flight: false }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> ToggleState {
        self.lock().state.clone()
    }

    pub fn in_flight(&self) -> bool {
        self.lock().in_flight
    }

    /// Flips the flag and adjusts the count right away. `None` while another
    /// toggle is in flight.
    pub fn begin(&self) -> Option<Pending<'_>> {
        let mut inner = self.lock();
        if inner.in_flight {
            return None;
        }
        inner.in_flight = true;

        let before = inner.state.clone();
        let activating = !before.active;
        inner.state.active = activating;
        inner.state.count = if activating {
            before.count.saturating_add(1)
        } else {
            before.count.saturating_sub(1)
        };
        Some(Pending {
            toggle: self,
            before,
            activating,
            settled: false,
        })
    }
}

/// Runs one press end to end. Failures are rolled back and reported on
/// `notices` as "Couldn't {action}".
pub async fn toggle<M: ToggleMutation + ?Sized>(
    toggle: &Toggle,
    mutation: &M,
    notices: &Notices,
    action: &'static str,
) -> ToggleOutcome {
    let Some(pending) = toggle.begin() else {
        tracing::debug!(action, "toggle ignored, previous one still in flight");
        return ToggleOutcome::Ignored;
    };

    let result = if pending.activating() {
        mutation.activate().await.map(Some)
    } else {
        match pending.record_id() {
            Some(record_id) => mutation.deactivate(record_id).await.map(|()| None),
            None => Err("nothing to undo: record id unknown".into()),
        }
    };

    match pending.settle(result) {
        Ok(()) => ToggleOutcome::Committed,
        Err(err) => {
            notices.mutation_failed(action, &err);
            ToggleOutcome::RolledBack
        }
    }
}
