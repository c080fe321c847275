//! Contents of a nested set that are still being materialized from storage.
//!
//! A pending set is created together with a single-use [`ChildrenPromise`].
//! Fulfilling the promise publishes the contents; dropping it unfulfilled
//! marks the set as interrupted, which readers observe according to their
//! [`InterruptStrategy`].

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::node::{NestedSet, Resolved};
use super::order::Order;
use crate::error::FlattenError;

/// What to do when resolution of a pending set is interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptStrategy {
    /// Report and exit the process with the interrupted exit code.
    Crash,
    /// Surface [`FlattenError::Interrupted`] to the caller.
    Propagate,
}

enum PendingState<E> {
    Waiting,
    Ready(Resolved<E>),
    Abandoned,
}

/// Write-once cell holding the eventual contents of a pending set.
pub(crate) struct PendingCell<E> {
    state: Mutex<PendingState<E>>,
    cond: Condvar,
}

impl<E: Clone> PendingCell<E> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(PendingCell {
            state: Mutex::new(PendingState::Waiting),
            cond: Condvar::new(),
        })
    }

    /// Whether the cell has settled, either with contents or abandoned.
    pub(crate) fn is_resolved(&self) -> bool {
        !matches!(*self.state.lock(), PendingState::Waiting)
    }

    pub(crate) fn wait(&self) -> Result<Resolved<E>, FlattenError> {
        let mut state = self.state.lock();
        loop {
            match &*state {
                PendingState::Ready(resolved) => return Ok(resolved.clone()),
                PendingState::Abandoned => return Err(FlattenError::Interrupted),
                PendingState::Waiting => self.cond.wait(&mut state),
            }
        }
    }

    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Result<Resolved<E>, FlattenError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            match &*state {
                PendingState::Ready(resolved) => return Ok(resolved.clone()),
                PendingState::Abandoned => return Err(FlattenError::Interrupted),
                PendingState::Waiting => {
                    if self.cond.wait_until(&mut state, deadline).timed_out() {
                        return Err(FlattenError::Timeout);
                    }
                }
            }
        }
    }

    fn fulfill(&self, resolved: Resolved<E>) {
        let mut state = self.state.lock();
        if matches!(*state, PendingState::Waiting) {
            *state = PendingState::Ready(resolved);
            self.cond.notify_all();
        }
    }

    fn abandon(&self) {
        let mut state = self.state.lock();
        if matches!(*state, PendingState::Waiting) {
            *state = PendingState::Abandoned;
            self.cond.notify_all();
        }
    }
}

/// Write side of a pending nested set.
pub struct ChildrenPromise<E> {
    cell: Arc<PendingCell<E>>,
    order: Order,
    fulfilled: bool,
}

impl<E: Clone> ChildrenPromise<E> {
    pub(crate) fn new(cell: Arc<PendingCell<E>>, order: Order) -> Self {
        ChildrenPromise {
            cell,
            order,
            fulfilled: false,
        }
    }

    /// Publish the contents of the pending set. The provided set must be
    /// fully materialized and of a compatible order.
    pub fn fulfill(mut self, contents: NestedSet<E>) {
        assert!(
            self.order.is_compatible(contents.order()),
            "cannot fulfill a {:?} set with {:?} contents",
            self.order,
            contents.order()
        );
        assert!(
            !contents.is_from_storage(),
            "cannot fulfill a pending set with another pending set"
        );
        self.cell.fulfill(contents.into_resolved());
        self.fulfilled = true;
    }
}

impl<E> Drop for ChildrenPromise<E> {
    fn drop(&mut self) {
        if !self.fulfilled {
            let mut state = self.cell.state.lock();
            if matches!(*state, PendingState::Waiting) {
                *state = PendingState::Abandoned;
                self.cell.cond.notify_all();
            }
        }
    }
}
