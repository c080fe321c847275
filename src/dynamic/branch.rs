//! Shared machinery for the two concurrent execution attempts of a spawn.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::actions::{DynamicMode, Spawn, SpawnResult};
use crate::error::{ExecError, ExecResult};

/// Lifecycle of a branch. Transitions are monotonic:
/// Pending → Running → Done or Cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    Pending,
    Running,
    Done,
    Cancelled,
}

impl BranchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BranchState::Done | BranchState::Cancelled)
    }

    fn from_u8(value: u8) -> BranchState {
        match value {
            0 => BranchState::Pending,
            1 => BranchState::Running,
            2 => BranchState::Done,
            _ => BranchState::Cancelled,
        }
    }
}

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const DONE: u8 = 2;
const CANCELLED: u8 = 3;

/// Either the branch's spawn results or the cancelled sentinel (`None`).
pub(crate) type BranchOutcome = ExecResult<Option<Vec<SpawnResult>>>;

/// State shared between a branch task, the arbiter, and the peer branch.
///
/// The done latch is a zero-permit semaphore released exactly once when the
/// branch task has finished all of its cleanup; the winner of the race
/// acquires it before the strategy is allowed to return.
pub(crate) struct BranchCore {
    mode: DynamicMode,
    spawn: Arc<Spawn>,
    state: AtomicU8,
    token: CancellationToken,
    done: Semaphore,
}

impl BranchCore {
    pub fn new(mode: DynamicMode, spawn: Arc<Spawn>) -> Arc<Self> {
        Arc::new(BranchCore {
            mode,
            spawn,
            state: AtomicU8::new(PENDING),
            token: CancellationToken::new(),
            done: Semaphore::new(0),
        })
    }

    pub fn mode(&self) -> DynamicMode {
        self.mode
    }

    pub fn spawn(&self) -> &Spawn {
        &self.spawn
    }

    pub fn state(&self) -> BranchState {
        BranchState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == BranchState::Cancelled
    }

    fn mark_running(&self) {
        let _ = self
            .state
            .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire);
    }

    fn mark_done(&self) {
        let _ = self
            .state
            .compare_exchange(RUNNING, DONE, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Record that this branch aborted itself after losing the race, so the
    /// peer's cancellation cannot race against a Done transition.
    fn mark_cancelled(&self) {
        let _ = self
            .state
            .compare_exchange(RUNNING, CANCELLED, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Request best-effort termination. Returns true if this call moved the
    /// branch into the cancelled state, false if it had already finished or
    /// was already cancelled.
    pub fn cancel(&self) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current == DONE || current == CANCELLED {
                return false;
            }
            match self.state.compare_exchange(
                current,
                CANCELLED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.token.cancel();
                    return true;
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Block until the branch task has finished its cleanup. Consumes the
    /// single permit so the handshake stays release-once/acquire-once.
    pub async fn acquire_done(&self) {
        let permit = self
            .done
            .acquire()
            .await
            .expect("branch done latch closed");
        permit.forget();
    }

    fn release_done(&self) {
        self.done.add_permits(1);
    }
}

/// Releases the done latch when the branch task unwinds for any reason.
struct DoneGuard(Arc<BranchCore>);

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.0.release_done();
    }
}

/// Handle the strategy keeps on a submitted branch.
pub(crate) struct BranchHandle {
    core: Arc<BranchCore>,
    results: oneshot::Receiver<BranchOutcome>,
}

impl BranchHandle {
    pub fn core(&self) -> &Arc<BranchCore> {
        &self.core
    }

    /// Wait for the branch to settle. Panics if the branch task died without
    /// publishing an outcome, which means a bug in a strategy implementation.
    pub async fn results(&mut self) -> BranchOutcome {
        match (&mut self.results).await {
            Ok(outcome) => outcome,
            Err(_) => panic!(
                "{} branch of {} terminated without publishing an outcome",
                self.core.mode(),
                self.core.spawn().describe()
            ),
        }
    }
}

/// Launch a branch task running `body`, racing it against the branch's
/// cancellation token. The done latch is released after the body has been
/// dropped, so subprocess teardown in the body completes first.
pub(crate) fn submit<F>(core: Arc<BranchCore>, body: F) -> BranchHandle
where
    F: Future<Output = ExecResult<Vec<SpawnResult>>> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let task_core = core.clone();
    tokio::spawn(async move {
        let guard = DoneGuard(task_core.clone());
        task_core.mark_running();
        let outcome: BranchOutcome = tokio::select! {
            _ = task_core.token.cancelled() => Ok(None),
            result = body => match result {
                Ok(results) => {
                    task_core.mark_done();
                    Ok(Some(results))
                }
                Err(ExecError::DynamicInterrupted(message)) => {
                    task_core.mark_cancelled();
                    tracing::debug!(
                        mode = %task_core.mode(),
                        spawn = %task_core.spawn().describe(),
                        %message,
                        "branch lost the race"
                    );
                    Err(ExecError::DynamicInterrupted(message))
                }
                Err(e) => {
                    task_core.mark_done();
                    Err(e)
                }
            },
        };
        let _ = tx.send(outcome);
        drop(guard);
    });
    BranchHandle { core, results: rx }
}
