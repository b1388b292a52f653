//! Asynchronous load tasks with a poll-based completion contract.
//!
//! A [`Task`] runs one job — typically a disk read plus decode — either
//! inline ([`LoadPolicy::Sync`]) or on a worker thread
//! ([`LoadPolicy::Async`]). The worker never touches engine structures; it
//! only produces a payload that the main thread consumes via
//! [`Task::try_take`] or [`Task::wait`]. This keeps the core single-threaded
//! with no locks.
//!
//! # Invariants
//! - A task's result is consumed at most once.
//! - `wait` is the only blocking operation.
//! - There is no cancellation: a spawned job always runs to completion.

use crossbeam_channel::{Receiver, TryRecvError, bounded};

/// Whether a load runs inline or on a worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPolicy {
    Sync,
    Async,
}

/// Failures of the task machinery itself. Job-level failures travel inside
/// the job's own payload type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    /// The worker thread died (panicked) before producing a result.
    #[error("worker terminated without producing a result")]
    WorkerLost,
    /// The result was already taken; polling again is a caller defect.
    #[error("task result was already consumed")]
    AlreadyTaken,
}

/// A one-shot load job.
pub struct Task<T> {
    state: State<T>,
}

enum State<T> {
    Pending(Receiver<T>),
    Ready(T),
    Taken,
}

impl<T: Send + 'static> Task<T> {
    /// Run `job` under the given policy. With `Sync` the job completes
    /// before `spawn` returns and the task is immediately ready.
    pub fn spawn<F>(policy: LoadPolicy, job: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        match policy {
            LoadPolicy::Sync => Self {
                state: State::Ready(job()),
            },
            LoadPolicy::Async => {
                let (tx, rx) = bounded(1);
                std::thread::spawn(move || {
                    // The receiver may be gone if the task was dropped;
                    // the job still ran to completion, which is the contract.
                    let _ = tx.send(job());
                });
                Self {
                    state: State::Pending(rx),
                }
            }
        }
    }

    /// A task that is ready without running a job.
    pub fn ready(value: T) -> Self {
        Self {
            state: State::Ready(value),
        }
    }

    /// Non-consuming readiness hint. A lost worker is only observable
    /// through `try_take`/`wait`.
    pub fn is_ready(&self) -> bool {
        match &self.state {
            State::Pending(rx) => !rx.is_empty(),
            State::Ready(_) => true,
            State::Taken => false,
        }
    }

    /// Non-blocking poll. Returns `None` while the job is still running;
    /// afterwards returns the payload exactly once.
    pub fn try_take(&mut self) -> Option<Result<T, TaskError>> {
        match std::mem::replace(&mut self.state, State::Taken) {
            State::Pending(rx) => match rx.try_recv() {
                Ok(value) => Some(Ok(value)),
                Err(TryRecvError::Empty) => {
                    self.state = State::Pending(rx);
                    None
                }
                Err(TryRecvError::Disconnected) => Some(Err(TaskError::WorkerLost)),
            },
            State::Ready(value) => Some(Ok(value)),
            State::Taken => Some(Err(TaskError::AlreadyTaken)),
        }
    }

    /// Block until the job finishes and take its payload.
    pub fn wait(&mut self) -> Result<T, TaskError> {
        match std::mem::replace(&mut self.state, State::Taken) {
            State::Pending(rx) => rx.recv().map_err(|_| TaskError::WorkerLost),
            State::Ready(value) => Ok(value),
            State::Taken => Err(TaskError::AlreadyTaken),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_task_is_ready_immediately() {
        let mut task = Task::spawn(LoadPolicy::Sync, || 42);
        assert!(task.is_ready());
        assert_eq!(task.try_take(), Some(Ok(42)));
    }

    #[test]
    fn ready_task_yields_its_value() {
        let mut task = Task::ready("hello");
        assert_eq!(task.wait(), Ok("hello"));
    }

    #[test]
    fn async_task_completes_via_wait() {
        let mut task = Task::spawn(LoadPolicy::Async, || 7 * 6);
        assert_eq!(task.wait(), Ok(42));
    }

    #[test]
    fn try_take_polls_until_the_job_finishes() {
        let (gate_tx, gate_rx) = bounded::<()>(1);
        let mut task = Task::spawn(LoadPolicy::Async, move || {
            gate_rx.recv().ok();
            "done"
        });
        // The job is parked on the gate, so polling yields nothing yet.
        assert_eq!(task.try_take(), None);
        assert_eq!(task.try_take(), None);

        gate_tx.send(()).unwrap();
        loop {
            match task.try_take() {
                Some(result) => {
                    assert_eq!(result, Ok("done"));
                    break;
                }
                None => std::thread::yield_now(),
            }
        }
    }

    #[test]
    fn second_take_reports_the_defect() {
        let mut task = Task::spawn(LoadPolicy::Sync, || 1);
        assert_eq!(task.try_take(), Some(Ok(1)));
        assert_eq!(task.try_take(), Some(Err(TaskError::AlreadyTaken)));
        assert_eq!(task.wait(), Err(TaskError::AlreadyTaken));
    }

    #[test]
    fn panicking_worker_surfaces_as_worker_lost() {
        let mut task: Task<i32> = Task::spawn(LoadPolicy::Async, || panic!("boom"));
        assert_eq!(task.wait(), Err(TaskError::WorkerLost));
    }
}
