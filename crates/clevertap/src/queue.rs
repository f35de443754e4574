//! Lifecycle operations that arrive before the CleverTap client exists.
//!
//! The queue starts out uninitialized: every submitted operation is parked.
//! Once the client is published, [`PendingOperations::mark_ready`] flips it
//! to ready and [`PendingOperations::drain`] runs the parked operations in
//! arrival order. Operations submitted while a drain is in progress are
//! appended and picked up by the same drain, so arrival order holds across
//! threads. After that, submissions run immediately on the caller's thread.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::api::VendorResult;

/// Deferred zero-argument call against the CleverTap SDK.
pub type PendingOperation = Box<dyn FnOnce() -> VendorResult + Send>;

/// Decides where a drain runs. The host may hop to its main thread.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, task: Box<dyn FnOnce() + Send>);
}

/// Runs dispatched work on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, task: Box<dyn FnOnce() + Send>) {
        task();
    }
}

#[derive(Default)]
struct QueueState {
    ready: bool,
    draining: bool,
    pending: VecDeque<PendingOperation>,
}

#[derive(Default)]
pub struct PendingOperations {
    state: Mutex<QueueState>,
}

fn run(operation: PendingOperation) {
    if let Err(e) = operation() {
        error!(error = %e, "CleverTap operation failed");
    }
}

impl PendingOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation` now if the client is ready and nothing is queued
    /// ahead of it, otherwise queue it.
    pub fn submit(&self, operation: PendingOperation) {
        {
            let mut state = self.state.lock();
            if !state.ready || state.draining {
                state.pending.push_back(operation);
                debug!(pending = state.pending.len(), "CleverTap not initialized yet, queuing operation");
                return;
            }
        }
        run(operation);
    }

    /// Switch to ready. Returns `true` when operations are waiting and a
    /// [`drain`](Self::drain) must follow; until it does, new submissions
    /// keep queueing behind them.
    pub fn mark_ready(&self) -> bool {
        let mut state = self.state.lock();
        if state.ready {
            return false;
        }
        state.ready = true;
        state.draining = !state.pending.is_empty();
        state.draining
    }

    /// Run queued operations in FIFO order until the queue is empty. A
    /// failing operation is logged and the drain moves on. Returns how many
    /// operations ran.
    pub fn drain(&self) -> usize {
        let mut executed = 0;
        loop {
            let operation = {
                let mut state = self.state.lock();
                match state.pending.pop_front() {
                    Some(operation) => operation,
                    None => {
                        state.draining = false;
                        break;
                    }
                }
            };
            run(operation);
            executed += 1;
        }
        executed
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::VendorError;
    use std::sync::Arc;
    use std::thread;

    fn recorder() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn record(log: &Arc<Mutex<Vec<String>>>, name: &str) -> PendingOperation {
        let log = Arc::clone(log);
        let name = name.to_string();
        Box::new(move || -> VendorResult {
            log.lock().push(name);
            Ok(())
        })
    }

    #[test]
    fn test_operations_wait_until_ready() {
        let queue = PendingOperations::new();
        let log = recorder();

        queue.submit(record(&log, "created"));
        queue.submit(record(&log, "resumed"));
        queue.submit(record(&log, "paused"));

        assert!(log.lock().is_empty());
        assert_eq!(queue.len(), 3);
        assert!(!queue.is_ready());

        assert!(queue.mark_ready());
        assert_eq!(queue.drain(), 3);
        assert_eq!(*log.lock(), vec!["created", "resumed", "paused"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ready_queue_runs_immediately() {
        let queue = PendingOperations::new();
        assert!(!queue.mark_ready());

        let log = recorder();
        queue.submit(record(&log, "resumed"));
        assert_eq!(*log.lock(), vec!["resumed"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_failure_does_not_stop_the_drain() {
        let queue = PendingOperations::new();
        let log = recorder();

        queue.submit(record(&log, "first"));
        queue.submit(Box::new(|| -> VendorResult { Err(VendorError::call("boom")) }));
        queue.submit(record(&log, "third"));

        queue.mark_ready();
        assert_eq!(queue.drain(), 3);
        assert_eq!(*log.lock(), vec!["first", "third"]);
    }

    #[test]
    fn test_mark_ready_is_one_shot() {
        let queue = PendingOperations::new();
        let log = recorder();
        queue.submit(record(&log, "a"));
        assert!(queue.mark_ready());
        assert!(!queue.mark_ready());
        queue.drain();
        assert_eq!(*log.lock(), vec!["a"]);
    }

    #[test]
    fn test_submissions_during_drain_keep_fifo_order() {
        let queue = Arc::new(PendingOperations::new());
        let log = recorder();

        queue.submit(record(&log, "queued-1"));
        let inner_queue = Arc::clone(&queue);
        let inner_log = Arc::clone(&log);
        queue.submit(Box::new(move || -> VendorResult {
            inner_log.lock().push("queued-2".to_string());
            // Arrives while the drain is running.
            inner_queue.submit(record(&inner_log, "late"));
            Ok(())
        }));
        queue.submit(record(&log, "queued-3"));

        assert!(queue.mark_ready());
        assert_eq!(queue.drain(), 4);
        assert_eq!(*log.lock(), vec!["queued-1", "queued-2", "queued-3", "late"]);
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        let queue = Arc::new(PendingOperations::new());
        let log = recorder();

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = Arc::clone(&queue);
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..50 {
                        queue.submit(record(&log, &format!("{p}-{i}")));
                    }
                })
            })
            .collect();

        queue.mark_ready();
        queue.drain();
        for producer in producers {
            producer.join().unwrap();
        }
        // Anything queued after the first drain finished ran inline.
        queue.drain();

        let log = log.lock();
        assert_eq!(log.len(), 200);
        for p in 0..4 {
            let order: Vec<usize> = log
                .iter()
                .filter(|entry| entry.starts_with(&format!("{p}-")))
                .map(|entry| entry[2..].parse().unwrap())
                .collect();
            assert_eq!(order, (0..50).collect::<Vec<_>>(), "producer {p} out of order");
        }
    }
}
