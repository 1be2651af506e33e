// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Asynchronous work submission.
//
// The platform retains one scheduler for its whole lifetime and shares it
// with every marshaled callback. Submission returns immediately; execution
// happens on the scheduler's worker context in submission order.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use tracing::{debug, warn};

use crate::error::{Result, WebshieldError};

/// A unit of work submitted for asynchronous execution.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Work-submission callable.
///
/// Shared (never mutated, only invoked) by the platform handle and by every
/// outstanding marshaled callback; it must outlive all work submitted
/// through it.
pub type Scheduler = Arc<dyn Fn(Task) + Send + Sync>;

/// Default scheduler: a single worker thread draining a FIFO queue.
///
/// The worker exits once every submission handle referencing it has been
/// dropped and the queue has drained. Work submitted through one handle (or
/// its clones) runs in submission order; no ordering is promised against
/// other schedulers.
pub struct WorkerScheduler {
    tx: mpsc::Sender<Task>,
}

impl WorkerScheduler {
    /// Start the worker thread.
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Task>();
        thread::Builder::new()
            .name("webshield-scheduler".into())
            .spawn(move || {
                debug!("scheduler worker started");
                while let Ok(task) = rx.recv() {
                    task();
                }
                debug!("scheduler worker stopped");
            })
            .map_err(|e| WebshieldError::Scheduler(format!("worker thread: {e}")))?;
        Ok(Self { tx })
    }

    /// A submission handle feeding this worker's queue.
    ///
    /// Handles are cheap to clone and keep the worker alive while any of
    /// them (or the `WorkerScheduler` itself) exists.
    pub fn handle(&self) -> Scheduler {
        let tx = self.tx.clone();
        Arc::new(move |task: Task| {
            if tx.send(task).is_err() {
                // Only reachable once the worker has already shut down.
                warn!("task submitted after scheduler shutdown; dropped");
            }
        })
    }
}
