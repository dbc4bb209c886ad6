//! Fixed-size worker pool fed by a bounded queue of accepted connections.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET};

const DRAIN_POLL: Duration = Duration::from_millis(10);

/// Outcome of waiting for workers to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every queued and in-flight call completed.
    Completed,
    /// The grace period elapsed with workers still busy.
    TimedOut {
        /// Workers that had not finished.
        pending: usize,
    },
}

/// Workers consuming connections from a queue with one slot per worker.
pub(crate) struct WorkerPool {
    sender: Option<SyncSender<ConnectionStream>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` workers, each running `handler` for one connection at a time.
    pub(crate) fn spawn(size: usize, handler: &Arc<dyn ConnectionHandler>) -> Self {
        let size = size.max(1);
        let (sender, receiver) = mpsc::sync_channel::<ConnectionStream>(size);
        let receiver = Arc::new(Mutex::new(receiver));
        let workers = (0..size)
            .map(|index| {
                let receiver = Arc::clone(&receiver);
                let handler = Arc::clone(handler);
                thread::Builder::new()
                    .name(format!("dendend-worker-{index}"))
                    .spawn(move || run_worker(&receiver, handler.as_ref()))
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(error) => {
                    warn!(target: LISTENER_TARGET, %error, "failed to spawn worker");
                    None
                }
            })
            .collect();
        Self {
            sender: Some(sender),
            workers,
        }
    }

    /// Number of live worker threads.
    pub(crate) fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues `stream` without blocking.
    ///
    /// Returns the stream when every worker is busy and the queue is full so
    /// the caller can back off and retry.
    pub(crate) fn try_submit(&self, stream: ConnectionStream) -> Result<(), Submit> {
        let Some(sender) = &self.sender else {
            return Err(Submit::Closed);
        };
        match sender.try_send(stream) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(stream)) => Err(Submit::Busy(stream)),
            Err(TrySendError::Disconnected(_)) => Err(Submit::Closed),
        }
    }

    /// Stops accepting work; queued connections are still served.
    pub(crate) fn close(&mut self) {
        self.sender = None;
    }

    /// Waits up to `grace` for every worker to finish.
    pub(crate) fn drain(mut self, grace: Duration) -> DrainOutcome {
        self.close();
        let deadline = Instant::now() + grace;
        loop {
            let pending = self.workers.iter().filter(|worker| !worker.is_finished()).count();
            if pending == 0 {
                for worker in self.workers.drain(..) {
                    if worker.join().is_err() {
                        warn!(target: LISTENER_TARGET, "worker thread panicked");
                    }
                }
                return DrainOutcome::Completed;
            }
            if Instant::now() >= deadline {
                return DrainOutcome::TimedOut { pending };
            }
            thread::sleep(DRAIN_POLL);
        }
    }
}

/// Reason a connection could not be queued.
pub(crate) enum Submit {
    /// All workers busy; the stream is handed back.
    Busy(ConnectionStream),
    /// The pool no longer accepts work.
    Closed,
}

fn run_worker(receiver: &Mutex<Receiver<ConnectionStream>>, handler: &dyn ConnectionHandler) {
    loop {
        let next = receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();
        match next {
            Ok(stream) => handler.handle(stream),
            Err(_) => break,
        }
    }
    debug!(target: LISTENER_TARGET, "worker exiting");
}
