//! Background status sync.
//!
//! The UI thread owns the board; this worker only talks to the store. Requests
//! go in over one channel and outcomes come back over another, which the event
//! loop drains between frames. There is no cancellation: once sent, a request
//! runs to completion even if the board has been dropped, and its outcome is
//! discarded.

use crate::board::{Action, SyncRequest};
use crate::store::TaskStore;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub request: SyncRequest,
    pub result: Result<(), String>,
}

impl SyncOutcome {
    pub fn into_action(self) -> Action {
        let SyncRequest { ticket, task, .. } = self.request;
        match self.result {
            Ok(()) => Action::CommitSucceeded { task, ticket },
            Err(error) => Action::CommitFailed {
                task,
                ticket,
                error,
            },
        }
    }
}

pub struct SyncWorker {
    requests: Option<Sender<SyncRequest>>,
    outcomes: Receiver<SyncOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl SyncWorker {
    pub fn spawn(store: Arc<dyn TaskStore>) -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<SyncRequest>();
        let (outcome_tx, outcome_rx) = mpsc::channel::<SyncOutcome>();
        let handle = thread::Builder::new()
            .name("status-sync".to_string())
            .spawn(move || run(store, request_rx, outcome_tx))?;
        Ok(Self {
            requests: Some(request_tx),
            outcomes: outcome_rx,
            handle: Some(handle),
        })
    }

    /// Queues a request. If the worker is gone the failure comes back as an
    /// outcome so the board can roll back.
    pub fn submit(&self, request: SyncRequest) -> Option<SyncOutcome> {
        let sent = self
            .requests
            .as_ref()
            .is_some_and(|tx| tx.send(request).is_ok());
        if sent {
            None
        } else {
            Some(SyncOutcome {
                request,
                result: Err("status sync worker stopped".to_string()),
            })
        }
    }

    pub fn try_next(&self) -> Option<SyncOutcome> {
        match self.outcomes.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Blocks until the next outcome arrives or the worker exits.
    pub fn next_blocking(&self) -> Option<SyncOutcome> {
        self.outcomes.recv().ok()
    }

    /// Closes the request channel and waits for queued calls to finish.
    pub fn shutdown(mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("status sync worker panicked");
            }
        }
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        // Detach: the worker drains whatever is queued and then exits.
        self.requests.take();
    }
}

fn run(store: Arc<dyn TaskStore>, requests: Receiver<SyncRequest>, outcomes: Sender<SyncOutcome>) {
    for request in requests {
        let result = store
            .update_task_status(request.task, request.status)
            .map_err(|err| err.to_string());
        if outcomes.send(SyncOutcome { request, result }).is_err() {
            debug!(task = %request.task, "board gone, dropping status result");
        }
    }
}
