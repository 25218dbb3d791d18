use std::fmt;
use std::io;
use std::time::Duration;

use crate::coordinator::broadcaster::BroadcastReport;
use crate::worker::logic::WorkerError;

/// Text payload fanned out to every worker. The sequence number lives in
/// the text itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(String);

impl Message {
    pub fn broadcast(seq: u64) -> Self {
        Self(format!("Broadcast Message: {seq}"))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sent once by a worker after its inbox has been closed and drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub worker_id: usize,
    pub processed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// How long the broadcaster keeps starting new passes.
    pub duration: Duration,
    pub num_listeners: usize,
    pub max_check_for_primes: i64,
    /// Pause between two broadcast passes.
    pub pass_interval: Duration,
    /// Pause after the last completion before the run returns.
    pub grace: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(15),
            num_listeners: 8,
            max_check_for_primes: 100_000,
            pass_interval: Duration::from_millis(100),
            grace: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Completions in the order they arrived.
    pub completions: Vec<Completion>,
    pub broadcast: BroadcastReport,
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("only {completed} of {expected} listeners signalled completion")]
    MissingCompletions { completed: usize, expected: usize },
    #[error("listener {worker_id} failed")]
    Worker {
        worker_id: usize,
        #[source]
        source: WorkerError,
    },
    #[error("failed to write progress line")]
    Output(#[source] io::Error),
    #[error(transparent)]
    Broadcast(#[from] crate::coordinator::broadcaster::BroadcastError),
    #[error("broadcaster task failed: {0}")]
    BroadcasterPanicked(#[from] tokio::task::JoinError),
}
