use chrono::{DateTime, Local};
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::coordinator::types::Message;
use crate::worker::math;

/// Work run by a worker for every message it receives.
///
/// Implementations are immutable once built; the worker shares them with
/// the blocking thread pool.
pub trait Listener: Send + Sync + 'static {
    fn process_message(&self, id: usize, message: &Message) -> Processed;

    /// Upper bound handed to each prime search.
    fn max(&self) -> i64;
}

/// Counts the primes up to a fixed bound on every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultListener {
    max: i64,
}

impl DefaultListener {
    pub const DEFAULT_MAX: i64 = 999_999;

    pub fn with_max(max: i64) -> Self {
        Self { max }
    }
}

impl Default for DefaultListener {
    fn default() -> Self {
        Self::with_max(Self::DEFAULT_MAX)
    }
}

impl Listener for DefaultListener {
    fn process_message(&self, id: usize, message: &Message) -> Processed {
        let (primes, elapsed) = math::count_primes(self.max);
        Processed {
            at: Local::now(),
            worker_id: id,
            message: message.clone(),
            primes,
            elapsed,
        }
    }

    fn max(&self) -> i64 {
        self.max
    }
}

/// Outcome of one message, printed as a single report line.
#[derive(Debug, Clone)]
pub struct Processed {
    pub at: DateTime<Local>,
    pub worker_id: usize,
    pub message: Message,
    pub primes: usize,
    pub elapsed: Duration,
}

impl fmt::Display for Processed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\tListener {} received: {}\tFound {} primes in {:?}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            self.worker_id,
            self.message,
            self.primes,
            self.elapsed,
        )
    }
}

/// Where report lines go. Shared by every worker and the coordinator so
/// lines never interleave mid-write.
pub type Output = Arc<Mutex<dyn Write + Send>>;

pub fn stdout() -> Output {
    Arc::new(Mutex::new(io::stdout()))
}

pub struct Worker<L> {
    pub(crate) id: usize,
    pub(crate) listener: Arc<L>,
    pub(crate) out: Output,
}
