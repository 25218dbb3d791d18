//! Listener wrappers and writers used by the tests to observe what workers
//! did and when.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::coordinator::types::Message;
use crate::worker::types::{Listener, Output, Processed};

#[derive(Debug, Clone)]
pub struct Record {
    pub worker_id: usize,
    pub message: Message,
    pub primes: usize,
    pub started: Instant,
    pub finished: Instant,
}

impl Record {
    /// Sequence number parsed back out of the message text.
    pub fn seq(&self) -> u64 {
        self.message
            .to_string()
            .rsplit(' ')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap()
    }
}

pub type Log = Arc<Mutex<Vec<Record>>>;

/// Delegates to an inner listener, optionally sleeping first, and appends a
/// [`Record`] per message to a shared log.
#[derive(Debug)]
pub struct RecordingListener<L> {
    inner: L,
    delay: Duration,
    log: Log,
}

impl<L: Listener> RecordingListener<L> {
    pub fn new(inner: L) -> Self {
        Self::with_log(inner, Log::default())
    }

    pub fn with_log(inner: L, log: Log) -> Self {
        Self {
            inner,
            delay: Duration::ZERO,
            log,
        }
    }

    pub fn slowed_by(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn log(&self) -> Log {
        Arc::clone(&self.log)
    }
}

impl<L: Listener> Listener for RecordingListener<L> {
    fn process_message(&self, id: usize, message: &Message) -> Processed {
        let started = Instant::now();
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let report = self.inner.process_message(id, message);
        self.log.lock().unwrap().push(Record {
            worker_id: id,
            message: message.clone(),
            primes: report.primes,
            started,
            finished: Instant::now(),
        });
        report
    }

    fn max(&self) -> i64 {
        self.inner.max()
    }
}

/// In-memory stand-in for stdout.
#[derive(Debug, Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn output(&self) -> Output {
        Arc::new(Mutex::new(self.clone()))
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Behaves like stdout after the reading end of the pipe has gone away.
#[derive(Debug)]
pub struct BrokenPipe;

impl BrokenPipe {
    pub fn output() -> Output {
        Arc::new(Mutex::new(BrokenPipe))
    }
}

impl Write for BrokenPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::ErrorKind::BrokenPipe.into())
    }
}
