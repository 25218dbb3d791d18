use log::{debug, info, warn};
use std::io::Write;
use std::sync::PoisonError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::channel::handoff;
use crate::coordinator::broadcaster::Broadcaster;
use crate::coordinator::types::{CoordinatorError, RunConfig, RunSummary};
use crate::worker::logic::WorkerError;
use crate::worker::types::{self, Output};
use crate::worker::{DefaultListener, Listener, Worker};

pub struct Coordinator {
    config: RunConfig,
    out: Output,
}

impl Coordinator {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            out: types::stdout(),
        }
    }

    /// Send report and progress lines to `out` instead of stdout.
    #[cfg(test)]
    pub fn with_output(mut self, out: Output) -> Self {
        self.out = out;
        self
    }

    /// Run with a [`DefaultListener`] bound to `max_check_for_primes` on
    /// every worker.
    pub async fn run(self) -> Result<RunSummary, CoordinatorError> {
        let max = self.config.max_check_for_primes;
        self.run_with(|_| DefaultListener::with_max(max)).await
    }

    /// Run with a listener built per worker id (`1..=num_listeners`).
    pub async fn run_with<L, F>(
        self,
        mut make_listener: F,
    ) -> Result<RunSummary, CoordinatorError>
    where
        L: Listener,
        F: FnMut(usize) -> L,
    {
        let RunConfig {
            duration,
            num_listeners,
            max_check_for_primes,
            pass_interval,
            grace,
        } = self.config;
        let out = self.out;

        info!(
            "Starting {} listeners for {:?} (max check for primes: {})",
            num_listeners, duration, max_check_for_primes
        );

        let (done_tx, mut done_rx) = mpsc::channel(num_listeners.max(1));
        let mut channels = Vec::with_capacity(num_listeners);
        let mut workers = Vec::with_capacity(num_listeners);
        for id in 1..=num_listeners {
            let (tx, rx) = handoff();
            channels.push(tx);
            let handle = Worker::new(id, make_listener(id))
                .with_output(out.clone())
                .spawn(rx, done_tx.clone());
            workers.push((id, handle));
        }
        // Only the workers hold senders now, so a worker that dies without
        // signalling shows up as an early `None` below.
        drop(done_tx);

        let broadcaster =
            tokio::spawn(Broadcaster::new(channels, duration, pass_interval).run());

        let mut completions = Vec::with_capacity(num_listeners);
        while completions.len() < num_listeners {
            let Some(completion) = done_rx.recv().await else {
                break;
            };
            {
                let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
                writeln!(out, "listener {} has finished processing.", completion.worker_id)
                    .and_then(|_| out.flush())
                    .map_err(CoordinatorError::Output)?;
            }
            debug!(
                "listener {} handled {} messages",
                completion.worker_id, completion.processed
            );
            completions.push(completion);
        }

        if completions.len() < num_listeners {
            // A failed worker also makes the broadcaster give up, so report
            // the worker's error, which carries the root cause.
            if let Some((worker_id, source)) = first_failure(workers).await {
                return Err(CoordinatorError::Worker { worker_id, source });
            }
        }

        let broadcast = broadcaster.await??;

        if completions.len() < num_listeners {
            warn!(
                "{} listeners exited without signalling completion",
                num_listeners - completions.len()
            );
            return Err(CoordinatorError::MissingCompletions {
                completed: completions.len(),
                expected: num_listeners,
            });
        }

        info!(
            "All {} listeners finished, {} messages delivered; waiting {:?} before exit",
            num_listeners,
            broadcast.total(),
            grace
        );
        sleep(grace).await;

        Ok(RunSummary {
            completions,
            broadcast,
        })
    }
}

async fn first_failure(
    workers: Vec<(usize, JoinHandle<Result<(), WorkerError>>)>,
) -> Option<(usize, WorkerError)> {
    let mut first = None;
    for (id, handle) in workers {
        let err = match handle.await {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e,
            Err(e) => WorkerError::Listener(e),
        };
        first.get_or_insert((id, err));
    }
    first
}
