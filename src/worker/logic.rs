use log::{debug, warn};
use std::io::{self, Write};
use std::sync::{Arc, PoisonError};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::channel::HandoffReceiver;
use crate::coordinator::types::{Completion, Message};
use crate::worker::types::{self, Listener, Output, Worker};

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("listener panicked while processing a message: {0}")]
    Listener(#[from] JoinError),
    #[error("failed to write report line")]
    Output(#[source] io::Error),
    #[error("completion receiver is gone")]
    CompletionDropped,
}

impl<L: Listener> Worker<L> {
    pub fn new(id: usize, listener: L) -> Self {
        Self {
            id,
            listener: Arc::new(listener),
            out: types::stdout(),
        }
    }

    /// Send report lines to `out` instead of stdout.
    pub fn with_output(mut self, out: Output) -> Self {
        self.out = out;
        self
    }

    /// Run on the current runtime. Failures are logged here and handed back
    /// through the join handle.
    pub fn spawn(
        self,
        inbox: HandoffReceiver<Message>,
        done: mpsc::Sender<Completion>,
    ) -> JoinHandle<Result<(), WorkerError>> {
        tokio::spawn(async move {
            let id = self.id;
            let res = self.run(inbox, done).await;
            if let Err(e) = &res {
                warn!("Listener {} stopped without completing: {}", id, e);
            }
            res
        })
    }

    /// Process every message until the inbox closes, then signal `done`
    /// exactly once.
    ///
    /// A report line that cannot be written ends the worker without a
    /// completion; dropping the inbox then stops the broadcaster.
    pub async fn run(
        self,
        mut inbox: HandoffReceiver<Message>,
        done: mpsc::Sender<Completion>,
    ) -> Result<(), WorkerError> {
        debug!("Listener {} ready (max = {})", self.id, self.listener.max());

        let mut processed = 0u64;
        while let Some(message) = inbox.recv().await {
            let listener = Arc::clone(&self.listener);
            let out = Arc::clone(&self.out);
            let id = self.id;
            // Prime searches are CPU bound and stdout may block; keep both
            // off the async workers.
            tokio::task::spawn_blocking(move || {
                let report = listener.process_message(id, &message);
                let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
                writeln!(out, "{report}").and_then(|_| out.flush())
            })
            .await?
            .map_err(WorkerError::Output)?;
            processed += 1;
        }

        debug!("Listener {} inbox closed after {} messages", self.id, processed);
        done.send(Completion {
            worker_id: self.id,
            processed,
        })
        .await
        .map_err(|_| WorkerError::CompletionDropped)
    }
}
