use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::{Instant, sleep};

use crate::channel::HandoffSender;
use crate::coordinator::types::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BroadcastError {
    #[error("listener {worker_id} dropped its inbox while broadcasting")]
    WorkerGone { worker_id: usize },
}

/// Messages sent per channel, indexed like the channels themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: Vec<u64>,
}

impl BroadcastReport {
    pub fn total(&self) -> u64 {
        self.sent.iter().sum()
    }
}

/// Fans sequentially numbered messages out to every channel until its
/// deadline elapses, then closes them all.
///
/// Each send blocks until that listener takes the message, so one slow
/// listener holds back every channel after it in the same pass. The deadline
/// is only checked between passes.
#[derive(Debug)]
pub struct Broadcaster {
    channels: Vec<HandoffSender<Message>>,
    deadline: Duration,
    pass_interval: Duration,
}

impl Broadcaster {
    pub fn new(
        channels: Vec<HandoffSender<Message>>,
        deadline: Duration,
        pass_interval: Duration,
    ) -> Self {
        Self {
            channels,
            deadline,
            pass_interval,
        }
    }

    pub async fn run(self) -> Result<BroadcastReport, BroadcastError> {
        let Self {
            channels,
            deadline,
            pass_interval,
        } = self;

        let timer = sleep(deadline);
        tokio::pin!(timer);

        let mut report = BroadcastReport {
            sent: vec![0; channels.len()],
        };
        let mut seq = 0u64;
        let mut passes = 0u64;
        let started = Instant::now();

        let outcome = loop {
            if timer.is_elapsed() {
                break Ok(());
            }

            if let Err(e) = broadcast_pass(&channels, &mut seq, &mut report).await {
                break Err(e);
            }
            passes += 1;
            debug!("Pass {} done, {} messages sent so far", passes, seq);

            tokio::select! {
                _ = &mut timer => break Ok(()),
                _ = sleep(pass_interval) => {}
            }
        };

        for ch in channels {
            ch.close();
        }

        match outcome {
            Ok(()) => {
                info!(
                    "Broadcast window closed after {:?}: {} passes, {} messages",
                    started.elapsed(),
                    passes,
                    report.total()
                );
                Ok(report)
            }
            Err(e) => {
                warn!("Broadcast aborted: {}", e);
                Err(e)
            }
        }
    }
}

async fn broadcast_pass(
    channels: &[HandoffSender<Message>],
    seq: &mut u64,
    report: &mut BroadcastReport,
) -> Result<(), BroadcastError> {
    for (i, ch) in channels.iter().enumerate() {
        *seq += 1;
        ch.send(Message::broadcast(*seq))
            .await
            .map_err(|_| BroadcastError::WorkerGone { worker_id: i + 1 })?;
        report.sent[i] += 1;
    }
    Ok(())
}
