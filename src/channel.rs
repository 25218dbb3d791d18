/*!
A zero-buffer handoff channel built on top of `tokio::sync::mpsc`.

`mpsc` channels always buffer at least one value, so a plain `send` returns
before the receiver has looked at anything. Each value here travels together
with a `oneshot` acknowledgement that the receiver fires the moment it takes
the value, and `send` does not return until that acknowledgement arrives.
A slow receiver therefore stalls its sender, one value at a time.

Closing the channel is expressed by consuming the sender. There is no way to
send after [`HandoffSender::close`].
*/

use tokio::sync::{mpsc, oneshot};

/// The receiving half went away before the value was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("handoff receiver has been dropped")]
pub struct Disconnected;

type Envelope<T> = (T, oneshot::Sender<()>);

/// Create a connected sender/receiver pair.
pub fn handoff<T>() -> (HandoffSender<T>, HandoffReceiver<T>) {
    let (tx, rx) = mpsc::channel(1);
    (HandoffSender { tx }, HandoffReceiver { rx })
}

#[derive(Debug)]
pub struct HandoffSender<T> {
    tx: mpsc::Sender<Envelope<T>>,
}

impl<T> HandoffSender<T> {
    /// Hand `value` to the receiver, waiting until it has been taken.
    pub async fn send(&self, value: T) -> Result<(), Disconnected> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send((value, ack_tx))
            .await
            .map_err(|_| Disconnected)?;
        // The receiver may drop between accepting the envelope into the
        // buffer and taking it out; the acknowledgement never fires then.
        ack_rx.await.map_err(|_| Disconnected)
    }

    /// Close the channel. The receiver sees `None` once it has taken every
    /// value sent before this call.
    pub fn close(self) {
        drop(self);
    }
}

#[derive(Debug)]
pub struct HandoffReceiver<T> {
    rx: mpsc::Receiver<Envelope<T>>,
}

impl<T> HandoffReceiver<T> {
    /// Take the next value, releasing the sender blocked on it.
    ///
    /// Returns `None` once the sender is closed and nothing is left.
    pub async fn recv(&mut self) -> Option<T> {
        let (value, ack) = self.rx.recv().await?;
        let _ = ack.send(());
        Some(value)
    }
}
