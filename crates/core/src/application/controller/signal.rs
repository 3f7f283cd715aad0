// Job control signal

use tokio::sync::watch;

/// What the runner of a job should be doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSignal {
    Run,
    Pause,
    Cancel,
}

/// Control side, owned by the job slot
pub struct SignalSender {
    tx: watch::Sender<JobSignal>,
}

impl SignalSender {
    /// Publish a signal; works with or without an attached runner
    pub fn send(&self, signal: JobSignal) {
        self.tx.send_replace(signal);
    }

    pub fn current(&self) -> JobSignal {
        *self.tx.borrow()
    }

    /// Attach a new runner
    pub fn subscribe(&self) -> SignalReceiver {
        SignalReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

/// Runner side
pub struct SignalReceiver {
    rx: watch::Receiver<JobSignal>,
}

impl SignalReceiver {
    /// Latest signal, marking it seen
    pub fn current(&mut self) -> JobSignal {
        *self.rx.borrow_and_update()
    }

    /// Latest signal without marking it seen
    pub fn peek(&self) -> JobSignal {
        *self.rx.borrow()
    }

    /// Wait for a signal newer than the last one seen.
    ///
    /// Returns `None` once the sender is gone.
    pub async fn changed(&mut self) -> Option<JobSignal> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

/// Create a signal channel
pub fn signal_channel(initial: JobSignal) -> (SignalSender, SignalReceiver) {
    let (tx, rx) = watch::channel(initial);
    (SignalSender { tx }, SignalReceiver { rx })
}
