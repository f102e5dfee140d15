//! Control signals for driver and client lifecycle
//!
//! The registry never stops a worker directly. It drops a [`Signal`] into a
//! bounded mailbox and the worker reacts on its own schedule: a channel
//! driver exits on [`Signal::Stop`] (then calls `unlock`), a transport
//! worker tears its client down on [`Signal::Stop`], and a driver recycles
//! its upstream connection on [`Signal::Restart`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Mutex;

/// Control code delivered through a [`SignalQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The receiver should stop and tear itself down
    Stop,
    /// The receiver should recycle its upstream connection
    Restart,
}

/// Bounded best-effort mailbox for [`Signal`]s
///
/// Cloning is cheap and every clone addresses the same underlying queue, so
/// a mailbox handed out in a snapshot keeps working after the registry entry
/// it came from has been replaced. Sends never block: a full mailbox loses
/// the signal and `send` reports it. There is one logical consumer per
/// mailbox; concurrent `recv` calls serialize through an internal mutex.
#[derive(Debug, Clone)]
pub struct SignalQueue {
    tx: mpsc::Sender<Signal>,
    rx: Arc<Mutex<mpsc::Receiver<Signal>>>,
}

impl SignalQueue {
    /// Create a mailbox holding at most `capacity` undelivered signals
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Non-blocking send
    ///
    /// Returns `false` when the signal was dropped because the mailbox is
    /// full. Callers treat that as "a prior request is still pending".
    pub fn send(&self, signal: Signal) -> bool {
        match self.tx.try_send(signal) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Await the next signal
    pub async fn recv(&self) -> Option<Signal> {
        self.rx.lock().await.recv().await
    }

    /// Non-blocking receive
    pub fn try_recv(&self) -> Option<Signal> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }

    /// Number of signals queued and not yet consumed
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Whether the mailbox can currently accept another signal
    pub fn has_capacity(&self) -> bool {
        self.tx.capacity() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_recv_order() {
        let queue = SignalQueue::new(10);

        assert!(queue.send(Signal::Stop));
        assert!(queue.send(Signal::Restart));

        assert_eq!(queue.recv().await, Some(Signal::Stop));
        assert_eq!(queue.recv().await, Some(Signal::Restart));
    }

    #[test]
    fn test_full_mailbox_drops_signal() {
        let queue = SignalQueue::new(2);

        assert!(queue.send(Signal::Stop));
        assert!(queue.send(Signal::Stop));

        // Third send is dropped, not queued
        assert!(!queue.send(Signal::Restart));
        assert_eq!(queue.pending(), 2);
    }

    #[test]
    fn test_pending_and_capacity() {
        let queue = SignalQueue::new(3);
        assert_eq!(queue.pending(), 0);
        assert!(queue.has_capacity());

        queue.send(Signal::Stop);
        queue.send(Signal::Stop);
        queue.send(Signal::Stop);

        assert_eq!(queue.pending(), 3);
        assert!(!queue.has_capacity());
    }

    #[test]
    fn test_clones_share_queue() {
        let queue = SignalQueue::new(5);
        let other = queue.clone();

        assert!(queue.send(Signal::Restart));

        assert_eq!(other.try_recv(), Some(Signal::Restart));
        assert_eq!(queue.try_recv(), None);
    }
}
