//! Ordered, replay-latest subscriptions to container updates.

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::warn;

/// Receiver half of a container stream.
///
/// Yields the value that was current when the subscription was taken, then
/// every later publication in publish order. A subscriber that falls more
/// than the channel capacity behind skips the oldest updates and logs how
/// many it missed.
pub struct Subscription<T> {
    latest: Option<T>,
    updates: broadcast::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    pub(crate) fn new(latest: T, updates: broadcast::Receiver<T>) -> Self {
        Subscription {
            latest: Some(latest),
            updates,
        }
    }

    /// Waits for the next value. Returns `None` once the container is gone
    /// and every queued value has been read.
    pub async fn recv(&mut self) -> Option<T> {
        if let Some(latest) = self.latest.take() {
            return Some(latest);
        }
        loop {
            match self.updates.recv().await {
                Ok(value) => return Some(value),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Session stream subscriber fell behind; skipping");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next queued value, without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        if let Some(latest) = self.latest.take() {
            return Some(latest);
        }
        loop {
            match self.updates.try_recv() {
                Ok(value) => return Some(value),
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Session stream subscriber fell behind; skipping");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Every value queued right now, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_comes_before_updates() {
        let (tx, rx) = broadcast::channel(4);
        let mut sub = Subscription::new(0, rx);
        tx.send(1).expect("receiver alive");
        tx.send(2).expect("receiver alive");

        assert_eq!(sub.drain(), vec![0, 1, 2]);
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn test_lagged_subscriber_resumes_at_oldest_retained() {
        let (tx, rx) = broadcast::channel(2);
        let mut sub = Subscription::new(0, rx);
        for value in 1..=5 {
            tx.send(value).expect("receiver alive");
        }

        assert_eq!(sub.drain(), vec![0, 4, 5]);
    }

    #[tokio::test]
    async fn test_recv_ends_when_sender_dropped() {
        let (tx, rx) = broadcast::channel(4);
        let mut sub = Subscription::new("current", rx);
        tx.send("next").expect("receiver alive");
        drop(tx);

        assert_eq!(sub.recv().await, Some("current"));
        assert_eq!(sub.recv().await, Some("next"));
        assert_eq!(sub.recv().await, None);
    }
}
