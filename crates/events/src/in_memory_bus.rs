//! In-memory pub/sub bus.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::bus::{EventBus, Subscription};

#[derive(Debug)]
pub enum InMemoryBusError {
    /// The subscriber list lock was poisoned by a panicking publisher.
    Poisoned,
}

impl<T> From<PoisonError<T>> for InMemoryBusError {
    fn from(_: PoisonError<T>) -> Self {
        InMemoryBusError::Poisoned
    }
}

/// Fan-out bus over unbounded tokio channels.
///
/// Publishing never blocks. Subscribers whose receiving side is gone are
/// forgotten on the next publish.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    fn senders(&self) -> Result<MutexGuard<'_, Vec<mpsc::UnboundedSender<M>>>, InMemoryBusError> {
        Ok(self.subscribers.lock()?)
    }

    /// Subscribers known to the bus; dropped ones count until the next publish.
    pub fn subscriber_count(&self) -> usize {
        self.senders().map(|s| s.len()).unwrap_or(0)
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let mut senders = self.senders()?;
        let Some((last, rest)) = senders.split_last() else {
            return Ok(());
        };

        let mut dead = vec![false; rest.len() + 1];
        for (i, tx) in rest.iter().enumerate() {
            dead[i] = tx.send(message.clone()).is_err();
        }
        dead[rest.len()] = last.send(message).is_err();

        let mut flags = dead.into_iter();
        senders.retain(|_| !flags.next().unwrap_or(false));
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::unbounded_channel();
        // On a poisoned lock the receiver is returned unregistered and stays silent.
        if let Ok(mut senders) = self.senders() {
            senders.push(tx);
        }
        Subscription::new(rx)
    }
}
