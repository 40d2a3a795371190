//! Publish/subscribe abstraction (mechanics only).
//!
//! The bus distributes messages (write outcomes, in practice) to any number
//! of observers. It makes minimal assumptions:
//!
//! - **Transport-agnostic**: in-memory channels today, anything later.
//! - **Non-blocking**: publishing never waits; receiving is async.
//! - **Broadcast**: every subscription gets a copy of every message published
//!   after it subscribed.
//! - **No persistence**: messages published with no subscriber are gone.

use std::sync::Arc;

use tokio::sync::mpsc;

/// A subscription to a message stream.
///
/// ## Usage Pattern
///
/// ```ignore
/// let mut sub = store.write_events();
///
/// tokio::spawn(async move {
///     while let Some(event) = sub.recv().await {
///         if let WriteEvent::Failed { error, .. } = event {
///             show_toast(error);
///         }
///     }
/// });
/// ```
///
/// Subscriptions are meant for a single consumer. Dropping one unregisters it
/// from the bus on the next publish.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: mpsc::UnboundedReceiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: mpsc::UnboundedReceiver<M>) -> Self {
        Self { receiver }
    }

    /// Wait for the next message. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<M> {
        self.receiver.recv().await
    }

    /// Next buffered message, without waiting.
    pub fn try_recv(&mut self) -> Option<M> {
        self.receiver.try_recv().ok()
    }

    /// Everything currently buffered, without waiting.
    pub fn drain(&mut self) -> Vec<M> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// Domain-agnostic pub/sub bus.
///
/// `publish()` can fail (e.g. poisoned lock in the in-memory bus). Callers
/// decide whether that matters; for write outcomes it is logged and ignored,
/// since the awaited `PendingWrite` still carries the result.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
