//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus is how the banking core surfaces balance changes to outside
//! collaborators (mail notifiers, statement writers). It is intentionally
//! lightweight:
//!
//! - **Transport-agnostic**: in-memory channels today, anything `Send + Sync` tomorrow
//! - **Best-effort**: a failed publish never rolls back the financial operation
//!   that produced the notification
//! - **No persistence**: the ledger history is the source of truth
//!
//! Consumers must tolerate gaps: a subscriber that falls behind or is dropped
//! simply stops receiving notifications.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to a notification stream.
///
/// Each subscription gets a copy of every message published after it was
/// created (broadcast semantics).
///
/// ## Usage Pattern
///
/// ```ignore
/// let subscription = bank.subscribe();
///
/// loop {
///     match subscription.recv_timeout(Duration::from_secs(1)) {
///         Ok(notification) => notifier.send(notification),
///         Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,  // Check for shutdown
///         Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,  // Bus closed
///     }
/// }
/// ```
///
/// Subscriptions are designed for single-threaded consumption.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently queued without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// ```text
/// deposit / withdraw / transfer leg → (locks released) → EventBus::publish → subscribers
/// ```
///
/// `publish()` must not block on slow consumers. Failures are reported to the
/// caller, which logs them and carries on.
///
/// The trait requires `Send + Sync`: many threads publish concurrently.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

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
