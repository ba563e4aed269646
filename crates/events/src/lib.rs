//! Account notifications and the pub/sub mechanics that carry them.
//!
//! The core never delivers messages itself: it publishes an
//! [`AccountNotification`] after every committed balance change and external
//! notifiers subscribe to the bus.

pub mod bus;
pub mod in_memory_bus;
pub mod notification;

pub use bus::{EventBus, Subscription};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use notification::{AccountNotification, MovementKind};
