//! Named-queue message transport with per-consumer lifecycle handles.
//!
//! The bus is the only transport the core runtime knows about. Queues are
//! created implicitly on first use, publishes to a queue with no consumer
//! are buffered until one attaches, and multiple consumers on one queue
//! compete for messages (each message is delivered to exactly one).
//!
//! # Main types
//!
//! - [`MessagePublisher`] — The publish-only seam handed to agents.
//! - [`MessageBus`] — Publisher plus consumer lifecycle management.
//! - [`MessageHandler`] — Per-consumer inbound callback.
//! - [`InMemoryMessageBus`] — The in-process transport implementation.
//! - [`ConsumerHandle`] — Stops one consumer without touching its siblings.

/// Bus traits and the in-memory implementation.
pub mod bus;

pub use bus::{ConsumerHandle, InMemoryMessageBus, MessageBus, MessageHandler, MessagePublisher};
