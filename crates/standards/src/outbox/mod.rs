//! Publishes persisted domain events to the event bus.

mod worker;

pub use worker::OutboxWorker;
