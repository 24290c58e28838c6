//! In-process event bus for job lifecycle events.
//!
//! Fan-out is synchronous from the publisher's viewpoint: handlers run in
//! subscription order, each under a bounded timeout. A slow handler is
//! abandoned (its task keeps running but its outcome is ignored) and a
//! failing handler never prevents later handlers from seeing the event.

pub mod bus;
pub mod handlers;

pub use bus::{EventBus, EventBusConfig, EventBusStats, EventHandler};
pub use handlers::LoggingEventHandler;
