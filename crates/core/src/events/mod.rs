//! Domain events module.
//!
//! Provides domain event types and the sink trait for emitting events after
//! successful budget writes. Hosts implement or pick a sink to turn events
//! into view refreshes, replacing any process-wide notification bus.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
