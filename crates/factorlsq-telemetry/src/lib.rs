//! # factorlsq-telemetry
//!
//! Event bus for solve telemetry. Emits structured events (assembly,
//! ordering, factorization, solve, failure) that are consumed by
//! pluggable sinks.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SolveEvent};
pub use sinks::{EventSink, TracingSink, VecSink};
