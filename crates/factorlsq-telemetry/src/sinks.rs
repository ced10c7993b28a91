//! Pluggable event sinks.
//!
//! Sinks consume events from the bus and process them
//! (log through `tracing`, collect in memory, etc.).

use std::sync::{Arc, Mutex, MutexGuard};

use crate::events::{EventKind, SolveEvent};

/// Trait for event consumers.
///
/// Implement this to create custom telemetry outputs.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &SolveEvent);

    /// Called when the bus is finalized. Flush buffers, close files, etc.
    fn finalize(&mut self) {}

    /// Returns a human-readable name for this sink.
    fn name(&self) -> &str;
}

/// Shared event storage behind a [`VecSink`].
pub type SharedEvents = Arc<Mutex<Vec<SolveEvent>>>;

/// A sink that collects events in memory.
///
/// Clone the sink (or grab [`VecSink::shared`]) before boxing it into the
/// bus; every clone sees the same event list.
#[derive(Clone, Default)]
pub struct VecSink {
    events: SharedEvents,
}

impl VecSink {
    /// Creates an empty vec sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the shared event list.
    pub fn shared(&self) -> SharedEvents {
        Arc::clone(&self.events)
    }

    /// Snapshot of the collected events.
    pub fn events(&self) -> Vec<SolveEvent> {
        self.lock().clone()
    }

    /// Number of collected events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SolveEvent>> {
        // A panicking sink cannot leave the Vec half-written
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SolveEvent) {
        self.lock().push(event.clone());
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// A sink that logs events using the `tracing` crate.
///
/// Failures log at `WARN`; every other event logs at the configured level.
pub struct TracingSink {
    level: tracing::Level,
}

impl TracingSink {
    /// Creates a new tracing sink at the given log level.
    pub fn new(level: tracing::Level) -> Self {
        Self { level }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(tracing::Level::INFO)
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SolveEvent) {
        if let EventKind::Failed { phase, message } = &event.kind {
            tracing::warn!(sequence = event.sequence, phase = %phase, "solve failed: {message}");
            return;
        }

        let label = event.kind.label();
        match self.level {
            tracing::Level::ERROR => {
                tracing::error!(sequence = event.sequence, event = ?event.kind, "{label}")
            }
            tracing::Level::WARN => {
                tracing::warn!(sequence = event.sequence, event = ?event.kind, "{label}")
            }
            tracing::Level::INFO => {
                tracing::info!(sequence = event.sequence, event = ?event.kind, "{label}")
            }
            tracing::Level::DEBUG => {
                tracing::debug!(sequence = event.sequence, event = ?event.kind, "{label}")
            }
            tracing::Level::TRACE => {
                tracing::trace!(sequence = event.sequence, event = ?event.kind, "{label}")
            }
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}
