//! Event bus — channel-backed event dispatch with pluggable sinks.
//!
//! The bus uses `std::sync::mpsc` so producers only need `&self`.
//! Events queue in the channel until [`EventBus::flush`] hands them to
//! every registered sink in emission order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;

use crate::events::{EventKind, SolveEvent};
use crate::sinks::EventSink;

/// Event bus for solve telemetry.
pub struct EventBus {
    /// Channel sender.
    sender: mpsc::Sender<SolveEvent>,
    /// Channel receiver, drained on flush.
    receiver: mpsc::Receiver<SolveEvent>,
    /// Registered sinks.
    sinks: Vec<Box<dyn EventSink>>,
    /// Next sequence number handed out by `emit`.
    next_sequence: AtomicU64,
    /// Whether the bus is active. Disabled bus is a no-op.
    enabled: bool,
}

impl EventBus {
    /// Creates a new event bus with no sinks.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            sinks: Vec::new(),
            next_sequence: AtomicU64::new(0),
            enabled: true,
        }
    }

    /// Registers a sink to receive events.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Enables or disables the bus. Disabled bus drops events silently.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns true if the bus is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Emit an event payload, stamping it with the next sequence number.
    /// If the bus is disabled, this is a no-op and no number is consumed.
    pub fn emit(&self, kind: EventKind) {
        if !self.enabled {
            return;
        }
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        // The receiver lives as long as the bus, so send cannot fail here
        let _ = self.sender.send(SolveEvent::new(sequence, kind));
    }

    /// Flush all pending events to registered sinks.
    ///
    /// Returns the number of events dispatched.
    pub fn flush(&mut self) -> usize {
        let mut dispatched = 0;
        while let Ok(event) = self.receiver.try_recv() {
            for sink in &mut self.sinks {
                sink.handle(&event);
            }
            dispatched += 1;
        }
        dispatched
    }

    /// Flush pending events, then finalize every sink.
    pub fn finalize(&mut self) {
        self.flush();
        for sink in &mut self.sinks {
            sink.finalize();
        }
    }

    /// Returns the number of registered sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
