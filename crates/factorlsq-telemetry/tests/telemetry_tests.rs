//! Integration tests for factorlsq-telemetry.

use factorlsq_telemetry::bus::EventBus;
use factorlsq_telemetry::events::{EventKind, SolveEvent};
use factorlsq_telemetry::sinks::{EventSink, TracingSink, VecSink};

fn assembled() -> EventKind {
    EventKind::Assembled {
        rows: 2,
        cols: 2,
        nnz: 4,
        elapsed: 0.001,
    }
}

// ─── Bus Tests ────────────────────────────────────────────────

#[test]
fn emit_and_flush() {
    let mut bus = EventBus::new();
    let sink = VecSink::new();
    bus.add_sink(Box::new(sink.clone()));

    bus.emit(assembled());
    bus.emit(EventKind::OrderingComputed {
        policy: "COLAMD".into(),
        elapsed: 0.0,
    });
    assert!(sink.is_empty(), "events are delivered on flush only");

    assert_eq!(bus.flush(), 2);
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].sequence, 0);
    assert_eq!(events[1].sequence, 1);
    assert_eq!(events[1].kind.label(), "ordering_computed");
}

#[test]
fn disabled_bus_drops_events() {
    let mut bus = EventBus::new();
    let sink = VecSink::new();
    bus.add_sink(Box::new(sink.clone()));
    bus.set_enabled(false);
    bus.emit(assembled());
    assert_eq!(bus.flush(), 0);
    assert!(sink.is_empty());

    // Dropped events do not consume sequence numbers
    bus.set_enabled(true);
    bus.emit(assembled());
    bus.flush();
    assert_eq!(sink.events()[0].sequence, 0);
}

#[test]
fn multiple_sinks_see_every_event() {
    let mut bus = EventBus::new();
    let a = VecSink::new();
    let b = VecSink::new();
    bus.add_sink(Box::new(a.clone()));
    bus.add_sink(Box::new(b.clone()));
    bus.add_sink(Box::new(TracingSink::default()));
    assert_eq!(bus.sink_count(), 3);

    bus.emit(assembled());
    bus.emit(EventKind::Failed {
        phase: "factorization".into(),
        message: "zero pivot".into(),
    });
    bus.finalize();
    assert_eq!(a.events(), b.events());
    assert_eq!(a.len(), 2);
}

#[test]
fn shared_handle_tracks_sink() {
    let mut sink = VecSink::new();
    let shared = sink.shared();
    sink.handle(&SolveEvent::new(7, assembled()));
    assert_eq!(shared.lock().unwrap()[0].sequence, 7);
    assert_eq!(sink.name(), "vec_sink");
}

// ─── Event Tests ──────────────────────────────────────────────

#[test]
fn event_serialization() {
    let event = SolveEvent::new(
        5,
        EventKind::Solved {
            unknowns: 3,
            residual_norm: Some(1e-12),
            elapsed: 0.002,
        },
    );
    let json = serde_json::to_string(&event).unwrap();
    let recovered: SolveEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, event);
}

#[test]
fn failure_event_carries_phase() {
    let event = SolveEvent::new(
        1,
        EventKind::Failed {
            phase: "ordering".into(),
            message: "unsupported ordering".into(),
        },
    );
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("ordering"));
    assert_eq!(event.kind.label(), "failed");
}

#[test]
fn custom_event_label() {
    let kind = EventKind::Custom {
        label: "checkpoint".into(),
        payload: "{}".into(),
    };
    assert_eq!(kind.label(), "checkpoint");
}
