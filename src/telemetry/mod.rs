//! Telemetry bus: pub/sub of typed events (spec §4.3, §6.5).
//!
//! Listeners are opaque to producers — a `Listener` is a value implementing
//! a single `emit` capability, per spec §9 ("avoid inheritance: listeners
//! are values implementing a single `emit(event)` capability"). Invocation
//! is synchronous and in registration order; a listener panic/failure must
//! not propagate or halt the bus, matching the teacher's pattern of never
//! letting telemetry plumbing take down the caller.

pub mod event;

pub use event::{CacheAction, CacheEventSource, Event, TelemetryEvent};

use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A telemetry listener. `emit` receives each event as it is published.
pub trait Listener: Send + Sync {
    /// Handle one event. Implementations must not panic in normal
    /// operation; if they do, the bus contains it and logs a warning
    /// rather than letting it propagate to the producer.
    fn emit(&self, event: &TelemetryEvent);
}

/// An opaque handle returned by `TelemetryBus::register`, used to
/// `unregister` later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    listener: Arc<dyn Listener>,
}

/// Typed event pub/sub bus (spec §4.3).
#[derive(Default)]
pub struct TelemetryBus {
    listeners: RwLock<Vec<Registration>>,
    next_id: AtomicU64,
}

impl TelemetryBus {
    /// Construct an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, returning a handle for later `unregister`.
    /// Listeners are invoked in registration order.
    pub fn register(&self, listener: Arc<dyn Listener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .write()
            .push(Registration { id, listener });
        id
    }

    /// Remove a previously registered listener. No-op if already removed.
    pub fn unregister(&self, id: ListenerId) {
        self.listeners.write().retain(|r| r.id != id);
    }

    /// The number of currently registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Emit an event to every registered listener, synchronously, in
    /// registration order. A listener panic is caught and logged; it does
    /// not stop dispatch to subsequent listeners and never propagates to
    /// the caller (spec §4.3: "a listener failure MUST NOT propagate").
    pub fn emit(&self, event: Event) {
        self.emit_envelope(TelemetryEvent::new(event));
    }

    /// Emit a pre-built envelope (used when a producer wants to attach
    /// metadata via `TelemetryEvent::with_metadata`).
    pub fn emit_envelope(&self, envelope: TelemetryEvent) {
        let listeners = self.listeners.read();
        for registration in listeners.iter() {
            let listener = registration.listener.clone();
            let envelope_ref = &envelope;
            let result = catch_unwind(AssertUnwindSafe(|| listener.emit(envelope_ref)));
            if result.is_err() {
                tracing::warn!(
                    listener_id = registration.id.0,
                    "telemetry listener panicked; continuing dispatch"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingListener(Arc<AtomicUsize>);

    impl Listener for CountingListener {
        fn emit(&self, _event: &TelemetryEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct PanickingListener;

    impl Listener for PanickingListener {
        fn emit(&self, _event: &TelemetryEvent) {
            panic!("boom");
        }
    }

    #[test]
    fn dispatches_to_all_listeners_in_order() {
        let bus = TelemetryBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.register(Arc::new(CountingListener(count.clone())));
        bus.register(Arc::new(CountingListener(count.clone())));
        bus.emit(Event::ParseStart {
            request_id: "r1".to_string(),
        });
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unregister_stops_future_dispatch() {
        let bus = TelemetryBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let id = bus.register(Arc::new(CountingListener(count.clone())));
        bus.unregister(id);
        bus.emit(Event::ParseStart {
            request_id: "r1".to_string(),
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn a_panicking_listener_does_not_stop_dispatch_or_propagate() {
        let bus = TelemetryBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.register(Arc::new(PanickingListener));
        bus.register(Arc::new(CountingListener(count.clone())));
        bus.emit(Event::ParseStart {
            request_id: "r1".to_string(),
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
