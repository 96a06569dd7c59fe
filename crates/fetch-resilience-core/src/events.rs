//! Event system shared by all acquisition-layer components.
//!
//! Each component defines its own event enum and emits instances through an
//! [`EventListeners`] collection configured at construction time.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Trait implemented by every component's event enum.
pub trait ComponentEvent: Send + Sync + fmt::Debug {
    /// Short machine-readable kind, e.g. "state_transition".
    fn event_type(&self) -> &'static str;

    /// When the event occurred.
    fn timestamp(&self) -> Instant;

    /// Name of the component instance that emitted the event.
    fn component(&self) -> &str;
}

/// Trait for receiving component events.
pub trait EventListener<E: ComponentEvent>: Send + Sync {
    /// Called for every emitted event.
    fn on_event(&self, event: &E);
}

type SharedListener<E> = Arc<dyn EventListener<E>>;

/// A collection of listeners attached to one component instance.
#[derive(Clone)]
pub struct EventListeners<E: ComponentEvent> {
    listeners: Vec<SharedListener<E>>,
}

impl<E: ComponentEvent> EventListeners<E> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Adds a listener.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Emits an event to every listener.
    ///
    /// A panicking listener is isolated so the remaining listeners still run.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
        }
    }

    /// Returns true when no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: ComponentEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Function-based listener, the common case for `on_*` builder hooks.
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _marker: std::marker::PhantomData<E>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    /// Wraps a closure as a listener.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: ComponentEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestEvent {
        at: Instant,
    }

    impl ComponentEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            "test"
        }

        fn timestamp(&self) -> Instant {
            self.at
        }

        fn component(&self) -> &str {
            "test-component"
        }
    }

    #[test]
    fn emits_to_every_listener() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&first);
        let s = Arc::clone(&second);

        let mut listeners = EventListeners::new();
        listeners.add(FnListener::new(move |_: &TestEvent| {
            f.fetch_add(1, Ordering::SeqCst);
        }));
        listeners.add(FnListener::new(move |_: &TestEvent| {
            s.fetch_add(1, Ordering::SeqCst);
        }));

        listeners.emit(&TestEvent { at: Instant::now() });
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let reached = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&reached);

        let mut listeners = EventListeners::new();
        listeners.add(FnListener::new(|_: &TestEvent| {
            panic!("listener bug");
        }));
        listeners.add(FnListener::new(move |_: &TestEvent| {
            r.fetch_add(1, Ordering::SeqCst);
        }));

        listeners.emit(&TestEvent { at: Instant::now() });
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }
}
