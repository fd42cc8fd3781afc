//! Reload notification for service facades.

/// Event passed to listeners after a service successfully reloaded.
#[derive(Debug, Clone)]
pub struct ReloadEvent {
    service_name: String,
}

impl ReloadEvent {
    pub(crate) fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Name of the service that reloaded.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

/// Observer notified synchronously after every successful service load.
///
/// Listeners run in registration order. A panicking listener is isolated and
/// logged; the remaining listeners still run.
pub trait LoadedListener: Send + Sync {
    /// Called after the service swapped in freshly loaded maps.
    fn on_reload(&self, event: &ReloadEvent);
}

/// Dispatch `event` to every listener, isolating per-listener failures.
pub(crate) fn dispatch(listeners: &[Box<dyn LoadedListener>], event: &ReloadEvent) {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    for listener in listeners {
        let outcome = catch_unwind(AssertUnwindSafe(|| listener.on_reload(event)));
        if outcome.is_err() {
            #[cfg(feature = "audit")]
            log::warn!(
                "reload listener for service '{}' failed; continuing with remaining listeners",
                event.service_name()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting(Arc<AtomicUsize>);
    impl LoadedListener for Counting {
        fn on_reload(&self, _event: &ReloadEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Panicking;
    impl LoadedListener for Panicking {
        fn on_reload(&self, _event: &ReloadEvent) {
            panic!("listener blew up");
        }
    }

    #[test]
    fn test_panicking_listener_does_not_stop_others() {
        let count = Arc::new(AtomicUsize::new(0));
        let listeners: Vec<Box<dyn LoadedListener>> = vec![
            Box::new(Counting(count.clone())),
            Box::new(Panicking),
            Box::new(Counting(count.clone())),
        ];

        dispatch(&listeners, &ReloadEvent::new("default"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
