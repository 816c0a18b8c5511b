//! Observer registries with stable unsubscribe handles.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

/// Identifies one subscription. Handles are unique across every registry in
/// the process, so a handle can never remove a listener from the wrong list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

impl ListenerHandle {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

pub struct Listeners<F: ?Sized> {
    entries: Mutex<Vec<(ListenerHandle, Arc<F>)>>,
}

impl<F: ?Sized> Listeners<F> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(ListenerHandle, Arc<F>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `listener`. Registering the same callback twice yields two
    /// handles and two invocations per dispatch.
    pub fn subscribe(&self, listener: Arc<F>) -> ListenerHandle {
        let handle = ListenerHandle::next();
        self.lock().push((handle, listener));
        handle
    }

    pub fn unsubscribe(&self, handle: ListenerHandle) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != handle);
        entries.len() != before
    }

    /// Listeners in registration order, as of now. Dispatch iterates a
    /// snapshot so callbacks may subscribe or unsubscribe reentrantly.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        self.lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<F: ?Sized> Default for Listeners<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    type Callback = dyn Fn() + Send + Sync;

    #[test]
    fn duplicate_subscriptions_get_distinct_handles() {
        let listeners: Listeners<Callback> = Listeners::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let callback: Arc<Callback> = {
            let hits = Arc::clone(&hits);
            Arc::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };

        let first = listeners.subscribe(Arc::clone(&callback));
        let second = listeners.subscribe(callback);
        assert_ne!(first, second);

        listeners.snapshot().iter().for_each(|listener| listener());
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        assert!(listeners.unsubscribe(first));
        listeners.snapshot().iter().for_each(|listener| listener());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unsubscribing_unknown_handle_is_a_no_op() {
        let listeners: Listeners<Callback> = Listeners::new();
        let handle = listeners.subscribe(Arc::new(|| {}));
        assert!(listeners.unsubscribe(handle));
        assert!(!listeners.unsubscribe(handle));
        assert!(listeners.is_empty());
    }
}
