//! notify — in-process subscriptions for structured error records.
//!
//! Scope:
//! - Local pub/sub: the pager and WAL overlay publish a record for every
//!   classified anomaly; subscribers get logging/telemetry hooks.
//! - A Notifier is explicitly constructed and injected into each Pager, so
//!   tests can run isolated instances without cross-talk.
//! - Drop of SubscriptionHandle unsubscribes.
//!
//! Notes:
//! - Callbacks run synchronously in the publishing thread. Keep them fast and
//!   non-blocking; spawn a thread if you need async work.
//! - Publication is safe from multiple threads: the subscriber set is locked
//!   only while cloning callbacks, and each record is delivered whole.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::error::RepairError;

type Callback = Arc<dyn Fn(&RepairError) + Send + Sync + 'static>;

#[derive(Default)]
struct NotifyInner {
    next_id: u64,
    subs: HashMap<u64, Callback>,
}

/// Subscriber registry (one per recovery context; share via Arc).
pub struct Notifier {
    inner: Mutex<NotifyInner>,
}

impl Notifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(NotifyInner::default()),
        })
    }

    /// Subscribe for every published record.
    /// Returns a handle; dropping it unsubscribes.
    pub fn subscribe(self: &Arc<Self>, cb: Callback) -> SubscriptionHandle {
        let mut g = self.inner.lock().unwrap();
        let id = g.next_id;
        g.next_id = g.next_id.wrapping_add(1);
        g.subs.insert(id, cb);
        drop(g);
        SubscriptionHandle {
            id,
            reg: Arc::downgrade(self),
        }
    }

    /// Publish a record to all current subscribers.
    pub fn notify(&self, error: &RepairError) {
        let callbacks: Vec<Callback> = {
            let g = self.inner.lock().unwrap();
            g.subs.values().cloned().collect()
        };
        // Execute outside the lock
        for cb in callbacks {
            cb(error);
        }
    }

    fn unsubscribe(&self, id: u64) {
        let mut g = self.inner.lock().unwrap();
        g.subs.remove(&id);
    }
}

/// RAII handle: unsubscribes on drop.
pub struct SubscriptionHandle {
    id: u64,
    reg: Weak<Notifier>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(reg) = self.reg.upgrade() {
            reg.unsubscribe(self.id);
        }
    }
}

/// Helper for building callbacks without spelling the Arc type.
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&RepairError) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Severity};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn publish_and_unsubscribe() {
        let reg = Notifier::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = {
            let hits = hits.clone();
            reg.subscribe(callback(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }))
        };

        let e = RepairError::new(ErrorKind::Notice, Severity::Notice).with_message("hi");
        reg.notify(&e);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        drop(h);
        reg.notify(&e);
        assert_eq!(hits.load(Ordering::SeqCst), 1, "dropped handle must not fire");
    }

    #[test]
    fn registries_are_isolated() {
        let a = Notifier::new();
        let b = Notifier::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let _h = {
            let hits = hits.clone();
            a.subscribe(callback(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }))
        };
        b.notify(&RepairError::new(ErrorKind::Notice, Severity::Notice));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
