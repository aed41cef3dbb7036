//! Change notification: payload-free callbacks plus an epoch watch channel.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::watch;
use tracing::trace;

type Callback = Box<dyn FnMut() + Send>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, Arc<Mutex<Callback>>)>,
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Subscribers are called synchronously, in subscription order, once per `notify`.
/// Callbacks receive nothing; they re-query the store.
pub struct Notifier {
    registry: Arc<Mutex<Registry>>,
    epoch_tx: watch::Sender<u64>,
}

impl Notifier {
    pub fn new() -> Self {
        let (epoch_tx, _rx) = watch::channel(0u64);
        Self { registry: Arc::new(Mutex::new(Registry::default())), epoch_tx }
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut() + Send + 'static,
    {
        let mut reg = lock(&self.registry);
        reg.next_id += 1;
        let id = reg.next_id;
        reg.entries.push((id, Arc::new(Mutex::new(Box::new(callback)))));
        Subscription { id, registry: Arc::downgrade(&self.registry) }
    }

    /// Number of change cycles published so far.
    pub fn epoch(&self) -> u64 {
        *self.epoch_tx.borrow()
    }

    /// Receiver that observes the epoch; awaiting `changed()` coalesces bursts naturally.
    pub fn subscribe_epoch(&self) -> watch::Receiver<u64> {
        self.epoch_tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).entries.len()
    }

    pub fn notify(&self) {
        self.epoch_tx.send_modify(|e| *e = e.wrapping_add(1));
        // Call outside the registry lock so callbacks may drop their own subscription.
        let entries: Vec<Arc<Mutex<Callback>>> = lock(&self.registry).entries.iter().map(|(_, cb)| Arc::clone(cb)).collect();
        trace!(subscribers = entries.len(), epoch = self.epoch(), "notify");
        for cb in entries {
            let mut f = lock(&cb);
            (f)();
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by `subscribe`. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}

    /// Keep the callback registered for the notifier's whole lifetime.
    pub fn detach(mut self) {
        self.registry = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(reg) = self.registry.upgrade() {
            lock(&reg).entries.retain(|(id, _)| *id != self.id);
        }
    }
}
