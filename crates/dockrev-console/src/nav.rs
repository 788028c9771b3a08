use std::sync::{
    Arc, Mutex, MutexGuard, Weak,
    atomic::{AtomicU64, Ordering},
};

use crate::routes::{Route, RouteCodec};

/// Seam to the browser location. The embedding layer implements this over
/// the real history/location APIs; tests implement it in memory.
pub trait AddressBar: Send + Sync {
    fn pathname(&self) -> String;
    /// The fragment including its leading `#`, or an empty string.
    fn hash(&self) -> String;
    /// Push a new history entry for `path` (path addressing mode).
    fn push_path(&self, path: &str);
    /// Rewrite only the fragment (hash addressing mode). In a real embedding
    /// this fires the hash-change event the embedder has wired to
    /// [`Navigator::on_external_change`].
    fn set_hash(&self, hash: &str);
    /// True when the document is an isolated preview frame that must not
    /// rewrite the outer path.
    fn embedded_preview(&self) -> bool {
        false
    }
}

type Listener = Arc<dyn Fn(&Route) + Send + Sync>;
type ListenerSet = Arc<Mutex<Vec<(u64, Listener)>>>;

/// Process-wide broadcast of "the route changed", decoupling route mutation
/// from the subscribers that re-render on it.
///
/// External address changes (back/forward navigation, manual URL edits)
/// enter through [`Navigator::on_external_change`], which the embedder wires
/// once at startup to the history-pop and hash-change events.
pub struct Navigator {
    codec: RouteCodec,
    address: Arc<dyn AddressBar>,
    listeners: ListenerSet,
    next_id: AtomicU64,
}

/// Disposer returned by [`Navigator::subscribe`]; dropping it removes the
/// listener.
pub struct Subscription {
    listeners: Weak<Mutex<Vec<(u64, Listener)>>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).retain(|(id, _)| *id != self.id);
        }
    }
}

impl Navigator {
    pub fn new(codec: RouteCodec, address: Arc<dyn AddressBar>) -> Self {
        Self {
            codec,
            address,
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn current_route(&self) -> Route {
        self.codec
            .decode_address(&self.address.hash(), &self.address.pathname())
    }

    pub fn subscribe(&self, listener: impl Fn(&Route) + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).push((id, Arc::new(listener)));
        Subscription {
            listeners: Arc::downgrade(&self.listeners),
            id,
        }
    }

    /// Move to `route`. The addressing mode is re-evaluated on every call:
    /// hash mode when the current hash is already `#/`-prefixed or the
    /// document is an embedded preview, path mode otherwise.
    pub fn navigate(&self, route: &Route) {
        let path = self.codec.encode(route);
        let hash = self.address.hash();
        let hash_mode = hash.starts_with("#/") || self.address.embedded_preview();

        tracing::debug!(path = %path, hash_mode, "navigate");

        if hash_mode {
            let target = format!("#{path}");
            if hash == target {
                // Writing an identical hash fires no browser event, so the
                // listeners would otherwise never hear about this navigation.
                self.notify(route);
            } else {
                self.address.set_hash(&target);
            }
        } else {
            self.address.push_path(&path);
            self.notify(route);
        }
    }

    /// Re-decode the address and broadcast. Wired once at process start to
    /// the history-pop and hash-change events.
    pub fn on_external_change(&self) {
        let route = self.current_route();
        self.notify(&route);
    }

    fn notify(&self, route: &Route) {
        // Snapshot first so listeners can subscribe or unsubscribe from
        // within a notification pass.
        let snapshot: Vec<Listener> = lock(&self.listeners)
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in snapshot {
            listener(route);
        }
    }
}

fn lock(listeners: &Mutex<Vec<(u64, Listener)>>) -> MutexGuard<'_, Vec<(u64, Listener)>> {
    listeners.lock().unwrap_or_else(|e| e.into_inner())
}
