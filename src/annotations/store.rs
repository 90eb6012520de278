use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::annotations::shape::{Shape, ShapeId};

/// Identifies the image an annotation belongs to: one frame of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageKey {
    pub instance_uid: String,
    pub frame: u32,
}

impl ImageKey {
    pub fn new(instance_uid: impl Into<String>, frame: u32) -> Self {
        Self {
            instance_uid: instance_uid.into(),
            frame,
        }
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.instance_uid, self.frame)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&ImageKey) + Send + Sync>;

/// Annotation shapes grouped per image, in insertion (z) order.
///
/// Every mutation notifies subscribers with the affected key once the store
/// lock has been released, so listeners may read the store.
#[derive(Default)]
pub struct ShapeStore {
    shapes: Mutex<HashMap<ImageKey, Vec<Shape>>>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl ShapeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ImageKey, Vec<Shape>>> {
        self.shapes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the shapes for `key`, oldest first.
    pub fn snapshot(&self, key: &ImageKey) -> Vec<Shape> {
        self.lock().get(key).cloned().unwrap_or_default()
    }

    pub fn find(&self, key: &ImageKey, id: ShapeId) -> Option<Shape> {
        self.lock()
            .get(key)
            .and_then(|shapes| shapes.iter().find(|shape| shape.id() == id).copied())
    }

    pub fn len(&self, key: &ImageKey) -> usize {
        self.lock().get(key).map_or(0, Vec::len)
    }

    pub fn add(&self, key: &ImageKey, shape: Shape) {
        self.lock().entry(key.clone()).or_default().push(shape);
        self.notify(key);
    }

    pub fn remove(&self, key: &ImageKey, id: ShapeId) -> Option<Shape> {
        let removed = {
            let mut shapes = self.lock();
            let list = shapes.get_mut(key)?;
            let position = list.iter().position(|shape| shape.id() == id)?;
            let removed = list.remove(position);
            if list.is_empty() {
                shapes.remove(key);
            }
            removed
        };
        self.notify(key);
        Some(removed)
    }

    /// Mutates the shape `id` in place. Returns `None` when it is not stored
    /// under `key`.
    pub fn update<R>(
        &self,
        key: &ImageKey,
        id: ShapeId,
        edit: impl FnOnce(&mut Shape) -> R,
    ) -> Option<R> {
        let result = {
            let mut shapes = self.lock();
            let shape = shapes
                .get_mut(key)?
                .iter_mut()
                .find(|shape| shape.id() == id)?;
            edit(shape)
        };
        self.notify(key);
        Some(result)
    }

    pub fn clear(&self, key: &ImageKey) {
        if self.lock().remove(key).is_some() {
            self.notify(key);
        }
    }

    pub fn clear_all(&self) {
        let keys: Vec<ImageKey> = self.lock().drain().map(|(key, _)| key).collect();
        for key in &keys {
            self.notify(key);
        }
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&ImageKey) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn notify(&self, key: &ImageKey) {
        let listeners: Vec<Listener> = self
            .lock_listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(key);
        }
    }
}
