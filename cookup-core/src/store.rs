//! Persistent store adapter.
//!
//! Ledgers never touch the storage medium directly: they go through
//! [`Store`], which serializes values as JSON text, decodes with documented
//! defaults, emits the written key's topic on the [`Notifier`], and degrades
//! to an in-memory session when the medium stops accepting writes.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::constants::KEY_NAMESPACE;
use crate::notifier::{Notifier, Subscription, Topic};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage write rejected: {0}")]
    WriteRejected(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Keeps a backend's cross-context listener alive; detaches on drop.
pub struct ExternalBridge {
    detach: Option<Box<dyn FnOnce()>>,
}

impl ExternalBridge {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }
}

impl fmt::Debug for ExternalBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalBridge")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

impl Drop for ExternalBridge {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

/// Synchronous string key-value storage.
/// Platform-specific implementations should provide this
pub trait StorageBackend {
    /// Read the raw text stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Persist `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium rejects the write (unavailable, quota).
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`; missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be modified.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    /// Every key currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be enumerated.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Forward changes made by *other* contexts sharing this medium into
    /// `notifier`. Backends without cross-context visibility return `None`.
    fn bridge_external(&self, _notifier: &Notifier) -> Option<ExternalBridge> {
        None
    }
}

impl<T: StorageBackend + ?Sized> StorageBackend for Box<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }

    fn bridge_external(&self, notifier: &Notifier) -> Option<ExternalBridge> {
        (**self).bridge_external(notifier)
    }
}

/// In-memory backend for a single context. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    items: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.items.borrow().keys().cloned().collect())
    }
}

type ExternalListener = Rc<dyn Fn(Option<&str>)>;

#[derive(Default)]
struct MediumInner {
    items: RefCell<BTreeMap<String, String>>,
    listeners: RefCell<Vec<(u64, u64, ExternalListener)>>,
    next_context: Cell<u64>,
    next_listener: Cell<u64>,
}

/// A storage medium shared by several independently running contexts.
///
/// Writes through one [`MediumContext`] are announced to the listeners of
/// every *other* context and never to the writer itself, matching how a
/// browser delivers `storage` events only to the other tabs.
#[derive(Clone, Default)]
pub struct SharedMedium {
    inner: Rc<MediumInner>,
}

impl fmt::Debug for SharedMedium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedMedium")
            .field("items", &self.inner.items.borrow().len())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl SharedMedium {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new context (think: a new tab) onto the medium.
    #[must_use]
    pub fn open_context(&self) -> MediumContext {
        let id = self.inner.next_context.get();
        self.inner.next_context.set(id + 1);
        MediumContext {
            medium: self.clone(),
            id,
        }
    }

    fn broadcast(&self, origin: u64, key: Option<&str>) {
        let targets: Vec<ExternalListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|(ctx, _, _)| *ctx != origin)
            .map(|(_, _, listener)| Rc::clone(listener))
            .collect();
        for listener in targets {
            listener(key);
        }
    }
}

/// One context's view of a [`SharedMedium`].
#[derive(Debug, Clone)]
pub struct MediumContext {
    medium: SharedMedium,
    id: u64,
}

impl MediumContext {
    /// Remove every item, announcing a full clear to the other contexts.
    pub fn clear(&self) {
        self.medium.inner.items.borrow_mut().clear();
        self.medium.broadcast(self.id, None);
    }
}

impl StorageBackend for MediumContext {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.medium.inner.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let previous = self
            .medium
            .inner
            .items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        // Browsers stay silent when the value did not change.
        if previous.as_deref() != Some(value) {
            self.medium.broadcast(self.id, Some(key));
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let removed = self.medium.inner.items.borrow_mut().remove(key);
        if removed.is_some() {
            self.medium.broadcast(self.id, Some(key));
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.medium.inner.items.borrow().keys().cloned().collect())
    }

    fn bridge_external(&self, notifier: &Notifier) -> Option<ExternalBridge> {
        let inner = &self.medium.inner;
        let listener_id = inner.next_listener.get();
        inner.next_listener.set(listener_id + 1);
        let target = notifier.clone();
        inner.listeners.borrow_mut().push((
            self.id,
            listener_id,
            Rc::new(move |key: Option<&str>| target.notify_external(key)),
        ));
        let medium = Rc::downgrade(&self.medium.inner);
        Some(ExternalBridge::new(move || {
            if let Some(inner) = medium.upgrade() {
                inner
                    .listeners
                    .borrow_mut()
                    .retain(|(_, id, _)| *id != listener_id);
            }
        }))
    }
}

/// Typed adapter over a [`StorageBackend`].
pub struct Store<B> {
    backend: B,
    notifier: Notifier,
    overlay: RefCell<BTreeMap<String, Option<String>>>,
    degraded: Cell<bool>,
}

impl<B> fmt::Debug for Store<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("degraded", &self.degraded.get())
            .field("overlay_keys", &self.overlay.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<B: StorageBackend> Store<B> {
    pub fn new(backend: B, notifier: Notifier) -> Self {
        Self {
            backend,
            notifier,
            overlay: RefCell::new(BTreeMap::new()),
            degraded: Cell::new(false),
        }
    }

    #[must_use]
    pub const fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether writes are currently held in memory only.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.get()
    }

    /// Raw text for `key`, preferring values held in the in-memory overlay.
    #[must_use]
    pub fn read_raw(&self, key: &str) -> Option<String> {
        if let Some(held) = self.overlay.borrow().get(key) {
            return held.clone();
        }
        match self.backend.get_item(key) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("reading '{key}' failed, treating as absent: {err}");
                None
            }
        }
    }

    /// Decode `key`, falling back to `T::default()` when missing or malformed.
    #[must_use]
    pub fn read<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        self.read_or(key, T::default)
    }

    /// Decode `key`, falling back to `default()` when missing or malformed.
    pub fn read_or<T>(&self, key: &str, default: impl FnOnce() -> T) -> T
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.read_raw(key) else {
            return default();
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("malformed payload under '{key}', using defaults: {err}");
                default()
            }
        }
    }

    /// Serialize and persist `value`, then announce the key's topic.
    ///
    /// The write is visible to the next `read` in this context even when the
    /// backend rejected it (the store is then degraded to memory).
    ///
    /// # Errors
    ///
    /// Returns an error only if `value` cannot be serialized.
    pub fn write<T>(&self, key: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + ?Sized,
    {
        let text = serde_json::to_string(value)?;
        self.persist(key, Some(text));
        self.notifier.notify_key(key);
        Ok(())
    }

    /// Remove `key` and announce its topic.
    pub fn remove(&self, key: &str) {
        self.persist(key, None);
        self.notifier.notify_key(key);
    }

    /// Remove every key in the application namespace, announcing each topic.
    pub fn clear_namespace(&self) {
        let mut keys: Vec<String> = self.backend.keys().unwrap_or_else(|err| {
            log::warn!("listing storage keys failed: {err}");
            Vec::new()
        });
        keys.extend(self.overlay.borrow().keys().cloned());
        keys.sort();
        keys.dedup();
        let _batch = self.notifier.hold();
        for key in keys.iter().filter(|k| k.starts_with(KEY_NAMESPACE)) {
            self.remove(key);
        }
    }

    /// Register `handler` for `topic` on this store's notifier.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, topic: Topic, handler: impl Fn() + 'static) -> Subscription {
        self.notifier.on_notify(topic, handler)
    }

    fn persist(&self, key: &str, text: Option<String>) {
        if !self.degraded.get() {
            let result = match text.as_deref() {
                Some(text) => self.backend.set_item(key, text),
                None => self.backend.remove_item(key),
            };
            match result {
                Ok(()) => {
                    self.overlay.borrow_mut().remove(key);
                    return;
                }
                Err(err) => {
                    log::warn!("storage write for '{key}' failed, continuing in memory: {err}");
                    self.degraded.set(true);
                }
            }
        }
        self.overlay.borrow_mut().insert(key.to_string(), text);
    }
}

/// Serde helpers that decode a field leniently: a missing or
/// type-mismatched value becomes the field type's default instead of
/// failing the whole record.
pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Use as `#[serde(default, deserialize_with = "lenient::or_default")]`.
    ///
    /// # Errors
    ///
    /// Only fails if the input is not valid JSON at all.
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: serde::de::DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(T::deserialize(value).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient::or_default")]
        count: u32,
        #[serde(default, deserialize_with = "lenient::or_default")]
        label: String,
    }

    struct BrokenBackend;

    impl StorageBackend for BrokenBackend {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::WriteRejected("quota".into()))
        }

        fn remove_item(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }

        fn keys(&self) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }
    }

    #[test]
    fn write_is_immediately_readable() {
        let store = Store::new(MemoryBackend::new(), Notifier::new());
        store
            .write("cookup.sample", &Sample {
                count: 3,
                label: "x".into(),
            })
            .unwrap();
        let read: Sample = store.read("cookup.sample");
        assert_eq!(read.count, 3);
    }

    #[test]
    fn malformed_payload_falls_back_to_default() {
        let backend = MemoryBackend::new();
        backend.set_item("cookup.sample", "{not json").unwrap();
        let store = Store::new(backend, Notifier::new());
        assert_eq!(store.read::<Sample>("cookup.sample"), Sample::default());
    }

    #[test]
    fn lenient_fields_keep_valid_siblings() {
        let backend = MemoryBackend::new();
        backend
            .set_item("cookup.sample", r#"{"count":"seven","label":"kept"}"#)
            .unwrap();
        let store = Store::new(backend, Notifier::new());
        let read: Sample = store.read("cookup.sample");
        assert_eq!(read.count, 0);
        assert_eq!(read.label, "kept");
    }

    #[test]
    fn unavailable_backend_degrades_to_memory() {
        let store = Store::new(BrokenBackend, Notifier::new());
        assert_eq!(store.read::<Sample>("cookup.sample"), Sample::default());
        store
            .write("cookup.sample", &Sample {
                count: 9,
                label: String::new(),
            })
            .unwrap();
        assert!(store.is_degraded());
        assert_eq!(store.read::<Sample>("cookup.sample").count, 9);
        store.remove("cookup.sample");
        assert_eq!(store.read::<Sample>("cookup.sample").count, 0);
    }

    #[test]
    fn writes_announce_the_key_topic() {
        let store = Store::new(MemoryBackend::new(), Notifier::new());
        let hits = Rc::new(Cell::new(0));
        let sink = Rc::clone(&hits);
        let _sub = store.subscribe(Topic::ProfileChanged, move || sink.set(sink.get() + 1));
        store
            .write(crate::constants::KEY_PROFILE, &serde_json::json!({}))
            .unwrap();
        store.write("unrelated", &1).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn shared_medium_notifies_other_contexts_only() {
        let medium = SharedMedium::new();
        let tab_a = medium.open_context();
        let tab_b = medium.open_context();
        let notifier_a = Notifier::new();
        let notifier_b = Notifier::new();
        let _bridge_a = tab_a.bridge_external(&notifier_a);
        let _bridge_b = tab_b.bridge_external(&notifier_b);

        let hits_a = Rc::new(Cell::new(0));
        let hits_b = Rc::new(Cell::new(0));
        let (sink_a, sink_b) = (Rc::clone(&hits_a), Rc::clone(&hits_b));
        let _sa = notifier_a.on_notify(Topic::MasteryChanged, move || sink_a.set(sink_a.get() + 1));
        let _sb = notifier_b.on_notify(Topic::MasteryChanged, move || sink_b.set(sink_b.get() + 1));

        tab_a
            .set_item(crate::constants::KEY_MASTERY, "{}")
            .unwrap();
        assert_eq!(hits_a.get(), 0);
        assert_eq!(hits_b.get(), 1);
        assert_eq!(
            tab_b.get_item(crate::constants::KEY_MASTERY).unwrap().as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn dropping_bridge_detaches_listener() {
        let medium = SharedMedium::new();
        let tab_a = medium.open_context();
        let tab_b = medium.open_context();
        let notifier_b = Notifier::new();
        let hits = Rc::new(Cell::new(0));
        let sink = Rc::clone(&hits);
        let _sub = notifier_b.on_notify(Topic::ProfileChanged, move || sink.set(sink.get() + 1));
        let bridge = tab_b.bridge_external(&notifier_b);
        drop(bridge);
        tab_a
            .set_item(crate::constants::KEY_PROFILE, "{}")
            .unwrap();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn clear_namespace_leaves_foreign_keys() {
        let backend = MemoryBackend::new();
        backend.set_item("other.app", "1").unwrap();
        backend.set_item(crate::constants::KEY_PROFILE, "{}").unwrap();
        let store = Store::new(backend.clone(), Notifier::new());
        store.clear_namespace();
        assert_eq!(backend.keys().unwrap(), vec!["other.app".to_string()]);
    }
}
