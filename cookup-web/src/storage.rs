//! Browser `localStorage` as a [`StorageBackend`].
//!
//! Writes from other tabs arrive as window `storage` events; the bridge
//! forwards each one to the ledger's notifier so open views refresh.

use cookup_core::{ExternalBridge, MemoryBackend, Notifier, StorageBackend, StoreError};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Storage, StorageEvent};

use crate::dom;

pub struct LocalStorageBackend {
    storage: Storage,
}

impl LocalStorageBackend {
    /// Open the window's `localStorage`.
    ///
    /// # Errors
    /// [`StoreError::Unavailable`] when storage is disabled or there is no window.
    pub fn open() -> Result<Self, StoreError> {
        dom::local_storage()
            .map(|storage| Self { storage })
            .map_err(|err| StoreError::Unavailable(dom::js_error_message(&err)))
    }
}

impl StorageBackend for LocalStorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|err| StoreError::Unavailable(dom::js_error_message(&err)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|err| StoreError::WriteRejected(dom::js_error_message(&err)))
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.storage
            .remove_item(key)
            .map_err(|err| StoreError::WriteRejected(dom::js_error_message(&err)))
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let len = self
            .storage
            .length()
            .map_err(|err| StoreError::Unavailable(dom::js_error_message(&err)))?;
        let mut keys = Vec::new();
        for index in 0..len {
            if let Ok(Some(key)) = self.storage.key(index) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn bridge_external(&self, notifier: &Notifier) -> Option<ExternalBridge> {
        let window = dom::window().ok()?;
        let target = notifier.clone();
        let listener = Closure::<dyn FnMut(StorageEvent)>::new(move |event: StorageEvent| {
            // A null key means the other tab cleared storage.
            target.notify_external(event.key().as_deref());
        });
        if let Err(err) =
            window.add_event_listener_with_callback("storage", listener.as_ref().unchecked_ref())
        {
            log::warn!(
                "cross-tab sync disabled: {}",
                dom::js_error_message(&err)
            );
            return None;
        }
        Some(ExternalBridge::new(move || {
            if let Err(err) = window
                .remove_event_listener_with_callback("storage", listener.as_ref().unchecked_ref())
            {
                log::debug!(
                    "storage listener detach failed: {}",
                    dom::js_error_message(&err)
                );
            }
            drop(listener);
        }))
    }
}

/// The storage backend for this platform: `localStorage` in the browser,
/// an in-memory session everywhere else or when the browser refuses.
#[must_use]
pub fn open_backend() -> Box<dyn StorageBackend> {
    #[cfg(target_arch = "wasm32")]
    {
        match LocalStorageBackend::open() {
            Ok(backend) => return Box::new(backend),
            Err(err) => log::warn!("falling back to session storage: {err}"),
        }
    }
    Box::new(MemoryBackend::new())
}
