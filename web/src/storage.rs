use concentration_core::{ChangeFeed, KeyValueStore, StorageChange, StoreError};
use gloo::events::EventListener;
use gloo::storage::{LocalStorage, Storage};
use gloo::utils::window;
use wasm_bindgen::{JsCast, JsValue};

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

/// `window.localStorage`, shared by every tab on the same origin.
pub(crate) struct BrowserStorage {
    storage: Option<web_sys::Storage>,
}

impl BrowserStorage {
    /// `LocalStorage::raw()` panics when storage is blocked, so availability is checked first.
    pub(crate) fn new() -> Self {
        let storage = match window().local_storage() {
            Ok(Some(_)) => Some(LocalStorage::raw()),
            Ok(None) => {
                log::warn!("localStorage is not available, progress will not be kept");
                None
            }
            Err(err) => {
                log::warn!("localStorage is blocked: {}", describe(&err));
                None
            }
        };
        Self { storage }
    }

    fn storage(&self) -> Result<&web_sys::Storage, StoreError> {
        self.storage.as_ref().ok_or(StoreError::Unavailable)
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?
            .get_item(key)
            .map_err(|err| StoreError::ReadFailed(describe(&err)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|err| StoreError::WriteRejected(describe(&err)))
    }
}

impl ChangeFeed for BrowserStorage {
    type Subscription = EventListener;

    /// The browser only fires `storage` in the other tabs, never in the one that wrote.
    fn subscribe<F>(&self, mut callback: F) -> EventListener
    where
        F: FnMut(&StorageChange) + 'static,
    {
        EventListener::new(&window(), "storage", move |event| {
            let Some(event) = event.dyn_ref::<web_sys::StorageEvent>() else {
                return;
            };
            // no key means the whole storage was cleared
            let Some(key) = event.key() else {
                return;
            };
            callback(&StorageChange {
                key,
                new_value: event.new_value(),
            });
        })
    }
}
