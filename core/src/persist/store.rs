use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::StoreError;

/// String key-value storage shared by every open instance of the game.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// A write made through another handle of the same storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
}

/// Storage that reports writes made by other contexts, like the browser `storage` event.
pub trait ChangeFeed {
    /// Keeps the callback registered until dropped.
    type Subscription;

    fn subscribe<F>(&self, callback: F) -> Self::Subscription
    where
        F: FnMut(&StorageChange) + 'static;
}

type Listener = Box<dyn FnMut(&StorageChange)>;

struct Registration {
    id: u64,
    handle: usize,
    listener: Listener,
}

#[derive(Default)]
struct Shared {
    entries: BTreeMap<String, String>,
    registrations: Vec<Registration>,
    next_handle: usize,
    next_id: u64,
    rejecting_writes: bool,
}

/// In-memory storage. Handles made with [`MemoryStore::connect`] share entries and
/// see each other's writes through [`ChangeFeed`], the way browser tabs share
/// `localStorage`.
pub struct MemoryStore {
    shared: Rc<RefCell<Shared>>,
    handle: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            shared: Default::default(),
            handle: 0,
        }
    }

    /// Another context on the same storage.
    pub fn connect(&self) -> Self {
        let mut shared = self.shared.borrow_mut();
        shared.next_handle += 1;
        Self {
            shared: Rc::clone(&self.shared),
            handle: shared.next_handle,
        }
    }

    /// Makes every following write fail, as a full or disabled storage would.
    pub fn reject_writes(&self, rejecting: bool) {
        self.shared.borrow_mut().rejecting_writes = rejecting;
    }

    pub fn len(&self) -> usize {
        self.shared.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn notify(&self, change: StorageChange) {
        // listeners run without the borrow held so they can read the store
        let mut registrations = core::mem::take(&mut self.shared.borrow_mut().registrations);
        for registration in registrations
            .iter_mut()
            .filter(|registration| registration.handle != self.handle)
        {
            (registration.listener)(&change);
        }
        let mut shared = self.shared.borrow_mut();
        registrations.append(&mut shared.registrations);
        shared.registrations = registrations;
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.shared.borrow().entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        {
            let mut shared = self.shared.borrow_mut();
            if shared.rejecting_writes {
                return Err(StoreError::WriteRejected("quota exceeded".into()));
            }
            shared.entries.insert(key.into(), value.into());
        }
        self.notify(StorageChange {
            key: key.into(),
            new_value: Some(value.into()),
        });
        Ok(())
    }
}

pub struct MemorySubscription {
    shared: Weak<RefCell<Shared>>,
    id: u64,
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            if let Ok(mut shared) = shared.try_borrow_mut() {
                shared.registrations.retain(|registration| registration.id != self.id);
            }
        }
    }
}

impl ChangeFeed for MemoryStore {
    type Subscription = MemorySubscription;

    fn subscribe<F>(&self, callback: F) -> MemorySubscription
    where
        F: FnMut(&StorageChange) + 'static,
    {
        let mut shared = self.shared.borrow_mut();
        shared.next_id += 1;
        let id = shared.next_id;
        shared.registrations.push(Registration {
            id,
            handle: self.handle,
            listener: Box::new(callback),
        });
        MemorySubscription {
            shared: Rc::downgrade(&self.shared),
            id,
        }
    }
}
