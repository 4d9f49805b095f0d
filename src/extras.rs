//! Per-handle side table
//!
//! Collaborators attach their own bookkeeping to a handle under a string
//! key instead of extending the handle record.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Keyed collection of arbitrary owned values
#[derive(Default)]
pub struct Extras {
    entries: BTreeMap<String, Box<dyn Any + Send>>,
}

impl Extras {
    /// Create an empty side table
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a value under `key`, returning the value it replaced
    pub fn insert<T: Any + Send>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> Option<Box<dyn Any + Send>> {
        self.entries.insert(key.into(), Box::new(value))
    }

    /// Borrow the value under `key` if it is a `T`
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries.get(key)?.downcast_ref::<T>()
    }

    /// Mutably borrow the value under `key` if it is a `T`
    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key)?.downcast_mut::<T>()
    }

    /// Detach the value under `key`
    pub fn remove(&mut self, key: &str) -> Option<Box<dyn Any + Send>> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Drop every entry, returning how many were freed
    pub fn free_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}

impl fmt::Debug for Extras {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
