//! Name-ordered handle set
//!
//! Keeps filled handles sorted with [`compare_by_name`] and tears them all
//! down through [`FileHandleManager::container_free`].

use std::cmp::Ordering;

use tracing::debug;

use crate::handle::{compare_by_name, FileHandle, FileHandleManager};

/// Handles keyed and ordered by file name
#[derive(Debug, Default)]
pub struct HandleSet {
    /// Sorted by name, no duplicates
    handles: Vec<FileHandle>,
}

impl HandleSet {
    /// Create a new empty set
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Result<usize, usize> {
        self.handles.binary_search_by(|h| {
            h.name()
                .map_or(Ordering::Less, |existing| existing.cmp(name))
        })
    }

    /// Insert a handle, returning any handle previously stored under its name
    ///
    /// # Panics
    /// The handle must have a name.
    pub fn insert(&mut self, handle: FileHandle) -> Option<FileHandle> {
        match self
            .handles
            .binary_search_by(|existing| compare_by_name(existing, &handle))
        {
            Ok(idx) => Some(std::mem::replace(&mut self.handles[idx], handle)),
            Err(idx) => {
                self.handles.insert(idx, handle);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FileHandle> {
        let idx = self.position(name).ok()?;
        self.handles.get(idx)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FileHandle> {
        let idx = self.position(name).ok()?;
        self.handles.get_mut(idx)
    }

    /// Take a handle out of the set without releasing it
    pub fn remove(&mut self, name: &str) -> Option<FileHandle> {
        let idx = self.position(name).ok()?;
        Some(self.handles.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Handles in name order
    pub fn iter(&self) -> impl Iterator<Item = &FileHandle> {
        self.handles.iter()
    }

    /// Names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handles.iter().filter_map(FileHandle::name)
    }

    /// Release every handle
    ///
    /// # Returns
    /// Number of handles whose release reported a close failure
    pub fn free_all(self, manager: &FileHandleManager) -> usize {
        let total = self.handles.len();
        let failures = self
            .handles
            .into_iter()
            .map(|h| manager.container_free(h, None))
            .filter(Result::is_err)
            .count();

        debug!(total = total, failures = failures, "Freed handle set");
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::BehaviorFlags;
    use crate::handle::tests::FakeOps;
    use crate::logging::CaptureSink;
    use nix::fcntl::OFlag;
    use nix::sys::stat::Mode;
    use std::sync::Arc;

    fn named(manager: &FileHandleManager, name: &str) -> FileHandle {
        manager.fill(None, name, OFlag::empty(), Mode::empty(), BehaviorFlags::empty())
    }

    fn fake_manager() -> (Arc<FakeOps>, FileHandleManager) {
        let fake = Arc::new(FakeOps::starting_at(20));
        let manager = FileHandleManager::with_parts(fake.clone(), Arc::new(CaptureSink::new()));
        (fake, manager)
    }

    #[test]
    fn test_sorted_by_name() {
        let (_fake, manager) = fake_manager();
        let mut set = HandleSet::new();

        for name in ["/var/c", "/etc/a", "/tmp/b"] {
            assert!(set.insert(named(&manager, name)).is_none());
        }

        assert_eq!(set.names().collect::<Vec<_>>(), vec!["/etc/a", "/tmp/b", "/var/c"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_insert_replaces_same_name() {
        let (_fake, manager) = fake_manager();
        let mut set = HandleSet::new();

        set.insert(named(&manager, "/a"));
        let mut second = named(&manager, "/a");
        second.extras_mut().insert("tag", 2u8);

        let old = set.insert(second).unwrap();
        assert!(old.extras().is_none());
        assert_eq!(set.len(), 1);
        assert!(set.get("/a").unwrap().extras().unwrap().contains("tag"));
    }

    #[test]
    fn test_lookup_and_remove() {
        let (_fake, manager) = fake_manager();
        let mut set = HandleSet::new();
        set.insert(named(&manager, "/a"));
        set.insert(named(&manager, "/b"));

        manager.open(set.get_mut("/b").unwrap()).unwrap();
        assert!(set.get("/b").unwrap().is_open());
        assert!(set.get("/missing").is_none());

        let removed = set.remove("/a").unwrap();
        assert_eq!(removed.name(), Some("/a"));
        assert!(set.remove("/a").is_none());
        assert_eq!(set.iter().count(), 1);
    }

    #[test]
    fn test_free_all_releases_each() {
        let (fake, manager) = fake_manager();
        let mut set = HandleSet::new();

        for name in ["/x", "/y"] {
            let mut h = named(&manager, name);
            manager.open(&mut h).unwrap();
            set.insert(h);
        }
        set.insert(named(&manager, "/z"));

        assert_eq!(set.free_all(&manager), 0);
        let mut closed = fake.closed.lock().unwrap().clone();
        closed.sort();
        assert_eq!(closed, vec![20, 21]);
    }

    #[test]
    fn test_free_all_counts_close_failures() {
        let manager = FileHandleManager::with_parts(
            Arc::new(FakeOps::failing_close(nix::errno::Errno::EIO)),
            Arc::new(CaptureSink::new()),
        );
        let mut set = HandleSet::new();

        let mut open = named(&manager, "/open");
        manager.open(&mut open).unwrap();
        set.insert(open);
        set.insert(named(&manager, "/closed"));

        assert_eq!(set.free_all(&manager), 1);
    }

    #[test]
    fn test_empty_set() {
        let (_fake, manager) = fake_manager();
        let set = HandleSet::new();
        assert!(set.is_empty());
        assert_eq!(set.free_all(&manager), 0);
    }
}
