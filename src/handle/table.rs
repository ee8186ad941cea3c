// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Handle table with generational sweep
//!
//! The table is the only owner of kernel-resident objects. Hashes are
//! assigned sequentially by the table; an optional content fingerprint lets a
//! structurally identical object reuse the live entry instead of minting a
//! second one. Reclamation is mark-and-sweep: every produce/reference stamps
//! `last_seen_run`, and [`HandleTable::sweep`] drops whatever was not stamped
//! recently enough.

use super::Handle;
use ahash::AHashMap;

/// SHA-256 digest of an object's content
pub type Fingerprint = [u8; 32];

/// A live table entry
#[derive(Debug)]
pub struct Entry<T> {
    object: T,
    kind: String,
    fingerprint: Option<Fingerprint>,
    last_seen_run: u64,
}

impl<T> Entry<T> {
    pub fn object(&self) -> &T {
        &self.object
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn last_seen_run(&self) -> u64 {
        self.last_seen_run
    }
}

/// Outcome of [`HandleTable::register`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub handle: Handle,
    /// True when an existing entry with the same fingerprint was returned
    pub reused: bool,
}

/// Type-erased map from hash to owned kernel object
#[derive(Debug)]
pub struct HandleTable<T> {
    entries: AHashMap<u64, Entry<T>>,
    by_fingerprint: AHashMap<Fingerprint, u64>,
    next_hash: u64,
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        Self {
            entries: AHashMap::new(),
            by_fingerprint: AHashMap::new(),
            next_hash: 1,
        }
    }

    /// Hand out a fresh hash without creating an entry yet
    pub fn reserve_hash(&mut self) -> u64 {
        let hash = self.next_hash;
        self.next_hash += 1;
        hash
    }

    /// Live handle for a fingerprint, if one is registered
    pub fn lookup_fingerprint(&self, fingerprint: &Fingerprint) -> Option<Handle> {
        let hash = self.by_fingerprint.get(fingerprint)?;
        self.entries
            .get(hash)
            .map(|entry| Handle::new(*hash, entry.kind.clone()))
    }

    /// Store `object` and return its handle, reusing a live entry with the
    /// same fingerprint when there is one.
    pub fn register(
        &mut self,
        object: T,
        kind: &str,
        fingerprint: Option<Fingerprint>,
        run: u64,
    ) -> Registration {
        if let Some(existing) = fingerprint.as_ref().and_then(|fp| self.lookup_fingerprint(fp)) {
            self.touch(existing.hash, run);
            return Registration {
                handle: existing,
                reused: true,
            };
        }

        let hash = self.reserve_hash();
        let handle = self.insert_reserved(hash, object, kind, fingerprint, run);
        Registration {
            handle,
            reused: false,
        }
    }

    /// Insert under a hash previously obtained from [`Self::reserve_hash`].
    ///
    /// First registration wins: if the hash or fingerprint is already live the
    /// new object is dropped and the live entry is stamped instead.
    pub fn insert_reserved(
        &mut self,
        hash: u64,
        object: T,
        kind: &str,
        fingerprint: Option<Fingerprint>,
        run: u64,
    ) -> Handle {
        if let Some(existing) = fingerprint.as_ref().and_then(|fp| self.lookup_fingerprint(fp)) {
            self.touch(existing.hash, run);
            return existing;
        }
        if let Some(entry) = self.entries.get_mut(&hash) {
            entry.last_seen_run = entry.last_seen_run.max(run);
            return Handle::new(hash, entry.kind.clone());
        }

        if let Some(fp) = fingerprint {
            self.by_fingerprint.insert(fp, hash);
        }
        self.entries.insert(
            hash,
            Entry {
                object,
                kind: kind.to_string(),
                fingerprint,
                last_seen_run: run,
            },
        );
        Handle::new(hash, kind)
    }

    pub fn resolve(&self, handle: &Handle) -> Option<&T> {
        self.entries.get(&handle.hash).map(|entry| &entry.object)
    }

    pub fn contains(&self, hash: u64) -> bool {
        self.entries.contains_key(&hash)
    }

    pub fn entry(&self, hash: u64) -> Option<&Entry<T>> {
        self.entries.get(&hash)
    }

    /// Mark an entry as seen during `run`. Stamps never move backwards.
    pub fn touch(&mut self, hash: u64, run: u64) -> bool {
        match self.entries.get_mut(&hash) {
            Some(entry) => {
                entry.last_seen_run = entry.last_seen_run.max(run);
                true
            }
            None => false,
        }
    }

    /// Drop every entry last seen before `run`, returning how many went
    pub fn sweep(&mut self, run: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.last_seen_run >= run);
        let entries = &self.entries;
        self.by_fingerprint.retain(|_, hash| entries.contains_key(hash));
        before - self.entries.len()
    }

    /// Release a single entry ahead of the next sweep
    pub fn remove(&mut self, hash: u64) -> Option<T> {
        let entry = self.entries.remove(&hash)?;
        if let Some(fp) = entry.fingerprint {
            self.by_fingerprint.remove(&fp);
        }
        Some(entry.object)
    }

    /// Drop everything. Hashes keep counting up so old handles stay stale.
    pub fn clear(&mut self) -> usize {
        let freed = self.entries.len();
        self.entries.clear();
        self.by_fingerprint.clear();
        freed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &Entry<T>)> {
        self.entries.iter().map(|(hash, entry)| (*hash, entry))
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fp(byte: u8) -> Fingerprint {
        [byte; 32]
    }

    #[test]
    fn test_register_assigns_distinct_hashes() {
        let mut table = HandleTable::new();
        let a = table.register("a", "TopoDSSolidPointer", None, 0);
        let b = table.register("b", "TopoDSSolidPointer", None, 0);

        assert_ne!(a.handle.hash, b.handle.hash);
        assert_eq!(table.resolve(&a.handle), Some(&"a"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_same_fingerprint_reuses_entry() {
        let mut table = HandleTable::new();
        let first = table.register("box", "TopoDSSolidPointer", Some(fp(1)), 0);
        let second = table.register("box again", "TopoDSSolidPointer", Some(fp(1)), 1);

        assert!(!first.reused);
        assert!(second.reused);
        assert_eq!(first.handle, second.handle);
        assert_eq!(table.len(), 1);
        // First registration wins, but the stamp moves forward
        assert_eq!(table.resolve(&first.handle), Some(&"box"));
        assert_eq!(table.entry(first.handle.hash).unwrap().last_seen_run(), 1);
    }

    #[test]
    fn test_touch_never_decreases() {
        let mut table = HandleTable::new();
        let reg = table.register(1u32, "TopoDSVertexPointer", None, 5);
        table.touch(reg.handle.hash, 3);
        assert_eq!(table.entry(reg.handle.hash).unwrap().last_seen_run(), 5);
        assert!(!table.touch(999, 5));
    }

    #[test]
    fn test_sweep_drops_stale_entries_and_runs_destructors() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let mut table = HandleTable::new();

        let old = table.register(Tracked(dropped.clone()), "TopoDSSolidPointer", Some(fp(1)), 0);
        let kept = table.register(Tracked(dropped.clone()), "TopoDSSolidPointer", Some(fp(2)), 0);
        table.touch(kept.handle.hash, 1);

        let freed = table.sweep(1);
        assert_eq!(freed, 1);
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
        assert!(table.resolve(&old.handle).is_none());
        assert!(table.resolve(&kept.handle).is_some());
        // The fingerprint index no longer points at the freed hash
        assert!(table.lookup_fingerprint(&fp(1)).is_none());
        assert_eq!(table.lookup_fingerprint(&fp(2)), Some(kept.handle));
    }

    #[test]
    fn test_hashes_are_not_recycled_after_clear() {
        let mut table = HandleTable::new();
        let a = table.register("a", "TopoDSSolidPointer", None, 0);
        assert_eq!(table.clear(), 1);
        let b = table.register("b", "TopoDSSolidPointer", None, 0);
        assert!(b.handle.hash > a.handle.hash);
        assert!(table.resolve(&a.handle).is_none());
    }

    #[test]
    fn test_insert_reserved_first_registration_wins() {
        let mut table = HandleTable::new();
        let hash = table.reserve_hash();
        table.insert_reserved(hash, "first", "TopoDSSolidPointer", None, 0);
        table.insert_reserved(hash, "second", "TopoDSSolidPointer", None, 2);

        assert_eq!(table.len(), 1);
        assert_eq!(table.entry(hash).unwrap().object(), &"first");
        assert_eq!(table.entry(hash).unwrap().last_seen_run(), 2);
    }
}
