//! Context handle cache
//!
//! Façades that revisit the same resource (a registry key, a SAM domain)
//! keep its context handle here, keyed by a canonical resource name. The
//! cache only stores handles; closing them is the owner's job, usually by
//! draining the cache when it is done.

use crate::error::Result;
use msrpc_ndr::ContextHandle;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    handles: HashMap<String, ContextHandle>,
    /// Handles opened by callers that lost an insert race, awaiting close
    orphans: Vec<(String, ContextHandle)>,
}

/// Thread-safe map from resource name to open context handle
#[derive(Debug, Default)]
pub struct HandleCache {
    inner: Mutex<Inner>,
}

impl HandleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<ContextHandle> {
        self.inner.lock().handles.get(key).copied()
    }

    /// Return the cached handle for `key`, opening and caching it on a miss
    ///
    /// The lock is not held while `open` runs, so `open` may itself use the
    /// cache (to fetch a parent handle). If another caller caches `key`
    /// first, its handle is returned and the redundant one is kept for
    /// [`drain`](Self::drain) to hand back.
    pub fn get_or_open<F>(&self, key: &str, open: F) -> Result<ContextHandle>
    where
        F: FnOnce() -> Result<ContextHandle>,
    {
        if let Some(handle) = self.get(key) {
            debug!("Handle cache hit: {}", key);
            return Ok(handle);
        }

        let handle = open()?;
        let mut inner = self.inner.lock();
        match inner.handles.entry(key.to_owned()) {
            Entry::Occupied(entry) => {
                let cached = *entry.get();
                debug!("Handle cache race on {}, keeping existing handle", key);
                inner.orphans.push((key.to_owned(), handle));
                Ok(cached)
            }
            Entry::Vacant(entry) => {
                debug!("Handle cache insert: {}", key);
                entry.insert(handle);
                Ok(handle)
            }
        }
    }

    /// Forget the handle for `key`, returning it so the caller can close it
    pub fn remove(&self, key: &str) -> Option<ContextHandle> {
        let removed = self.inner.lock().handles.remove(key);
        if removed.is_some() {
            debug!("Handle cache evict: {}", key);
        }
        removed
    }

    /// Empty the cache, returning every handle it held
    pub fn drain(&self) -> Vec<(String, ContextHandle)> {
        let mut inner = self.inner.lock();
        let mut drained: Vec<_> = inner.handles.drain().collect();
        drained.append(&mut inner.orphans);
        drained
    }

    pub fn len(&self) -> usize {
        self.inner.lock().handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
