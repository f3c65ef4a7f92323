// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-path document cache.
//
// Each path has its own slot lock: at most one build runs per path, while
// built documents are handed out as shared read-only `Arc<Document>`s.
// Entries are rebuilt when the source fingerprint changes and the least
// recently used entry is evicted beyond capacity.
//
// Lock order: the slot map may be held while *trying* a slot lock, never the
// other way round. Slots are cloned out of the map only under the map lock,
// so a slot with more than one owner is in use and is never removed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ppdwerk_core::Document;
use ppdwerk_core::error::Result;
use tracing::debug;

struct Entry {
    fingerprint: String,
    document: Arc<Document>,
    last_used: u64,
}

type Slot = Arc<Mutex<Option<Entry>>>;

pub struct DocumentCache {
    capacity: usize,
    slots: Mutex<HashMap<PathBuf, Slot>>,
    clock: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DocumentCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            slots: Mutex::new(HashMap::new()),
            clock: AtomicU64::new(0),
        }
    }

    /// Return the cached document for `path` if its fingerprint still
    /// matches, otherwise run `build` (holding the path's slot) and cache
    /// the result. A failed build leaves no entry behind.
    pub fn get_or_build<F>(&self, path: &Path, fingerprint: &str, build: F) -> Result<Arc<Document>>
    where
        F: FnOnce() -> Result<Document>,
    {
        let slot = lock(&self.slots).entry(path.to_path_buf()).or_default().clone();
        let tick = self.clock.fetch_add(1, Ordering::Relaxed);

        let mut entry = lock(&slot);
        if let Some(cached) = entry.as_mut() {
            if cached.fingerprint == fingerprint {
                cached.last_used = tick;
                debug!(path = %path.display(), "document cache hit");
                return Ok(Arc::clone(&cached.document));
            }
            debug!(path = %path.display(), "cached document is stale");
        }

        let document = match build() {
            Ok(document) => Arc::new(document),
            Err(err) => {
                *entry = None;
                return Err(err);
            }
        };
        *entry = Some(Entry {
            fingerprint: fingerprint.to_string(),
            document: Arc::clone(&document),
            last_used: tick,
        });
        drop(entry);
        drop(slot);

        self.evict();
        Ok(document)
    }

    /// Number of built documents currently held. Slots busy building are
    /// not counted.
    pub fn len(&self) -> usize {
        lock(&self.slots)
            .values()
            .filter(|slot| slot.try_lock().map(|e| e.is_some()).unwrap_or(false))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict(&self) {
        let mut slots = lock(&self.slots);

        // Slots held by a caller are left alone; empty slots are dropped.
        let mut ages: Vec<(PathBuf, u64)> = Vec::new();
        slots.retain(|path, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(entry) => match entry.as_ref() {
                    Some(e) => {
                        ages.push((path.clone(), e.last_used));
                        true
                    }
                    None => false,
                },
                Err(_) => true,
            }
        });

        if ages.len() <= self.capacity {
            return;
        }
        ages.sort_by_key(|(_, used)| *used);
        let excess = ages.len() - self.capacity;
        for (path, _) in ages.into_iter().take(excess) {
            debug!(path = %path.display(), "evicting cached document");
            slots.remove(&path);
        }
    }
}
