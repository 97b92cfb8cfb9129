//! # Chunk Cache
//!
//! The set of chunks currently loaded, shared between the caller, the load
//! workers and the save worker.
//!
//! Every operation takes the same mutex over the whole collection; there is no
//! per-position locking. Lookups are O(1) through a hash map keyed by position.
//! Each position maps to a list so that the `Append` policy can represent the
//! duplicates produced by concurrent loads of one position.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::{DuplicatePolicy, MtResource};
use crate::world::{chunk::chunk_position, ChunkPosition, WorldChunk};

/// The chunks currently loaded, keyed by position.
///
/// Every operation takes the single cache lock for its duration. Chunks are
/// handed out as shared `MtResource` handles, so edits made through a handle
/// are what the save worker later writes.
pub struct ChunkCache<C: WorldChunk> {
    chunks: Mutex<HashMap<ChunkPosition, Vec<MtResource<C>>>>,
    duplicate_policy: DuplicatePolicy,
}

impl<C: WorldChunk> ChunkCache<C> {
    /// Creates an empty cache resolving duplicates with `duplicate_policy`.
    pub fn new(duplicate_policy: DuplicatePolicy) -> Self {
        ChunkCache {
            chunks: Mutex::new(HashMap::new()),
            duplicate_policy,
        }
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Caches `chunk` at its own position and returns the handle now cached
    /// there.
    ///
    /// Under `KeepFirst` the returned handle is the existing chunk when the
    /// position was already occupied, and `chunk` is dropped.
    pub fn add(&self, chunk: C) -> MtResource<C> {
        let position = chunk.position();
        let handle = MtResource::new(chunk);

        let mut chunks = self.lock();
        let entries = chunks.entry(position).or_default();
        match self.duplicate_policy {
            DuplicatePolicy::Append => entries.push(handle.clone()),
            DuplicatePolicy::KeepFirst => {
                if let Some(existing) = entries.first() {
                    return existing.clone();
                }
                entries.push(handle.clone());
            }
            DuplicatePolicy::Replace => {
                entries.clear();
                entries.push(handle.clone());
            }
        }

        handle
    }

    /// Removes exactly this handle, compared by identity.
    ///
    /// Scans every cached entry and never locks the chunk itself, so it is safe
    /// to call while holding a guard on `chunk`.
    pub fn remove(&self, chunk: &MtResource<C>) -> bool {
        let mut chunks = self.lock();
        let mut removed = false;

        chunks.retain(|_, entries| {
            if !removed {
                if let Some(index) = entries.iter().position(|entry| entry.ptr_eq(chunk)) {
                    entries.remove(index);
                    removed = true;
                }
            }
            !entries.is_empty()
        });

        removed
    }

    /// The oldest chunk cached at (x, z).
    pub fn find(&self, x: i32, z: i32) -> Option<MtResource<C>> {
        self.lock()
            .get(&chunk_position(x, z))
            .and_then(|entries| entries.first().cloned())
    }

    /// Drops every chunk cached at (x, z) and returns how many there were.
    pub fn remove_at(&self, x: i32, z: i32) -> usize {
        self.lock()
            .remove(&chunk_position(x, z))
            .map_or(0, |entries| entries.len())
    }

    /// Number of chunks cached at (x, z). Only `Append` can make this exceed 1.
    pub fn count_at(&self, x: i32, z: i32) -> usize {
        self.lock()
            .get(&chunk_position(x, z))
            .map_or(0, |entries| entries.len())
    }

    /// Total number of cached chunks, duplicates included.
    pub fn len(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn positions(&self) -> Vec<ChunkPosition> {
        self.lock().keys().copied().collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChunkPosition, Vec<MtResource<C>>>> {
        self.chunks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
