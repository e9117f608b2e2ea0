//! Shared pool of known owner identifiers

use indexmap::IndexSet;
use parking_lot::Mutex;
use rand::Rng;
use std::ops::RangeInclusive;

/// Owners that ship with the PetClinic sample data
pub const SEED_OWNER_IDS: RangeInclusive<u64> = 1..=10;

/// Append-only registry of owner ids shared by every virtual user of a run.
///
/// The membership check and the append happen under one lock, so concurrent
/// creations of the same id insert it once.
#[derive(Debug)]
pub struct OwnerRegistry {
    ids: Mutex<IndexSet<u64>>,
}

impl OwnerRegistry {
    /// Registry seeded with the sample owners
    pub fn new() -> Self {
        Self::with_ids(SEED_OWNER_IDS)
    }

    /// Registry seeded with the given ids, duplicates dropped
    pub fn with_ids(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: Mutex::new(ids.into_iter().collect()),
        }
    }

    /// Append `id` unless already known. Returns whether it was added.
    pub fn add_if_absent(&self, id: u64) -> bool {
        self.ids.lock().insert(id)
    }

    /// Uniformly random known id, `None` when the registry is empty
    pub fn random_pick(&self) -> Option<u64> {
        let ids = self.ids.lock();
        if ids.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..ids.len());
        ids.get_index(idx).copied()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.lock().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }

    /// Known ids in insertion order
    pub fn snapshot(&self) -> Vec<u64> {
        self.ids.lock().iter().copied().collect()
    }
}

impl Default for OwnerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
