//! Storages composed from an ordered list of parts.

use crate::error::{StorageError, StorageResult};
use crate::storage::{SingleSlotStorage, SlottedStorage, Storage, ViewIter};
use crate::variant::ResourceVariant;
use std::marker::PhantomData;
use stowage_transaction::Transaction;

/// A storage composed from multiple underlying storages.
///
/// Iterating yields the concatenation of all parts' views. Insert and
/// extract visit the parts in order, accumulating until `max_amount` is
/// reached, so the distribution across parts is deterministic for a given
/// construction.
pub struct CombinedStorage<T: ResourceVariant, S: Storage<T>> {
    pub(crate) parts: Vec<S>,
    _resource: PhantomData<T>,
}

impl<T: ResourceVariant, S: Storage<T> + Clone> Clone for CombinedStorage<T, S> {
    fn clone(&self) -> Self {
        Self {
            parts: self.parts.clone(),
            _resource: PhantomData,
        }
    }
}

impl<T: ResourceVariant, S: Storage<T>> CombinedStorage<T, S> {
    /// Creates a combined storage from the provided parts.
    #[must_use]
    pub fn new(parts: Vec<S>) -> Self {
        Self {
            parts,
            _resource: PhantomData,
        }
    }

    /// Returns the parts this storage combines.
    #[must_use]
    pub fn parts(&self) -> &[S] {
        &self.parts
    }
}

impl<T: ResourceVariant, S: Storage<T>> Storage<T> for CombinedStorage<T, S> {
    fn insert(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        let mut total = 0;
        for part in &self.parts {
            total += part.insert(resource, max_amount - total, transaction);
            if total == max_amount {
                break;
            }
        }
        total
    }

    fn extract(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        let mut total = 0;
        for part in &self.parts {
            total += part.extract(resource, max_amount - total, transaction);
            if total == max_amount {
                break;
            }
        }
        total
    }

    fn supports_insertion(&self) -> bool {
        self.parts.iter().any(|part| part.supports_insertion())
    }

    fn supports_extraction(&self) -> bool {
        self.parts.iter().any(|part| part.supports_extraction())
    }

    fn views(&self) -> ViewIter<'_, T> {
        Box::new(self.parts.iter().flat_map(|part| part.views()))
    }
}

/// A slotted storage composed from multiple underlying slotted storages.
///
/// The slots of the parts are concatenated: a slot index on the composite
/// is translated into the appropriate part and the slot within it.
pub struct CombinedSlottedStorage<T: ResourceVariant, S: SlottedStorage<T>> {
    combined: CombinedStorage<T, S>,
}

impl<T: ResourceVariant, S: SlottedStorage<T> + Clone> Clone for CombinedSlottedStorage<T, S> {
    fn clone(&self) -> Self {
        Self {
            combined: self.combined.clone(),
        }
    }
}

impl<T: ResourceVariant, S: SlottedStorage<T>> CombinedSlottedStorage<T, S> {
    /// Creates a combined slotted storage from the provided parts.
    #[must_use]
    pub fn new(parts: Vec<S>) -> Self {
        Self {
            combined: CombinedStorage::new(parts),
        }
    }

    /// Returns the parts this storage combines.
    #[must_use]
    pub fn parts(&self) -> &[S] {
        self.combined.parts()
    }
}

impl<T: ResourceVariant, S: SlottedStorage<T>> Storage<T> for CombinedSlottedStorage<T, S> {
    fn insert(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        self.combined.insert(resource, max_amount, transaction)
    }

    fn extract(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        self.combined.extract(resource, max_amount, transaction)
    }

    fn supports_insertion(&self) -> bool {
        self.combined.supports_insertion()
    }

    fn supports_extraction(&self) -> bool {
        self.combined.supports_extraction()
    }

    fn views(&self) -> ViewIter<'_, T> {
        self.combined.views()
    }
}

impl<T: ResourceVariant, S: SlottedStorage<T>> SlottedStorage<T>
    for CombinedSlottedStorage<T, S>
{
    fn slot_count(&self) -> usize {
        self.combined.parts.iter().map(|part| part.slot_count()).sum()
    }

    fn slot(&self, index: usize) -> StorageResult<Box<dyn SingleSlotStorage<T>>> {
        let mut local = index;
        for part in &self.combined.parts {
            let count = part.slot_count();
            if local < count {
                return part.slot(local);
            }
            local -= count;
        }
        Err(StorageError::slot_out_of_bounds(index, self.slot_count()))
    }
}
