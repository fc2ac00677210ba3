//! Storage contracts and container implementations.
//!
//! A [`Storage`] is a container of resources exposing transaction-gated
//! insert and extract operations plus read-only [`StorageView`]s of its
//! contents. Containers compose: [`FilteringStorage`] restricts what may
//! pass through an inner storage, and [`CombinedStorage`] /
//! [`CombinedSlottedStorage`] concatenate several containers into one.

mod combined;
mod filtering;
mod fixed_variant;
mod single_variant;

pub use combined::{CombinedSlottedStorage, CombinedStorage};
pub use filtering::FilteringStorage;
pub use fixed_variant::FixedVariantStorage;
pub use single_variant::SingleVariantStorage;

use crate::error::StorageResult;
use crate::variant::ResourceVariant;
use stowage_transaction::{Snapshottable, Transaction};

/// Boxed iterator over the slot views of a storage.
pub type ViewIter<'a, T> = Box<dyn Iterator<Item = Box<dyn StorageView<T>>> + 'a>;

/// A container exposing transaction-gated insert/extract operations.
///
/// Both operations return the amount actually moved, between 0 and
/// `max_amount`. A mismatched variant, a full or empty container, or a
/// policy rejection are not errors: they are reported as 0 (or a partial
/// amount) and must be checked by the caller. No operation has an
/// observable effect on final program state unless the enclosing
/// transaction is eventually committed all the way out.
pub trait Storage<T: ResourceVariant> {
    /// Tries to insert up to `max_amount` of `resource`.
    ///
    /// Returns the amount actually inserted.
    ///
    /// # Panics
    ///
    /// Panics if `resource` is blank.
    fn insert(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64;

    /// Tries to extract up to `max_amount` of `resource`.
    ///
    /// Returns the amount actually extracted.
    ///
    /// # Panics
    ///
    /// Panics if `resource` is blank.
    fn extract(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64;

    /// Checks whether this storage can ever accept insertions.
    ///
    /// A `false` return means insert always returns 0 and callers may skip
    /// this storage entirely.
    fn supports_insertion(&self) -> bool {
        true
    }

    /// Checks whether this storage can ever yield extractions.
    fn supports_extraction(&self) -> bool {
        true
    }

    /// Iterates over the slot views of this storage.
    ///
    /// The yielded views are live handles: they observe mutations made
    /// after the iterator was created.
    fn views(&self) -> ViewIter<'_, T>;

    /// Iterates over the views that hold a resource, skipping blank and
    /// empty slots.
    ///
    /// Emptiness is decided when the iterator is advanced, not when it is
    /// created, so a slot that changes in between is classified correctly.
    fn non_empty_views(&self) -> ViewIter<'_, T> {
        Box::new(
            self.views()
                .filter(|view| !view.is_resource_blank() && view.amount() > 0),
        )
    }
}

/// A read-only view of one slot of a storage, plus slot-level extraction.
pub trait StorageView<T: ResourceVariant> {
    /// Returns the resource currently stored in this slot. Blank when the
    /// slot is empty.
    fn resource(&self) -> T;

    /// Returns the amount currently stored in this slot.
    fn amount(&self) -> u64;

    /// Returns this slot's capacity for its current resource.
    fn capacity(&self) -> u64;

    /// Checks whether the slot currently stores the blank variant.
    fn is_resource_blank(&self) -> bool {
        self.resource().is_blank()
    }

    /// Tries to extract up to `max_amount` of `resource` from this slot,
    /// honoring the owning storage's extraction policy.
    ///
    /// # Panics
    ///
    /// Panics if `resource` is blank.
    fn extract(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64;
}

/// A storage whose slots can be addressed by index.
pub trait SlottedStorage<T: ResourceVariant>: Storage<T> {
    /// Returns the number of slots in this storage.
    fn slot_count(&self) -> usize;

    /// Returns a handle to the slot at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SlotOutOfBounds`](crate::StorageError) if
    /// `index` is not below [`slot_count`](SlottedStorage::slot_count).
    fn slot(&self, index: usize) -> StorageResult<Box<dyn SingleSlotStorage<T>>>;
}

/// A storage that is also its only storage view.
///
/// Useful for containers that wrap a single "slot": they expose one view
/// (themselves), have a slot count of 1, and answer slot index 0 with a
/// handle to themselves.
pub trait SingleSlotStorage<T: ResourceVariant>:
    SlottedStorage<T> + StorageView<T> + std::fmt::Debug
{
}

/// The (resource, amount) pair of a single-slot container.
///
/// This is the state that participates in transactions: snapshots are plain
/// copies of the pair, and aborting restores the whole pair at once.
#[derive(Debug, Clone)]
pub(crate) struct SlotContents<T: ResourceVariant> {
    pub(crate) resource: T,
    pub(crate) amount: u64,
}

impl<T: ResourceVariant> SlotContents<T> {
    pub(crate) fn blank() -> Self {
        Self {
            resource: T::blank(),
            amount: 0,
        }
    }
}

impl<T: ResourceVariant> Snapshottable for SlotContents<T> {
    type Snapshot = SlotContents<T>;

    fn create_snapshot(&self) -> Self {
        self.clone()
    }

    fn read_snapshot(&mut self, snapshot: Self) {
        *self = snapshot;
    }
}
