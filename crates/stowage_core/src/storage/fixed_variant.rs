//! A container that only ever accepts one fixed resource variant.

use crate::error::{StorageError, StorageResult};
use crate::storage::{
    SingleSlotStorage, SlotContents, SlottedStorage, Storage, StorageView, ViewIter,
};
use crate::variant::ResourceVariant;
use std::rc::Rc;
use stowage_transaction::{SnapshotParticipant, Transaction};

/// A storage whose allowed variant is fixed at construction.
///
/// Unlike [`SingleVariantStorage`](crate::SingleVariantStorage), which will
/// accept whatever variant is inserted first, this container only ever
/// accepts its allowed variant — even while empty. The *reported* contents
/// still revert to blank at amount 0; it is the acceptance policy that
/// never changes, which makes the container a natural dedicated tank.
///
/// The amount-only conveniences [`fill`](FixedVariantStorage::fill) and
/// [`drain`](FixedVariantStorage::drain) operate on the allowed variant
/// without the caller having to name it.
///
/// Cloning the handle shares the underlying container.
pub struct FixedVariantStorage<T: ResourceVariant> {
    contents: SnapshotParticipant<SlotContents<T>>,
    allowed: T,
    capacity_for: Rc<dyn Fn(&T) -> u64>,
}

impl<T: ResourceVariant> Clone for FixedVariantStorage<T> {
    fn clone(&self) -> Self {
        Self {
            contents: self.contents.clone(),
            allowed: self.allowed.clone(),
            capacity_for: Rc::clone(&self.capacity_for),
        }
    }
}

impl<T: ResourceVariant> std::fmt::Debug for FixedVariantStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedVariantStorage")
            .field("amount", &self.amount())
            .finish_non_exhaustive()
    }
}

impl<T: ResourceVariant> FixedVariantStorage<T> {
    /// Creates an empty storage accepting only `allowed`, with a fixed
    /// capacity.
    ///
    /// # Panics
    ///
    /// Panics if `allowed` is blank.
    #[must_use]
    pub fn new(allowed: T, capacity: u64) -> Self {
        assert!(!allowed.is_blank(), "the allowed variant may not be blank");
        Self {
            contents: SnapshotParticipant::new(SlotContents::blank()),
            allowed,
            capacity_for: Rc::new(move |_: &T| capacity),
        }
    }

    /// Creates an empty storage accepting only `allowed`, with a fixed
    /// capacity and a change handler. The handler runs once per externally
    /// visible change, after the outermost commit only.
    ///
    /// # Panics
    ///
    /// Panics if `allowed` is blank.
    #[must_use]
    pub fn with_on_change(allowed: T, capacity: u64, on_change: impl FnMut() + 'static) -> Self {
        let storage = Self::new(allowed, capacity);
        storage.contents.set_on_final_commit(on_change);
        storage
    }

    /// Installs (or replaces) the change handler.
    pub fn set_on_change(&self, on_change: impl FnMut() + 'static) {
        self.contents.set_on_final_commit(on_change);
    }

    /// Returns the variant this storage accepts.
    #[must_use]
    pub fn allowed_variant(&self) -> &T {
        &self.allowed
    }

    /// Returns the stored resource; blank while the container is empty.
    #[must_use]
    pub fn resource(&self) -> T {
        self.contents.with(|c| c.resource.clone())
    }

    /// Returns the stored amount.
    #[must_use]
    pub fn amount(&self) -> u64 {
        self.contents.with(|c| c.amount)
    }

    /// Sets the contents directly, outside any transaction.
    ///
    /// Intended for host load paths and test setup; the change is not
    /// covered by any rollback.
    pub fn set_contents(&self, resource: T, amount: u64) {
        debug_assert!(
            !resource.is_blank() || amount == 0,
            "blank contents must have zero amount"
        );
        self.contents.with_mut_untracked(|c| {
            c.resource = resource;
            c.amount = amount;
        });
    }

    /// Tries to insert up to `max_amount` of `resource`, returning the
    /// amount actually inserted. Any variant other than the allowed one is
    /// rejected with 0.
    ///
    /// # Panics
    ///
    /// Panics if `resource` is blank.
    pub fn insert(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        assert!(!resource.is_blank(), "cannot insert the blank resource");
        if *resource != self.allowed {
            return 0;
        }

        let stored_amount = self.contents.with(|c| c.amount);
        let capacity = (self.capacity_for)(resource);
        let inserted = max_amount.min(capacity.saturating_sub(stored_amount));
        if inserted > 0 {
            self.contents.with_mut(transaction, |c| {
                if c.resource.is_blank() {
                    c.resource = resource.clone();
                }
                c.amount += inserted;
            });
        }
        inserted
    }

    /// Tries to extract up to `max_amount` of `resource`, returning the
    /// amount actually extracted.
    ///
    /// # Panics
    ///
    /// Panics if `resource` is blank.
    pub fn extract(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        assert!(!resource.is_blank(), "cannot extract the blank resource");
        let (matches, stored_amount) =
            self.contents.with(|c| (c.resource == *resource, c.amount));
        if !matches {
            return 0;
        }

        let extracted = max_amount.min(stored_amount);
        if extracted > 0 {
            self.contents.with_mut(transaction, |c| {
                c.amount -= extracted;
                if c.amount == 0 {
                    c.resource = T::blank();
                }
            });
        }
        extracted
    }

    /// Inserts up to `max_amount` of the allowed variant.
    pub fn fill(&self, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        let allowed = self.allowed.clone();
        self.insert(&allowed, max_amount, transaction)
    }

    /// Extracts up to `max_amount` of the allowed variant.
    pub fn drain(&self, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        let allowed = self.allowed.clone();
        self.extract(&allowed, max_amount, transaction)
    }
}

impl<T: ResourceVariant> Storage<T> for FixedVariantStorage<T> {
    fn insert(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        FixedVariantStorage::insert(self, resource, max_amount, transaction)
    }

    fn extract(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        FixedVariantStorage::extract(self, resource, max_amount, transaction)
    }

    fn views(&self) -> ViewIter<'_, T> {
        Box::new(std::iter::once(
            Box::new(self.clone()) as Box<dyn StorageView<T>>
        ))
    }
}

impl<T: ResourceVariant> StorageView<T> for FixedVariantStorage<T> {
    fn resource(&self) -> T {
        FixedVariantStorage::resource(self)
    }

    fn amount(&self) -> u64 {
        FixedVariantStorage::amount(self)
    }

    fn capacity(&self) -> u64 {
        (self.capacity_for)(&self.allowed)
    }

    fn extract(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        FixedVariantStorage::extract(self, resource, max_amount, transaction)
    }
}

impl<T: ResourceVariant> SlottedStorage<T> for FixedVariantStorage<T> {
    fn slot_count(&self) -> usize {
        1
    }

    fn slot(&self, index: usize) -> StorageResult<Box<dyn SingleSlotStorage<T>>> {
        if index == 0 {
            Ok(Box::new(self.clone()))
        } else {
            Err(StorageError::slot_out_of_bounds(index, 1))
        }
    }
}

impl<T: ResourceVariant> SingleSlotStorage<T> for FixedVariantStorage<T> {}
