//! A container storing a single resource variant at a time.

use crate::error::{StorageError, StorageResult};
use crate::storage::{
    SingleSlotStorage, SlotContents, SlottedStorage, Storage, StorageView, ViewIter,
};
use crate::variant::ResourceVariant;
use std::rc::Rc;
use stowage_transaction::{SnapshotParticipant, Transaction};

/// A storage that can hold one resource variant at any given time.
///
/// While blank, any (non-blank) variant may be inserted; afterwards only
/// the stored variant is accepted until the container is emptied again, at
/// which point the stored variant reverts to blank. Capacity is a
/// per-variant function, commonly a constant.
///
/// The (variant, amount) pair is a snapshot participant: all mutations made
/// through [`insert`](SingleVariantStorage::insert) and
/// [`extract`](SingleVariantStorage::extract) are reverted when the
/// enclosing transaction aborts. The `on_change` callback, if any, runs
/// exactly once per externally visible change, only after the outermost
/// commit.
///
/// Cloning the handle shares the underlying container.
///
/// # Example
///
/// ```rust
/// use stowage_core::SingleVariantStorage;
/// use stowage_testkit::StringVariant;
/// use stowage_transaction::TransactionManager;
///
/// let txns = TransactionManager::new();
/// let storage: SingleVariantStorage<StringVariant> = SingleVariantStorage::new(10);
/// let iron = StringVariant::of("Iron");
///
/// let mut tx = txns.open_outer().unwrap();
/// assert_eq!(storage.insert(&iron, 4, &mut tx), 4);
/// tx.commit();
/// assert_eq!(storage.amount(), 4);
/// ```
pub struct SingleVariantStorage<T: ResourceVariant> {
    contents: SnapshotParticipant<SlotContents<T>>,
    capacity_for: Rc<dyn Fn(&T) -> u64>,
}

impl<T: ResourceVariant> Clone for SingleVariantStorage<T> {
    fn clone(&self) -> Self {
        Self {
            contents: self.contents.clone(),
            capacity_for: Rc::clone(&self.capacity_for),
        }
    }
}

impl<T: ResourceVariant> std::fmt::Debug for SingleVariantStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleVariantStorage")
            .field("amount", &self.amount())
            .finish_non_exhaustive()
    }
}

impl<T: ResourceVariant> SingleVariantStorage<T> {
    /// Creates an empty storage with a fixed capacity for every variant.
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self::with_capacity_for(move |_| capacity)
    }

    /// Creates an empty storage with a per-variant capacity function.
    #[must_use]
    pub fn with_capacity_for(capacity_for: impl Fn(&T) -> u64 + 'static) -> Self {
        Self {
            contents: SnapshotParticipant::new(SlotContents::blank()),
            capacity_for: Rc::new(capacity_for),
        }
    }

    /// Creates an empty storage with a fixed capacity and a change handler,
    /// generally for "mark dirty" style calls. The handler runs once per
    /// externally visible change, after the outermost commit only.
    #[must_use]
    pub fn with_on_change(capacity: u64, on_change: impl FnMut() + 'static) -> Self {
        let storage = Self::new(capacity);
        storage.contents.set_on_final_commit(on_change);
        storage
    }

    /// Installs (or replaces) the change handler.
    pub fn set_on_change(&self, on_change: impl FnMut() + 'static) {
        self.contents.set_on_final_commit(on_change);
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
    /// amount actually inserted.
    ///
    /// Insertion is accepted while the container is blank or already stores
    /// `resource`; a different stored variant rejects the insert with 0.
    ///
    /// # Panics
    ///
    /// Panics if `resource` is blank.
    pub fn insert(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        assert!(!resource.is_blank(), "cannot insert the blank resource");
        let (accepts, stored_amount) = self
            .contents
            .with(|c| (c.resource.is_blank() || c.resource == *resource, c.amount));
        if !accepts {
            return 0;
        }

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
    /// Only the stored variant can be extracted; emptying the container
    /// reverts the stored variant to blank.
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
}

impl<T: ResourceVariant> Storage<T> for SingleVariantStorage<T> {
    fn insert(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        SingleVariantStorage::insert(self, resource, max_amount, transaction)
    }

    fn extract(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        SingleVariantStorage::extract(self, resource, max_amount, transaction)
    }

    fn views(&self) -> ViewIter<'_, T> {
        Box::new(std::iter::once(
            Box::new(self.clone()) as Box<dyn StorageView<T>>
        ))
    }
}

impl<T: ResourceVariant> StorageView<T> for SingleVariantStorage<T> {
    fn resource(&self) -> T {
        SingleVariantStorage::resource(self)
    }

    fn amount(&self) -> u64 {
        SingleVariantStorage::amount(self)
    }

    fn capacity(&self) -> u64 {
        (self.capacity_for)(&self.resource())
    }

    fn extract(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        SingleVariantStorage::extract(self, resource, max_amount, transaction)
    }
}

impl<T: ResourceVariant> SlottedStorage<T> for SingleVariantStorage<T> {
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

impl<T: ResourceVariant> SingleSlotStorage<T> for SingleVariantStorage<T> {}
