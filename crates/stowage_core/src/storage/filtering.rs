//! A decorator restricting what may pass through an inner storage.

use crate::storage::{Storage, StorageView, ViewIter};
use crate::variant::ResourceVariant;
use std::rc::Rc;
use stowage_transaction::Transaction;

/// A storage wrapper that filters insertions and extractions.
///
/// Operations delegate to the backing storage only when the respective
/// predicate accepts the resource; the rejected direction returns 0 without
/// touching the backing storage at all. Views are wrapped the same way, so
/// slot-level extraction honors the extraction predicate too.
///
/// The [`insert_only`](FilteringStorage::insert_only) and
/// [`extract_only`](FilteringStorage::extract_only) constructors build the
/// common one-way wrappers used to expose an internal tank to the outside
/// world.
pub struct FilteringStorage<T: ResourceVariant, S: Storage<T>> {
    backing: S,
    can_insert: Rc<dyn Fn(&T) -> bool>,
    can_extract: Rc<dyn Fn(&T) -> bool>,
    insertion_allowed: bool,
    extraction_allowed: bool,
}

impl<T: ResourceVariant, S: Storage<T> + Clone> Clone for FilteringStorage<T, S> {
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
            can_insert: Rc::clone(&self.can_insert),
            can_extract: Rc::clone(&self.can_extract),
            insertion_allowed: self.insertion_allowed,
            extraction_allowed: self.extraction_allowed,
        }
    }
}

impl<T: ResourceVariant, S: Storage<T>> FilteringStorage<T, S> {
    /// Creates a filtering wrapper with explicit predicates for both
    /// directions.
    #[must_use]
    pub fn new(
        backing: S,
        can_insert: impl Fn(&T) -> bool + 'static,
        can_extract: impl Fn(&T) -> bool + 'static,
    ) -> Self {
        Self {
            backing,
            can_insert: Rc::new(can_insert),
            can_extract: Rc::new(can_extract),
            insertion_allowed: true,
            extraction_allowed: true,
        }
    }

    /// Creates a wrapper that only lets insertions through; extraction
    /// always returns 0.
    #[must_use]
    pub fn insert_only(backing: S) -> Self {
        let mut storage = Self::new(backing, |_| true, |_| false);
        storage.extraction_allowed = false;
        storage
    }

    /// Creates a wrapper that only lets extractions through; insertion
    /// always returns 0.
    #[must_use]
    pub fn extract_only(backing: S) -> Self {
        let mut storage = Self::new(backing, |_| false, |_| true);
        storage.insertion_allowed = false;
        storage
    }

    /// Returns the backing storage.
    #[must_use]
    pub fn backing(&self) -> &S {
        &self.backing
    }
}

impl<T: ResourceVariant, S: Storage<T>> Storage<T> for FilteringStorage<T, S> {
    fn insert(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        if self.insertion_allowed && (self.can_insert)(resource) {
            self.backing.insert(resource, max_amount, transaction)
        } else {
            0
        }
    }

    fn extract(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        if self.extraction_allowed && (self.can_extract)(resource) {
            self.backing.extract(resource, max_amount, transaction)
        } else {
            0
        }
    }

    fn supports_insertion(&self) -> bool {
        self.insertion_allowed && self.backing.supports_insertion()
    }

    fn supports_extraction(&self) -> bool {
        self.extraction_allowed && self.backing.supports_extraction()
    }

    fn views(&self) -> ViewIter<'_, T> {
        let can_extract = Rc::clone(&self.can_extract);
        let extraction_allowed = self.extraction_allowed;
        Box::new(self.backing.views().map(move |view| {
            Box::new(FilteringView {
                view,
                can_extract: Rc::clone(&can_extract),
                extraction_allowed,
            }) as Box<dyn StorageView<T>>
        }))
    }
}

struct FilteringView<T: ResourceVariant> {
    view: Box<dyn StorageView<T>>,
    can_extract: Rc<dyn Fn(&T) -> bool>,
    extraction_allowed: bool,
}

impl<T: ResourceVariant> StorageView<T> for FilteringView<T> {
    fn resource(&self) -> T {
        self.view.resource()
    }

    fn amount(&self) -> u64 {
        self.view.amount()
    }

    fn capacity(&self) -> u64 {
        self.view.capacity()
    }

    fn extract(&self, resource: &T, max_amount: u64, transaction: &mut Transaction<'_>) -> u64 {
        if self.extraction_allowed && (self.can_extract)(resource) {
            self.view.extract(resource, max_amount, transaction)
        } else {
            0
        }
    }
}
