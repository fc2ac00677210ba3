//! Ready-made transactional containers for plain values.

use crate::participant::{SnapshotParticipant, Snapshottable};
use crate::transaction::Transaction;

struct ValueState<T> {
    value: T,
}

impl<T: Clone + 'static> Snapshottable for ValueState<T> {
    type Snapshot = T;

    fn create_snapshot(&self) -> T {
        self.value.clone()
    }

    fn read_snapshot(&mut self, snapshot: T) {
        self.value = snapshot;
    }
}

/// A transactional box around a single value.
///
/// Every write goes through a transaction and is rolled back if that
/// transaction (or any enclosing one) aborts. Reads need no transaction and
/// always observe the latest speculative value.
///
/// Cloning the handle shares the underlying value.
///
/// # Example
///
/// ```rust
/// use stowage_transaction::{TransactionManager, TransactionalValue};
///
/// let txns = TransactionManager::new();
/// let value = TransactionalValue::new(10u32);
///
/// let mut tx = txns.open_outer().unwrap();
/// value.set(20, &mut tx);
/// drop(tx); // implicit abort
///
/// assert_eq!(value.get(), 10);
/// ```
pub struct TransactionalValue<T: Clone + 'static> {
    participant: SnapshotParticipant<ValueState<T>>,
}

impl<T: Clone + 'static> Clone for TransactionalValue<T> {
    fn clone(&self) -> Self {
        Self {
            participant: self.participant.clone(),
        }
    }
}

impl<T: Clone + 'static> TransactionalValue<T> {
    /// Creates a transactional value with a starting value.
    #[must_use]
    pub fn new(starting_value: T) -> Self {
        Self {
            participant: SnapshotParticipant::new(ValueState {
                value: starting_value,
            }),
        }
    }

    /// Returns a copy of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.participant.with(|state| state.value.clone())
    }

    /// Reads the current value through a borrow, without cloning.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.participant.with(|state| f(&state.value))
    }

    /// Sets the value inside a transaction.
    pub fn set(&self, value: T, transaction: &mut Transaction<'_>) {
        self.participant
            .with_mut(transaction, |state| state.value = value);
    }

    /// Sets the value and returns the previous one.
    pub fn replace(&self, value: T, transaction: &mut Transaction<'_>) -> T {
        self.participant
            .with_mut(transaction, |state| std::mem::replace(&mut state.value, value))
    }

    /// Sets the value outside any transaction, without rollback coverage.
    /// Intended for initialization and host load paths.
    pub fn set_untracked(&self, value: T) {
        self.participant
            .with_mut_untracked(|state| state.value = value);
    }
}

/// A transactional sequence.
///
/// Exposes the mutating operations of a `Vec`, each of which snapshots the
/// sequence on the first touch at the current transaction depth before
/// delegating — so every mutation is transaction-safe without the caller
/// managing snapshots. Read accessors need no transaction.
pub struct TransactionalVec<T: Clone + 'static> {
    participant: SnapshotParticipant<VecState<T>>,
}

struct VecState<T> {
    items: Vec<T>,
}

impl<T: Clone + 'static> Snapshottable for VecState<T> {
    type Snapshot = Vec<T>;

    fn create_snapshot(&self) -> Vec<T> {
        // The sequence is mutable, so the snapshot must be a fresh copy.
        self.items.clone()
    }

    fn read_snapshot(&mut self, snapshot: Vec<T>) {
        self.items = snapshot;
    }
}

impl<T: Clone + 'static> Clone for TransactionalVec<T> {
    fn clone(&self) -> Self {
        Self {
            participant: self.participant.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for TransactionalVec<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Clone + 'static> TransactionalVec<T> {
    /// Creates a transactional sequence with starting items.
    #[must_use]
    pub fn new(starting_items: Vec<T>) -> Self {
        Self {
            participant: SnapshotParticipant::new(VecState {
                items: starting_items,
            }),
        }
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participant.with(|state| state.items.len())
    }

    /// Checks whether the sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the item at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.participant.with(|state| state.items.get(index).cloned())
    }

    /// Returns a copy of all items.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.participant.with(|state| state.items.clone())
    }

    /// Checks whether the sequence contains an item.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.participant.with(|state| state.items.contains(item))
    }

    /// Appends an item.
    pub fn push(&self, item: T, transaction: &mut Transaction<'_>) {
        self.participant
            .with_mut(transaction, |state| state.items.push(item));
    }

    /// Removes and returns the last item.
    pub fn pop(&self, transaction: &mut Transaction<'_>) -> Option<T> {
        self.participant.with_mut(transaction, |state| state.items.pop())
    }

    /// Inserts an item at `index`, shifting the rest right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, item: T, transaction: &mut Transaction<'_>) {
        self.participant
            .with_mut(transaction, |state| state.items.insert(index, item));
    }

    /// Removes and returns the item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&self, index: usize, transaction: &mut Transaction<'_>) -> T {
        self.participant
            .with_mut(transaction, |state| state.items.remove(index))
    }

    /// Replaces the item at `index`, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn set(&self, index: usize, item: T, transaction: &mut Transaction<'_>) -> T {
        self.participant.with_mut(transaction, |state| {
            std::mem::replace(&mut state.items[index], item)
        })
    }

    /// Removes all items.
    pub fn clear(&self, transaction: &mut Transaction<'_>) {
        self.participant
            .with_mut(transaction, |state| state.items.clear());
    }

    /// Keeps only the items for which the predicate holds.
    pub fn retain(&self, f: impl FnMut(&T) -> bool, transaction: &mut Transaction<'_>) {
        self.participant
            .with_mut(transaction, |state| state.items.retain(f));
    }

    /// Appends copies of all items in `items`.
    pub fn extend_from_slice(&self, items: &[T], transaction: &mut Transaction<'_>) {
        self.participant
            .with_mut(transaction, |state| state.items.extend_from_slice(items));
    }
}
