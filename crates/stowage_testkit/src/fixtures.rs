//! Test fixtures and helpers for transactional storages.

use crate::variant::StringVariant;
use stowage_core::{FixedVariantStorage, ResourceVariant, SingleVariantStorage, Storage};
use stowage_transaction::{SnapshotParticipant, Snapshottable, Transaction, TransactionManager};

/// A storage that can store a single string variant at any given time.
pub type SingleStringStorage = SingleVariantStorage<StringVariant>;

/// A storage that can store one allowed string variant or be empty.
pub type FixedStringStorage = FixedVariantStorage<StringVariant>;

struct StringState(String);

impl Snapshottable for StringState {
    type Snapshot = String;

    fn create_snapshot(&self) -> String {
        // The state is mutable, so the snapshot must be an independent copy.
        self.0.clone()
    }

    fn read_snapshot(&mut self, snapshot: String) {
        self.0 = snapshot;
    }
}

/// A transactional string, implemented directly on the snapshot-participant
/// machinery.
///
/// Used to exercise the engine without any storage semantics on top.
pub struct TransactionalString {
    participant: SnapshotParticipant<StringState>,
}

impl TransactionalString {
    /// Creates a transactional string with a starting value.
    #[must_use]
    pub fn new(starting_value: &str) -> Self {
        Self {
            participant: SnapshotParticipant::new(StringState(starting_value.to_owned())),
        }
    }

    /// Returns the current value.
    #[must_use]
    pub fn get(&self) -> String {
        self.participant.with(|state| state.0.clone())
    }

    /// Sets the value inside a transaction.
    pub fn set(&self, value: &str, transaction: &mut Transaction<'_>) {
        self.participant
            .with_mut(transaction, |state| state.0 = value.to_owned());
    }
}

/// Inserts into a storage inside a fresh, self-committing outer
/// transaction. Panics if a transaction is already open on the manager.
pub fn insert<T, S>(storage: &S, resource: &T, max_amount: u64, txns: &TransactionManager) -> u64
where
    T: ResourceVariant,
    S: Storage<T> + ?Sized,
{
    let mut tx = txns.open_outer().expect("no transaction should be open");
    let inserted = storage.insert(resource, max_amount, &mut tx);
    tx.commit();
    inserted
}

/// Extracts from a storage inside a fresh, self-committing outer
/// transaction. Panics if a transaction is already open on the manager.
pub fn extract<T, S>(storage: &S, resource: &T, max_amount: u64, txns: &TransactionManager) -> u64
where
    T: ResourceVariant,
    S: Storage<T> + ?Sized,
{
    let mut tx = txns.open_outer().expect("no transaction should be open");
    let extracted = storage.extract(resource, max_amount, &mut tx);
    tx.commit();
    extracted
}

/// Inserts into a storage inside a self-committing nested transaction.
pub fn insert_nested<T, S>(
    storage: &S,
    resource: &T,
    max_amount: u64,
    transaction: &mut Transaction<'_>,
) -> u64
where
    T: ResourceVariant,
    S: Storage<T> + ?Sized,
{
    let mut nested = transaction.open_nested();
    let inserted = storage.insert(resource, max_amount, &mut nested);
    nested.commit();
    inserted
}

/// Extracts from a storage inside a self-committing nested transaction.
pub fn extract_nested<T, S>(
    storage: &S,
    resource: &T,
    max_amount: u64,
    transaction: &mut Transaction<'_>,
) -> u64
where
    T: ResourceVariant,
    S: Storage<T> + ?Sized,
{
    let mut nested = transaction.open_nested();
    let extracted = storage.extract(resource, max_amount, &mut nested);
    nested.commit();
    extracted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::hello;

    #[test]
    fn transactional_string_round_trip() {
        let txns = TransactionManager::new();
        let value = TransactionalString::new("Hello");

        let mut tx = txns.open_outer().unwrap();
        value.set("World", &mut tx);
        tx.commit();

        assert_eq!(value.get(), "World");
    }

    #[test]
    fn helpers_commit_their_own_transaction() {
        let txns = TransactionManager::new();
        let storage = SingleStringStorage::new(10);

        assert_eq!(insert(&storage, &hello(), 4, &txns), 4);
        assert_eq!(extract(&storage, &hello(), 1, &txns), 1);
        assert_eq!(storage.amount(), 3);
        assert!(!txns.is_open());
    }
}
