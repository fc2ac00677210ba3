//! Property-based test generators using proptest.

use crate::variant::StringVariant;
use proptest::prelude::*;

/// A single storage operation for property tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    /// Try to insert up to this amount.
    Insert(u64),
    /// Try to extract up to this amount.
    Extract(u64),
}

/// Strategy for generating non-blank string variants.
pub fn string_variant_strategy() -> impl Strategy<Value = StringVariant> {
    prop::string::string_regex("[A-Z][a-z]{2,8}")
        .expect("valid regex")
        .prop_map(|name| StringVariant::of(&name))
}

/// Strategy for generating amounts in `0..=max_amount`.
pub fn amount_strategy(max_amount: u64) -> impl Strategy<Value = u64> {
    0..=max_amount
}

/// Strategy for generating a single insert-or-extract operation with an
/// amount in `0..=max_amount`.
pub fn storage_op_strategy(max_amount: u64) -> impl Strategy<Value = StorageOp> {
    prop_oneof![
        amount_strategy(max_amount).prop_map(StorageOp::Insert),
        amount_strategy(max_amount).prop_map(StorageOp::Extract),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn storage_op_sequence_strategy(
    max_amount: u64,
    max_len: usize,
) -> impl Strategy<Value = Vec<StorageOp>> {
    prop::collection::vec(storage_op_strategy(max_amount), 0..max_len)
}
