//! Resource variants: immutable descriptors of "what kind of resource".

use std::fmt;

/// An immutable, value-equality-comparable descriptor of a resource kind.
///
/// Every variant type has a distinguished *blank* variant used as the
/// absence marker: an empty slot stores the blank variant with amount zero.
/// Variants are compared by value and must be cheap to clone.
pub trait ResourceVariant: Clone + Eq + fmt::Debug + 'static {
    /// Returns the blank variant denoting absence.
    fn blank() -> Self;

    /// Checks whether this is the blank variant.
    fn is_blank(&self) -> bool;
}

/// A resource paired with an amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAmount<T> {
    /// The resource kind.
    pub resource: T,
    /// How much of it.
    pub amount: u64,
}

impl<T> ResourceAmount<T> {
    /// Creates a resource/amount pair.
    #[must_use]
    pub fn new(resource: T, amount: u64) -> Self {
        Self { resource, amount }
    }
}
