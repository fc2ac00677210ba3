//! # Stowage Transaction
//!
//! A nested transaction engine for in-memory mutable state.
//!
//! This crate provides:
//! - A [`TransactionManager`] owning one logical thread of control's
//!   transaction stack, with RAII [`Transaction`] guards
//! - Snapshot-based rollback via [`SnapshotParticipant`] and the
//!   [`Snapshottable`] trait
//! - Ready-made transactional containers: [`TransactionalValue`] and
//!   [`TransactionalVec`]
//!
//! ## Design Principles
//!
//! - Explicit context passing: there is no hidden "current transaction";
//!   the guard returned by [`TransactionManager::open_outer`] is threaded
//!   through every operation, and nested opens borrow their parent
//! - Aborting is implicit: dropping a guard without committing reverts
//!   every change registered at that depth, on every exit path
//! - Single-threaded by construction: handles are `!Send`, modeling one
//!   cooperative actor rather than concurrent writers
//!
//! ## Example
//!
//! ```rust
//! use stowage_transaction::{TransactionManager, TransactionalValue};
//!
//! let txns = TransactionManager::new();
//! let greeting = TransactionalValue::new(String::from("Hello"));
//!
//! // Closing without a commit reverts the change.
//! {
//!     let mut tx = txns.open_outer().unwrap();
//!     greeting.set(String::from("World"), &mut tx);
//! }
//! assert_eq!(greeting.get(), "Hello");
//!
//! // Committing keeps it.
//! let mut tx = txns.open_outer().unwrap();
//! greeting.set(String::from("World"), &mut tx);
//! tx.commit();
//! assert_eq!(greeting.get(), "World");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod lifecycle;
mod manager;
mod participant;
mod transaction;
mod value;

pub use error::TransactionError;
pub use lifecycle::{Lifecycle, TransactionResult};
pub use manager::TransactionManager;
pub use participant::{SnapshotParticipant, Snapshottable};
pub use transaction::{CloseContext, Transaction};
pub use value::{TransactionalValue, TransactionalVec};
