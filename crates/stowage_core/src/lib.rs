//! # Stowage Core
//!
//! Transactional in-memory resource containers.
//!
//! This crate provides:
//! - The [`Storage`] / [`StorageView`] / [`SlottedStorage`] contracts for
//!   transaction-gated resource containers
//! - Variant-typed tanks: [`SingleVariantStorage`] and
//!   [`FixedVariantStorage`]
//! - Composition: [`FilteringStorage`], [`CombinedStorage`], and
//!   [`CombinedSlottedStorage`]
//! - Search and transfer helpers in [`storage_util`]
//!
//! ## Design Principles
//!
//! - All mutations are transaction-gated: a multi-step transfer either
//!   fully applies or fully reverts, however deeply the steps nest
//! - Rejections are values, not errors: a mismatched variant or a full
//!   container reports 0 (or a partial amount), never a failure
//! - Containers are cheap shared handles; composing them never copies
//!   contents
//!
//! ## Example
//!
//! ```rust
//! use stowage_core::{storage_util, FixedVariantStorage, Storage};
//! use stowage_testkit::StringVariant;
//! use stowage_transaction::TransactionManager;
//!
//! let txns = TransactionManager::new();
//! let water = StringVariant::of("Water");
//! let tank = FixedVariantStorage::new(water.clone(), 1000);
//!
//! let mut tx = txns.open_outer().unwrap();
//! assert_eq!(tank.fill(250, &mut tx), 250);
//! tx.commit();
//!
//! assert_eq!(storage_util::find_stored_resource(&tank, None), Some(water));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod storage;
pub mod storage_util;
mod variant;

pub use error::{StorageError, StorageResult};
pub use storage::{
    CombinedSlottedStorage, CombinedStorage, FilteringStorage, FixedVariantStorage,
    SingleSlotStorage, SingleVariantStorage, SlottedStorage, Storage, StorageView, ViewIter,
};
pub use variant::{ResourceAmount, ResourceVariant};
