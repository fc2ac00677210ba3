//! # Stowage Testkit
//!
//! Test fixtures and helpers for the Stowage crates.
//!
//! This crate provides:
//! - [`StringVariant`], a string-based resource variant, plus the common
//!   fixture variants and amount units
//! - [`TransactionalString`], a minimal snapshot participant
//! - [`SingleStringStorage`] / [`FixedStringStorage`] type aliases
//! - [`SteamBoiler`], an end-to-end multi-resource transform scenario
//! - Self-committing [`insert`] / [`extract`] helpers
//! - proptest [`generators`]

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod boiler;
mod fixtures;
pub mod generators;
mod variant;

pub use boiler::SteamBoiler;
pub use fixtures::{
    extract, extract_nested, insert, insert_nested, FixedStringStorage, SingleStringStorage,
    TransactionalString,
};
pub use variant::{
    hello, lava, steam, water, world, StringVariant, UNIT_BUCKET, UNIT_MILLIBUCKET,
};
