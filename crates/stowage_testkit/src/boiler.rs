//! A steam boiler scenario: a multi-resource atomic transform.

use crate::variant::{lava, steam, water, StringVariant, UNIT_BUCKET, UNIT_MILLIBUCKET};
use stowage_core::{FilteringStorage, FixedVariantStorage};
use stowage_transaction::TransactionManager;

/// A steam boiler with two input tanks ("Water" and "Lava") and one output
/// tank ("Steam").
///
/// The outside world interacts through the exposed tanks: the inputs are
/// insert-only and the output is extract-only. One production step takes a
/// fixed lava amount and up to a fixed water amount, and produces
/// [`WATER_TO_STEAM_RATIO`](SteamBoiler::WATER_TO_STEAM_RATIO) times the
/// extracted water amount of steam — atomically, so a failed step leaves
/// every tank untouched.
pub struct SteamBoiler {
    /// Internal water tank; supports both directions.
    pub water_tank: FixedVariantStorage<StringVariant>,
    /// Internal lava tank; supports both directions.
    pub lava_tank: FixedVariantStorage<StringVariant>,
    /// Internal steam tank; supports both directions.
    pub steam_tank: FixedVariantStorage<StringVariant>,
    /// Water input as seen from the outside: insert-only.
    pub exposed_water_tank: FilteringStorage<StringVariant, FixedVariantStorage<StringVariant>>,
    /// Lava input as seen from the outside: insert-only.
    pub exposed_lava_tank: FilteringStorage<StringVariant, FixedVariantStorage<StringVariant>>,
    /// Steam output as seen from the outside: extract-only.
    pub exposed_steam_tank: FilteringStorage<StringVariant, FixedVariantStorage<StringVariant>>,
}

impl SteamBoiler {
    /// Water drawn per production step, at most.
    pub const WATER_CONSUMPTION: u64 = 100 * UNIT_MILLIBUCKET;
    /// Lava drawn per production step, exactly.
    pub const LAVA_CONSUMPTION: u64 = UNIT_MILLIBUCKET;
    /// Steam produced per unit of water consumed.
    pub const WATER_TO_STEAM_RATIO: u64 = 20;

    /// Water tank capacity.
    pub const WATER_CAPACITY: u64 = 8 * UNIT_BUCKET;
    /// Lava tank capacity.
    pub const LAVA_CAPACITY: u64 = 8 * UNIT_BUCKET;
    /// Steam tank capacity.
    pub const STEAM_CAPACITY: u64 = 8 * UNIT_BUCKET;

    /// Creates an empty boiler.
    #[must_use]
    pub fn new() -> Self {
        let water_tank = FixedVariantStorage::new(water(), Self::WATER_CAPACITY);
        let lava_tank = FixedVariantStorage::new(lava(), Self::LAVA_CAPACITY);
        let steam_tank = FixedVariantStorage::new(steam(), Self::STEAM_CAPACITY);
        Self {
            exposed_water_tank: FilteringStorage::insert_only(water_tank.clone()),
            exposed_lava_tank: FilteringStorage::insert_only(lava_tank.clone()),
            exposed_steam_tank: FilteringStorage::extract_only(steam_tank.clone()),
            water_tank,
            lava_tank,
            steam_tank,
        }
    }

    /// Runs one production step.
    ///
    /// Extracts up to [`WATER_CONSUMPTION`](Self::WATER_CONSUMPTION) water
    /// (at least some water must be available), exactly
    /// [`LAVA_CONSUMPTION`](Self::LAVA_CONSUMPTION) lava, and inserts the
    /// corresponding steam into the output tank, all in one transaction
    /// that commits only if both extractions succeeded. Panics if a
    /// transaction is already open on the manager.
    pub fn produce_steam(&self, txns: &TransactionManager) {
        let mut tx = txns.open_outer().expect("no transaction should be open");

        let water_extracted = self.water_tank.drain(Self::WATER_CONSUMPTION, &mut tx);
        if water_extracted == 0 {
            return; // aborts the transaction
        }

        let lava_extracted = self.lava_tank.drain(Self::LAVA_CONSUMPTION, &mut tx);
        if lava_extracted != Self::LAVA_CONSUMPTION {
            return; // aborts the transaction
        }

        let steam_produced = water_extracted * Self::WATER_TO_STEAM_RATIO;
        // Whatever the output tank cannot hold is vented.
        self.steam_tank.fill(steam_produced, &mut tx);

        tx.commit();
    }
}

impl Default for SteamBoiler {
    fn default() -> Self {
        Self::new()
    }
}
