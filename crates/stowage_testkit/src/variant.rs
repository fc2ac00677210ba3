//! A string-based resource variant for tests and examples.

use std::rc::Rc;
use stowage_core::ResourceVariant;

/// Amount unit used by the fixtures: one millibucket.
pub const UNIT_MILLIBUCKET: u64 = 1;

/// Amount unit used by the fixtures: one bucket.
pub const UNIT_BUCKET: u64 = 1000 * UNIT_MILLIBUCKET;

/// A resource variant identified by a string.
///
/// The blank variant carries no string. Variants compare by value and are
/// cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringVariant(Option<Rc<str>>);

impl StringVariant {
    /// Creates a variant for the given string.
    #[must_use]
    pub fn of(value: &str) -> Self {
        Self(Some(Rc::from(value)))
    }

    /// Checks whether this variant is for the given string.
    #[must_use]
    pub fn is_of(&self, value: &str) -> bool {
        self.0.as_deref() == Some(value)
    }

    /// Returns the underlying string, if this variant is not blank.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl ResourceVariant for StringVariant {
    fn blank() -> Self {
        Self(None)
    }

    fn is_blank(&self) -> bool {
        self.0.is_none()
    }
}

/// The "Hello" variant.
#[must_use]
pub fn hello() -> StringVariant {
    StringVariant::of("Hello")
}

/// The "World" variant.
#[must_use]
pub fn world() -> StringVariant {
    StringVariant::of("World")
}

/// The "Water" variant.
#[must_use]
pub fn water() -> StringVariant {
    StringVariant::of("Water")
}

/// The "Lava" variant.
#[must_use]
pub fn lava() -> StringVariant {
    StringVariant::of("Lava")
}

/// The "Steam" variant.
#[must_use]
pub fn steam() -> StringVariant {
    StringVariant::of("Steam")
}
