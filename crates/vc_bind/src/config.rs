//! Provider configuration.
//!
//! [`BindConfig`] is consumed once when a [`Provider`](crate::Provider) is
//! built. It can be written by hand or loaded from any serde format:
//!
//! ```
//! use vc_bind::config::{BindConfig, DecodeFeatures, Inclusion};
//!
//! let config: BindConfig = serde_json::from_str(r#"{
//!     "decode": "FAIL_ON_UNKNOWN_PROPERTIES | ACCEPT_SINGLE_VALUE_AS_ARRAY",
//!     "inclusion": "NonNull"
//! }"#).unwrap();
//!
//! assert!(config.decode.contains(DecodeFeatures::ACCEPT_SINGLE_VALUE_AS_ARRAY));
//! assert!(!config.decode.contains(DecodeFeatures::ACCEPT_FLOAT_AS_INT));
//! assert_eq!(config.inclusion, Inclusion::NonNull);
//! assert_eq!(config.type_property, "@type");
//! ```

use alloc::string::String;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Features

bitflags! {
    /// Switches consulted while decoding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct DecodeFeatures: u32 {
        /// Unknown properties are an error unless ignorable or handled.
        const FAIL_ON_UNKNOWN_PROPERTIES = 1 << 0;
        /// `null` for a primitive property, and a missing primitive creator
        /// argument, are errors instead of defaulting to zero/false.
        const FAIL_ON_NULL_FOR_PRIMITIVES = 1 << 1;
        /// Any missing creator argument is an error.
        const FAIL_ON_MISSING_CREATOR_PROPERTIES = 1 << 2;
        /// A lone value where a collection is expected binds as a one-element collection.
        const ACCEPT_SINGLE_VALUE_AS_ARRAY = 1 << 3;
        /// A one-element array where a single value is expected is unwrapped.
        const UNWRAP_SINGLE_VALUE_ARRAYS = 1 << 4;
        /// Floats with no fractional part bind to integer types.
        const ACCEPT_FLOAT_AS_INT = 1 << 5;
        /// Strings bind to numbers and booleans when they parse.
        const ALLOW_COERCION_OF_SCALARS = 1 << 6;
        /// Integer tokens are rejected for enum types.
        const FAIL_ON_NUMBERS_FOR_ENUMS = 1 << 7;
        /// Unknown enum names decode to `null`.
        const READ_UNKNOWN_ENUM_VALUES_AS_NULL = 1 << 8;
        /// Enum names match ignoring ASCII case.
        const ACCEPT_CASE_INSENSITIVE_ENUMS = 1 << 9;
    }
}

impl Default for DecodeFeatures {
    #[inline]
    fn default() -> Self {
        Self::FAIL_ON_UNKNOWN_PROPERTIES | Self::ACCEPT_FLOAT_AS_INT | Self::ALLOW_COERCION_OF_SCALARS
    }
}

bitflags! {
    /// Switches consulted while encoding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EncodeFeatures: u32 {
        /// A bean without readable properties is an error.
        const FAIL_ON_EMPTY_BEANS = 1 << 0;
        /// Enums are written as their ordinal.
        const WRITE_ENUMS_USING_INDEX = 1 << 1;
        /// Map entries with a `null` value are written.
        const WRITE_NULL_MAP_VALUES = 1 << 2;
        /// Timestamps are written as epoch milliseconds, otherwise RFC 3339 text.
        const WRITE_DATES_AS_TIMESTAMPS = 1 << 3;
        /// Map entries are sorted by their encoded key.
        const ORDER_MAP_ENTRIES_BY_KEYS = 1 << 4;
    }
}

impl Default for EncodeFeatures {
    #[inline]
    fn default() -> Self {
        Self::FAIL_ON_EMPTY_BEANS | Self::WRITE_NULL_MAP_VALUES | Self::WRITE_DATES_AS_TIMESTAMPS
    }
}

// -----------------------------------------------------------------------------
// Inclusion

/// Which bean properties are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Inclusion {
    #[default]
    Always,
    /// Skip `null` values.
    NonNull,
    /// Skip `null`, empty strings and empty containers.
    NonEmpty,
}

// -----------------------------------------------------------------------------
// BindConfig

/// Configuration of one [`Provider`](crate::Provider).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    pub decode: DecodeFeatures,
    pub encode: EncodeFeatures,
    pub inclusion: Inclusion,
    /// Property carrying the type id of polymorphic values, unless the
    /// abstract type declares its own.
    pub type_property: String,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            decode: DecodeFeatures::default(),
            encode: EncodeFeatures::default(),
            inclusion: Inclusion::default(),
            type_property: String::from("@type"),
        }
    }
}

impl BindConfig {
    #[inline]
    pub fn with_decode(mut self, features: DecodeFeatures, enabled: bool) -> Self {
        self.decode.set(features, enabled);
        self
    }

    #[inline]
    pub fn with_encode(mut self, features: EncodeFeatures, enabled: bool) -> Self {
        self.encode.set(features, enabled);
        self
    }

    #[inline]
    pub fn with_inclusion(mut self, inclusion: Inclusion) -> Self {
        self.inclusion = inclusion;
        self
    }

    #[inline]
    pub fn with_type_property(mut self, name: impl Into<String>) -> Self {
        self.type_property = name.into();
        self
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BindConfig::default();
        assert!(config.decode.contains(DecodeFeatures::FAIL_ON_UNKNOWN_PROPERTIES));
        assert!(!config.decode.contains(DecodeFeatures::FAIL_ON_NULL_FOR_PRIMITIVES));
        assert!(config.encode.contains(EncodeFeatures::FAIL_ON_EMPTY_BEANS));
        assert_eq!(config.inclusion, Inclusion::Always);
    }

    #[test]
    fn builder_toggles() {
        let config = BindConfig::default()
            .with_decode(DecodeFeatures::FAIL_ON_UNKNOWN_PROPERTIES, false)
            .with_encode(EncodeFeatures::WRITE_ENUMS_USING_INDEX, true)
            .with_type_property("kind");
        assert!(!config.decode.contains(DecodeFeatures::FAIL_ON_UNKNOWN_PROPERTIES));
        assert!(config.encode.contains(EncodeFeatures::WRITE_ENUMS_USING_INDEX));
        assert_eq!(config.type_property, "kind");
    }

    #[test]
    fn serde_round_trip() {
        let config = BindConfig::default().with_inclusion(Inclusion::NonEmpty);
        let text = serde_json::to_string(&config).unwrap();
        let back: BindConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
