use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use heck::{ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use serde::{Deserialize, Serialize};

/// Maps member names to property names.
///
/// Explicitly renamed members are left untouched.
///
/// # Examples
///
/// ```
/// use vc_bind::introspect::NamingStrategy;
///
/// assert_eq!(NamingStrategy::LowerCamelCase.apply("created_at"), "createdAt");
/// assert_eq!(NamingStrategy::KebabCase.apply("created_at"), "created-at");
/// assert_eq!("SCREAMING_SNAKE_CASE".parse(), Ok(NamingStrategy::ShoutySnakeCase));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamingStrategy {
    /// `camelCase`
    LowerCamelCase,
    /// `PascalCase`
    UpperCamelCase,
    /// `snake_case`
    SnakeCase,
    /// `kebab-case`
    KebabCase,
    /// `SCREAMING_SNAKE_CASE`
    ShoutySnakeCase,
    /// `lowercase`, without separators.
    LowerCase,
}

impl NamingStrategy {
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::LowerCamelCase => name.to_lower_camel_case(),
            Self::UpperCamelCase => name.to_upper_camel_case(),
            Self::SnakeCase => name.to_snake_case(),
            Self::KebabCase => name.to_kebab_case(),
            Self::ShoutySnakeCase => name.to_shouty_snake_case(),
            Self::LowerCase => name.to_snake_case().replace('_', ""),
        }
    }

    /// The conventional spelling, as accepted by [`FromStr`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LowerCamelCase => "camelCase",
            Self::UpperCamelCase => "PascalCase",
            Self::SnakeCase => "snake_case",
            Self::KebabCase => "kebab-case",
            Self::ShoutySnakeCase => "SCREAMING_SNAKE_CASE",
            Self::LowerCase => "lowercase",
        }
    }
}

impl fmt::Display for NamingStrategy {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error returned when parsing an unknown [`NamingStrategy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNamingStrategy;

impl fmt::Display for UnknownNamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown naming strategy")
    }
}

impl core::error::Error for UnknownNamingStrategy {}

impl FromStr for NamingStrategy {
    type Err = UnknownNamingStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "camelCase" => Self::LowerCamelCase,
            "PascalCase" => Self::UpperCamelCase,
            "snake_case" => Self::SnakeCase,
            "kebab-case" => Self::KebabCase,
            "SCREAMING_SNAKE_CASE" => Self::ShoutySnakeCase,
            "lowercase" => Self::LowerCase,
            _ => return Err(UnknownNamingStrategy),
        })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategies() {
        assert_eq!(NamingStrategy::UpperCamelCase.apply("user_id"), "UserId");
        assert_eq!(NamingStrategy::SnakeCase.apply("userId"), "user_id");
        assert_eq!(NamingStrategy::ShoutySnakeCase.apply("userId"), "USER_ID");
        assert_eq!(NamingStrategy::LowerCase.apply("user_id"), "userid");
    }

    #[test]
    fn parse_round_trip() {
        for strategy in [
            NamingStrategy::LowerCamelCase,
            NamingStrategy::UpperCamelCase,
            NamingStrategy::SnakeCase,
            NamingStrategy::KebabCase,
            NamingStrategy::ShoutySnakeCase,
            NamingStrategy::LowerCase,
        ] {
            assert_eq!(strategy.as_str().parse(), Ok(strategy));
        }
        assert_eq!("Title Case".parse::<NamingStrategy>(), Err(UnknownNamingStrategy));
    }
}
