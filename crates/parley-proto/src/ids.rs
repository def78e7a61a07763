//! User identity on the wire.

use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Primary key of a user account.
///
/// The host serializes primary keys as decimal strings (`"42"`) in most
/// places and as integers in a few. Decoding accepts both; encoding always
/// produces the string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(u64),
            Str(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Int(value) => Ok(Self(value)),
            Repr::Str(text) => text
                .parse()
                .map_err(|e| de::Error::custom(format!("invalid user id {text:?}: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_string_and_integer_forms() {
        let from_str: UserId = serde_json::from_str("\"42\"").unwrap();
        let from_int: UserId = serde_json::from_str("42").unwrap();
        assert_eq!(from_str, UserId(42));
        assert_eq!(from_int, UserId(42));
    }

    #[test]
    fn rejects_non_numeric_strings() {
        assert!(serde_json::from_str::<UserId>("\"alice\"").is_err());
        assert!(serde_json::from_str::<UserId>("-3").is_err());
    }

    #[test]
    fn serializes_as_string() {
        assert_eq!(serde_json::to_string(&UserId(7)).unwrap(), "\"7\"");
    }
}
