//! Helpers for the protobuf-JSON wire encoding.

use serde::de::{self, Deserialize, Deserializer};
use serde::Serializer;

/// Returns true when a field holds its default value and can be omitted.
pub(crate) fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// 64-bit integers travel as JSON strings; decoding accepts either form.
pub(crate) mod int64 {
    use super::*;

    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i64),
        Text(String),
    }

    pub(crate) fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}
