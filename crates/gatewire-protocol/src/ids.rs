//! Identifier types for the gateway protocol.
//!
//! Platform objects are keyed by [`Snowflake`]s, 64-bit ids that embed their
//! creation time. Connection-local ids are opaque String wrappers
//! (serde-transparent), generated with UUID v4 where the client mints them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Milliseconds between the UNIX epoch and the platform epoch (2015-01-01T00:00:00Z).
pub const SNOWFLAKE_EPOCH_MS: u64 = 1_420_070_400_000;

/// A platform object id.
///
/// Serialized as a decimal string (the wire form, since JSON numbers lose
/// precision above 2^53); deserialized from either a string or an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(u64);

impl Snowflake {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Milliseconds since UNIX epoch encoded in the upper 42 bits.
    pub const fn timestamp_ms(self) -> u64 {
        (self.0 >> 22) + SNOWFLAKE_EPOCH_MS
    }

    /// Creation time derived from the id itself.
    pub fn created_at(self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp_ms() as i64)
            .single()
            .unwrap_or_default()
    }

    /// Smallest snowflake that could have been minted at `time`; useful as a
    /// pagination bound.
    pub fn from_datetime(time: DateTime<Utc>) -> Self {
        let ms = u64::try_from(time.timestamp_millis()).unwrap_or_default();
        Self(ms.saturating_sub(SNOWFLAKE_EPOCH_MS) << 22)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Snowflake {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<Snowflake> for u64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl PartialEq<u64> for Snowflake {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a snowflake as a decimal string or unsigned integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Snowflake(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(Snowflake)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse()
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from any string value.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Create a new ID using UUID v4 (random).
            pub fn new_uuid() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// View as string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

typed_id!(
    /// Client-side identifier for one gateway connection, minted on connect.
    ConnectionId
);

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new_uuid()
    }
}
