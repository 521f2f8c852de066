//! RFC 3339 timestamps at the persistence boundary.
//!
//! Stored messages carry their timestamp as a string; live messages carry an
//! `OffsetDateTime`.  Formatting keeps full sub-second precision, so a value
//! formatted here parses back to the identical instant.

use serde::{Deserialize, Deserializer, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{Error, Result};

/// Format an instant as an RFC 3339 string.
pub fn format_timestamp(datetime: &OffsetDateTime) -> Result<String> {
    datetime.format(&Rfc3339).map_err(|err| {
        Error::serialization(
            format!("failed to format timestamp: {err}"),
            Some(Box::new(err)),
        )
    })
}

/// Parse an RFC 3339 string into an instant.
pub fn parse_timestamp(s: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339).map_err(|err| {
        Error::serialization(
            format!("invalid timestamp {s:?}: {err}"),
            Some(Box::new(err)),
        )
    })
}

/// Serde adapter for `Option<OffsetDateTime>` stored as an RFC 3339 string.
pub mod option {
    use super::*;

    /// Deserialize an optional RFC 3339 formatted string.
    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom))
            .transpose()
    }

    /// Serialize an optional OffsetDateTime into an RFC 3339 formatted string.
    pub fn serialize<S>(
        datetime: &Option<OffsetDateTime>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match datetime {
            Some(datetime) => {
                let s = datetime
                    .format(&Rfc3339)
                    .map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&s)
            }
            None => serializer.serialize_none(),
        }
    }
}
