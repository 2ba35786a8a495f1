//! Canonical record identifier.

use crate::{UuidError, UuidResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// A record identifier in canonical form (32 lowercase hex characters, no hyphens).
///
/// Once constructed the inner UUID is known to be valid, so display, equality and
/// path derivation are consistent everywhere the id travels.
///
/// # Construction
/// - [`RecordId::new`] allocates a fresh random identifier.
/// - [`RecordId::parse`] validates an externally supplied identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(Uuid);

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordId {
    /// Allocates a new random (v4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID. Any UUID value has a canonical rendering.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Validates and parses an identifier that must already be canonical.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not 32 lowercase hex characters.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "record id must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("invalid record id '{}': {}", input, e)))
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// Purely syntactic; suitable as a cheap pre-check before [`RecordId::parse`].
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<id>/` where `s1`/`s2` are the first two pairs of hex digits.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "550e8400e29b41d4a716446655440000";

    #[test]
    fn new_ids_are_canonical_and_distinct() {
        let a = RecordId::new();
        let b = RecordId::new();

        assert!(RecordId::is_canonical(&a.to_string()));
        assert_ne!(a, b);
    }

    #[test]
    fn parse_accepts_canonical_input() {
        let id = RecordId::parse(SAMPLE).expect("canonical id should parse");
        assert_eq!(id.to_string(), SAMPLE);
    }

    #[test]
    fn parse_rejects_non_canonical_forms() {
        for input in [
            "550e8400-e29b-41d4-a716-446655440000",
            "550E8400E29B41D4A716446655440000",
            "550e8400e29b41d4a71644665544000",
            "550e8400e29b41d4a716446655440000a",
            "g50e8400e29b41d4a716446655440000",
            "",
        ] {
            let err = RecordId::parse(input).expect_err("non-canonical input should fail");
            match err {
                UuidError::InvalidInput(msg) => assert!(msg.contains("32 lowercase hex")),
            }
        }
    }

    #[test]
    fn from_str_matches_parse() {
        let parsed: RecordId = SAMPLE.parse().expect("should parse");
        assert_eq!(parsed, RecordId::parse(SAMPLE).unwrap());
        assert!("not-an-id".parse::<RecordId>().is_err());
    }

    #[test]
    fn from_uuid_renders_without_hyphens() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(RecordId::from_uuid(uuid).to_string(), SAMPLE);
    }

    #[test]
    fn sharded_dir_uses_first_four_hex_digits() {
        let id = RecordId::parse("aabbccddeeff00112233445566778899").unwrap();
        let dir = id.sharded_dir(Path::new("/records/patients"));

        assert_eq!(
            dir,
            PathBuf::from("/records/patients/aa/bb/aabbccddeeff00112233445566778899")
        );
    }

    #[test]
    fn serde_uses_canonical_string() {
        let id = RecordId::parse(SAMPLE).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{SAMPLE}\""));

        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let err = serde_json::from_str::<RecordId>("\"550E8400E29B41D4A716446655440000\"");
        assert!(err.is_err());
    }
}
