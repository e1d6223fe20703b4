//! Domain types for the catalog with strong typing.
//!
//! Identifiers coming from the metadata provider are numeric, but the
//! catalog keys records by their string form. [`EntryId`] enforces that
//! shape once, at the edge, so nothing past it needs to re-validate.

pub mod error;
pub mod events;

pub use error::CatalogError;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider-native identifier of a catalog entry, kept in string form.
///
/// # Examples
///
/// ```rust
/// use curatarr::domain::EntryId;
///
/// let id = EntryId::parse(" 550 ").unwrap();
/// assert_eq!(id.as_str(), "550");
/// assert!(EntryId::parse("tt0137523").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(String);

impl EntryId {
    /// Validates a raw identifier. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidIdentifier`] when the value is empty,
    /// not purely numeric, zero, or does not fit in a `u64`.
    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CatalogError::InvalidIdentifier(raw.to_string()));
        }

        match trimmed.parse::<u64>() {
            Ok(0) | Err(_) => Err(CatalogError::InvalidIdentifier(raw.to_string())),
            Ok(value) => Ok(Self(value.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric form, as the provider expects it.
    #[must_use]
    pub fn numeric(&self) -> u64 {
        // Construction guarantees the string is a valid u64.
        self.0.parse().unwrap_or_default()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for EntryId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl TryFrom<String> for EntryId {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntryId> for String {
    fn from(id: EntryId) -> Self {
        id.0
    }
}

/// Whether a catalog entry is a movie or a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Movie,
    Series,
}

impl EntryKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }

    /// Path segment the provider uses for this kind.
    #[must_use]
    pub const fn provider_segment(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "tv",
        }
    }

    #[must_use]
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(Self::Movie),
            "series" => Some(Self::Series),
            _ => None,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Logical group of entry fields that an operator can take ownership of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    /// Title, artwork, overview, cast and the other presentation fields.
    Metadata,
    /// Watch and download links.
    Links,
}

impl FieldGroup {
    pub const ALL: [Self; 2] = [Self::Metadata, Self::Links];

    const fn bit(self) -> u8 {
        match self {
            Self::Metadata => 0b01,
            Self::Links => 0b10,
        }
    }
}

/// Set of field groups that carry operator-authored values.
///
/// A group in the set is "admin-set" and automatic refreshes must leave it
/// alone; a group outside the set is "untouched" and may be backfilled.
///
/// # Examples
///
/// ```rust
/// use curatarr::domain::{FieldGroup, OverrideSet};
///
/// let mut set = OverrideSet::empty();
/// set.insert(FieldGroup::Links);
/// assert!(set.contains(FieldGroup::Links));
/// assert!(!set.admin_edited());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideSet(u8);

impl OverrideSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn all() -> Self {
        Self(FieldGroup::Metadata.bit() | FieldGroup::Links.bit())
    }

    #[must_use]
    pub const fn contains(self, group: FieldGroup) -> bool {
        self.0 & group.bit() != 0
    }

    pub const fn insert(&mut self, group: FieldGroup) {
        self.0 |= group.bit();
    }

    pub const fn remove(&mut self, group: FieldGroup) {
        self.0 &= !group.bit();
    }

    pub const fn set(&mut self, group: FieldGroup, admin_set: bool) {
        if admin_set {
            self.insert(group);
        } else {
            self.remove(group);
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The record-level `admin_edited` flag: whether presentation metadata
    /// is operator-owned.
    #[must_use]
    pub const fn admin_edited(self) -> bool {
        self.contains(FieldGroup::Metadata)
    }

    #[must_use]
    pub fn groups(self) -> Vec<FieldGroup> {
        FieldGroup::ALL
            .into_iter()
            .filter(|g| self.contains(*g))
            .collect()
    }

    #[must_use]
    pub const fn bits(self) -> i32 {
        self.0 as i32
    }

    /// Rebuilds a set from its stored form, ignoring unknown bits.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn from_bits(bits: i32) -> Self {
        Self((bits as u8) & Self::all().0)
    }
}
