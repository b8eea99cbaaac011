//! # Assets
//!
//! An [`AssetId`] names exactly one custodied asset. The protocol only ever
//! compares identifiers for equality; the `Ord` impl exists so identifiers
//! can key a `BTreeMap` and carries no protocol meaning.
//!
//! Identifiers are BLAKE3 digests. Two constructors:
//!
//! - [`AssetId::from_label`] — deterministic, `BLAKE3(label-domain || label)`.
//!   Handy for scenarios and tests where "the painting" should always be the
//!   same asset.
//! - [`AssetId::mint`] — fresh, `BLAKE3(mint-domain || uuid-v4)`.
//!
//! Any type the vault can hold implements [`Custody`]. The crate ships one
//! such type, [`Asset`], which is intentionally *not* `Clone`: an asset is a
//! linear value that lives either in the vault or with a caller, never both.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::{ASSET_ID_LENGTH, ASSET_LABEL_DOMAIN, ASSET_MINT_DOMAIN};
use crate::crypto::hash::domain_hash;

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// Opaque, globally unique identifier of one custodied asset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId([u8; ASSET_ID_LENGTH]);

impl AssetId {
    /// Wraps raw identifier bytes.
    pub const fn from_bytes(bytes: [u8; ASSET_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Deterministic identifier for a human label.
    pub fn from_label(label: &str) -> Self {
        Self(domain_hash(ASSET_LABEL_DOMAIN, label.as_bytes()))
    }

    /// Fresh identifier, unique with overwhelming probability.
    pub fn mint() -> Self {
        Self(domain_hash(ASSET_MINT_DOMAIN, Uuid::new_v4().as_bytes()))
    }

    /// Returns the raw 32-byte identifier.
    pub fn as_bytes(&self) -> &[u8; ASSET_ID_LENGTH] {
        &self.0
    }

    /// Returns the hex-encoded identifier.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hex-encoded identifier.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; ASSET_ID_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({}...)", self.short())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for AssetId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// Serialized as a hex string so identifiers read naturally in JSON and can
// key JSON objects.
impl Serialize for AssetId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            <[u8; ASSET_ID_LENGTH]>::deserialize(deserializer).map(Self)
        }
    }
}

// ---------------------------------------------------------------------------
// Custody
// ---------------------------------------------------------------------------

/// Anything a vault can hold. The only thing tickets need to know about an
/// asset is which identifier it carries.
pub trait Custody {
    fn asset_id(&self) -> AssetId;
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// A concrete custodied asset: an identifier plus descriptive metadata.
///
/// Not `Clone`. Moving an `Asset` is moving custody.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    id: AssetId,
    /// Free-form category, e.g. `"nft"`, `"coin"`, `"deed"`.
    kind: String,
    /// Human-readable description. Not interpreted by the protocol.
    note: String,
}

impl Asset {
    /// Creates an asset with a freshly minted identifier.
    pub fn mint(kind: impl Into<String>, note: impl Into<String>) -> Self {
        Self::with_id(AssetId::mint(), kind, note)
    }

    /// Creates an asset whose identifier is derived from `label`.
    pub fn labelled(label: &str, kind: impl Into<String>) -> Self {
        Self::with_id(AssetId::from_label(label), kind, label)
    }

    /// Creates an asset with an explicit identifier.
    pub fn with_id(id: AssetId, kind: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            note: note.into(),
        }
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn note(&self) -> &str {
        &self.note
    }
}

impl Custody for Asset {
    fn asset_id(&self) -> AssetId {
        self.id
    }
}
