//! # Vault — the custody boundary
//!
//! The vault is the governance-controlled account that holds assets. Tickets
//! never move assets themselves; they call the two primitives defined here:
//!
//! ```text
//! receive(IncomingTransfer) -> Asset   vault ──► caller   (receive-once)
//! send(Asset)                          caller ──► vault
//! ```
//!
//! An [`IncomingTransfer`] is a handle naming one pending transfer addressed
//! to a vault, keyed by asset identity. Receiving it consumes that pending
//! transfer; presenting the same handle again fails with
//! [`VaultError::UnknownTransfer`] unless another transfer with the same
//! identifier is pending.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs     — VaultAddress, IncomingTransfer, VaultError, the Vault trait
//! memory.rs  — MemoryVault, a thread-safe in-process implementation
//! ```
//!
//! The trait takes `&self`: one vault serves many tickets, possibly from many
//! threads, and each call is a single atomic transfer. Implementations choose
//! their own synchronization and persistence.

pub mod memory;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::asset::{AssetId, Custody};
use crate::config::{VAULT_ADDRESS_DOMAIN, VAULT_ADDRESS_PREFIX};
use crate::crypto::hash::domain_hash;

pub use memory::{Direction, MemoryVault, TransferRecord};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures of the transfer primitive itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// No pending transfer for this asset is addressed to the vault: the
    /// handle is stale, forged, or was already received.
    #[error("no pending transfer of asset {asset} to the vault")]
    UnknownTransfer {
        /// Identifier named by the handle.
        asset: AssetId,
    },

    /// The handle names a transfer addressed to some other vault.
    #[error("transfer addressed to {got}, but this vault is {expected}")]
    WrongRecipient {
        /// This vault's address.
        expected: VaultAddress,
        /// Recipient named by the handle.
        got: VaultAddress,
    },
}

// ---------------------------------------------------------------------------
// VaultAddress
// ---------------------------------------------------------------------------

/// Address of a vault. Rendered as `vault:<hex>`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VaultAddress([u8; 32]);

impl VaultAddress {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Deterministic address for a vault label.
    pub fn from_label(label: &str) -> Self {
        Self(domain_hash(VAULT_ADDRESS_DOMAIN, label.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for VaultAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", VAULT_ADDRESS_PREFIX, hex::encode(self.0))
    }
}

impl fmt::Debug for VaultAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VaultAddress({}...)", &hex::encode(self.0)[..12])
    }
}

impl std::str::FromStr for VaultAddress {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s.strip_prefix(VAULT_ADDRESS_PREFIX).unwrap_or(s);
        let bytes = hex::decode(hex_part)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl Serialize for VaultAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VaultAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// IncomingTransfer
// ---------------------------------------------------------------------------

/// Handle naming one pending transfer of `asset_id` to `recipient`.
///
/// Holding a handle grants nothing by itself: the vault only releases an
/// asset to a ticket that expects exactly this identifier next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingTransfer {
    recipient: VaultAddress,
    asset_id: AssetId,
}

impl IncomingTransfer {
    pub fn new(recipient: VaultAddress, asset_id: AssetId) -> Self {
        Self {
            recipient,
            asset_id,
        }
    }

    /// Vault the transfer is addressed to.
    pub fn recipient(&self) -> VaultAddress {
        self.recipient
    }

    /// Identifier of the asset the handle claims to carry.
    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// The asset-transfer primitive tickets are redeemed against.
pub trait Vault {
    /// The asset type held in custody.
    type Asset: Custody;

    /// This vault's address. Assets sent here land in its inbox.
    fn address(&self) -> VaultAddress;

    /// Consumes a pending incoming transfer and hands the asset to the
    /// caller.
    ///
    /// # Errors
    ///
    /// [`VaultError::WrongRecipient`] if the handle is addressed elsewhere,
    /// [`VaultError::UnknownTransfer`] if nothing is pending under it.
    fn receive(&self, transfer: IncomingTransfer) -> Result<Self::Asset, VaultError>;

    /// Moves an asset into the vault's custody. Always succeeds.
    fn send(&self, asset: Self::Asset);
}

impl<V: Vault + ?Sized> Vault for std::sync::Arc<V> {
    type Asset = V::Asset;

    fn address(&self) -> VaultAddress {
        (**self).address()
    }

    fn receive(&self, transfer: IncomingTransfer) -> Result<Self::Asset, VaultError> {
        (**self).receive(transfer)
    }

    fn send(&self, asset: Self::Asset) {
        (**self).send(asset)
    }
}
