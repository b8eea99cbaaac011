//! # In-Memory Vault
//!
//! [`MemoryVault`] keeps its inbox in a `DashMap` keyed by asset identifier,
//! with a FIFO queue per key. The queue is what makes duplicate identifiers
//! representable: two distinct assets that share an identifier are two
//! pending transfers under the same key, received in arrival order.
//!
//! `send` always appends to the back of its identifier's queue, including
//! when a ticket sends back an asset it refused. An asset that leaves and
//! comes back therefore queues behind same-id assets still held.
//!
//! Every transfer is appended to a journal guarded by a `parking_lot` mutex.
//! The journal is an audit trail for simulations and tests; nothing in the
//! transfer path reads it. It is unbounded unless a limit is set with
//! [`MemoryVault::with_journal_limit`], in which case the oldest records are
//! dropped first and sequence numbers keep counting.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::{IncomingTransfer, Vault, VaultAddress, VaultError};
use crate::asset::{Asset, AssetId, Custody};

/// Which way an asset crossed the custody boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Sent into the vault.
    In,
    /// Received out of the vault by a caller.
    Out,
}

/// One journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Position in the journal, starting at 0.
    pub sequence: u64,
    pub direction: Direction,
    pub asset: AssetId,
}

/// A thread-safe, in-process vault.
///
/// Meant for simulations and tests. The journal grows with every transfer
/// unless capped with [`with_journal_limit`](Self::with_journal_limit).
pub struct MemoryVault<A: Custody = Asset> {
    address: VaultAddress,
    inbox: DashMap<AssetId, VecDeque<A>>,
    journal: Mutex<Journal>,
}

#[derive(Debug, Default)]
struct Journal {
    records: VecDeque<TransferRecord>,
    next_sequence: u64,
    limit: Option<usize>,
}

impl<A: Custody> MemoryVault<A> {
    /// Creates an empty vault whose address is derived from `label`.
    pub fn new(label: &str) -> Self {
        Self::with_address(VaultAddress::from_label(label))
    }

    pub fn with_address(address: VaultAddress) -> Self {
        Self {
            address,
            inbox: DashMap::new(),
            journal: Mutex::new(Journal::default()),
        }
    }

    /// Keeps at most `limit` journal records, dropping the oldest.
    pub fn with_journal_limit(self, limit: usize) -> Self {
        self.journal.lock().limit = Some(limit);
        self
    }

    /// Puts an asset into custody. Same as [`Vault::send`]; the separate name
    /// reads better when a party funds the vault.
    pub fn deposit(&self, asset: A) {
        self.send(asset);
    }

    /// Returns a handle for a pending transfer of `asset_id`, if any.
    pub fn incoming(&self, asset_id: AssetId) -> Option<IncomingTransfer> {
        self.holds(asset_id)
            .then(|| IncomingTransfer::new(self.address, asset_id))
    }

    /// Returns `true` if at least one asset with this identifier is held.
    pub fn holds(&self, asset_id: AssetId) -> bool {
        self.inbox.contains_key(&asset_id)
    }

    /// Number of held assets carrying this identifier.
    pub fn count(&self, asset_id: AssetId) -> usize {
        self.inbox.get(&asset_id).map_or(0, |queue| queue.len())
    }

    /// Total number of held assets.
    pub fn len(&self) -> usize {
        self.inbox.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inbox.is_empty()
    }

    /// Identifiers currently held, sorted, one entry per asset.
    pub fn asset_ids(&self) -> Vec<AssetId> {
        let mut ids: Vec<AssetId> = self
            .inbox
            .iter()
            .flat_map(|entry| std::iter::repeat(*entry.key()).take(entry.value().len()))
            .collect();
        ids.sort();
        ids
    }

    /// Snapshot of the retained transfer journal, oldest first.
    pub fn journal(&self) -> Vec<TransferRecord> {
        self.journal.lock().records.iter().cloned().collect()
    }

    fn record(&self, direction: Direction, asset: AssetId) {
        let mut journal = self.journal.lock();
        let sequence = journal.next_sequence;
        journal.next_sequence += 1;
        journal.records.push_back(TransferRecord {
            sequence,
            direction,
            asset,
        });
        if let Some(limit) = journal.limit {
            while journal.records.len() > limit {
                journal.records.pop_front();
            }
        }
    }
}

impl<A: Custody> Vault for MemoryVault<A> {
    type Asset = A;

    fn address(&self) -> VaultAddress {
        self.address
    }

    fn receive(&self, transfer: IncomingTransfer) -> Result<A, VaultError> {
        if transfer.recipient() != self.address {
            return Err(VaultError::WrongRecipient {
                expected: self.address,
                got: transfer.recipient(),
            });
        }

        let asset_id = transfer.asset_id();
        let asset = match self.inbox.entry(asset_id) {
            Entry::Occupied(mut slot) => {
                let asset = slot.get_mut().pop_front();
                if slot.get().is_empty() {
                    slot.remove();
                }
                asset
            }
            Entry::Vacant(_) => None,
        }
        .ok_or(VaultError::UnknownTransfer { asset: asset_id })?;

        self.record(Direction::Out, asset_id);
        tracing::debug!(vault = %self.address, asset = %asset_id.short(), "transfer received out of custody");
        Ok(asset)
    }

    fn send(&self, asset: A) {
        let asset_id = asset.asset_id();
        self.inbox.entry(asset_id).or_default().push_back(asset);
        self.record(Direction::In, asset_id);
        tracing::debug!(vault = %self.address, asset = %asset_id.short(), "asset sent into custody");
    }
}

impl<A: Custody> std::fmt::Debug for MemoryVault<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryVault")
            .field("address", &self.address)
            .field("assets", &self.len())
            .finish()
    }
}
