//! # Borrow Ticket
//!
//! A [`WithdrawTicket`] plus a must-return obligation.
//!
//! Construction copies the declared list into two containers that never
//! touch each other again:
//!
//! ```text
//!            ┌── inner.pending  (stack)    shrinks on borrow()
//! objects ───┤
//!            └── to_return      (multiset) shrinks on put_back()
//! ```
//!
//! Borrows follow the inner ticket's reverse declaration order. Returns are
//! matched by identity and may happen in any order, interleaved with
//! borrows, across any number of calls. Retirement needs both containers
//! empty, so an episode cannot close while a borrowed asset is still out.

use serde::{Deserialize, Serialize};

use super::error::{Rejected, TicketError};
use super::withdraw::WithdrawTicket;
use crate::asset::{AssetId, Custody};
use crate::vault::{IncomingTransfer, Vault};

/// Permission to borrow the declared assets, on condition that each one
/// comes back.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "a borrow ticket must have every asset returned and then be retired"]
pub struct BorrowTicket {
    inner: WithdrawTicket,
    to_return: Vec<AssetId>,
}

impl BorrowTicket {
    pub fn new(objects: impl IntoIterator<Item = AssetId>) -> Self {
        let objects: Vec<AssetId> = objects.into_iter().collect();
        Self {
            to_return: objects.clone(),
            inner: WithdrawTicket::new(objects),
        }
    }

    /// The wrapped withdraw ticket.
    pub fn withdrawal(&self) -> &WithdrawTicket {
        &self.inner
    }

    /// Identifiers still owed back to the vault.
    pub fn to_return(&self) -> &[AssetId] {
        &self.to_return
    }

    pub fn outstanding(&self) -> usize {
        self.to_return.len()
    }

    /// `true` once everything has been borrowed and returned.
    pub fn is_retirable(&self) -> bool {
        self.inner.is_exhausted() && self.to_return.is_empty()
    }

    /// Takes the next asset out of custody. Same contract as
    /// [`WithdrawTicket::redeem_next`]; the asset stays on the return list.
    pub fn borrow<V: Vault>(
        &mut self,
        vault: &V,
        transfer: IncomingTransfer,
    ) -> Result<V::Asset, TicketError> {
        self.inner.redeem_next(vault, transfer)
    }

    /// Returns an asset to the vault and strikes one matching entry from the
    /// return list.
    ///
    /// # Errors
    ///
    /// [`TicketError::UnexpectedAsset`] if the asset's identifier is not on
    /// the return list. The asset comes back inside the error and nothing
    /// is sent to the vault.
    pub fn put_back<V: Vault>(
        &mut self,
        vault: &V,
        asset: V::Asset,
    ) -> Result<(), Rejected<V::Asset>> {
        let asset_id = asset.asset_id();
        let Some(index) = self.to_return.iter().position(|id| *id == asset_id) else {
            tracing::warn!(
                asset = %asset_id.short(),
                "return rejected: asset not owed under this ticket"
            );
            return Err(Rejected::new(
                asset,
                TicketError::UnexpectedAsset { asset: asset_id },
            ));
        };

        self.to_return.remove(index);
        vault.send(asset);
        tracing::debug!(
            asset = %asset_id.short(),
            outstanding = self.to_return.len(),
            "borrowed asset returned"
        );
        Ok(())
    }

    /// Destroys the ticket once both containers are empty.
    ///
    /// The inner withdrawal is checked first, then the return list.
    ///
    /// # Errors
    ///
    /// [`TicketError::IncompleteWithdrawal`] or
    /// [`TicketError::PendingReturns`], with the ticket handed back.
    pub fn retire(self) -> Result<(), Rejected<Self>> {
        if let Err(error) = self.inner.ensure_complete() {
            return Err(Rejected::new(self, error));
        }
        if !self.to_return.is_empty() {
            let outstanding = self.to_return.len();
            return Err(Rejected::new(self, TicketError::PendingReturns { outstanding }));
        }
        tracing::debug!("borrow ticket retired");
        Ok(())
    }
}

impl Drop for BorrowTicket {
    fn drop(&mut self) {
        // The inner ticket reports its own unredeemed entries.
        if !self.to_return.is_empty() {
            tracing::warn!(
                outstanding = self.to_return.len(),
                "borrow ticket dropped with assets still owed to the vault"
            );
        }
    }
}
