//! # Withdraw Ticket
//!
//! Permission to take a declared list of assets out of the vault.
//!
//! The pending list is a stack. [`WithdrawTicket::redeem_next`] always
//! expects the *last* declared identifier, so a ticket over `[A, B, C]` must
//! be redeemed as `C`, `B`, `A`. The check is one equality comparison on the
//! tail, never a search: a transfer of `A` while `C` is expected fails even
//! though `A` is on the ticket.

use serde::{Deserialize, Serialize};

use super::error::{Rejected, TicketError};
use crate::asset::{AssetId, Custody};
use crate::vault::{IncomingTransfer, Vault};

/// A single-use capability naming the assets that may leave custody.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "a ticket must be redeemed and then retired"]
pub struct WithdrawTicket {
    pending: Vec<AssetId>,
}

impl WithdrawTicket {
    /// Creates a ticket over `objects`, in declaration order.
    ///
    /// No validation: duplicates are allowed and an empty list yields a
    /// ticket that can be retired immediately.
    pub fn new(objects: impl IntoIterator<Item = AssetId>) -> Self {
        Self {
            pending: objects.into_iter().collect(),
        }
    }

    /// Identifiers not yet redeemed, in declaration order.
    pub fn pending(&self) -> &[AssetId] {
        &self.pending
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }

    /// The identifier the next redemption must carry.
    pub fn next_expected(&self) -> Option<AssetId> {
        self.pending.last().copied()
    }

    /// Redeems the next asset from the vault.
    ///
    /// The transfer handle must name the tail of the pending list. The
    /// handle is checked before anything moves, so a wrong handle leaves the
    /// vault untouched. If the vault then hands over an asset other than the
    /// one its handle declared, that asset goes straight back.
    ///
    /// # Errors
    ///
    /// - [`TicketError::NothingToWithdraw`] if the ticket is exhausted.
    /// - [`TicketError::MismatchedAsset`] if the transfer carries a different
    ///   identifier than the one expected.
    /// - [`TicketError::Vault`] if the vault cannot honor the handle.
    ///
    /// The pending list is unchanged on every error. If the vault hands over
    /// an asset other than the one its handle declared, that asset is sent
    /// back with [`Vault::send`]; where it lands among same-id assets is up
    /// to the vault.
    pub fn redeem_next<V: Vault>(
        &mut self,
        vault: &V,
        transfer: IncomingTransfer,
    ) -> Result<V::Asset, TicketError> {
        let expected = self.next_expected().ok_or(TicketError::NothingToWithdraw)?;

        let declared = transfer.asset_id();
        if declared != expected {
            tracing::warn!(
                expected = %expected.short(),
                actual = %declared.short(),
                "redemption rejected: transfer does not match ticket tail"
            );
            return Err(TicketError::MismatchedAsset {
                expected,
                actual: declared,
            });
        }

        let asset = vault.receive(transfer)?;
        let actual = asset.asset_id();
        if actual != expected {
            vault.send(asset);
            tracing::warn!(
                expected = %expected.short(),
                actual = %actual.short(),
                "vault delivered a different asset than its handle declared; sent back"
            );
            return Err(TicketError::MismatchedAsset { expected, actual });
        }

        self.pending.pop();
        tracing::debug!(
            asset = %actual.short(),
            remaining = self.pending.len(),
            "asset redeemed"
        );
        Ok(asset)
    }

    /// Fails unless every declared asset has been redeemed.
    pub(crate) fn ensure_complete(&self) -> Result<(), TicketError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(TicketError::IncompleteWithdrawal {
                remaining: self.pending.len(),
            })
        }
    }

    /// Destroys an exhausted ticket.
    ///
    /// # Errors
    ///
    /// [`TicketError::IncompleteWithdrawal`] if entries remain; the ticket
    /// comes back inside the error.
    pub fn retire(self) -> Result<(), Rejected<Self>> {
        match self.ensure_complete() {
            Ok(()) => {
                tracing::debug!("withdraw ticket retired");
                Ok(())
            }
            Err(error) => Err(Rejected::new(self, error)),
        }
    }
}

impl Drop for WithdrawTicket {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            tracing::warn!(
                remaining = self.pending.len(),
                "withdraw ticket dropped with unredeemed assets"
            );
        }
    }
}
