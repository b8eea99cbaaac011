//! Error types for ticket operations.
//!
//! Every failure is local to the call that raised it and leaves the ticket
//! exactly as it was. When a failing call took ownership of something the
//! caller still needs (an asset being put back, a ticket being retired), the
//! value comes back inside [`Rejected`].

use std::fmt;
use thiserror::Error;

use crate::asset::AssetId;
use crate::vault::VaultError;

/// Errors that can occur while redeeming, returning or retiring tickets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketError {
    /// The asset offered by the vault is not the one the ticket expects
    /// next. Tickets redeem in reverse declaration order.
    #[error("mismatched asset: expected {expected}, got {actual}")]
    MismatchedAsset {
        /// Tail of the ticket's pending list.
        expected: AssetId,
        /// Identifier carried by the transfer.
        actual: AssetId,
    },

    /// The asset being put back was never borrowed under this ticket, or
    /// was already returned.
    #[error("unexpected asset {asset}: not awaiting return under this ticket")]
    UnexpectedAsset {
        /// Identifier of the rejected asset.
        asset: AssetId,
    },

    /// Retirement attempted while assets are still waiting to be redeemed.
    #[error("incomplete withdrawal: {remaining} asset(s) not yet redeemed")]
    IncompleteWithdrawal {
        /// Entries left in the pending list.
        remaining: usize,
    },

    /// Retirement attempted while borrowed assets are still out of custody.
    #[error("pending returns: {outstanding} asset(s) not yet returned")]
    PendingReturns {
        /// Entries left in the return set.
        outstanding: usize,
    },

    /// Redemption attempted on a ticket with nothing left to redeem.
    #[error("nothing to withdraw: ticket is exhausted")]
    NothingToWithdraw,

    /// The vault's transfer primitive failed.
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),
}

/// A failed operation that hands its input back.
///
/// Converts into [`TicketError`] with `?` when the caller does not need the
/// value back.
#[derive(Error)]
#[error("{error}")]
pub struct Rejected<T> {
    value: T,
    error: TicketError,
}

impl<T> Rejected<T> {
    pub fn new(value: T, error: TicketError) -> Self {
        Self { value, error }
    }

    /// Why the operation failed.
    pub fn error(&self) -> &TicketError {
        &self.error
    }

    /// The value the operation was given.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Recovers the value, discarding the error.
    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, TicketError) {
        (self.value, self.error)
    }

    /// Wraps the returned value, keeping the error.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Rejected<U> {
        Rejected {
            value: f(self.value),
            error: self.error,
        }
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> From<Rejected<T>> for TicketError {
    fn from(rejected: Rejected<T>) -> Self {
        rejected.error
    }
}
