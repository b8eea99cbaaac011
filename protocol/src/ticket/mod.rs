//! # Tickets — single-use custody capabilities
//!
//! A ticket is the only way an asset leaves the vault. The governance layer
//! builds one with [`create_withdraw_ticket`] or [`create_borrow_ticket`],
//! embeds it as the payload of a proposal, and hands it back to the caller
//! once the proposal is authorized. From then on the ticket alone decides
//! which assets may be taken:
//!
//! ```text
//! WithdrawTicket:  Created ─(redeem_next)*─► exhausted ─(retire)─► gone
//! BorrowTicket:    Created ─(borrow | put_back)*─► retirable ─(retire)─► gone
//! ```
//!
//! Tickets are linear values: no `Clone`, mutation through `&mut`,
//! retirement by value. A failed retirement hands the ticket back.
//!
//! ## Architecture
//!
//! ```text
//! error.rs     — TicketError, Rejected<T>
//! withdraw.rs  — WithdrawTicket (stack of pending identifiers)
//! borrow.rs    — BorrowTicket (withdraw ticket + return multiset)
//! mod.rs       — Ticket payload enum, constructors, canonical encoding
//! ```

pub mod borrow;
pub mod error;
pub mod withdraw;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::asset::AssetId;
use crate::config::{TICKET_DIGEST_DOMAIN, TICKET_ENCODING_VERSION};
use crate::crypto::hash::domain_hash;

pub use borrow::BorrowTicket;
pub use error::{Rejected, TicketError};
pub use withdraw::WithdrawTicket;

/// Builds a withdraw ticket. Pure; no vault is consulted.
pub fn create_withdraw_ticket(objects: impl IntoIterator<Item = AssetId>) -> WithdrawTicket {
    WithdrawTicket::new(objects)
}

/// Builds a borrow ticket. Pure; no vault is consulted.
pub fn create_borrow_ticket(objects: impl IntoIterator<Item = AssetId>) -> BorrowTicket {
    BorrowTicket::new(objects)
}

// ---------------------------------------------------------------------------
// Payload encoding
// ---------------------------------------------------------------------------

/// Errors encoding or decoding a ticket payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("ticket payload encoding failed: {0}")]
    Codec(#[from] bincode::Error),

    #[error("unsupported ticket payload version {0}")]
    UnsupportedVersion(u8),

    #[error("empty ticket payload")]
    Empty,
}

/// Which kind of ticket a payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketKind {
    Withdraw,
    Borrow,
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketKind::Withdraw => write!(f, "withdraw"),
            TicketKind::Borrow => write!(f, "borrow"),
        }
    }
}

/// Either kind of ticket, as carried by a proposal.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "a ticket must be redeemed and then retired"]
pub enum Ticket {
    Withdraw(WithdrawTicket),
    Borrow(BorrowTicket),
}

impl Ticket {
    /// Builds a fresh ticket of the given kind.
    pub fn create(kind: TicketKind, objects: impl IntoIterator<Item = AssetId>) -> Self {
        match kind {
            TicketKind::Withdraw => Ticket::Withdraw(create_withdraw_ticket(objects)),
            TicketKind::Borrow => Ticket::Borrow(create_borrow_ticket(objects)),
        }
    }

    pub fn kind(&self) -> TicketKind {
        match self {
            Ticket::Withdraw(_) => TicketKind::Withdraw,
            Ticket::Borrow(_) => TicketKind::Borrow,
        }
    }

    /// Identifiers still waiting to leave custody.
    pub fn pending(&self) -> &[AssetId] {
        match self {
            Ticket::Withdraw(ticket) => ticket.pending(),
            Ticket::Borrow(ticket) => ticket.withdrawal().pending(),
        }
    }

    /// Identifiers still owed back. Always empty for withdraw tickets.
    pub fn to_return(&self) -> &[AssetId] {
        match self {
            Ticket::Withdraw(_) => &[],
            Ticket::Borrow(ticket) => ticket.to_return(),
        }
    }

    pub fn is_retirable(&self) -> bool {
        match self {
            Ticket::Withdraw(ticket) => ticket.is_exhausted(),
            Ticket::Borrow(ticket) => ticket.is_retirable(),
        }
    }

    /// Retires whichever ticket this is.
    pub fn retire(self) -> Result<(), Rejected<Self>> {
        match self {
            Ticket::Withdraw(ticket) => ticket.retire().map_err(|r| r.map(Ticket::Withdraw)),
            Ticket::Borrow(ticket) => ticket.retire().map_err(|r| r.map(Ticket::Borrow)),
        }
    }

    /// Canonical bytes: one version byte followed by the bincode encoding.
    pub fn encode(&self) -> Result<Vec<u8>, PayloadError> {
        let mut bytes = vec![TICKET_ENCODING_VERSION];
        bytes.extend(bincode::serialize(self)?);
        Ok(bytes)
    }

    /// Inverse of [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        let (&version, body) = bytes.split_first().ok_or(PayloadError::Empty)?;
        if version != TICKET_ENCODING_VERSION {
            return Err(PayloadError::UnsupportedVersion(version));
        }
        Ok(bincode::deserialize(body)?)
    }

    /// Domain-separated BLAKE3 digest of the canonical encoding. This is the
    /// message governance members sign when approving the ticket.
    pub fn digest(&self) -> Result<[u8; 32], PayloadError> {
        Ok(domain_hash(TICKET_DIGEST_DOMAIN, &self.encode()?))
    }
}

impl From<WithdrawTicket> for Ticket {
    fn from(ticket: WithdrawTicket) -> Self {
        Ticket::Withdraw(ticket)
    }
}

impl From<BorrowTicket> for Ticket {
    fn from(ticket: BorrowTicket) -> Self {
        Ticket::Borrow(ticket)
    }
}
