// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Strongroom Protocol — Core Library
//!
//! Strongroom is a custodial lending protocol. A governance-controlled vault
//! holds assets for several parties, and nobody takes an asset out directly:
//! a party first obtains an approved, single-use *ticket* naming exactly
//! which assets may leave custody, then redeems the ticket against the real
//! assets. A *borrow* ticket additionally requires every redeemed asset to
//! come back before the ticket can be retired.
//!
//! ## Architecture
//!
//! - **asset** — Asset identifiers and the `Custody` trait.
//! - **vault** — The transfer primitive tickets redeem against, plus an
//!   in-memory implementation.
//! - **ticket** — Withdraw and borrow tickets: the state machine at the
//!   heart of the protocol.
//! - **crypto** — BLAKE3 digests and Ed25519 member keys for the governance
//!   layer that issues tickets.
//! - **config** — Protocol constants.
//!
//! ## Design Philosophy
//!
//! 1. Tickets are linear: no `Clone`, retirement consumes them.
//! 2. A failed call changes nothing. Anything it took ownership of comes
//!    back in the error.
//! 3. Redemption order is part of the contract (last declared, first out).
//! 4. The core never decides who is authorized; it only honors tickets.

pub mod asset;
pub mod config;
pub mod crypto;
pub mod ticket;
pub mod vault;

pub use asset::{Asset, AssetId, Custody};
pub use ticket::{
    create_borrow_ticket, create_withdraw_ticket, BorrowTicket, Rejected, Ticket, TicketError,
    TicketKind, WithdrawTicket,
};
pub use vault::{IncomingTransfer, MemoryVault, Vault, VaultAddress, VaultError};
