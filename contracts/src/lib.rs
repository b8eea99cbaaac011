//! # Strongroom Governance Contracts
//!
//! The authorization layer that sits in front of the ticket core. The core
//! honors any ticket it is handed; these contracts decide which tickets get
//! handed out.
//!
//! - **Custody Account** — a vault governed by a member set and an approval
//!   threshold. Tickets are proposed, signed off by members, and executed
//!   inside a time window.
//! - **Proposal** — a ticket payload plus its approvals and lifecycle state.
//!
//! ## Design Principles
//!
//! 1. State transitions are explicit: enum variants, not boolean flags.
//! 2. Signature verification gates every approval.
//! 3. Time is an argument. Nothing here reads the clock to make a decision.
//! 4. A failed call leaves the account exactly as it was.

pub mod custody;
pub mod proposal;

pub use custody::{CustodyAccount, GovernanceError};
pub use proposal::{Approval, Proposal, ProposalStatus};
