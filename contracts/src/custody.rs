//! # Custody Account
//!
//! A vault governed by a fixed member set and an approval threshold. This is
//! the only place tickets are minted for real: a member proposes a ticket,
//! at least `threshold` members sign the proposal's approval message, and
//! once the execution window opens anyone may execute the proposal and
//! receive the ticket.
//!
//! ## Lifecycle
//!
//! ```text
//! propose ──► Pending ──(threshold approvals)──► Approved ──(execute)──► Executed
//!                │                                  │
//!                └──────────(expire after window)───┴──► Expired
//! ```
//!
//! The account never redeems tickets itself. Executed tickets are redeemed
//! against [`CustodyAccount::vault`] by whoever holds them.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use strongroom_protocol::asset::AssetId;
use strongroom_protocol::config::{DEFAULT_PROPOSAL_TTL, MAX_MEMBERS};
use strongroom_protocol::crypto::{require_valid, MemberKey, MemberSignature};
use strongroom_protocol::ticket::{PayloadError, Ticket, TicketKind};
use strongroom_protocol::vault::{MemoryVault, Vault};

use crate::proposal::{Approval, Proposal, ProposalStatus};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during governance operations.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// Threshold is zero or exceeds the member count.
    #[error("invalid threshold {threshold} for {members} members")]
    InvalidThreshold {
        /// Requested threshold.
        threshold: usize,
        /// Size of the member set.
        members: usize,
    },

    /// The member set is larger than the protocol allows.
    #[error("too many members: {count} (max {max})")]
    TooManyMembers { count: usize, max: usize },

    /// The same key appears twice in the member set.
    #[error("duplicate member {0}")]
    DuplicateMember(MemberKey),

    /// The key is not part of this account's member set.
    #[error("{0} is not a member of this account")]
    NotAMember(MemberKey),

    /// No proposal with this id exists.
    #[error("unknown proposal {0}")]
    UnknownProposal(Uuid),

    /// Execution time is not strictly before expiration time.
    #[error("empty execution window: {execution_time} is not before {expiration_time}")]
    InvalidWindow {
        execution_time: DateTime<Utc>,
        expiration_time: DateTime<Utc>,
    },

    /// The proposal is not in a state that allows this operation.
    #[error("invalid state: proposal is {current}, expected {expected}")]
    InvalidState {
        /// Current proposal status.
        current: ProposalStatus,
        /// Required status for the attempted operation.
        expected: ProposalStatus,
    },

    /// The member has already signed this proposal.
    #[error("{0} already approved this proposal")]
    AlreadyApproved(MemberKey),

    /// The signature does not verify over the proposal's approval message.
    #[error("invalid approval signature from {0}")]
    InvalidSignature(MemberKey),

    /// The execution window has not opened yet.
    #[error("not executable before {0}")]
    NotYetExecutable(DateTime<Utc>),

    /// The proposal's window has closed.
    #[error("proposal expired at {0}")]
    Expired(DateTime<Utc>),

    /// `expire` was called before the window closed.
    #[error("proposal does not expire until {0}")]
    NotExpired(DateTime<Utc>),

    /// The ticket payload could not be encoded for signing.
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),
}

// ---------------------------------------------------------------------------
// CustodyAccount
// ---------------------------------------------------------------------------

/// A threshold-multisig account wrapping a vault.
#[derive(Debug)]
pub struct CustodyAccount<V: Vault = MemoryVault> {
    vault: V,
    members: Vec<MemberKey>,
    threshold: usize,
    proposals: HashMap<Uuid, Proposal>,
}

impl<V: Vault> CustodyAccount<V> {
    /// Creates an account over `vault`.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::InvalidThreshold`] for a threshold of zero
    /// or above the member count, [`GovernanceError::TooManyMembers`] past
    /// `MAX_MEMBERS`, and [`GovernanceError::DuplicateMember`] if a key
    /// repeats.
    pub fn new(
        vault: V,
        members: impl IntoIterator<Item = MemberKey>,
        threshold: usize,
    ) -> Result<Self, GovernanceError> {
        let mut set: Vec<MemberKey> = Vec::new();
        for member in members {
            if set.contains(&member) {
                return Err(GovernanceError::DuplicateMember(member));
            }
            set.push(member);
        }

        if set.len() > MAX_MEMBERS {
            return Err(GovernanceError::TooManyMembers {
                count: set.len(),
                max: MAX_MEMBERS,
            });
        }
        if threshold == 0 || threshold > set.len() {
            return Err(GovernanceError::InvalidThreshold {
                threshold,
                members: set.len(),
            });
        }

        tracing::info!(
            vault = %vault.address(),
            members = set.len(),
            threshold,
            "custody account created"
        );

        Ok(Self {
            vault,
            members: set,
            threshold,
            proposals: HashMap::new(),
        })
    }

    /// The governed vault. Executed tickets are redeemed against it.
    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn members(&self) -> &[MemberKey] {
        &self.members
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn is_member(&self, key: &MemberKey) -> bool {
        self.members.contains(key)
    }

    /// Looks up a proposal by id.
    pub fn proposal(&self, id: Uuid) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    /// All proposals, in no particular order.
    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    // ---- Proposing ----

    /// Submits `ticket` for approval.
    ///
    /// The proposal becomes executable at `execution_time` and stops being
    /// executable at `expiration_time`.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::NotAMember`] if the proposer is not in the
    /// member set and [`GovernanceError::InvalidWindow`] if the window is
    /// empty. On error the ticket is dropped.
    pub fn propose(
        &mut self,
        proposer: MemberKey,
        ticket: Ticket,
        execution_time: DateTime<Utc>,
        expiration_time: DateTime<Utc>,
    ) -> Result<Uuid, GovernanceError> {
        if !self.is_member(&proposer) {
            return Err(GovernanceError::NotAMember(proposer));
        }
        if execution_time >= expiration_time {
            return Err(GovernanceError::InvalidWindow {
                execution_time,
                expiration_time,
            });
        }

        let digest = ticket.digest()?;
        let proposal = Proposal::new(proposer, ticket, digest, execution_time, expiration_time);
        let id = proposal.id;

        tracing::info!(
            proposal = %id,
            kind = %proposal.kind,
            assets = proposal.assets.len(),
            proposer = %proposer,
            "ticket proposed"
        );
        self.proposals.insert(id, proposal);
        Ok(id)
    }

    /// Proposes a ticket of `kind` over `assets`, executable from `now` for
    /// the default proposal lifetime.
    pub fn propose_ticket(
        &mut self,
        proposer: MemberKey,
        kind: TicketKind,
        assets: impl IntoIterator<Item = AssetId>,
        now: DateTime<Utc>,
    ) -> Result<Uuid, GovernanceError> {
        let ttl = Duration::seconds(DEFAULT_PROPOSAL_TTL.as_secs() as i64);
        self.propose(proposer, Ticket::create(kind, assets), now, now + ttl)
    }

    // ---- Approving ----

    /// Records `member`'s approval.
    ///
    /// `signature` must verify over [`Proposal::approval_message`]. Once the
    /// number of approvals reaches the threshold the proposal becomes
    /// `Approved`. Further approvals on an approved proposal are recorded
    /// but change nothing else.
    pub fn approve(
        &mut self,
        proposal_id: Uuid,
        member: MemberKey,
        signature: MemberSignature,
        now: DateTime<Utc>,
    ) -> Result<ProposalStatus, GovernanceError> {
        if !self.is_member(&member) {
            return Err(GovernanceError::NotAMember(member));
        }
        let threshold = self.threshold;
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::UnknownProposal(proposal_id))?;

        if proposal.status.is_terminal() {
            return Err(GovernanceError::InvalidState {
                current: proposal.status,
                expected: ProposalStatus::Pending,
            });
        }
        if proposal.is_expired_at(now) {
            return Err(GovernanceError::Expired(proposal.expiration_time));
        }
        if proposal.has_approved(&member) {
            return Err(GovernanceError::AlreadyApproved(member));
        }
        if let Err(e) = require_valid(&member, &proposal.approval_message(), &signature) {
            tracing::warn!(proposal = %proposal_id, member = %member, error = %e, "approval signature rejected");
            return Err(GovernanceError::InvalidSignature(member));
        }

        proposal.approvals.push(Approval {
            member,
            signature,
            approved_at: now,
        });
        if proposal.status == ProposalStatus::Pending && proposal.approval_count() >= threshold {
            proposal.status = ProposalStatus::Approved;
        }

        tracing::info!(
            proposal = %proposal_id,
            member = %member,
            approvals = proposal.approval_count(),
            threshold,
            status = %proposal.status,
            "proposal approved by member"
        );
        Ok(proposal.status)
    }

    // ---- Execution ----

    /// Hands the authorized ticket to the caller.
    ///
    /// Only `Approved` proposals inside `[execution_time, expiration_time)`
    /// execute. A failed call leaves the proposal untouched.
    pub fn execute(&mut self, proposal_id: Uuid, now: DateTime<Utc>) -> Result<Ticket, GovernanceError> {
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::UnknownProposal(proposal_id))?;

        if proposal.status != ProposalStatus::Approved {
            return Err(GovernanceError::InvalidState {
                current: proposal.status,
                expected: ProposalStatus::Approved,
            });
        }
        if now < proposal.execution_time {
            return Err(GovernanceError::NotYetExecutable(proposal.execution_time));
        }
        if proposal.is_expired_at(now) {
            return Err(GovernanceError::Expired(proposal.expiration_time));
        }

        let ticket = proposal.take_payload().ok_or(GovernanceError::InvalidState {
            current: proposal.status,
            expected: ProposalStatus::Approved,
        })?;
        proposal.status = ProposalStatus::Executed;

        tracing::info!(proposal = %proposal_id, kind = %ticket.kind(), "ticket issued");
        Ok(ticket)
    }

    /// Marks an un-executed proposal past its window as `Expired` and drops
    /// its payload.
    pub fn expire(&mut self, proposal_id: Uuid, now: DateTime<Utc>) -> Result<(), GovernanceError> {
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::UnknownProposal(proposal_id))?;

        if proposal.status.is_terminal() {
            return Err(GovernanceError::InvalidState {
                current: proposal.status,
                expected: ProposalStatus::Pending,
            });
        }
        if !proposal.is_expired_at(now) {
            return Err(GovernanceError::NotExpired(proposal.expiration_time));
        }

        proposal.status = ProposalStatus::Expired;
        let discarded = proposal.take_payload();
        tracing::info!(
            proposal = %proposal_id,
            assets = discarded.as_ref().map_or(0, |t| t.pending().len()),
            "proposal expired, ticket discarded"
        );
        Ok(())
    }
}
