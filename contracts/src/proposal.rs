//! # Proposals
//!
//! A proposal is a ticket waiting for enough members to sign off on it.
//! The ticket travels inside the proposal as its payload and only leaves
//! through [`CustodyAccount::execute`](crate::custody::CustodyAccount::execute).
//!
//! ## Approval Message
//!
//! Members sign `domain_hash(PROPOSAL_APPROVAL_DOMAIN, id || digest)` where
//! `digest` is the ticket payload digest. Binding the proposal id means a
//! signature collected for one proposal cannot be replayed onto another
//! proposal carrying an identical ticket.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use strongroom_protocol::asset::AssetId;
use strongroom_protocol::config::PROPOSAL_APPROVAL_DOMAIN;
use strongroom_protocol::crypto::{domain_hash, MemberKey, MemberSignature};
use strongroom_protocol::ticket::{Ticket, TicketKind};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle of a proposal. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProposalStatus {
    /// Collecting approvals.
    Pending,
    /// Threshold reached; executable inside its window.
    Approved,
    /// The ticket has been handed out.
    Executed,
    /// The window closed before execution. The payload is gone.
    Expired,
}

impl ProposalStatus {
    /// `true` once the proposal can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalStatus::Executed | ProposalStatus::Expired)
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalStatus::Pending => write!(f, "Pending"),
            ProposalStatus::Approved => write!(f, "Approved"),
            ProposalStatus::Executed => write!(f, "Executed"),
            ProposalStatus::Expired => write!(f, "Expired"),
        }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One member's recorded sign-off.
#[derive(Debug, Clone, Serialize)]
pub struct Approval {
    pub member: MemberKey,
    pub signature: MemberSignature,
    pub approved_at: DateTime<Utc>,
}

/// A ticket awaiting authorization.
///
/// The ticket itself is not serialized; reports show its kind, the declared
/// assets and the digest members signed.
#[derive(Debug, Serialize)]
pub struct Proposal {
    /// Unique identifier for this proposal.
    pub id: Uuid,
    /// The member who submitted it.
    pub proposer: MemberKey,
    /// Kind of ticket carried.
    pub kind: TicketKind,
    /// Declared asset list, in declaration order.
    pub assets: Vec<AssetId>,
    /// Hex-encoded digest of the ticket payload.
    pub payload_digest: String,
    /// Approvals collected so far, in arrival order.
    pub approvals: Vec<Approval>,
    pub created_at: DateTime<Utc>,
    /// Earliest instant the ticket may be handed out.
    pub execution_time: DateTime<Utc>,
    /// Instant from which the proposal can no longer execute.
    pub expiration_time: DateTime<Utc>,
    pub status: ProposalStatus,
    #[serde(skip)]
    digest: [u8; 32],
    #[serde(skip)]
    payload: Option<Ticket>,
}

impl Proposal {
    pub(crate) fn new(
        proposer: MemberKey,
        ticket: Ticket,
        digest: [u8; 32],
        execution_time: DateTime<Utc>,
        expiration_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            proposer,
            kind: ticket.kind(),
            assets: ticket.pending().to_vec(),
            payload_digest: hex::encode(digest),
            approvals: Vec::new(),
            created_at: Utc::now(),
            execution_time,
            expiration_time,
            status: ProposalStatus::Pending,
            digest,
            payload: Some(ticket),
        }
    }

    /// The exact bytes a member signs to approve this proposal.
    pub fn approval_message(&self) -> [u8; 32] {
        let mut data = Vec::with_capacity(16 + self.digest.len());
        data.extend_from_slice(self.id.as_bytes());
        data.extend_from_slice(&self.digest);
        domain_hash(PROPOSAL_APPROVAL_DOMAIN, &data)
    }

    /// Whether `member` has already signed off.
    pub fn has_approved(&self, member: &MemberKey) -> bool {
        self.approvals.iter().any(|a| &a.member == member)
    }

    pub fn approval_count(&self) -> usize {
        self.approvals.len()
    }

    /// `true` while the payload has not been handed out or discarded.
    pub fn holds_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Borrow the payload ticket without taking it.
    pub fn payload(&self) -> Option<&Ticket> {
        self.payload.as_ref()
    }

    pub(crate) fn take_payload(&mut self) -> Option<Ticket> {
        self.payload.take()
    }

    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration_time
    }
}
