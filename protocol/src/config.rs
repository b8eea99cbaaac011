//! # Protocol Configuration & Constants
//!
//! Every magic number in Strongroom lives here. If you're hardcoding a
//! constant somewhere else, move it here.
//!
//! Changing the domain separators or the ticket encoding version changes
//! every asset identifier and every proposal digest derived from them, so
//! treat those as frozen once tickets are being signed for real.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full protocol version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Version byte prefixed to every encoded ticket payload. Bump when the
/// ticket layout changes so old signatures stop verifying against new
/// payloads.
pub const TICKET_ENCODING_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Length of an asset identifier in bytes. BLAKE3 output size.
pub const ASSET_ID_LENGTH: usize = 32;

/// Domain separator for asset identifiers derived from a human label.
pub const ASSET_LABEL_DOMAIN: &[u8] = b"strongroom/asset/label/v1";

/// Domain separator for freshly minted asset identifiers.
pub const ASSET_MINT_DOMAIN: &[u8] = b"strongroom/asset/mint/v1";

/// Domain separator for ticket payload digests (the message members sign).
pub const TICKET_DIGEST_DOMAIN: &[u8] = b"strongroom/ticket/v1";

/// Domain separator for vault addresses derived from a label.
pub const VAULT_ADDRESS_DOMAIN: &[u8] = b"strongroom/vault/v1";

/// Prefix of the human-readable vault address, e.g. `vault:3f9a...`.
pub const VAULT_ADDRESS_PREFIX: &str = "vault:";

/// Label used for the vault when a scenario does not name one.
pub const DEFAULT_VAULT_LABEL: &str = "treasury";

// ---------------------------------------------------------------------------
// Governance
// ---------------------------------------------------------------------------

/// Default lifetime of a proposal when the caller does not give an explicit
/// expiration: one week.
pub const DEFAULT_PROPOSAL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Domain separator for the message a member signs to approve a proposal.
/// Binds the proposal id to the digest of its ticket payload.
pub const PROPOSAL_APPROVAL_DOMAIN: &[u8] = b"strongroom/approval/v1";

/// Upper bound on the number of members in one custody account. Approval
/// bookkeeping is linear in the member count.
pub const MAX_MEMBERS: usize = 64;
