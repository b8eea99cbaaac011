//! # Cryptographic Primitives
//!
//! - **BLAKE3** for asset identifiers, vault addresses and ticket digests.
//! - **Ed25519** for member approvals in the governance layer.
//!
//! Everything here is a thin, typed wrapper around audited crates.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{blake3_hash, domain_hash};
pub use keys::{KeyError, MemberKey, MemberKeypair, MemberSignature};
pub use signatures::{require_valid, sign, verify, SignatureError};
