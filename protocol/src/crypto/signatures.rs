//! # Digital Signatures
//!
//! Free-function wrappers over [`MemberKeypair`] / [`MemberKey`]. The
//! scenario runner signs approvals with [`sign`] and the custody account
//! checks them with [`require_valid`].
//!
//! Verification is strict (`verify_strict`): small-order keys and
//! non-canonical signatures are rejected.

use thiserror::Error;

use super::keys::{MemberKey, MemberKeypair, MemberSignature};

/// Errors during signature operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature verification failed")]
    VerificationFailed,
}

/// Sign a message with a member keypair.
pub fn sign(keypair: &MemberKeypair, message: &[u8]) -> MemberSignature {
    keypair.sign(message)
}

/// Returns `true` if the signature is valid for `(public_key, message)`.
pub fn verify(public_key: &MemberKey, message: &[u8], signature: &MemberSignature) -> bool {
    public_key.verify(message, signature)
}

/// Like [`verify`] but as a `Result`, for call sites that propagate with `?`.
pub fn require_valid(
    public_key: &MemberKey,
    message: &[u8],
    signature: &MemberSignature,
) -> Result<(), SignatureError> {
    if verify(public_key, message, signature) {
        Ok(())
    } else {
        Err(SignatureError::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let kp = MemberKeypair::generate();
        let sig = sign(&kp, b"approve ticket");
        assert!(verify(&kp.public_key(), b"approve ticket", &sig));
    }

    #[test]
    fn wrong_message_fails() {
        let kp = MemberKeypair::generate();
        let sig = sign(&kp, b"approve ticket 1");
        assert_eq!(
            require_valid(&kp.public_key(), b"approve ticket 2", &sig),
            Err(SignatureError::VerificationFailed)
        );
    }

    #[test]
    fn wrong_key_fails() {
        let alice = MemberKeypair::from_label("alice");
        let bob = MemberKeypair::from_label("bob");
        let sig = sign(&alice, b"m");
        assert!(!verify(&bob.public_key(), b"m", &sig));
    }
}
