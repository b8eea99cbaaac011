//! # Member Keys
//!
//! Ed25519 keypairs for the parties of a custody account.
//!
//! Members approve proposals by signing the digest of the ticket payload
//! they are authorizing. The core ticket machinery never touches keys; they
//! exist for the governance layer that issues tickets.
//!
//! Key bytes are never logged. `Debug` prints only the public half.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::hash::blake3_hash;

/// Errors that can occur during key operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or malformed hex")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// A member's signing keypair.
///
/// Deliberately not `Serialize`: exporting a secret key should be an
/// explicit call to [`secret_key_bytes`](Self::secret_key_bytes).
///
/// # Examples
///
/// ```
/// use strongroom_protocol::crypto::MemberKeypair;
///
/// let kp = MemberKeypair::generate();
/// let sig = kp.sign(b"approve");
/// assert!(kp.public_key().verify(b"approve", &sig));
/// ```
pub struct MemberKeypair {
    signing_key: SigningKey,
}

/// The public half of a member identity. This is what a custody account
/// stores in its member set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberKey {
    bytes: [u8; 32],
}

/// An Ed25519 signature. Always 64 bytes once constructed through
/// [`MemberKeypair::sign`] or [`MemberSignature::from_hex`].
#[derive(Clone, PartialEq, Eq)]
pub struct MemberSignature {
    bytes: Vec<u8>,
}

impl MemberKeypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Derives a keypair from a human label by hashing it into a seed.
    ///
    /// Only suitable for simulations and tests: anyone who knows the label
    /// knows the key.
    pub fn from_label(label: &str) -> Self {
        Self::from_seed(&blake3_hash(label.as_bytes()))
    }

    /// Reconstruct a keypair from a hex-encoded secret key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// Returns the member key (public half).
    pub fn public_key(&self) -> MemberKey {
        MemberKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> MemberSignature {
        MemberSignature {
            bytes: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }

    /// Exports the raw 32-byte secret key.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl fmt::Debug for MemberKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberKeypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// MemberKey
// ---------------------------------------------------------------------------

impl MemberKey {
    /// Validates that `bytes` is an Ed25519 point before accepting it.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, KeyError> {
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Parses a hex-encoded public key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidPublicKey)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidPublicKey)?;
        Self::from_bytes(arr)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Hex-encoded representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Returns `true` if `signature` is a valid signature of `message` by
    /// this key. Uses strict verification.
    pub fn verify(&self, message: &[u8], signature: &MemberSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(signature.bytes.as_slice()) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&sig_bytes);
        verifying_key.verify_strict(message, &sig).is_ok()
    }
}

impl fmt::Debug for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberKey({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for MemberKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// Keys and signatures are hex strings on the wire, like every other
// identifier in the workspace.
impl Serialize for MemberKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for MemberKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// MemberSignature
// ---------------------------------------------------------------------------

impl MemberSignature {
    /// Parses a hex-encoded 64-byte signature.
    pub fn from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex_str)?;
        if bytes.len() != 64 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        Ok(Self { bytes })
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Debug for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "MemberSignature({}...)", &hex[..hex.len().min(16)])
    }
}

impl Serialize for MemberSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for MemberSignature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_keys_are_deterministic() {
        let a = MemberKeypair::from_label("alice");
        let b = MemberKeypair::from_label("alice");
        assert_eq!(a.public_key(), b.public_key());
        assert_ne!(a.public_key(), MemberKeypair::from_label("bob").public_key());
    }

    #[test]
    fn hex_roundtrip_preserves_identity() {
        let kp = MemberKeypair::generate();
        let restored = MemberKeypair::from_hex(&hex::encode(kp.secret_key_bytes())).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());
        assert_eq!(
            MemberKey::from_hex(&kp.public_key().to_hex()).unwrap(),
            kp.public_key()
        );
    }

    #[test]
    fn short_secret_rejected() {
        assert_eq!(
            MemberKeypair::from_hex("abcd").unwrap_err(),
            KeyError::InvalidSecretKey
        );
    }

    #[test]
    fn truncated_signature_does_not_verify() {
        let kp = MemberKeypair::generate();
        let sig = MemberSignature {
            bytes: kp.sign(b"m").as_bytes()[..32].to_vec(),
        };
        assert!(!kp.public_key().verify(b"m", &sig));
    }

    #[test]
    fn json_forms_are_hex_strings() {
        let kp = MemberKeypair::from_label("dave");
        let sig = kp.sign(b"m");

        let key_json = serde_json::to_string(&kp.public_key()).unwrap();
        assert_eq!(key_json, format!("\"{}\"", kp.public_key().to_hex()));
        let sig_json = serde_json::to_string(&sig).unwrap();
        assert_eq!(sig_json, format!("\"{}\"", sig.to_hex()));

        let key: MemberKey = serde_json::from_str(&key_json).unwrap();
        let back: MemberSignature = serde_json::from_str(&sig_json).unwrap();
        assert!(key.verify(b"m", &back));
        assert!(serde_json::from_str::<MemberSignature>("\"abcd\"").is_err());
    }

    #[test]
    fn debug_never_prints_secret() {
        let kp = MemberKeypair::from_label("carol");
        let secret = hex::encode(kp.secret_key_bytes());
        assert!(!format!("{:?}", kp).contains(&secret));
    }
}
