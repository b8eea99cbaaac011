//! # Hashing Utilities
//!
//! Strongroom uses exactly one hash function: **BLAKE3**. Asset identifiers,
//! vault addresses and ticket digests are all BLAKE3 outputs over a
//! domain-separated preimage, so a digest produced for one purpose can never
//! be replayed as a digest for another.
//!
//! The domain separators live in [`crate::config`].

/// Compute the BLAKE3 hash of the input data.
///
/// # Example
///
/// ```
/// use strongroom_protocol::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"strongroom");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute `BLAKE3(len(domain) || domain || data)`.
///
/// The domain is length-prefixed (one little-endian `u16`) so that no
/// `(domain, data)` pair can collide with another pair whose domain happens
/// to be a prefix of the first.
pub fn domain_hash(domain: &[u8], data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(domain.len() as u16).to_le_bytes());
    hasher.update(domain);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}
