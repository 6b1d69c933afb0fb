//! Lexical fingerprinting.
//!
//! The fingerprint is the Tier-1 exact-match bucket key: a versioned SHA-256
//! digest over the normalized token sequence joined by single spaces. Two
//! submissions with identical token sequences always collide, regardless of
//! the formatting or comments in their original sources.

use sha2::{Digest, Sha256};

/// Version prefix baked into every fingerprint. Bumping it retires all
/// existing buckets, so change it only when the token join rule changes.
pub const FINGERPRINT_VERSION: u32 = 1;

/// Compute the exact-match fingerprint for a normalized token sequence.
///
/// Layout hashed: `version.to_be_bytes() || 0x00 || join(tokens, " ")`.
/// The discriminator byte keeps the digest domain separate from any future
/// token-level hashes.
pub fn fingerprint_tokens(tokens: &[String]) -> String {
    let joined = tokens.join(" ");
    let mut hasher = Sha256::new();
    hasher.update(FINGERPRINT_VERSION.to_be_bytes());
    hasher.update([0]);
    hasher.update(joined.as_bytes());
    hex::encode(hasher.finalize())
}
