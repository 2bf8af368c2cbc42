use sha2::{Digest, Sha256};

/// One-way transform of a plaintext credential into its stored form.
///
/// Verification re-applies the transform and compares digests; the
/// plaintext is never persisted.
pub fn hash_credential(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a plaintext credential against a stored hash.
pub fn verify_credential(secret: &str, stored_hash: &str) -> bool {
    hash_credential(secret) == stored_hash
}
