// ============================
// webpanel-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! Every user carries their own random salt, regenerated on each
//! password change. The salt is appended to the password before the
//! scrypt hash, so the stored PHC string alone is never enough to
//! test a candidate password.
use scrypt::{password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng}, Scrypt};
use rand::RngCore;
use zeroize::Zeroize;

/// Per-user salt length in bytes (hex-encoded for storage)
pub const SALT_BYTES: usize = 32;

/// Salt used to burn a hash for unknown usernames so the lookup path
/// costs the same as a real verification.
pub(crate) const DUMMY_SALT: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Generate a fresh random salt (hex-encoded)
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a password combined with its per-user salt using scrypt
pub fn hash_password(plain: &str, salt: &str) -> anyhow::Result<String> {
    let salted = format!("{plain}{salt}");
    let phc_salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password(salted.as_bytes(), &phc_salt)?
        .to_string();
    Ok(hash)
}

/// Verify a password against a stored hash and per-user salt
pub fn verify_password(hash: &str, salt: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    let salted = format!("{plain}{salt}");
    Scrypt.verify_password(salted.as_bytes(), &parsed_hash).is_ok()
}

/// Hash a password and zeroize the plaintext buffer
pub fn hash_password_secure(plain: &mut String, salt: &str) -> anyhow::Result<String> {
    let hash = hash_password(plain, salt);
    plain.zeroize();
    hash
}
