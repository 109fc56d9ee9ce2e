use rand::RngCore;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

/// Salt and salted hash as stored in `Account_Credential`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub salted_hash: String,
    pub salt: String,
}

impl Credential {
    /// Derive a fresh credential for `password` with a new random salt
    pub fn derive(password: &str, salt_length: usize) -> Self {
        let salt = generate_salt(salt_length);
        let salted_hash = generate_hash(password, &salt);
        Self { salted_hash, salt }
    }

    /// Recompute the hash with the stored salt and compare
    pub fn verify(&self, password: &str) -> bool {
        let candidate = generate_hash(password, &self.salt);
        candidate.as_bytes().ct_eq(self.salted_hash.as_bytes()).into()
    }
}

/// `length` random bytes from the thread-local CSPRNG, hex encoded
pub fn generate_salt(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hex SHA-512 of the password followed by the salt
pub fn generate_hash(password: &str, salt: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}
