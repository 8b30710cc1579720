//! Salted password digests for the local identity provider.

use uuid::Uuid;

const PASSWORD_KDF_CONTEXT: &str = "memo-core local-identity password v1";

pub(crate) struct PasswordDigest {
    pub(crate) salt: String,
    pub(crate) digest: String,
}

/// Derives a digest for `password` under a fresh random salt.
pub(crate) fn derive(password: &str) -> PasswordDigest {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = digest_with_salt(&salt, password).to_hex().to_string();
    PasswordDigest { salt, digest }
}

/// Compares in constant time through `blake3::Hash` equality.
pub(crate) fn verify(salt: &str, stored_digest: &str, password: &str) -> bool {
    match blake3::Hash::from_hex(stored_digest) {
        Ok(stored) => stored == digest_with_salt(salt, password),
        Err(_) => false,
    }
}

fn digest_with_salt(salt: &str, password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(PASSWORD_KDF_CONTEXT);
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize()
}
