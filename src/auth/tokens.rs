use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{NewToken, TokenPurpose};

/// Lifetime of emailed verification and reset tokens.
pub const EMAIL_TOKEN_TTL: Duration = Duration::minutes(60);

/// Random plaintext for an emailed link: 32 random bytes as hex, suffixed with the user id.
pub fn generate_token(user_id: Uuid) -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    format!("{}{}", hex::encode(bytes), user_id.simple())
}

/// SHA-256 hex digest; the only form of the token that is stored.
pub fn hash_token(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

/// Fresh plaintext plus the record to persist for it.
pub fn issue(user_id: Uuid, purpose: TokenPurpose, now: OffsetDateTime) -> (String, NewToken) {
    let plain = generate_token(user_id);
    let record = NewToken {
        user_id,
        purpose,
        token_hash: hash_token(&plain),
        expires_at: now + EMAIL_TOKEN_TTL,
    };
    (plain, record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique_and_bound_to_user() {
        let user_id = Uuid::new_v4();
        let a = generate_token(user_id);
        let b = generate_token(user_id);
        assert_ne!(a, b);
        assert_eq!(a.len(), 64 + 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(a.ends_with(&user_id.simple().to_string()));
    }

    #[test]
    fn hash_is_stable_hex() {
        let h = hash_token("abc");
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_token("abc"), h);
    }

    #[test]
    fn issue_stores_hash_not_plaintext() {
        let now = OffsetDateTime::now_utc();
        let (plain, record) = issue(Uuid::new_v4(), TokenPurpose::Verification, now);
        assert_ne!(record.token_hash, plain);
        assert_eq!(record.token_hash, hash_token(&plain));
        assert_eq!(record.expires_at - now, Duration::minutes(60));
    }
}
