use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

const SCHEME: &str = "sha256";

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Salted hash in the form `sha256$<salt>$<hex digest>`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let hash = digest(&salt, password);
    format!("{SCHEME}${salt}${hash}")
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(SCHEME), Some(salt), Some(hash)) => {
            digest(salt, password).as_bytes().ct_eq(hash.as_bytes()).into()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let stored = hash_password("hunter2");
        assert!(stored.starts_with("sha256$"));
        assert!(verify_password("hunter2", &stored));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let stored = hash_password("hunter2");
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn same_password_gets_a_fresh_salt() {
        assert_ne!(hash_password("pw"), hash_password("pw"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("pw", "plaintext"));
        assert!(!verify_password("pw", "md5$salt$abc"));
    }

    #[test]
    fn truncated_or_altered_digest_never_verifies() {
        let stored = hash_password("pw");
        assert!(!verify_password("pw", &stored[..stored.len() - 1]));

        let mut altered = stored.clone();
        let last = if altered.ends_with('0') { '1' } else { '0' };
        altered.pop();
        altered.push(last);
        assert!(!verify_password("pw", &altered));
    }
}
