//! Random tokens and HMAC signing.
//!
//! Session and reset tokens are handed to the browser in clear and stored
//! only as an HMAC-SHA256 digest keyed by `SESSION_SECRET`. The same key
//! signs small cookie values (flash messages, the pending signup email).

use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Random bytes in a session or reset token before encoding.
const TOKEN_BYTES: usize = 32;

const TEMP_PASSWORD_LEN: usize = 12;
const TEMP_PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";

/// Generates a URL-safe random token (43 characters).
pub fn generate_url_token() -> String {
    let mut buffer = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut buffer);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer)
}

/// Generates a 6-digit one-time code, zero padded.
pub fn generate_otp() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000))
}

/// Generates a temporary password for admin-approved resets.
pub fn generate_temporary_password() -> String {
    let mut rng = rand::rng();

    (0..TEMP_PASSWORD_LEN)
        .map(|_| {
            let idx = rng.random_range(0..TEMP_PASSWORD_CHARSET.len());
            TEMP_PASSWORD_CHARSET[idx] as char
        })
        .collect()
}

/// Transaction id for a fine payment: `TXN`, the timestamp, four random digits.
pub fn generate_transaction_id(now: DateTime<Utc>) -> String {
    format!(
        "TXN{}{:04}",
        now.format("%Y%m%d%H%M%S"),
        rand::rng().random_range(0..10_000)
    )
}

/// HMAC-SHA256 keyed by the server secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        <HmacSha256 as Mac>::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }

    /// Hashes a raw token for storage. Returns 64 lowercase hex characters.
    pub fn hash_token(&self, token: &str) -> String {
        let mut mac = self.mac();
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Appends a signature to `value`: `<base64 value>.<hex mac>`.
    pub fn sign(&self, value: &str) -> String {
        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(value);
        let signature = self.hash_token(&encoded);
        format!("{encoded}.{signature}")
    }

    /// Returns the original value if the signature matches.
    pub fn verify(&self, signed: &str) -> Option<String> {
        let (encoded, signature) = signed.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(encoded.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(encoded)
            .ok()?;
        String::from_utf8(bytes).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_url_token_is_url_safe_and_unique() {
        let tokens: HashSet<String> = (0..100).map(|_| generate_url_token()).collect();
        assert_eq!(tokens.len(), 100);

        for token in &tokens {
            assert_eq!(token.len(), 43);
            assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }

    #[test]
    fn test_otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_temporary_password_length() {
        let password = generate_temporary_password();
        assert_eq!(password.len(), TEMP_PASSWORD_LEN);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_transaction_id_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 14, 7, 9).unwrap();
        let id = generate_transaction_id(now);

        assert!(id.starts_with("TXN20260305140709"));
        assert_eq!(id.len(), 3 + 14 + 4);
        assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_hash_token_is_keyed() {
        let a = TokenSigner::new("secret-a");
        let b = TokenSigner::new("secret-b");

        assert_eq!(a.hash_token("t"), a.hash_token("t"));
        assert_ne!(a.hash_token("t"), b.hash_token("t"));
        assert_eq!(a.hash_token("t").len(), 64);
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = TokenSigner::new("secret");
        let signed = signer.sign("student@rgmcet.edu.in");

        assert_eq!(
            signer.verify(&signed).as_deref(),
            Some("student@rgmcet.edu.in")
        );
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let signer = TokenSigner::new("secret");
        let signed = signer.sign("hello");
        let (_, signature) = signed.rsplit_once('.').unwrap();
        let forged = format!(
            "{}.{signature}",
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode("world")
        );

        assert!(signer.verify(&forged).is_none());
        assert!(TokenSigner::new("other").verify(&signed).is_none());
        assert!(signer.verify("garbage").is_none());
    }
}
