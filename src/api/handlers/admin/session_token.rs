//! Stateless admin session tokens.
//!
//! Token layout: `admin:<expires_at_millis>:<hex(HMAC-SHA256(secret, "admin:<expires_at_millis>"))>`.
//!
//! Validity is recomputed from the token content, the server secret and the
//! current time. Nothing is stored server-side, so a token cannot be revoked
//! before it expires and rotating the secret invalidates every token at once.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const ADMIN_ROLE: &str = "admin";
const FIELD_SEPARATOR: char = ':';

/// A freshly issued token and the instant it stops being valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at_millis: i64,
}

pub struct SessionTokenCodec {
    secret: SecretString,
    ttl_seconds: i64,
}

impl SessionTokenCodec {
    #[must_use]
    pub fn new(secret: SecretString, ttl_seconds: i64) -> Self {
        Self {
            secret,
            ttl_seconds,
        }
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue a token that expires `ttl_seconds` from now.
    #[must_use]
    pub fn issue(&self) -> IssuedSession {
        self.issue_at(now_millis())
    }

    #[must_use]
    pub fn issue_at(&self, now_millis: i64) -> IssuedSession {
        let expires_at_millis = now_millis.saturating_add(self.ttl_seconds.saturating_mul(1000));
        let payload = format!("{ADMIN_ROLE}{FIELD_SEPARATOR}{expires_at_millis}");
        let signature = self.sign(&payload);
        IssuedSession {
            token: format!("{payload}{FIELD_SEPARATOR}{signature}"),
            expires_at_millis,
        }
    }

    /// Returns `true` only for an untampered, unexpired token.
    #[must_use]
    pub fn verify(&self, token: &str) -> bool {
        self.verify_at(token, now_millis())
    }

    #[must_use]
    pub fn verify_at(&self, token: &str, now_millis: i64) -> bool {
        self.expires_at(token, now_millis).is_some()
    }

    /// Expiry of a valid token, or `None` when the token is malformed, forged or expired.
    #[must_use]
    pub fn expires_at(&self, token: &str, now_millis: i64) -> Option<i64> {
        let fields: Vec<&str> = token.split(FIELD_SEPARATOR).collect();
        let [role, expires, signature] = fields.as_slice() else {
            return None;
        };
        if *role != ADMIN_ROLE {
            return None;
        }

        let expected = self.sign(&format!("{role}{FIELD_SEPARATOR}{expires}"));
        if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            return None;
        }

        let expires_at_millis = expires.parse::<i64>().ok()?;
        (now_millis < expires_at_millis).then_some(expires_at_millis)
    }

    fn sign(&self, payload: &str) -> String {
        // HMAC accepts keys of any length; an empty signature never matches.
        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes()) else {
            return String::new();
        };
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for SessionTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenCodec")
            .field("secret", &"***")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
