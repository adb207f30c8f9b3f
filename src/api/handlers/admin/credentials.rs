//! Admin credential check.
//!
//! Both the submitted and the configured values are hashed before comparison
//! so the constant-time compare always runs over equal-length buffers.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Credential check used by the login handler.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, email: &str, password: &str) -> bool;
}

/// The single configured operator account.
#[derive(Clone, Default)]
pub struct AdminCredentials {
    email: Option<String>,
    password: Option<SecretString>,
}

impl AdminCredentials {
    #[must_use]
    pub fn new(email: Option<String>, password: Option<SecretString>) -> Self {
        Self { email, password }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.email.is_some() && self.password.is_some()
    }
}

impl CredentialVerifier for AdminCredentials {
    fn verify(&self, email: &str, password: &str) -> bool {
        verify_credentials(
            email,
            password,
            self.email.as_deref(),
            self.password.as_ref().map(|password| password.expose_secret()),
        )
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Compare a submitted credential pair against the reference pair.
///
/// Emails are trimmed and lower-cased, passwords are compared verbatim. A
/// missing reference value always fails.
#[must_use]
pub fn verify_credentials(
    email: &str,
    password: &str,
    reference_email: Option<&str>,
    reference_password: Option<&str>,
) -> bool {
    let (Some(reference_email), Some(reference_password)) = (reference_email, reference_password)
    else {
        return false;
    };

    let submitted_email = digest(&normalize_email(email));
    let expected_email = digest(&normalize_email(reference_email));
    let submitted_password = digest(password);
    let expected_password = digest(reference_password);

    let email_match = submitted_email.as_slice().ct_eq(expected_email.as_slice());
    let password_match = submitted_password
        .as_slice()
        .ct_eq(expected_password.as_slice());

    // `&` on `Choice` evaluates both sides.
    (email_match & password_match).into()
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}
