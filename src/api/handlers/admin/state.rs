//! Admin auth configuration and shared state.

use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

use super::credentials::CredentialVerifier;
use super::login_attempts::{DEFAULT_LOCKOUT, DEFAULT_MAX_ATTEMPTS, LoginAttemptTracker};
use super::session_token::SessionTokenCodec;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AdminConfig {
    site_base_url: String,
    session_ttl_seconds: i64,
    max_attempts: u32,
    lockout: Duration,
    trust_proxy_headers: bool,
}

impl AdminConfig {
    #[must_use]
    pub fn new(site_base_url: String) -> Self {
        Self {
            site_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout: DEFAULT_LOCKOUT,
            trust_proxy_headers: false,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_lockout_seconds(mut self, seconds: u64) -> Self {
        self.lockout = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn lockout(&self) -> Duration {
        self.lockout
    }

    /// Whether `X-Forwarded-For`/`X-Real-IP` identify the client.
    #[must_use]
    pub fn trust_proxy_headers(&self) -> bool {
        self.trust_proxy_headers
    }

    /// Only mark cookies secure when the site is served over HTTPS.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.site_base_url.starts_with("https://")
    }
}

pub struct AdminState {
    config: AdminConfig,
    credentials: Arc<dyn CredentialVerifier>,
    tokens: SessionTokenCodec,
    attempts: LoginAttemptTracker,
}

impl AdminState {
    pub fn new(
        config: AdminConfig,
        credentials: Arc<dyn CredentialVerifier>,
        session_secret: SecretString,
    ) -> Self {
        let tokens = SessionTokenCodec::new(session_secret, config.session_ttl_seconds());
        let attempts = LoginAttemptTracker::new(config.max_attempts(), config.lockout());
        Self {
            config,
            credentials,
            tokens,
            attempts,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    pub(crate) fn credentials(&self) -> &dyn CredentialVerifier {
        self.credentials.as_ref()
    }

    #[must_use]
    pub fn tokens(&self) -> &SessionTokenCodec {
        &self.tokens
    }

    #[must_use]
    pub fn attempts(&self) -> &LoginAttemptTracker {
        &self.attempts
    }
}
