//! Admin authentication.
//!
//! Flow Overview:
//! 1) `POST /api/admin/login` checks the lockout gate, then the configured
//!    operator credentials, and sets a signed session cookie.
//! 2) Admin-only endpoints call `require_admin`, which accepts the cookie or an
//!    `Authorization: Bearer` header and recomputes the token signature.
//! 3) `POST /api/admin/logout` only clears the cookie; tokens stay valid until
//!    they expire.
//!
//! ## Lockout
//!
//! Failed logins are counted per client IP in process memory. After
//! `max_attempts` failures the client is refused for the lockout window without
//! the credentials being checked. Each instance keeps its own counters, so a
//! deployment with several replicas multiplies the effective attempt budget.

pub mod credentials;
pub(crate) mod login;
pub mod login_attempts;
pub(crate) mod session;
pub mod session_token;
mod state;
pub(crate) mod subscribers;
pub mod types;
mod utils;

pub use credentials::{AdminCredentials, CredentialVerifier, verify_credentials};
pub use login_attempts::{AttemptDecision, LoginAttemptTracker};
pub use session::SESSION_COOKIE_NAME;
pub use session_token::{IssuedSession, SessionTokenCodec};
pub use state::{AdminConfig, AdminState};
