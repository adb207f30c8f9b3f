//! # Hourglass (admin session gate and newsletter tokens)
//!
//! `hourglass` is the server-side core behind the Hourglass website. Pages,
//! calculators and translations live elsewhere; this crate owns the two flows
//! that carry security-relevant state.
//!
//! ## Admin Sessions
//!
//! A single operator signs in with a configured email/password pair. Both
//! halves are hashed before a constant-time comparison, so the check does not
//! leak timing or which half was wrong. A successful login issues a
//! self-contained HMAC-signed token (`admin:<expires_ms>:<hex signature>`)
//! stored in an `HttpOnly` cookie. There is no server-side session record and
//! no revocation list; tokens die by expiry.
//!
//! Failed logins are counted per client address. After the configured number
//! of failures the address is locked out and every attempt is rejected before
//! credentials are looked at. Lockouts live in process memory only.
//!
//! ## Newsletter Tokens
//!
//! Each subscriber carries two opaque tokens: a single-use confirm token for
//! double opt-in and a durable unsubscribe token. Tokens are the only
//! authorization for confirm, settings and unsubscribe actions.
//!
//! - **Confirm:** redirects to a locale-prefixed status page
//!   (`success`, `already`, `invalid`, `error`).
//! - **Unsubscribe:** `GET` only redirects to a feedback page; the state
//!   change needs a `POST`, so mail scanners prefetching links cannot
//!   unsubscribe anyone.
//! - **Settings:** accepts either token role.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
