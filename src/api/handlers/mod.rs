//! API handlers for hourglass.
//!
//! `admin` holds the operator login, session guard and lockout tracker;
//! `newsletter` holds the token-driven subscriber flows and their stores.

pub mod admin;
pub mod health;
pub mod newsletter;
pub mod root;
