//! Newsletter double opt-in, settings and unsubscribe.
//!
//! Every subscriber carries two opaque tokens generated by the store:
//! - a confirm token, mailed on signup and spent by the first confirmation;
//! - an unsubscribe token, durable and linked from every newsletter email.
//!
//! The token in the URL is the only credential these endpoints accept.

pub(crate) mod confirm;
pub mod memory_storage;
pub mod pg_storage;
pub(crate) mod settings;
mod state;
pub mod storage;
pub(crate) mod subscribe;
pub mod types;
pub(crate) mod unsubscribe;
mod utils;

pub use confirm::ConfirmStatus;
pub use memory_storage::MemorySubscriberStore;
pub use pg_storage::PgSubscriberStore;
pub use state::{NewsletterConfig, NewsletterState};
pub use storage::{SubscribeOutcome, SubscriberRecord, SubscriberStore, TokenRole};
pub(crate) use utils::mask_email;
pub use utils::{DEFAULT_LOCALE, LOCALES};
