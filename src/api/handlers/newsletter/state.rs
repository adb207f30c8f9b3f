use std::sync::Arc;

use super::storage::SubscriberStore;
use crate::api::email::EmailSender;

#[derive(Clone, Debug)]
pub struct NewsletterConfig {
    site_base_url: String,
}

impl NewsletterConfig {
    #[must_use]
    pub fn new(site_base_url: String) -> Self {
        Self { site_base_url }
    }

    /// Public origin used for links in outgoing mail.
    #[must_use]
    pub fn site_base_url(&self) -> &str {
        &self.site_base_url
    }
}

pub struct NewsletterState {
    config: NewsletterConfig,
    store: Arc<dyn SubscriberStore>,
    email: Arc<dyn EmailSender>,
}

impl NewsletterState {
    pub fn new(
        config: NewsletterConfig,
        store: Arc<dyn SubscriberStore>,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            config,
            store,
            email,
        }
    }

    #[must_use]
    pub fn config(&self) -> &NewsletterConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn SubscriberStore {
        self.store.as_ref()
    }

    pub(crate) fn email(&self) -> &dyn EmailSender {
        self.email.as_ref()
    }
}
