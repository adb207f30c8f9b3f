//! Small helpers for newsletter validation, tokens and links.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{RngCore, rngs::OsRng};
use regex::Regex;
use url::Url;

/// Locales the site is translated into.
pub const LOCALES: [&str; 5] = ["en", "de", "ar", "es", "fr"];

pub const DEFAULT_LOCALE: &str = "en";

pub(crate) fn valid_locale(locale: &str) -> bool {
    LOCALES.contains(&locale)
}

/// Allowed locale or the default; used where a redirect must always land somewhere.
pub(super) fn locale_or_default(locale: Option<&str>) -> &str {
    locale
        .map(str::trim)
        .filter(|locale| valid_locale(locale))
        .unwrap_or(DEFAULT_LOCALE)
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Keep the first two characters of the local part and the whole domain.
///
/// `ab@example.com` becomes `ab***@example.com`; an address without `@` is
/// masked entirely.
pub(crate) fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{visible}***@{domain}")
        }
        None => "***".to_string(),
    }
}

/// 32 random bytes, URL-safe base64 without padding.
pub(crate) fn generate_subscriber_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate subscriber token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Trim optional free-text fields; blank means absent.
pub(super) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Link in the confirmation email.
pub(super) fn build_confirm_url(site_base_url: &str, token: &str, locale: &str) -> Result<String> {
    let mut url = api_url(site_base_url, "api/newsletter/confirm")?;
    url.query_pairs_mut()
        .append_pair("token", token)
        .append_pair("locale", locale);
    Ok(url.into())
}

/// Link in every newsletter email.
pub(super) fn build_unsubscribe_url(site_base_url: &str, token: &str) -> Result<String> {
    let mut url = api_url(site_base_url, "api/newsletter/unsubscribe")?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url.into())
}

fn api_url(site_base_url: &str, path: &str) -> Result<Url> {
    let base = format!("{}/", site_base_url.trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|base| base.join(path))
        .with_context(|| format!("Invalid site base URL: {site_base_url}"))
}

/// Site-relative path of a confirm status page.
pub(super) fn confirm_status_path(locale: &str, status: &str) -> String {
    format!("/{locale}/newsletter/confirmed?status={status}")
}

/// Site-relative path of the unsubscribe feedback page; the page reports a missing token itself.
pub(super) fn unsubscribe_page_path(locale: &str, token: Option<&str>) -> String {
    match token {
        Some(token) => {
            let encoded: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
            format!("/{locale}/newsletter/unsubscribe?token={encoded}")
        }
        None => format!("/{locale}/newsletter/unsubscribe"),
    }
}
