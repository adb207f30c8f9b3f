//! Map parsed CLI arguments to the server action.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_DSN, ARG_PORT, ARG_SITE_BASE_URL, admin};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .map(|dsn| dsn.trim().to_string())
        .filter(|dsn| !dsn.is_empty());
    let site_base_url = matches
        .get_one::<String>(ARG_SITE_BASE_URL)
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
        .context("missing required argument: --site-base-url")?;

    let admin = admin::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        site_base_url,
        admin,
    }))
}
