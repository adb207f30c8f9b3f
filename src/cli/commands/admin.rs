use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, builder::BoolishValueParser};
use secrecy::SecretString;

pub const ARG_ADMIN_EMAIL: &str = "admin-email";
pub const ARG_ADMIN_PASSWORD: &str = "admin-password";
pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_LOGIN_MAX_ATTEMPTS: &str = "login-max-attempts";
pub const ARG_LOGIN_LOCKOUT_SECONDS: &str = "login-lockout-seconds";
pub const ARG_TRUST_PROXY_HEADERS: &str = "trust-proxy-headers";

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_credential_args(command);
    with_lockout_args(command)
}

fn with_credential_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ADMIN_EMAIL)
                .long(ARG_ADMIN_EMAIL)
                .help("Operator email; admin login is refused when unset")
                .env("HOURGLASS_ADMIN_EMAIL"),
        )
        .arg(
            Arg::new(ARG_ADMIN_PASSWORD)
                .long(ARG_ADMIN_PASSWORD)
                .help("Operator password; admin login is refused when unset")
                .env("HOURGLASS_ADMIN_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("HMAC key for admin session tokens")
                .long_help(
                    "HMAC key for admin session tokens. When unset a random key is generated at startup, so sessions do not survive a restart.",
                )
                .env("HOURGLASS_SESSION_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Admin session lifetime in seconds")
                .env("HOURGLASS_SESSION_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
}

fn with_lockout_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_LOGIN_MAX_ATTEMPTS)
                .long(ARG_LOGIN_MAX_ATTEMPTS)
                .help("Failed admin logins before a client is locked out")
                .env("HOURGLASS_LOGIN_MAX_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_LOGIN_LOCKOUT_SECONDS)
                .long(ARG_LOGIN_LOCKOUT_SECONDS)
                .help("Lockout duration in seconds")
                .env("HOURGLASS_LOGIN_LOCKOUT_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_TRUST_PROXY_HEADERS)
                .long(ARG_TRUST_PROXY_HEADERS)
                .help("Identify clients by X-Forwarded-For/X-Real-IP (only behind a proxy that overwrites them)")
                .env("HOURGLASS_TRUST_PROXY_HEADERS")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
}

pub struct Options {
    pub email: Option<String>,
    pub password: Option<SecretString>,
    pub session_secret: Option<SecretString>,
    pub session_ttl_seconds: i64,
    pub max_attempts: u32,
    pub lockout_seconds: u64,
    pub trust_proxy_headers: bool,
}

impl Options {
    /// Read admin auth options from validated matches.
    ///
    /// # Errors
    /// Currently infallible; kept fallible to match the other option groups.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Ok(Self {
            email: non_empty(ARG_ADMIN_EMAIL),
            // Passwords and secrets are taken verbatim.
            password: matches
                .get_one::<String>(ARG_ADMIN_PASSWORD)
                .filter(|value| !value.is_empty())
                .map(|value| SecretString::from(value.as_str())),
            session_secret: matches
                .get_one::<String>(ARG_SESSION_SECRET)
                .filter(|value| !value.is_empty())
                .map(|value| SecretString::from(value.as_str())),
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(86_400),
            max_attempts: matches
                .get_one::<u32>(ARG_LOGIN_MAX_ATTEMPTS)
                .copied()
                .unwrap_or(5),
            lockout_seconds: matches
                .get_one::<u64>(ARG_LOGIN_LOCKOUT_SECONDS)
                .copied()
                .unwrap_or(900),
            trust_proxy_headers: matches.get_flag(ARG_TRUST_PROXY_HEADERS),
        })
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("session_secret", &self.session_secret.as_ref().map(|_| "***"))
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("max_attempts", &self.max_attempts)
            .field("lockout_seconds", &self.lockout_seconds)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .finish()
    }
}
