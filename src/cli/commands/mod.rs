pub mod admin;
pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_PORT: &str = "port";
pub const ARG_DSN: &str = "dsn";
pub const ARG_SITE_BASE_URL: &str = "site-base-url";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("hourglass")
        .about("Admin session gate and newsletter token service")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("HOURGLASS_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("PostgreSQL connection string for the subscriber store")
                .long_help(
                    "PostgreSQL connection string for the subscriber store. Without it subscribers are kept in memory and lost on restart.",
                )
                .env("HOURGLASS_DSN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SITE_BASE_URL)
                .long(ARG_SITE_BASE_URL)
                .help("Public site URL used for email links, CORS and the Secure cookie flag")
                .env("HOURGLASS_SITE_BASE_URL")
                .default_value("https://hourglass.money"),
        );

    let command = admin::with_args(command);
    logging::with_args(command)
}
