use super::handlers::{admin, health, newsletter};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI document.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` document.
pub(crate) fn api_router() -> OpenApiRouter {
    // Handlers sharing a path must be registered in the same `routes!` call.
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(admin::login::login))
        .routes(routes!(admin::session::logout))
        .routes(routes!(admin::session::session))
        .routes(routes!(admin::subscribers::list_subscribers))
        .routes(routes!(newsletter::subscribe::subscribe))
        .routes(routes!(newsletter::confirm::confirm))
        .routes(routes!(
            newsletter::unsubscribe::unsubscribe_link,
            newsletter::unsubscribe::unsubscribe
        ))
        .routes(routes!(
            newsletter::settings::settings,
            newsletter::settings::update_settings
        ));

    let mut admin_tag = Tag::new("admin");
    admin_tag.description = Some("Operator login and session".to_string());

    let mut newsletter_tag = Tag::new("newsletter");
    newsletter_tag.description = Some("Double opt-in, settings and unsubscribe".to_string());

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Liveness and build information".to_string());

    router.get_openapi_mut().tags = Some(vec![admin_tag, newsletter_tag, health_tag]);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `:` separated and may include "Name <email>".
    let primary = env!("CARGO_PKG_AUTHORS").split(':').next().map(str::trim)?;
    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    Some(value.trim()).filter(|value| !value.is_empty())
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value).filter(|value| !value.is_empty())
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match author.split_once('<') {
        Some((name, email)) => (
            non_empty(name.trim()),
            non_empty(email.trim_end_matches('>').trim()),
        ),
        None => (non_empty(author.trim()), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let doc = openapi();
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));

        let contact = doc.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Team Hourglass"));
            assert_eq!(contact.email.as_deref(), Some("team@hourglass.money"));
        }

        let license = doc.info.license;
        assert!(license.is_some_and(|license| license.name == "BSD-3-Clause"));
    }

    #[test]
    fn openapi_tags_and_paths() {
        let doc = openapi();
        let tags = doc.tags.clone().unwrap_or_default();
        for name in ["admin", "newsletter", "health"] {
            assert!(tags.iter().any(|tag| tag.name == name), "missing tag {name}");
        }
        for path in [
            "/health",
            "/api/admin/login",
            "/api/admin/logout",
            "/api/admin/session",
            "/api/admin/subscribers",
            "/api/newsletter/subscribe",
            "/api/newsletter/confirm",
            "/api/newsletter/unsubscribe",
            "/api/newsletter/settings",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn unsubscribe_path_documents_both_methods() {
        let doc = openapi();
        let item = doc.paths.paths.get("/api/newsletter/unsubscribe");
        assert!(item.is_some_and(|item| item.get.is_some() && item.post.is_some()));
    }

    #[test]
    fn parse_author_variants() {
        assert_eq!(
            parse_author("Team Hourglass <team@hourglass.money>"),
            (Some("Team Hourglass"), Some("team@hourglass.money"))
        );
        assert_eq!(parse_author("Solo"), (Some("Solo"), None));
        assert_eq!(parse_author("<only@mail.dev>"), (None, Some("only@mail.dev")));
    }
}
