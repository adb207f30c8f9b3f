use anyhow::{Context, Result, anyhow};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, RETRY_AFTER, SET_COOKIE},
    },
    response::Response,
};
use hourglass::api::{
    self,
    email::RecordingEmailSender,
    handlers::{
        admin::{AdminConfig, AdminCredentials, AdminState, SESSION_COOKIE_NAME},
        newsletter::{MemorySubscriberStore, NewsletterConfig, NewsletterState},
    },
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use url::Url;

const ADMIN_EMAIL: &str = "owner@hourglass.money";
const ADMIN_PASSWORD: &str = "correct horse battery staple";
const SITE: &str = "https://hourglass.money";

struct TestApp {
    router: Router,
    mail: Arc<RecordingEmailSender>,
}

fn test_app() -> Result<TestApp> {
    let credentials = AdminCredentials::new(
        Some(ADMIN_EMAIL.to_string()),
        Some(SecretString::from(ADMIN_PASSWORD)),
    );
    let admin = AdminState::new(
        AdminConfig::new(SITE.to_string())
            .with_max_attempts(5)
            .with_lockout_seconds(900),
        Arc::new(credentials),
        SecretString::from("integration-test-secret"),
    );

    let mail = Arc::new(RecordingEmailSender::new());
    let newsletter = NewsletterState::new(
        NewsletterConfig::new(SITE.to_string()),
        Arc::new(MemorySubscriberStore::new()),
        mail.clone(),
    );

    let router = api::app(Arc::new(admin), Arc::new(newsletter))?;
    Ok(TestApp { router, mail })
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Result<Response> {
        Ok(self.router.clone().oneshot(request).await?)
    }

    async fn post_json(&self, uri: &str, body: &Value) -> Result<Response> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?;
        self.send(request).await
    }

    async fn get(&self, uri: &str) -> Result<Response> {
        self.send(Request::builder().uri(uri).body(Body::empty())?)
            .await
    }

    async fn login(&self, email: &str, password: &str) -> Result<Response> {
        self.post_json(
            "/api/admin/login",
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn admin_token(&self) -> Result<String> {
        let response = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
        let cookie = session_cookie(&response)?;
        cookie
            .split_once('=')
            .map(|(_, token)| token.to_string())
            .context("cookie without value")
    }

    /// Subscribe and return the `(confirm, unsubscribe)` tokens from the mail.
    async fn subscribe(&self, email: &str, locale: &str) -> Result<(String, String)> {
        let response = self
            .post_json(
                "/api/newsletter/subscribe",
                &json!({ "email": email, "locale": locale }),
            )
            .await?;
        assert_eq!(response.status(), StatusCode::OK);

        let message = self
            .mail
            .sent()
            .pop()
            .ok_or_else(|| anyhow!("no confirmation email recorded"))?;
        Ok((
            token_param(&message.confirm_url)?,
            token_param(&message.unsubscribe_url)?,
        ))
    }
}

fn token_param(link: &str) -> Result<String> {
    let url = Url::parse(link)?;
    url.query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .context("link without token")
}

async fn body_json(response: Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
}

fn session_cookie(response: &Response) -> Result<String> {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .context("missing Set-Cookie")?
        .to_str()?;
    header
        .split(';')
        .next()
        .map(str::to_string)
        .context("empty Set-Cookie")
}

#[tokio::test]
async fn login_sets_session_cookie() -> Result<()> {
    let app = test_app()?;

    let response = app.login("  OWNER@hourglass.money ", ADMIN_PASSWORD).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let header = response
        .headers()
        .get(SET_COOKIE)
        .context("missing Set-Cookie")?
        .to_str()?
        .to_string();
    assert!(header.starts_with(&format!("{SESSION_COOKIE_NAME}=admin:")));
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("SameSite=Strict"));
    assert!(header.contains("Secure"));

    assert_eq!(body_json(response).await?, json!({ "success": true }));
    Ok(())
}

#[tokio::test]
async fn login_rejects_bad_input_and_credentials() -> Result<()> {
    let app = test_app()?;

    let malformed = Request::builder()
        .method("POST")
        .uri("/api/admin/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let response = app.send(malformed).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.login("", "").await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await?,
        json!({ "error": "Email and password are required" })
    );

    let response = app.login(ADMIN_EMAIL, "wrong").await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert_eq!(
        body_json(response).await?,
        json!({ "error": "Invalid credentials" })
    );
    Ok(())
}

#[tokio::test]
async fn lockout_blocks_even_correct_credentials() -> Result<()> {
    let app = test_app()?;

    for _ in 0..5 {
        let response = app.login(ADMIN_EMAIL, "wrong").await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: i64 = response
        .headers()
        .get(RETRY_AFTER)
        .context("missing Retry-After")?
        .to_str()?
        .parse()?;
    assert!(retry_after > 0 && retry_after <= 900);

    let body = body_json(response).await?;
    let message = body["error"].as_str().unwrap_or_default();
    assert!(message.starts_with("Too many login attempts"));
    Ok(())
}

#[tokio::test]
async fn lockout_applies_before_input_validation() -> Result<()> {
    let app = test_app()?;

    for _ in 0..5 {
        app.login(ADMIN_EMAIL, "wrong").await?;
    }

    let response = app.login("", "").await?;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().get(RETRY_AFTER).is_some());

    let malformed = Request::builder()
        .method("POST")
        .uri("/api/admin/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let response = app.send(malformed).await?;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    Ok(())
}

#[tokio::test]
async fn session_and_logout() -> Result<()> {
    let app = test_app()?;

    let response = app.get("/api/admin/session").await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let login = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    let cookie = session_cookie(&login)?;

    let request = Request::builder()
        .uri("/api/admin/session")
        .header(COOKIE, format!("theme=dark; {cookie}"))
        .body(Body::empty())?;
    let response = app.send(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["authenticated"], json!(true));
    assert!(body["expires_at"].as_i64().unwrap_or_default() > 0);

    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/logout")
        .body(Body::empty())?;
    let response = app.send(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response
        .headers()
        .get(SET_COOKIE)
        .context("missing Set-Cookie")?
        .to_str()?;
    assert!(cleared.starts_with(&format!("{SESSION_COOKIE_NAME}=;")));
    assert!(cleared.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
async fn subscriber_listing_requires_session() -> Result<()> {
    let app = test_app()?;
    app.subscribe("reader@example.com", "de").await?;

    let response = app.get("/api/admin/subscribers").await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/admin/subscribers")
        .header(AUTHORIZATION, "Bearer admin:99999999999999:deadbeef")
        .body(Body::empty())?;
    assert_eq!(app.send(request).await?.status(), StatusCode::UNAUTHORIZED);

    let token = app.admin_token().await?;

    let request = Request::builder()
        .uri("/api/admin/subscribers?limit=10")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?;
    let response = app.send(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    let subscribers = body["subscribers"].as_array().context("subscribers array")?;
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0]["email"], json!("re***@example.com"));
    assert_eq!(subscribers[0]["locale"], json!("de"));
    assert_eq!(subscribers[0]["confirmed"], json!(false));
    Ok(())
}

#[tokio::test]
async fn double_opt_in_flow() -> Result<()> {
    let app = test_app()?;
    let (confirm_token, _) = app.subscribe("Reader@Example.com", "fr").await?;

    let message = app.mail.sent().pop().context("missing email")?;
    assert_eq!(message.to_email, "reader@example.com");
    assert_eq!(message.locale, "fr");

    let uri = format!("/api/newsletter/confirm?token={confirm_token}&locale=fr");
    let response = app.get(&uri).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        Some("/fr/newsletter/confirmed?status=success")
    );

    let response = app.get(&uri).await?;
    assert_eq!(
        location(&response),
        Some("/fr/newsletter/confirmed?status=already")
    );

    let response = app.get("/api/newsletter/confirm?token=bogus").await?;
    assert_eq!(
        location(&response),
        Some("/en/newsletter/confirmed?status=invalid")
    );

    let response = app.get("/api/newsletter/confirm?locale=xx").await?;
    assert_eq!(
        location(&response),
        Some("/en/newsletter/confirmed?status=invalid")
    );
    Ok(())
}

#[tokio::test]
async fn subscribe_validation() -> Result<()> {
    let app = test_app()?;

    let response = app
        .post_json("/api/newsletter/subscribe", &json!({ "email": "nope" }))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?, json!({ "error": "invalid_email" }));

    let response = app
        .post_json(
            "/api/newsletter/subscribe",
            &json!({ "email": "reader@example.com", "locale": "pt" }),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?, json!({ "error": "invalid_locale" }));

    assert!(app.mail.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn unsubscribe_link_never_mutates() -> Result<()> {
    let app = test_app()?;
    let (_, unsubscribe_token) = app.subscribe("reader@example.com", "es").await?;

    let response = app
        .get(&format!(
            "/api/newsletter/unsubscribe?token={unsubscribe_token}&locale=es"
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        Some(format!("/es/newsletter/unsubscribe?token={unsubscribe_token}").as_str())
    );

    let response = app.get("/api/newsletter/unsubscribe").await?;
    assert_eq!(location(&response), Some("/en/newsletter/unsubscribe"));

    let token = app.admin_token().await?;
    let request = Request::builder()
        .uri("/api/admin/subscribers")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?;
    let body = body_json(app.send(request).await?).await?;
    assert_eq!(body["subscribers"][0]["unsubscribed"], json!(false));
    Ok(())
}

#[tokio::test]
async fn unsubscribe_post() -> Result<()> {
    let app = test_app()?;
    let (_, unsubscribe_token) = app.subscribe("reader@example.com", "ar").await?;

    let response = app
        .post_json("/api/newsletter/unsubscribe", &json!({}))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?, json!({ "error": "missing_token" }));

    let response = app
        .post_json("/api/newsletter/unsubscribe", &json!({ "token": "unknown" }))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await?, json!({ "error": "invalid_token" }));

    let body = json!({
        "token": unsubscribe_token,
        "reason": "too_frequent",
        "feedback": "  ",
    });
    for _ in 0..2 {
        let response = app.post_json("/api/newsletter/unsubscribe", &body).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await?,
            json!({ "success": true, "locale": "ar" })
        );
    }
    Ok(())
}

#[tokio::test]
async fn settings_read_and_update() -> Result<()> {
    let app = test_app()?;
    let (confirm_token, unsubscribe_token) = app.subscribe("reader@example.com", "en").await?;

    let response = app.get("/api/newsletter/settings").await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .get(&format!("/api/newsletter/settings?token={confirm_token}"))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await?,
        json!({ "locale": "en", "confirmed": false, "email": "re***@example.com" })
    );

    let response = app
        .post_json(
            "/api/newsletter/settings",
            &json!({ "token": unsubscribe_token, "locale": "xx" }),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?, json!({ "error": "invalid_locale" }));

    let response = app
        .post_json(
            "/api/newsletter/settings",
            &json!({ "token": unsubscribe_token, "locale": "de" }),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await?,
        json!({ "success": true, "locale": "de" })
    );

    let response = app
        .get(&format!("/api/newsletter/settings?token={unsubscribe_token}"))
        .await?;
    assert_eq!(body_json(response).await?["locale"], json!("de"));
    Ok(())
}

#[tokio::test]
async fn health_and_openapi() -> Result<()> {
    let app = test_app()?;

    let response = app.get("/health").await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("X-App").is_some());
    assert!(response.headers().get("x-request-id").is_some());
    let body = body_json(response).await?;
    assert_eq!(body["name"], json!("hourglass"));

    let response = app.get("/openapi.json").await?;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await?;
    for path in [
        "/api/admin/login",
        "/api/admin/session",
        "/api/newsletter/confirm",
        "/api/newsletter/unsubscribe",
    ] {
        assert!(doc["paths"].get(path).is_some(), "missing {path}");
    }
    Ok(())
}
