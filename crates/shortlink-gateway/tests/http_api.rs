use axum::body::{to_bytes, Body};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use jiff::Timestamp;
use jsonwebtoken::{encode, EncodingKey, Header};
use prometheus::Registry;
use serde_json::{json, Value};
use shortlink_core::StaticAdminChecker;
use shortlink_gateway::handlers::RESERVED_ALIASES;
use shortlink_gateway::{App, AppState, Claims, HttpMetrics, JwtValidator};
use shortlink_generator::RandomGenerator;
use shortlink_shortener::UrlService;
use shortlink_storage::InMemoryRepository;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const PRIVATE_KEY: &[u8] = include_bytes!("fixtures/jwt_private.pem");
const PUBLIC_KEY: &str = include_str!("fixtures/jwt_public.pem");
const OTHER_PRIVATE_KEY: &[u8] = include_bytes!("fixtures/other_private.pem");

const BASE_URL: &str = "https://sho.rt";
const ADMIN_ID: i64 = 99;

fn app() -> Router {
    let registry = Registry::new();
    let metrics = HttpMetrics::new(&registry).unwrap();
    let service = UrlService::new(
        InMemoryRepository::new(),
        StaticAdminChecker::new([ADMIN_ID]),
        RandomGenerator::default(),
    )
    .with_reserved_aliases(RESERVED_ALIASES.iter().copied());
    let jwt = JwtValidator::from_pem(PUBLIC_KEY).unwrap();
    let state = AppState::new(Arc::new(service), jwt, metrics, registry, BASE_URL);

    App::router(state, Duration::from_secs(5))
}

fn claims(uid: i64, email: &str, exp_offset: i64) -> Claims {
    let now = Timestamp::now().as_second();
    Claims {
        uid,
        email: email.to_string(),
        app_id: 1,
        exp: now + exp_offset,
        iat: Some(now),
    }
}

fn sign(claims: &Claims, key: &[u8]) -> String {
    encode(
        &Header::new(jsonwebtoken::Algorithm::RS256),
        claims,
        &EncodingKey::from_rsa_pem(key).unwrap(),
    )
    .unwrap()
}

fn token(uid: i64, email: &str) -> String {
    sign(&claims(uid, email, 3600), PRIVATE_KEY)
}

fn create_request(token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/url")
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn delete_request(token: &str, alias: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(format!("/url/{alias}"))
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_with_custom_alias() {
    let app = app();

    let response = send(
        &app,
        create_request(
            Some(&token(1, "alice@example.com")),
            json!({"original_url": "https://example.com/page", "alias": "my-link"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"status": "OK", "alias": "my-link", "short_url": "https://sho.rt/my-link"})
    );
}

#[tokio::test]
async fn create_generates_alias_then_redirects() {
    let app = app();

    let response = send(
        &app,
        create_request(
            Some(&token(1, "alice@example.com")),
            json!({"original_url": "https://example.com/generated"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let alias = body["alias"].as_str().unwrap().to_string();
    assert_eq!(alias.len(), 6);
    assert!(alias.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(body["short_url"], format!("{BASE_URL}/{alias}"));

    let response = send(&app, get_request(&format!("/{alias}"))).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://example.com/generated"
    );
}

#[tokio::test]
async fn create_without_token_is_unauthorized() {
    let app = app();

    let response = send(
        &app,
        create_request(None, json!({"original_url": "https://example.com"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"status": "Error", "error": "unauthorized: missing token"})
    );
}

#[tokio::test]
async fn malformed_authorization_header_is_unauthorized() {
    let app = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/url")
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::from(json!({"original_url": "https://example.com"}).to_string()))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await["error"],
        "unauthorized: invalid header format"
    );
}

#[tokio::test]
async fn rejects_bad_tokens() {
    let app = app();
    let foreign = sign(&claims(1, "alice@example.com", 3600), OTHER_PRIVATE_KEY);
    let expired = sign(&claims(1, "alice@example.com", -3600), PRIVATE_KEY);

    for token in ["not-a-jwt", foreign.as_str(), expired.as_str()] {
        let response = send(
            &app,
            create_request(Some(token), json!({"original_url": "https://example.com"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{token}");
        assert_eq!(json_body(response).await["error"], "unauthorized: invalid token");
    }
}

#[tokio::test]
async fn rejects_token_issued_in_the_future() {
    let app = app();
    let mut future = claims(1, "alice@example.com", 7200);
    future.iat = Some(Timestamp::now().as_second() + 3600);
    let token = sign(&future, PRIVATE_KEY);

    let response = send(
        &app,
        create_request(Some(&token), json!({"original_url": "https://example.com"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_without_expiry_is_unauthorized() {
    let app = app();
    let claims = json!({"uid": 1, "email": "alice@example.com", "app_id": 1});
    let token = encode(
        &Header::new(jsonwebtoken::Algorithm::RS256),
        &claims,
        &EncodingKey::from_rsa_pem(PRIVATE_KEY).unwrap(),
    )
    .unwrap();

    let response = send(
        &app,
        create_request(Some(&token), json!({"original_url": "https://example.com"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "unauthorized: invalid token");
}

#[tokio::test]
async fn duplicate_alias_conflicts() {
    let app = app();
    let token = token(1, "alice@example.com");
    let body = json!({"original_url": "https://example.com", "alias": "taken"});

    let first = send(&app, create_request(Some(&token), body.clone())).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = send(&app, create_request(Some(&token), body)).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(
        json_body(second).await,
        json!({"status": "Error", "error": "alias already exists"})
    );
}

#[tokio::test]
async fn rejects_invalid_input() {
    let app = app();
    let token = token(1, "alice@example.com");

    let cases = [
        (json!({"original_url": "not a url"}), "invalid URL"),
        (json!({"original_url": "ftp://example.com/file"}), "invalid URL"),
        (json!({"original_url": ""}), "invalid URL"),
        (json!({"alias": "missing-url"}), "invalid request body"),
        (
            json!({"original_url": "https://example.com", "alias": "health"}),
            "alias 'health' is reserved",
        ),
    ];

    for (body, expected) in cases {
        let response = send(&app, create_request(Some(&token), body.clone())).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(json_body(response).await["error"], expected, "{body}");
    }
}

#[tokio::test]
async fn accepts_free_form_custom_aliases() {
    let app = app();
    let token = token(1, "alice@example.com");

    for alias in ["x", "go.link"] {
        let response = send(
            &app,
            create_request(
                Some(&token),
                json!({"original_url": "https://example.com/free", "alias": alias}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "{alias}");
        assert_eq!(json_body(response).await["alias"], alias);

        let response = send(&app, get_request(&format!("/{alias}"))).await;
        assert_eq!(response.status(), StatusCode::FOUND, "{alias}");
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://example.com/free"
        );
    }
}

#[tokio::test]
async fn rejects_urls_with_control_characters() {
    let app = app();
    let token = token(1, "alice@example.com");

    for url in [
        "https://example.com/\nSet-Cookie: x=1",
        " https://example.com",
        "https://exa\tmple.com",
    ] {
        let response = send(
            &app,
            create_request(Some(&token), json!({"original_url": url, "alias": "ctl"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{url:?}");
        assert_eq!(json_body(response).await["error"], "invalid URL");
    }

    let response = send(&app, get_request("/ctl")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejects_non_json_body() {
    let app = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/url")
        .header(CONTENT_TYPE, "application/json")
        .header(
            AUTHORIZATION,
            format!("Bearer {}", token(1, "alice@example.com")),
        )
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid request body");
}

#[tokio::test]
async fn unknown_alias_is_not_found() {
    let app = app();

    let response = send(&app, get_request("/nothing-here")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await,
        json!({"status": "Error", "error": "alias not found"})
    );
}

#[tokio::test]
async fn only_owner_or_admin_may_delete() {
    let app = app();
    let owner = token(1, "alice@example.com");
    let stranger = token(2, "mallory@example.com");
    let admin = token(ADMIN_ID, "root@example.com");

    for alias in ["owned", "moderated"] {
        let response = send(
            &app,
            create_request(
                Some(&owner),
                json!({"original_url": "https://example.com", "alias": alias}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(&app, delete_request(&stranger, "owned")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await["error"],
        "you do not have permission to delete this URL"
    );

    let response = send(&app, delete_request(&owner, "owned")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "OK"}));

    let response = send(&app, delete_request(&admin, "moderated")).await;
    assert_eq!(response.status(), StatusCode::OK);

    for alias in ["owned", "moderated"] {
        let response = send(&app, get_request(&format!("/{alias}"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let response = send(&app, delete_request(&owner, "owned")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_requires_token() {
    let app = app();

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/url/anything")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();

    let response = send(&app, get_request("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn metrics_count_requests() {
    let app = app();

    let response = send(
        &app,
        create_request(
            Some(&token(1, "alice@example.com")),
            json!({"original_url": "https://example.com", "alias": "counted"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, get_request("/counted")).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let response = send(&app, get_request("/metrics")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains("url_shortener_business_urls_created_total 1"));
    assert!(body.contains("url_shortener_business_redirects_total 1"));
    assert!(body.contains(
        r#"url_shortener_http_requests_total{method="GET",path="/{alias}",status_code="302"} 1"#
    ));
    assert!(body.contains(
        r#"url_shortener_http_requests_total{method="POST",path="/url",status_code="200"} 1"#
    ));
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = app();

    let response = send(&app, get_request("/health")).await;
    let generated = response.headers().get("x-request-id").unwrap();
    assert!(!generated.is_empty());

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-me")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-me");
}
