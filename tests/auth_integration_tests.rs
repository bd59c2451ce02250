use axum::http::{HeaderMap, HeaderValue, header};
use forum_post::{
    auth::{AuthError, Claims, JwtSessionResolver, LOCAL_BYPASS_HEADER, SessionResolver, session_token},
    config::{AuthConfig, Env},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use std::time::SystemTime;

const TEST_JWT_SECRET: &str = "auth-test-secret";
const TEST_EMAIL: &str = "writer@forum.dev";

// --- Test Utilities ---

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn create_token(secret: &str, exp: u64) -> String {
    let claims = Claims {
        sub: "user-1".to_string(),
        email: TEST_EMAIL.to_string(),
        name: Some("Writer".to_string()),
        iat: now() as usize,
        exp: exp as usize,
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn auth_config(env: Env, secret: &str) -> AuthConfig {
    AuthConfig {
        env,
        jwt_secret: secret.to_string(),
    }
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

// --- Tests ---

#[tokio::test]
async fn test_valid_bearer_token_resolves_session() {
    let token = create_token(TEST_JWT_SECRET, now() + 3600);
    let config = auth_config(Env::Production, TEST_JWT_SECRET);

    let session = JwtSessionResolver
        .resolve(&bearer(&token), &config)
        .await
        .unwrap()
        .expect("valid token should resolve a session");

    assert_eq!(session.user.email, TEST_EMAIL);
    assert_eq!(session.user.name.as_deref(), Some("Writer"));
    assert!(session.expires.is_some());
}

#[tokio::test]
async fn test_session_cookie_resolves_session() {
    let token = create_token(TEST_JWT_SECRET, now() + 3600);
    let config = auth_config(Env::Production, TEST_JWT_SECRET);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("theme=dark; __Secure-next-auth.session-token={}", token))
            .unwrap(),
    );

    let session = JwtSessionResolver.resolve(&headers, &config).await.unwrap();

    assert_eq!(session.map(|s| s.user.email).as_deref(), Some(TEST_EMAIL));
}

#[tokio::test]
async fn test_missing_token_is_anonymous() {
    let config = auth_config(Env::Production, TEST_JWT_SECRET);

    let session = JwtSessionResolver
        .resolve(&HeaderMap::new(), &config)
        .await
        .unwrap();

    assert!(session.is_none());
}

#[tokio::test]
async fn test_wrong_signature_is_anonymous() {
    let token = create_token("some-other-secret", now() + 3600);
    let config = auth_config(Env::Production, TEST_JWT_SECRET);

    let session = JwtSessionResolver
        .resolve(&bearer(&token), &config)
        .await
        .unwrap();

    assert!(session.is_none());
}

#[tokio::test]
async fn test_expired_token_is_anonymous() {
    // Well beyond the default validation leeway.
    let token = create_token(TEST_JWT_SECRET, now() - 3600);
    let config = auth_config(Env::Production, TEST_JWT_SECRET);

    let session = JwtSessionResolver
        .resolve(&bearer(&token), &config)
        .await
        .unwrap();

    assert!(session.is_none());
}

#[tokio::test]
async fn test_garbage_token_is_anonymous() {
    let config = auth_config(Env::Production, TEST_JWT_SECRET);

    let session = JwtSessionResolver
        .resolve(&bearer("not.a.jwt"), &config)
        .await
        .unwrap();

    assert!(session.is_none());
}

#[tokio::test]
async fn test_token_with_audience_resolves_session() {
    // Validly signed, carries an `aud` this service never configured.
    let claims = json!({
        "sub": "user-1",
        "email": TEST_EMAIL,
        "aud": "forum",
        "iat": now(),
        "exp": now() + 3600,
    });
    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    let token = encode(&Header::default(), &claims, &key).unwrap();
    let config = auth_config(Env::Production, TEST_JWT_SECRET);

    let session = JwtSessionResolver
        .resolve(&bearer(&token), &config)
        .await
        .expect("a mismatched claim must not be an infrastructure error");

    assert_eq!(session.map(|s| s.user.email).as_deref(), Some(TEST_EMAIL));
}

#[tokio::test]
async fn test_signed_token_missing_claims_is_anonymous() {
    // Correct signature, but no `email` claim and no `exp`.
    let claims = json!({ "sub": "user-1", "iss": "elsewhere" });
    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    let token = encode(&Header::default(), &claims, &key).unwrap();
    let config = auth_config(Env::Production, TEST_JWT_SECRET);

    let result = JwtSessionResolver.resolve(&bearer(&token), &config).await;

    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn test_empty_secret_is_an_error() {
    let token = create_token(TEST_JWT_SECRET, now() + 3600);
    let config = auth_config(Env::Production, "");

    let result = JwtSessionResolver.resolve(&bearer(&token), &config).await;

    assert!(matches!(result, Err(AuthError::MissingSecret)));
}

#[tokio::test]
async fn test_local_bypass_success() {
    let config = auth_config(Env::Local, TEST_JWT_SECRET);
    let mut headers = HeaderMap::new();
    headers.insert(LOCAL_BYPASS_HEADER, HeaderValue::from_static("local@dev.com"));

    let session = JwtSessionResolver.resolve(&headers, &config).await.unwrap();

    assert_eq!(session.map(|s| s.user.email).as_deref(), Some("local@dev.com"));
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let config = auth_config(Env::Production, TEST_JWT_SECRET);
    let mut headers = HeaderMap::new();
    headers.insert(LOCAL_BYPASS_HEADER, HeaderValue::from_static("local@dev.com"));

    let session = JwtSessionResolver.resolve(&headers, &config).await.unwrap();

    assert!(session.is_none());
}

#[test]
fn test_bearer_header_preferred_over_cookie() {
    let mut headers = bearer("from-header");
    headers.insert(
        header::COOKIE,
        HeaderValue::from_static("next-auth.session-token=from-cookie"),
    );

    assert_eq!(session_token(&headers), Some("from-header"));
}

#[test]
fn test_unrelated_cookies_yield_no_token() {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_static("theme=dark; next-auth.csrf-token=abc"),
    );

    assert_eq!(session_token(&headers), None);
}
