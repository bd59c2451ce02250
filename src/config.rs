use std::env;

/// Fallback session secret for local runs. Never accepted in production.
pub const LOCAL_SESSION_SECRET: &str = "super-secure-test-secret-value-local";

/// Default 400 message for a submission without a title ("enter a title").
pub const DEFAULT_TITLE_REQUIRED_MESSAGE: &str = "제목을 입력하세요";

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// shared immutably with every request through the application state (FromRef).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the local session bypass and log format.
    pub env: Env,
    // Postgres connection string for the document store. `None` selects the in-memory store (local only).
    pub db_url: Option<String>,
    // Trust anchor handed to the session resolver on every call.
    pub auth: AuthConfig,
    // When true, a missing or non-string title is rejected like an empty one.
    pub require_title: bool,
    // Body of the 400 response for a submission without a title.
    pub title_required_message: String,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
}

/// AuthConfig
///
/// Explicit session-validation settings. Passed into the session resolver rather than
/// read from ambient global state.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub env: Env,
    // HS256 secret used to verify session tokens.
    pub jwt_secret: String,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (in-memory store, header bypass) and hardened production behavior.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests. Uses the in-memory store.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            auth: AuthConfig {
                env: Env::Local,
                jwt_secret: LOCAL_SESSION_SECRET.to_string(),
            },
            require_title: false,
            title_required_message: DEFAULT_TITLE_REQUIRED_MESSAGE.to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables and fails fast.
    ///
    /// # Panics
    /// Panics in production when `DATABASE_URL` or `NEXTAUTH_SECRET` is missing, so the
    /// service never starts without a real store or a real session secret.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => env::var("NEXTAUTH_SECRET")
                .expect("FATAL: NEXTAUTH_SECRET must be set in production."),
            Env::Local => {
                env::var("NEXTAUTH_SECRET").unwrap_or_else(|_| LOCAL_SESSION_SECRET.to_string())
            }
        };

        let db_url = match env {
            Env::Production => Some(
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in production"),
            ),
            // Local runs may go without Postgres; the in-memory store takes over.
            Env::Local => env::var("DATABASE_URL").ok(),
        };

        let require_title = env::var("POST_REQUIRE_TITLE")
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            env,
            db_url,
            auth: AuthConfig { env, jwt_secret },
            require_title,
            title_required_message: env::var("TITLE_REQUIRED_MESSAGE")
                .unwrap_or_else(|_| DEFAULT_TITLE_REQUIRED_MESSAGE.to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        }
    }
}
