use std::{env, time::Duration};

/// AppConfig
///
/// Holds the shell's entire configuration state. Loaded once at startup and cloned into
/// the components that need it (API client, identity provider, application shell).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Base URL of the Lavlus API (all form submissions and reads go through it).
    pub api_base_url: String,
    // Supabase project URL, used for the identity provider endpoints.
    pub auth_url: String,
    // Public (anon) key sent as the `apikey` header to the identity provider.
    pub auth_api_key: String,
    // Where unauthenticated visitors are redirected.
    pub sign_in_path: String,
    // Upper bound for every API call. The adapter fails with NetworkFailure instead of hanging.
    pub request_timeout: Duration,
    // Runtime environment marker. Controls the log format and the fail-fast checks.
    pub env: Env,
}

/// Env
///
/// Defines the runtime context, used to switch between local development defaults
/// and the strict production configuration.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_SIGN_IN_PATH: &str = "/login";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking configuration for tests. Points at local services only.
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            auth_url: "http://localhost:54321".to_string(),
            auth_api_key: "local-anon-key".to_string(),
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from the environment and applies the **fail-fast** principle.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `LAVLUS_API_URL`, `SUPABASE_URL` or `SUPABASE_KEY`
    /// is missing, so the shell never starts against an implicit localhost backend.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let sign_in_path =
            env::var("SIGN_IN_PATH").unwrap_or_else(|_| DEFAULT_SIGN_IN_PATH.to_string());

        // Unparseable values fall back to the default rather than disabling the timeout.
        let request_timeout = env::var("API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        match env {
            Env::Local => {
                let defaults = Self::default();
                Self {
                    env: Env::Local,
                    api_base_url: env::var("LAVLUS_API_URL").unwrap_or(defaults.api_base_url),
                    auth_url: env::var("SUPABASE_URL").unwrap_or(defaults.auth_url),
                    auth_api_key: env::var("SUPABASE_KEY").unwrap_or(defaults.auth_api_key),
                    sign_in_path,
                    request_timeout,
                }
            }
            Env::Production => Self {
                env: Env::Production,
                api_base_url: env::var("LAVLUS_API_URL")
                    .expect("FATAL: LAVLUS_API_URL required in prod"),
                auth_url: env::var("SUPABASE_URL").expect("FATAL: SUPABASE_URL required in prod"),
                auth_api_key: env::var("SUPABASE_KEY")
                    .expect("FATAL: SUPABASE_KEY required in prod"),
                sign_in_path,
                request_timeout,
            },
        }
    }
}
