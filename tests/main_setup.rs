use lavlus_shell::{AppConfig, config::Env, telemetry};
use serial_test::serial;
use std::{env, panic, time::Duration};

const CONFIG_VARS: [&str; 6] = [
    "APP_ENV",
    "LAVLUS_API_URL",
    "SUPABASE_URL",
    "SUPABASE_KEY",
    "SIGN_IN_PATH",
    "API_TIMEOUT_SECS",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with the given variables set (and every other config variable cleared),
/// then restores the original environment, even if the test panicked.
fn run_with_env<T, R>(vars: &[(&str, &str)], test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> =
        CONFIG_VARS.iter().map(|&var| (var, env::var(var).ok())).collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    // SUPABASE_KEY is missing.
    let result = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("LAVLUS_API_URL", "https://api.lavlus.example"),
            ("SUPABASE_URL", "https://project.supabase.co"),
        ],
        || panic::catch_unwind(AppConfig::load),
    );

    assert!(
        result.is_err(),
        "Production config loading should panic on missing secrets"
    );
}

#[test]
#[serial]
fn test_app_config_production_reads_everything() {
    let config = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("LAVLUS_API_URL", "https://api.lavlus.example"),
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_KEY", "anon"),
            ("SIGN_IN_PATH", "/signin"),
            ("API_TIMEOUT_SECS", "30"),
        ],
        AppConfig::load,
    );

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.api_base_url, "https://api.lavlus.example");
    assert_eq!(config.auth_api_key, "anon");
    assert_eq!(config.sign_in_path, "/signin");
    assert_eq!(config.request_timeout, Duration::from_secs(30));
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config =
        run_with_env(&[("APP_ENV", "local"), ("API_TIMEOUT_SECS", "soon")], AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.api_base_url, "http://localhost:8080");
    assert_eq!(config.sign_in_path, "/login");
    // Unparseable timeout falls back to the default instead of disabling it.
    assert_eq!(config.request_timeout, Duration::from_secs(15));
}

#[test]
#[serial]
fn test_telemetry_init_is_idempotent() {
    let config = AppConfig::default();
    telemetry::init(&config);
    telemetry::init(&config);
    tracing::info!("still logging after second init");
}
