use std::{env, sync::Arc};

use lavlus_shell::{
    AppConfig, AppShell, GateAction,
    app::pages,
    identity::SupabaseIdentityProvider,
    layout::LayoutRegistry,
    navigation::{History, Navigator},
    session::SessionStore,
    telemetry,
};

/// main
///
/// Dry-run of the client shell: resolves the session against the identity provider, then
/// prints the Auth Gate decision for every path given on the command line (`/` if none).
///
/// Credentials come from `LAVLUS_ACCESS_TOKEN` (restore) or `LAVLUS_EMAIL` /
/// `LAVLUS_PASSWORD` (interactive sign-in).
#[tokio::main]
async fn main() {
    // 1. Configuration & Logging
    dotenv::dotenv().ok();
    let config = AppConfig::load();
    telemetry::init(&config);

    tracing::info!("Shell starting in {:?} mode", config.env);

    // 2. Identity Provider
    let mut provider = SupabaseIdentityProvider::new(&config)
        .expect("FATAL: Failed to build the identity provider HTTP client.");
    let login = env::var("LAVLUS_EMAIL").ok().zip(env::var("LAVLUS_PASSWORD").ok());
    let can_sign_in = login.is_some();
    if let Some((email, password)) = login {
        provider = provider.with_password(email, password);
    }
    if let Ok(token) = env::var("LAVLUS_ACCESS_TOKEN") {
        provider = provider.with_stored_token(token);
    }

    // 3. Shell Assembly
    let session = Arc::new(SessionStore::new(Arc::new(provider)));
    let history = Arc::new(History::new());
    let shell = AppShell::new(
        &config,
        Arc::clone(&session),
        pages(&config.sign_in_path),
        LayoutRegistry::new(),
        history.clone(),
    );

    // 4. Session Resolution
    let restored = session.restore().await;
    if !restored.is_authenticated() && can_sign_in {
        if let Err(e) = shell.sign_in().await {
            tracing::error!("Sign-in failed: {}", e);
        }
    }
    tracing::info!("Session resolved as {}", session.get_state().state());

    // 5. Gate Decisions
    let paths: Vec<String> = env::args().skip(1).collect();
    let paths = if paths.is_empty() { vec!["/".to_string()] } else { paths };

    for path in &paths {
        let action = shell.evaluate(path);
        match &action {
            GateAction::Placeholder => println!("{}\tplaceholder", path),
            GateAction::Redirect(to) => println!("{}\tredirect -> {}", path, to),
            GateAction::Render(layout) => println!("{}\trender in {} layout", path, layout),
        }
        shell.navigate_to(path);
    }

    tracing::info!("Navigation history: {:?}", history.entries());
}
