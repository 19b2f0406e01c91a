use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::{
    config::AppConfig,
    error::AuthError,
    gate::{GateAction, PageRegistry, decide},
    layout::LayoutRegistry,
    models::{LayoutId, PageDeclaration, Session},
    navigation::Navigator,
    session::{SessionStore, Subscription},
};

/// What the shell shows for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Loading placeholder while the session is still unknown.
    Placeholder,
    /// The visitor is being sent elsewhere; nothing was rendered.
    Redirect(String),
    /// The page body composed into its layout.
    Page(String),
}

/// pages
///
/// The application's page table. `sign_in_path` is declared public so redirects to it
/// always land on a page that renders.
pub fn pages(sign_in_path: &str) -> PageRegistry {
    PageRegistry::new()
        .register("/", PageDeclaration::public(LayoutId::Standard))
        .register(sign_in_path, PageDeclaration::public(LayoutId::Standard))
        .register("/requester-info", PageDeclaration::protected(LayoutId::Standard))
        .register("/:username", PageDeclaration::protected(LayoutId::Dashboard))
}

/// AppShell
///
/// The composition root of the client. It owns no session state: it reads the shared
/// [`SessionStore`], re-runs the Auth Gate on every navigation and on every session
/// notification, and follows redirects through the underlying [`Navigator`].
///
/// `AppShell` is itself a `Navigator`, so forms can be handed the shell and their
/// success/sign-in navigations pass through the gate too.
pub struct AppShell {
    session: Arc<SessionStore>,
    pages: PageRegistry,
    layouts: LayoutRegistry,
    navigator: Arc<dyn Navigator>,
    sign_in_path: String,
    current: Mutex<Option<String>>,
    subscription: Mutex<Option<Subscription>>,
}

impl AppShell {
    pub fn new(
        config: &AppConfig,
        session: Arc<SessionStore>,
        pages: PageRegistry,
        layouts: LayoutRegistry,
        navigator: Arc<dyn Navigator>,
    ) -> Arc<Self> {
        let shell = Arc::new(Self {
            session: Arc::clone(&session),
            pages,
            layouts,
            navigator,
            sign_in_path: config.sign_in_path.clone(),
            current: Mutex::new(None),
            subscription: Mutex::new(None),
        });

        let weak: Weak<AppShell> = Arc::downgrade(&shell);
        let subscription = session.subscribe(move |session| {
            if let Some(shell) = weak.upgrade() {
                shell.on_session_change(session);
            }
        });
        *shell.subscription.lock() = Some(subscription);

        shell
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    pub fn current_path(&self) -> Option<String> {
        self.current.lock().clone()
    }

    /// Gate decision for `path` against the current session.
    pub fn evaluate(&self, path: &str) -> GateAction {
        decide(&self.session.get_state(), &self.pages.lookup(path), &self.sign_in_path)
    }

    /// render
    ///
    /// Produces the screen for `path`. `page` is only called when the gate allows the
    /// page to render.
    pub fn render<F>(&self, path: &str, page: F) -> Screen
    where
        F: FnOnce() -> String,
    {
        match self.evaluate(path) {
            GateAction::Placeholder => Screen::Placeholder,
            GateAction::Redirect(to) => Screen::Redirect(to),
            GateAction::Render(layout) => {
                Screen::Page(self.layouts.resolve(layout).compose(&page()))
            }
        }
    }

    /// Signs in and, on success, opens the user's own page.
    pub async fn sign_in(&self) -> Result<Session, AuthError> {
        let session = self.session.sign_in().await?;
        if let Some(identity) = session.identity() {
            self.navigate_to(&format!("/{}", identity.display_name));
        }
        Ok(session)
    }

    /// Signs out. The session notification re-runs the gate for the current page.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.session.sign_out().await
    }

    fn apply(&self, path: &str) {
        match self.evaluate(path) {
            GateAction::Redirect(to) if to != path => {
                tracing::info!(from = path, to = %to, "redirecting unauthenticated visitor");
                self.navigate_to(&to);
            }
            GateAction::Redirect(_) => {
                tracing::error!(path, "sign-in page itself requires authentication");
            }
            GateAction::Placeholder | GateAction::Render(_) => {}
        }
    }

    fn on_session_change(&self, session: &Session) {
        tracing::debug!(state = %session.state(), "re-evaluating gate");
        if let Some(path) = self.current_path() {
            self.apply(&path);
        }
    }
}

impl Navigator for AppShell {
    fn navigate_to(&self, path: &str) {
        {
            let mut current = self.current.lock();
            if current.as_deref() == Some(path) {
                return;
            }
            *current = Some(path.to_string());
        }

        self.navigator.navigate_to(path);
        self.apply(path);
    }
}

impl Drop for AppShell {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.get_mut().take() {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DEFAULT_SIGN_IN_PATH, identity::MockIdentityProvider, navigation::History,
    };

    fn shell(provider: MockIdentityProvider) -> (Arc<AppShell>, Arc<History>) {
        let history = Arc::new(History::new());
        let session = Arc::new(SessionStore::new(Arc::new(provider)));
        let shell = AppShell::new(
            &AppConfig::default(),
            session,
            pages(DEFAULT_SIGN_IN_PATH),
            LayoutRegistry::new(),
            history.clone(),
        );
        (shell, history)
    }

    #[tokio::test]
    async fn unknown_session_shows_placeholder_without_rendering() {
        let (shell, history) = shell(MockIdentityProvider::default());

        shell.navigate_to("/requester-info");
        assert_eq!(shell.render("/requester-info", || unreachable!()), Screen::Placeholder);
        assert_eq!(history.entries(), vec!["/requester-info".to_string()]);
    }

    #[tokio::test]
    async fn restore_redirects_waiting_protected_page() {
        let (shell, history) = shell(MockIdentityProvider::default());

        shell.navigate_to("/alice");
        shell.session().restore().await;

        assert_eq!(shell.current_path().as_deref(), Some("/login"));
        assert_eq!(history.entries(), vec!["/alice".to_string(), "/login".to_string()]);
    }

    #[tokio::test]
    async fn sign_in_opens_own_dashboard() {
        let (shell, history) = shell(MockIdentityProvider::signing_in_as("t1", "alice"));
        shell.session().restore().await;
        shell.navigate_to("/login");

        shell.sign_in().await.unwrap();

        assert_eq!(history.current().as_deref(), Some("/alice"));
        let Screen::Page(html) = shell.render("/alice", || "<h1>projects</h1>".into()) else {
            panic!("dashboard should render for a signed-in user");
        };
        assert!(html.contains("data-layout=\"dashboard\""));
    }

    #[tokio::test]
    async fn sign_out_from_protected_page_redirects() {
        let (shell, history) = shell(MockIdentityProvider::signing_in_as("t1", "alice"));
        shell.sign_in().await.unwrap();

        shell.sign_out().await.unwrap();

        assert_eq!(history.current().as_deref(), Some("/login"));
        let expected = "<div data-layout=\"standard\"><header>Lavlus</header>\
                        <main>login</main><footer></footer></div>";
        assert_eq!(shell.render("/login", || "login".into()), Screen::Page(expected.into()));
    }

    #[test]
    fn dropping_the_shell_unsubscribes() {
        let (shell, _history) = shell(MockIdentityProvider::default());
        let session = Arc::clone(shell.session());
        drop(shell);

        // No listener left to upgrade a dangling shell.
        session.expire();
        assert_eq!(session.get_state(), Session::Unauthenticated);
    }
}
