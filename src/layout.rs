use std::{collections::HashMap, str::FromStr, sync::Arc};

use crate::models::LayoutId;

/// Shell
///
/// A page-composition shell: takes the rendered page body and returns it wrapped in the
/// layout's chrome. Must be a pure function of its input.
pub trait Shell: Send + Sync {
    fn id(&self) -> LayoutId;
    fn compose(&self, body: &str) -> String;
}

/// Signed-in area: navigation bar plus the user's sidebar.
pub struct DashboardShell;

impl Shell for DashboardShell {
    fn id(&self) -> LayoutId {
        LayoutId::Dashboard
    }

    fn compose(&self, body: &str) -> String {
        format!(
            "<div data-layout=\"dashboard\"><header>Lavlus</header><aside></aside>\
             <main>{}</main></div>",
            body
        )
    }
}

/// Public pages: header and footer around a centred column.
pub struct StandardShell;

impl Shell for StandardShell {
    fn id(&self) -> LayoutId {
        LayoutId::Standard
    }

    fn compose(&self, body: &str) -> String {
        format!(
            "<div data-layout=\"standard\"><header>Lavlus</header><main>{}</main>\
             <footer></footer></div>",
            body
        )
    }
}

/// No chrome at all.
pub struct BareShell;

impl Shell for BareShell {
    fn id(&self) -> LayoutId {
        LayoutId::None
    }

    fn compose(&self, body: &str) -> String {
        body.to_string()
    }
}

/// LayoutRegistry
///
/// Total mapping from layout identifier to shell. Anything not registered, and any name
/// that is not a known identifier, resolves to the standard shell.
#[derive(Clone)]
pub struct LayoutRegistry {
    shells: HashMap<LayoutId, Arc<dyn Shell>>,
    fallback: Arc<dyn Shell>,
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        let mut registry = Self { shells: HashMap::new(), fallback: Arc::new(StandardShell) };
        registry.register(Arc::new(DashboardShell));
        registry.register(Arc::new(StandardShell));
        registry.register(Arc::new(BareShell));
        registry
    }
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs (or replaces) the shell for its own identifier.
    pub fn register(&mut self, shell: Arc<dyn Shell>) {
        if shell.id() == LayoutId::Standard {
            self.fallback = Arc::clone(&shell);
        }
        self.shells.insert(shell.id(), shell);
    }

    pub fn resolve(&self, id: LayoutId) -> Arc<dyn Shell> {
        self.shells
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// Resolves a layout by name, e.g. from page metadata.
    pub fn resolve_name(&self, name: &str) -> Arc<dyn Shell> {
        match LayoutId::from_str(name) {
            Ok(id) => self.resolve(id),
            Err(_) => {
                tracing::debug!(layout = name, "unknown layout, using standard");
                Arc::clone(&self.fallback)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_fall_back_to_standard() {
        let registry = LayoutRegistry::new();
        assert_eq!(registry.resolve_name("sidebar").id(), LayoutId::Standard);
        assert_eq!(registry.resolve_name("").id(), LayoutId::Standard);
        assert_eq!(registry.resolve_name("dashboard").id(), LayoutId::Dashboard);
    }

    #[test]
    fn bare_shell_leaves_body_untouched() {
        let registry = LayoutRegistry::new();
        assert_eq!(registry.resolve(LayoutId::None).compose("<p>hi</p>"), "<p>hi</p>");
        assert!(
            registry
                .resolve(LayoutId::Dashboard)
                .compose("<p>hi</p>")
                .contains("<main><p>hi</p></main>")
        );
    }

    #[test]
    fn replacing_standard_changes_the_fallback() {
        struct Plain;
        impl Shell for Plain {
            fn id(&self) -> LayoutId {
                LayoutId::Standard
            }
            fn compose(&self, body: &str) -> String {
                format!("[{}]", body)
            }
        }

        let mut registry = LayoutRegistry::new();
        registry.register(Arc::new(Plain));
        assert_eq!(registry.resolve_name("unknown").compose("x"), "[x]");
    }
}
