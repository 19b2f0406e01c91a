//! Auth Gate: decides, per navigated page, whether to render, redirect or wait.

use crate::models::{LayoutId, PageDeclaration, Session};

/// What the shell does with a navigated page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction {
    /// Session not resolved yet: show the loading placeholder, no layout.
    Placeholder,
    /// Send the visitor elsewhere; the page body is never rendered.
    Redirect(String),
    /// Render the page inside this layout.
    Render(LayoutId),
}

/// decide
///
/// | session         | needs auth | action                    |
/// |-----------------|------------|---------------------------|
/// | Unknown         | any        | `Placeholder`             |
/// | Unauthenticated | true       | `Redirect(sign_in_path)`  |
/// | Unauthenticated | false      | `Render(page.layout)`     |
/// | Authenticated   | any        | `Render(page.layout)`     |
pub fn decide(session: &Session, page: &PageDeclaration, sign_in_path: &str) -> GateAction {
    match session {
        Session::Unknown => GateAction::Placeholder,
        Session::Unauthenticated if page.needs_authentication => {
            GateAction::Redirect(sign_in_path.to_string())
        }
        Session::Unauthenticated | Session::Authenticated { .. } => GateAction::Render(page.layout),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param,
}

/// A registered path such as `/requester-info` or `/:username`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(_) => Segment::Param,
                None => Segment::Static(s.to_string()),
            })
            .collect();
        Self { segments }
    }

    /// Number of static segments when `path` matches, used to prefer specific routes.
    fn score(&self, path: &[&str]) -> Option<usize> {
        if path.len() != self.segments.len() {
            return None;
        }
        let mut score = 0;
        for (segment, part) in self.segments.iter().zip(path) {
            match segment {
                Segment::Static(s) if s == part => score += 1,
                Segment::Static(_) => return None,
                Segment::Param => {}
            }
        }
        Some(score)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty())
}

/// PageRegistry
///
/// Page declarations keyed by route pattern, populated once at startup. The most
/// specific matching pattern wins; ties go to the earliest registration. Paths with no
/// match get `PageDeclaration::default()` (public, no layout).
#[derive(Debug, Clone, Default)]
pub struct PageRegistry {
    pages: Vec<(RoutePattern, PageDeclaration)>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, pattern: &str, declaration: PageDeclaration) -> Self {
        self.pages.push((RoutePattern::parse(pattern), declaration));
        self
    }

    pub fn lookup(&self, path: &str) -> PageDeclaration {
        let parts: Vec<&str> = split_path(path).collect();

        let mut best: Option<(usize, PageDeclaration)> = None;
        for (pattern, declaration) in &self.pages {
            if let Some(score) = pattern.score(&parts) {
                if best.is_none_or(|(best_score, _)| score > best_score) {
                    best = Some((score, *declaration));
                }
            }
        }

        best.map(|(_, declaration)| declaration).unwrap_or_default()
    }
}
