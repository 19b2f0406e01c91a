//! Navigation seam.
//!
//! The shell never routes by itself: it asks a [`Navigator`] to go somewhere and assumes
//! the request eventually takes effect.

use parking_lot::Mutex;

/// Fire-and-forget navigation to an application path.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}

/// History
///
/// In-memory navigator that records every requested path. Used by the binary and by
/// tests to observe where the shell sent the user.
#[derive(Debug, Default)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent path, if any navigation happened.
    pub fn current(&self) -> Option<String> {
        self.entries.lock().last().cloned()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Navigator for History {
    fn navigate_to(&self, path: &str) {
        tracing::debug!(path, "navigate");
        self.entries.lock().push(path.to_string());
    }
}
