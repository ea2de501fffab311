//! The redirect capability handed to the client and the route guard.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    /// Full page load. Discards all in-memory application state.
    Document { path: String },
    /// In-app navigation that adds a history entry.
    Push { path: String },
    /// In-app navigation that replaces the current history entry, carrying
    /// the location the user was trying to reach.
    Replace { path: String, from: Option<String> },
}

impl Navigation {
    pub fn document(path: impl Into<String>) -> Self {
        Navigation::Document { path: path.into() }
    }

    pub fn push(path: impl Into<String>) -> Self {
        Navigation::Push { path: path.into() }
    }

    pub fn replace(path: impl Into<String>, from: Option<String>) -> Self {
        Navigation::Replace {
            path: path.into(),
            from,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Navigation::Document { path }
            | Navigation::Push { path }
            | Navigation::Replace { path, .. } => path,
        }
    }
}

pub trait Navigator: Send + Sync + Debug {
    fn navigate(&self, navigation: Navigation);
}

/// Keeps every navigation it receives, newest last.
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator {
    history: Arc<Mutex<Vec<Navigation>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Navigation> {
        self.history.lock().clone()
    }

    pub fn last(&self) -> Option<Navigation> {
        self.history.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, navigation: Navigation) {
        self.history.lock().push(navigation);
    }
}

/// Logs navigations instead of performing them. Used by the command line
/// front end, which has no location to change.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, navigation: Navigation) {
        match &navigation {
            Navigation::Document { path } => info!(%path, "redirect (document)"),
            Navigation::Push { path } => info!(%path, "navigate"),
            Navigation::Replace { path, from } => {
                info!(%path, from = from.as_deref().unwrap_or("-"), "redirect (replace)")
            }
        }
    }
}
