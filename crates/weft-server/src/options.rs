//! Explicit render configuration, threaded into each entry point rather
//! than read from ambient process state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use weft_core::ServerConfig;

/// Options recognized by the server render entry points.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    path: Option<String>,
    root: Option<PathBuf>,
}

impl RenderOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL relative resource paths are resolved against.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Filesystem root for server-relative path math.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Configured base URL, if any.
    pub fn base_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Configured filesystem root, if any.
    pub fn root_path(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// The configuration slot carried by detached props snapshots.
    pub(crate) fn to_config(&self) -> Arc<ServerConfig> {
        Arc::new(ServerConfig {
            path: self.path.clone(),
            root: self.root.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_thread_into_config() {
        let options = RenderOptions::new().path("https://x/").root("/srv");
        let config = options.to_config();

        assert_eq!(config.path.as_deref(), Some("https://x/"));
        assert_eq!(config.root.as_deref(), Some(Path::new("/srv")));
    }

    #[test]
    fn test_empty_options_carry_nothing() {
        let config = RenderOptions::new().to_config();

        assert!(config.path.is_none());
        assert!(config.root.is_none());
    }
}
