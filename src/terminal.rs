use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use futures::future::BoxFuture;

use crate::id::TerminalKey;

/// Options for a terminal-resource creation request.
#[derive(Clone, Debug, Default)]
pub struct TerminalOptions {
    /// Creation timestamp override in milliseconds. Restore passes the
    /// persisted value so the recreated resource keeps its key; fresh
    /// creations leave this unset and the spawner stamps the current time.
    pub created_ms: Option<i64>,
    pub title: Option<String>,
    pub command: Option<String>,
    pub cwd: Option<PathBuf>,
}

/// Handle to one terminal session.
///
/// The manager only relies on the stable identity (the creation timestamp)
/// and the start/dispose hooks; everything about the actual process behind
/// the handle lives on the spawner's side of the boundary.
#[derive(Clone, Debug)]
pub struct TerminalResource {
    key: TerminalKey,
    pub title: String,
    pub command: Option<String>,
    pub cwd: Option<PathBuf>,
    started: bool,
    disposed: bool,
}

impl TerminalResource {
    /// Build a handle without any backing session, e.g. for tests or for
    /// spawners that defer process startup.
    pub fn offline(created_ms: i64, title: &str) -> Self {
        Self {
            key: TerminalKey::from_millis(created_ms),
            title: title.to_string(),
            command: None,
            cwd: None,
            started: false,
            disposed: false,
        }
    }

    pub fn key(&self) -> TerminalKey {
        self.key
    }

    pub fn start(&mut self) {
        self.started = true;
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// The external factory the manager requests terminal sessions from.
///
/// Creation is the one awaited suspension point in the mutation paths; a
/// request, once issued, is always awaited to completion before any tree or
/// panel state changes.
pub trait TerminalSpawner: Send {
    fn spawn(&mut self, opts: TerminalOptions) -> BoxFuture<'_, Result<TerminalResource>>;
}

/// Spawner that mints in-process handles stamped with the current time.
///
/// Freshly minted timestamps are clamped to be strictly increasing, so two
/// spawns inside the same millisecond cannot collide on a key. An explicit
/// `created_ms` (the restore path) is taken verbatim.
#[derive(Debug, Default)]
pub struct LocalSpawner {
    last_created_ms: i64,
}

impl LocalSpawner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TerminalSpawner for LocalSpawner {
    fn spawn(&mut self, opts: TerminalOptions) -> BoxFuture<'_, Result<TerminalResource>> {
        Box::pin(async move {
            let created = match opts.created_ms {
                Some(ms) => ms,
                None => Utc::now().timestamp_millis().max(self.last_created_ms + 1),
            };
            self.last_created_ms = self.last_created_ms.max(created);
            let title = opts.title.as_deref().unwrap_or("Terminal");
            let mut resource = TerminalResource::offline(created, title);
            resource.command = opts.command;
            resource.cwd = opts.cwd;
            Ok(resource)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_resource_key_from_millis() {
        let resource = TerminalResource::offline(1_700_000_000_000, "Terminal");
        assert_eq!(resource.key(), TerminalKey::from_millis(1_700_000_000_000));
        assert!(!resource.is_started());
        assert!(!resource.is_disposed());
    }

    #[test]
    fn test_start_and_dispose_flags() {
        let mut resource = TerminalResource::offline(1, "Terminal");
        resource.start();
        assert!(resource.is_started());
        resource.dispose();
        assert!(resource.is_disposed());
    }

    #[tokio::test]
    async fn test_local_spawner_keys_are_strictly_increasing() {
        let mut spawner = LocalSpawner::new();
        let a = spawner.spawn(TerminalOptions::default()).await.unwrap();
        let b = spawner.spawn(TerminalOptions::default()).await.unwrap();
        let c = spawner.spawn(TerminalOptions::default()).await.unwrap();
        assert!(a.key() < b.key());
        assert!(b.key() < c.key());
    }

    #[tokio::test]
    async fn test_local_spawner_honors_restore_timestamp() {
        let mut spawner = LocalSpawner::new();
        let opts = TerminalOptions {
            created_ms: Some(42),
            ..Default::default()
        };
        let resource = spawner.spawn(opts).await.unwrap();
        assert_eq!(resource.key(), TerminalKey::from_millis(42));
    }

    #[tokio::test]
    async fn test_local_spawner_carries_options_through() {
        let mut spawner = LocalSpawner::new();
        let opts = TerminalOptions {
            created_ms: Some(7),
            title: Some("build".to_string()),
            command: Some("cargo watch".to_string()),
            cwd: Some(PathBuf::from("/tmp")),
        };
        let resource = spawner.spawn(opts).await.unwrap();
        assert_eq!(resource.title, "build");
        assert_eq!(resource.command.as_deref(), Some("cargo watch"));
        assert_eq!(resource.cwd, Some(PathBuf::from("/tmp")));
    }
}
