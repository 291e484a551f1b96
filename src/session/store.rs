use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use super::{LayoutSnapshot, SNAPSHOT_VERSION};

fn state_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("termdeck")
}

pub fn state_file_path() -> PathBuf {
    state_dir().join("state.json")
}

pub fn save(snap: &LayoutSnapshot) -> Result<()> {
    save_to(snap, &state_file_path())
}

pub fn load() -> Option<LayoutSnapshot> {
    load_from(&state_file_path())
}

/// Delete the saved state, if any.
pub fn clear() -> Result<()> {
    let path = state_file_path();
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

// Variants taking an explicit path so tests can point at a temp dir

pub fn save_to(snap: &LayoutSnapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let json = serde_json::to_string_pretty(snap)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_from(path: &Path) -> Option<LayoutSnapshot> {
    let json = fs::read_to_string(path).ok()?;
    let mut snap: LayoutSnapshot = serde_json::from_str(&json).ok()?;
    migrate(&mut snap);
    Some(snap)
}

/// Migrate a saved snapshot to the latest version (currently v1).
fn migrate(snap: &mut LayoutSnapshot) {
    if snap.version < SNAPSHOT_VERSION {
        snap.version = SNAPSHOT_VERSION;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::make_snapshot;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let snap = make_snapshot();

        save_to(&snap, &path).unwrap();
        let loaded = load_from(&path).unwrap();

        assert_eq!(loaded.pages.len(), 1);
        assert_eq!(loaded.pages[0].id, snap.pages[0].id);
        assert_eq!(loaded.pages[0].groups.len(), 2);
        assert_eq!(loaded.panel_sizes, snap.panel_sizes);
    }

    #[test]
    fn test_load_nonexistent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonexistent.json");
        assert!(load_from(&path).is_none());
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut snap = make_snapshot();
        save_to(&snap, &path).unwrap();

        snap.pages[0].label = "renamed".to_string();
        save_to(&snap, &path).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.pages[0].label, "renamed");
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ invalid }").unwrap();
        assert!(load_from(&path).is_none());
    }

    #[test]
    fn test_migrate_bumps_old_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut snap = make_snapshot();
        snap.version = 0;
        save_to(&snap, &path).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.version, SNAPSHOT_VERSION);
    }
}
