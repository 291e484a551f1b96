use std::path::PathBuf;

use serde::Deserialize;

use crate::session::PanelRelativeSizes;

/// Which side of the widget the tree view sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeViewLocation {
    Left,
    Right,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub tree_view_location: TreeViewLocation,
    /// Default split between the terminal area and the tree view, used until
    /// a saved snapshot overrides it.
    pub panel_sizes: PanelRelativeSizes,
    /// How long the attention highlight stays on a newly selected terminal.
    pub flash_duration_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tree_view_location: TreeViewLocation::Left,
            panel_sizes: PanelRelativeSizes::default(),
            flash_duration_ms: 250,
        }
    }
}

// ---------------------------------------------------------------------------
// TOML shape — everything optional, unset fields keep their defaults
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    tree_view_location: Option<String>,
    panel_sizes: Option<RawPanelSizes>,
    flash_duration_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPanelSizes {
    tree: Option<f64>,
    terminal: Option<f64>,
}

pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("termdeck").join("config.toml"))
        .unwrap_or_default()
}

impl Config {
    pub fn load() -> Self {
        let path = config_file_path();

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };

        let raw: RawConfig = match toml::from_str(&content) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("termdeck: invalid config at {}: {}", path.display(), e);
                return Self::default();
            }
        };

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Self {
        let mut config = Self::default();

        if let Some(loc) = raw.tree_view_location {
            match loc.as_str() {
                "left" => config.tree_view_location = TreeViewLocation::Left,
                "right" => config.tree_view_location = TreeViewLocation::Right,
                other => eprintln!("termdeck: unknown tree_view_location '{other}'"),
            }
        }
        if let Some(sizes) = raw.panel_sizes {
            if let Some(tree) = sizes.tree {
                config.panel_sizes.tree = tree;
            }
            if let Some(terminal) = sizes.terminal {
                config.panel_sizes.terminal = terminal;
            }
        }
        if let Some(ms) = raw.flash_duration_ms {
            config.flash_duration_ms = ms;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tree_view_location, TreeViewLocation::Left);
        assert_eq!(config.flash_duration_ms, 250);
        assert!((config.panel_sizes.tree - 0.2).abs() < f64::EPSILON);
        assert!((config.panel_sizes.terminal - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_raw_full() {
        let raw: RawConfig = toml::from_str(
            r#"
            tree_view_location = "right"
            flash_duration_ms = 100

            [panel_sizes]
            tree = 0.3
            terminal = 0.7
            "#,
        )
        .unwrap();
        let config = Config::from_raw(raw);
        assert_eq!(config.tree_view_location, TreeViewLocation::Right);
        assert_eq!(config.flash_duration_ms, 100);
        assert!((config.panel_sizes.tree - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_raw_partial_keeps_defaults() {
        let raw: RawConfig = toml::from_str("tree_view_location = \"right\"").unwrap();
        let config = Config::from_raw(raw);
        assert_eq!(config.tree_view_location, TreeViewLocation::Right);
        assert_eq!(config.flash_duration_ms, 250);
    }

    #[test]
    fn test_unknown_location_keeps_default() {
        let raw: RawConfig = toml::from_str("tree_view_location = \"top\"").unwrap();
        let config = Config::from_raw(raw);
        assert_eq!(config.tree_view_location, TreeViewLocation::Left);
    }
}
