// Theme library - named directories of chime assets

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Which chime asset of a theme to look up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Quarter chime 1..=4 (the full hour uses quarter 4 as its prelude)
    Quarter(u32),
    /// One hour stroke, repeated by the caller
    Hour,
}

impl AssetKind {
    pub fn file_name(&self) -> Option<String> {
        match self {
            AssetKind::Quarter(n @ 1..=4) => Some(format!("q{}.mid", n)),
            AssetKind::Quarter(_) => None,
            AssetKind::Hour => Some("h.mid".to_string()),
        }
    }
}

/// Per-theme tempo/transpose applied to the composed chime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeOverride {
    pub transpose: i32,
    pub tempo: f64,
}

impl Default for ThemeOverride {
    fn default() -> Self {
        Self {
            transpose: 0,
            tempo: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThemeLibrary {
    base: PathBuf,
    overrides: HashMap<String, ThemeOverride>,
}

impl ThemeLibrary {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            overrides: HashMap::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, ThemeOverride>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// A theme exists when `base/name` is a directory
    pub fn exists(&self, name: &str) -> bool {
        is_plain_name(name) && self.base.join(name).is_dir()
    }

    /// Path of the asset, or `None` if the theme does not ship it
    pub fn resolve(&self, name: &str, kind: AssetKind) -> Option<PathBuf> {
        if !is_plain_name(name) {
            return None;
        }
        let file_name = kind.file_name()?;
        let path = self.base.join(name).join(file_name);
        if path.is_file() {
            Some(path)
        } else {
            debug!("Theme '{}' has no {:?} asset", name, kind);
            None
        }
    }

    pub fn override_for(&self, name: &str) -> Option<ThemeOverride> {
        self.overrides.get(name).copied()
    }

    /// Names of all theme directories, sorted
    pub fn list(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.base) else {
            return Vec::new();
        };

        let mut themes: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        themes.sort();
        themes
    }
}

/// Single normal path component: no separators, no `..`
pub(crate) fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
