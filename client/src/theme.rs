use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

use tutor_common::session::Theme;

/// Persists the light/dark choice across restarts. This is the only state the
/// client keeps on disk.
pub struct ThemeStore {
    path: Option<PathBuf>,
}

impl ThemeStore {
    /// `<config_dir>/tutor/theme`, or memory-only when the platform has no
    /// config directory.
    pub fn from_default_dir() -> Self {
        Self {
            path: dirs::config_dir().map(|d| d.join("tutor").join("theme")),
        }
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn load(&self) -> Theme {
        let Some(path) = &self.path else {
            return Theme::default();
        };
        match std::fs::read_to_string(path) {
            Ok(text) => Theme::parse_lenient(&text),
            Err(e) => {
                debug!("[client] No saved theme at {}: {e}", path.display());
                Theme::default()
            }
        }
    }

    pub fn save(&self, theme: Theme) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        std::fs::write(path, theme.as_str())
            .with_context(|| format!("writing theme to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tutor_theme_test_{}_{name}", std::process::id()))
            .join("theme")
    }

    #[test]
    fn missing_file_defaults_to_light() {
        let store = ThemeStore::at(temp_path("missing"));
        assert_eq!(store.load(), Theme::Light);
    }

    #[test]
    fn saved_theme_survives_reload() {
        let path = temp_path("roundtrip");
        let store = ThemeStore::at(path.clone());
        store.save(Theme::Dark).unwrap();

        assert_eq!(ThemeStore::at(path.clone()).load(), Theme::Dark);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
