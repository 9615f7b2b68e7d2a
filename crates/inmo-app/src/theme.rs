//! Process-wide light/dark theme
//!
//! Independent of the session and of any result set: it is initialised once at
//! startup and flipped only by an explicit toggle, which persists the choice.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

static GLOBAL: OnceLock<ThemeStore> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Interpret `COLORFGBG` (`"fg;bg"` or `"fg;default;bg"`)
pub fn hint_from_colorfgbg(value: &str) -> Option<Theme> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    Some(if bg < 7 || bg == 8 { Theme::Dark } else { Theme::Light })
}

/// Current theme plus where it is persisted
#[derive(Debug)]
pub struct ThemeStore {
    current: Mutex<Theme>,
    path: Option<PathBuf>,
}

impl ThemeStore {
    /// Resolve the starting theme: saved choice, then `preference`, then the
    /// terminal hint, then light
    pub fn init(path: Option<PathBuf>, preference: Option<Theme>, terminal_hint: Option<Theme>) -> Self {
        let saved = path.as_deref().and_then(read_saved);
        let theme = saved.or(preference).or(terminal_hint).unwrap_or_default();
        log::debug!("Theme initialised to {}", theme.as_str());
        Self {
            current: Mutex::new(theme),
            path,
        }
    }

    pub fn current(&self) -> Theme {
        self.current.lock().map(|t| *t).unwrap_or_default()
    }

    /// Flip the theme and persist the new value
    pub fn toggle(&self) -> Result<Theme> {
        let next = {
            let mut current = self
                .current
                .lock()
                .map_err(|_| anyhow!("theme state poisoned"))?;
            *current = current.toggled();
            *current
        };

        if let Some(path) = &self.path {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
            fs::write(path, next.as_str())
                .with_context(|| format!("Failed to save theme to {}", path.display()))?;
        }
        Ok(next)
    }
}

fn read_saved(path: &Path) -> Option<Theme> {
    fs::read_to_string(path).ok().as_deref().and_then(Theme::parse)
}

/// Initialise the process-wide store. Later calls return the first store.
pub fn init_global(path: Option<PathBuf>, preference: Option<Theme>) -> &'static ThemeStore {
    GLOBAL.get_or_init(|| {
        let hint = std::env::var("COLORFGBG")
            .ok()
            .as_deref()
            .and_then(hint_from_colorfgbg);
        ThemeStore::init(path, preference, hint)
    })
}

/// Theme of the process, light until initialised
pub fn current_theme() -> Theme {
    GLOBAL.get().map(ThemeStore::current).unwrap_or_default()
}
