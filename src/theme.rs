//! Visual themes for the EPUB reader.
//!
//! The host page supplies the available themes as name/stylesheet pairs; the
//! controller only resolves names and remembers the last selection. Unknown
//! or missing names fall back to the default light theme.

use serde::{Deserialize, Serialize};

/// Theme applied when nothing is stored or the stored name is unknown.
pub const DEFAULT_THEME: &str = "lightTheme";

/// One host-registered theme: a display name and the stylesheet it loads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThemeDef {
    pub name: String,
    pub stylesheet: String,
}

#[derive(Debug, Clone, Default)]
pub struct ThemeRegistry {
    themes: Vec<ThemeDef>,
}

impl ThemeRegistry {
    pub fn new(themes: Vec<ThemeDef>) -> Self {
        ThemeRegistry { themes }
    }

    pub fn get(&self, name: &str) -> Option<&ThemeDef> {
        self.themes.iter().find(|theme| theme.name == name)
    }

    /// Resolve a possibly-stored selection, falling back to the default
    /// theme, then to the first registered one.
    pub fn resolve(&self, stored: Option<&str>) -> Option<&ThemeDef> {
        stored
            .and_then(|name| self.get(name))
            .or_else(|| self.get(DEFAULT_THEME))
            .or_else(|| self.themes.first())
    }
}
