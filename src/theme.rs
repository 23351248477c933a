//! Light and dark colour themes, and the remembered choice between them.

use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tabled::settings::Style;
use tabled::Table;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

const DARK_VARIABLES: [(&str, &str); 11] = [
    ("--background", "#0a0a0b"),
    ("--surface", "#1a1a1c"),
    ("--card", "#2a2a2e"),
    ("--accent", "#f5c842"),
    ("--secondary", "#e67e22"),
    ("--success", "#27ae60"),
    ("--warning", "#f39c12"),
    ("--danger", "#e74c3c"),
    ("--text-primary", "#ffffff"),
    ("--text-secondary", "#a0a0a0"),
    ("--border", "#3a3a3e"),
];

const LIGHT_VARIABLES: [(&str, &str); 11] = [
    ("--background", "#f8f9fa"),
    ("--surface", "#ffffff"),
    ("--card", "#f1f3f4"),
    ("--accent", "#d4a574"),
    ("--secondary", "#8b7355"),
    ("--success", "#2e7d32"),
    ("--warning", "#f57c00"),
    ("--danger", "#d32f2f"),
    ("--text-primary", "#1a1a1c"),
    ("--text-secondary", "#5f6368"),
    ("--border", "#dadce0"),
];

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    /// The theme's display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dark => "Midnight Scholar",
            Self::Light => "Metallic Luxe",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// The CSS custom properties that make up the theme.
    pub fn variables(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Dark => &DARK_VARIABLES,
            Self::Light => &LIGHT_VARIABLES,
        }
    }

    /// Renders the theme as a stylesheet rule scoped to its `data-theme` attribute.
    pub fn css(&self) -> String {
        let mut css = format!(":root[data-theme=\"{}\"] {{\n", self.as_str());
        for (property, value) in self.variables() {
            css.push_str(&format!("  {property}: {value};\n"));
        }
        css.push_str("}\n");
        css
    }

    /// Applies the theme's border style to a table.
    pub fn style_table(&self, table: &mut Table) {
        match self {
            Self::Dark => table.with(Style::modern()),
            Self::Light => table.with(Style::rounded()),
        };
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => Err(Error::Validation(format!(
                "Unknown theme '{other}', expected dark or light"
            ))),
        }
    }
}

/// The persisted theme choice.
#[derive(Debug, Clone)]
pub struct ThemePreference {
    path: PathBuf,
}

impl ThemePreference {
    /// The preference file inside `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("theme"),
        }
    }

    /// The stored theme. Falls back to dark when nothing, or nothing recognisable, is stored.
    pub fn load(&self) -> Theme {
        match fs::read_to_string(&self.path) {
            Ok(contents) => contents.parse().unwrap_or_else(|_| {
                tracing::warn!(path = %self.path.display(), "ignoring unknown stored theme");
                Theme::default()
            }),
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %e, "could not read theme");
                }
                Theme::default()
            }
        }
    }

    pub fn save(&self, theme: Theme) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, theme.as_str())?;
        Ok(())
    }

    /// Switches to the other theme and returns it.
    pub fn toggle(&self) -> Result<Theme> {
        let theme = self.load().toggled();
        self.save(theme)?;
        Ok(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn themes_toggle_between_each_other() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled().toggled(), Theme::Light);
        assert_eq!(Theme::Light.name(), "Metallic Luxe");
    }

    #[test]
    fn css_lists_every_variable() {
        let css = Theme::Dark.css();
        assert!(css.starts_with(":root[data-theme=\"dark\"] {"));
        assert!(css.contains("  --accent: #f5c842;\n"));
        assert_eq!(css.matches(": #").count(), Theme::Dark.variables().len());
    }

    #[test]
    fn preference_defaults_to_dark_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let preference = ThemePreference::new(dir.path());

        assert_eq!(preference.load(), Theme::Dark);
        assert_eq!(preference.toggle().unwrap(), Theme::Light);
        assert_eq!(preference.load(), Theme::Light);

        fs::write(dir.path().join("theme"), "sepia").unwrap();
        assert_eq!(preference.load(), Theme::Dark);
    }
}
