//! Persisted per-workspace preferences.
//!
//! [`Preferences`] mirrors the preference page fields and serializes to JSON
//! with the same keys the preference ids use:
//!
//! ```json
//! {
//!   "instancePredefinedIcon": "eclipse_blue",
//!   "instanceIconPath": "",
//!   "instanceTitleSuffix": "[DEV]",
//!   "instanceColorPrimary": "71,55,136",
//!   "instanceColorSecondary": "44,34,85",
//!   "instanceColorAccent": "247,148,30",
//!   "instanceIconText": "",
//!   "instanceIconTextColor": "0,0,0",
//!   "instanceIconTextSize": 33,
//!   "instanceColorsEnabled": false
//! }
//! ```
//!
//! Colors stay in their persisted string form so that a hand-edited,
//! malformed value degrades to the default color instead of failing the
//! whole file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::{ColorTriple, OverlaySpec};
use crate::error::Result;

/// Location of the preference file relative to the workspace root.
pub const PREFERENCES_FILE: &str = ".metadata/.plugins/instance-icon/preferences.json";

// ============================================================================
// Preferences
// ============================================================================

/// The persisted preference set.
///
/// Missing keys take their defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Name of a predefined theme, empty for none.
    #[serde(rename = "instancePredefinedIcon")]
    pub predefined_icon: String,

    /// Path of a custom raster icon, empty for none.
    #[serde(rename = "instanceIconPath")]
    pub icon_path: String,

    #[serde(rename = "instanceTitleSuffix")]
    pub title_suffix: String,

    #[serde(rename = "instanceColorPrimary")]
    pub color_primary: String,

    #[serde(rename = "instanceColorSecondary")]
    pub color_secondary: String,

    #[serde(rename = "instanceColorAccent")]
    pub color_accent: String,

    #[serde(rename = "instanceIconText")]
    pub icon_text: String,

    #[serde(rename = "instanceIconTextColor")]
    pub icon_text_color: String,

    /// Overlay font height as a percentage of icon width.
    #[serde(rename = "instanceIconTextSize")]
    pub icon_text_size: i64,

    /// Whether the custom-colors template is used when no predefined theme
    /// or custom file is configured.
    #[serde(rename = "instanceColorsEnabled")]
    pub colors_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            predefined_icon: String::new(),
            icon_path: String::new(),
            title_suffix: String::new(),
            color_primary: ColorTriple::DEFAULT_PRIMARY.to_string(),
            color_secondary: ColorTriple::DEFAULT_SECONDARY.to_string(),
            color_accent: ColorTriple::DEFAULT_ACCENT.to_string(),
            icon_text: String::new(),
            icon_text_color: ColorTriple::BLACK.to_string(),
            icon_text_size: OverlaySpec::DEFAULT_SIZE_PERCENT as i64,
            colors_enabled: false,
        }
    }
}

impl Preferences {
    pub fn primary(&self) -> ColorTriple {
        ColorTriple::parse_or(&self.color_primary, ColorTriple::DEFAULT_PRIMARY)
    }

    pub fn secondary(&self) -> ColorTriple {
        ColorTriple::parse_or(&self.color_secondary, ColorTriple::DEFAULT_SECONDARY)
    }

    pub fn accent(&self) -> ColorTriple {
        ColorTriple::parse_or(&self.color_accent, ColorTriple::DEFAULT_ACCENT)
    }

    pub fn overlay(&self) -> OverlaySpec {
        OverlaySpec::new(
            &self.icon_text,
            ColorTriple::parse_or(&self.icon_text_color, ColorTriple::BLACK),
            self.icon_text_size,
        )
    }

    pub fn set_colors(
        &mut self,
        primary: ColorTriple,
        secondary: ColorTriple,
        accent: ColorTriple,
    ) {
        self.color_primary = primary.to_string();
        self.color_secondary = secondary.to_string();
        self.color_accent = accent.to_string();
    }

    pub fn set_overlay(&mut self, overlay: &OverlaySpec) {
        self.icon_text = overlay.text().to_string();
        self.icon_text_color = overlay.color().to_string();
        self.icon_text_size = overlay.size_percent() as i64;
    }

    /// Replaces blank color and text-color entries with their defaults.
    ///
    /// Returns true if anything changed.
    pub fn fill_defaults(&mut self) -> bool {
        let defaults = Self::default();
        let mut changed = false;
        for (value, default) in [
            (&mut self.color_primary, defaults.color_primary),
            (&mut self.color_secondary, defaults.color_secondary),
            (&mut self.color_accent, defaults.color_accent),
            (&mut self.icon_text_color, defaults.icon_text_color),
        ] {
            if value.trim().is_empty() {
                *value = default;
                changed = true;
            }
        }
        changed
    }

    /// Serializes the preferences to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes preferences from a JSON string.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// PreferenceStore
// ============================================================================

/// Preferences plus where they are persisted.
#[derive(Debug, Clone, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    preferences: Preferences,
}

impl PreferenceStore {
    /// A store that is never written to disk.
    pub fn in_memory(preferences: Preferences) -> Self {
        Self {
            path: None,
            preferences,
        }
    }

    /// Opens the store for a workspace directory.
    pub fn for_workspace(workspace: &Path) -> Self {
        Self::open(workspace.join(PREFERENCES_FILE))
    }

    /// Opens the store at `path`.
    ///
    /// A missing file yields defaults; an unreadable or invalid one yields
    /// defaults with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let preferences = load_or_default(&path);
        Self {
            path: Some(path),
            preferences,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self) -> &Preferences {
        &self.preferences
    }

    pub fn get_mut(&mut self) -> &mut Preferences {
        &mut self.preferences
    }

    pub fn set(&mut self, preferences: Preferences) {
        self.preferences = preferences;
    }

    /// Re-reads the file, picking up changes written by another process.
    pub fn refresh(&mut self) {
        if let Some(path) = &self.path {
            self.preferences = load_or_default(path);
        }
    }

    /// Writes the preferences, creating parent directories as needed.
    ///
    /// In-memory stores succeed without writing anything.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.preferences.to_json_pretty()?)?;
        log::debug!("Saved preferences to {}", path.display());
        Ok(())
    }
}

fn load_or_default(path: &Path) -> Preferences {
    let mut preferences = match fs::read_to_string(path) {
        Ok(content) => Preferences::from_json(&content).unwrap_or_else(|e| {
            log::warn!("Invalid preferences in {}, using defaults: {e}", path.display());
            Preferences::default()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
        Err(e) => {
            log::warn!("Cannot read preferences {}, using defaults: {e}", path.display());
            Preferences::default()
        }
    };
    preferences.fill_defaults();
    preferences
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_template_colors() {
        let prefs = Preferences::default();
        assert_eq!(prefs.primary(), ColorTriple::DEFAULT_PRIMARY);
        assert_eq!(prefs.secondary(), ColorTriple::DEFAULT_SECONDARY);
        assert_eq!(prefs.accent(), ColorTriple::DEFAULT_ACCENT);
        assert!(prefs.overlay().is_empty());
        assert_eq!(prefs.overlay().color(), ColorTriple::BLACK);
        assert_eq!(prefs.overlay().size_percent(), 33);
        assert!(!prefs.colors_enabled);
    }

    #[test]
    fn json_uses_preference_ids() {
        let json = Preferences::default().to_json_pretty().unwrap();
        assert!(json.contains("\"instancePredefinedIcon\""));
        assert!(json.contains("\"instanceTitleSuffix\""));
        assert!(json.contains("\"instanceColorPrimary\": \"71,55,136\""));
        assert!(json.contains("\"instanceIconTextSize\": 33"));
    }

    #[test]
    fn partial_json_takes_defaults() {
        let prefs = Preferences::from_json(r#"{"instanceTitleSuffix": "[DEV]"}"#).unwrap();
        assert_eq!(prefs.title_suffix, "[DEV]");
        assert_eq!(prefs.primary(), ColorTriple::DEFAULT_PRIMARY);
    }

    #[test]
    fn malformed_colors_fall_back_per_key() {
        let prefs = Preferences {
            color_primary: "nope".into(),
            color_secondary: "1,2".into(),
            color_accent: "10,20,30".into(),
            ..Preferences::default()
        };
        assert_eq!(prefs.primary(), ColorTriple::DEFAULT_PRIMARY);
        assert_eq!(prefs.secondary(), ColorTriple::DEFAULT_SECONDARY);
        assert_eq!(prefs.accent(), ColorTriple::new(10, 20, 30));
    }

    #[test]
    fn overlay_setters_normalize() {
        let mut prefs = Preferences::default();
        prefs.set_overlay(&OverlaySpec::new("test!", ColorTriple::new(255, 255, 255), 500));
        assert_eq!(prefs.icon_text, "TEST");
        assert_eq!(prefs.icon_text_color, "255,255,255");
        assert_eq!(prefs.icon_text_size, 100);
    }

    #[test]
    fn fill_defaults_replaces_blank_colors() {
        let mut prefs = Preferences {
            color_primary: " ".into(),
            icon_text_color: String::new(),
            ..Preferences::default()
        };
        assert!(prefs.fill_defaults());
        assert_eq!(prefs.color_primary, "71,55,136");
        assert_eq!(prefs.icon_text_color, "0,0,0");
        assert!(!prefs.fill_defaults());
    }

    #[test]
    fn save_and_open_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = PreferenceStore::for_workspace(dir.path());
        store.get_mut().title_suffix = "[TEST]".into();
        store.get_mut().predefined_icon = "eclipse_sage".into();
        store.save().unwrap();

        let reopened = PreferenceStore::for_workspace(dir.path());
        assert_eq!(reopened.get(), store.get());
        assert!(dir.path().join(PREFERENCES_FILE).is_file());
    }

    #[test]
    fn invalid_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{ not json").unwrap();

        let store = PreferenceStore::open(&path);
        assert_eq!(store.get(), &Preferences::default());
    }

    #[test]
    fn refresh_picks_up_external_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let mut store = PreferenceStore::open(&path);
        assert!(store.get().title_suffix.is_empty());

        let mut other = PreferenceStore::open(&path);
        other.get_mut().title_suffix = "[PROD]".into();
        other.save().unwrap();

        store.refresh();
        assert_eq!(store.get().title_suffix, "[PROD]");
    }

    #[test]
    fn save_fails_when_parent_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let store = PreferenceStore::open(blocker.join("prefs.json"));
        assert!(store.save().is_err());
    }

    #[test]
    fn in_memory_store_never_writes() {
        let store = PreferenceStore::in_memory(Preferences::default());
        assert!(store.path().is_none());
        assert!(store.save().is_ok());
    }
}
