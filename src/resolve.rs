//! Configuration precedence resolution.
//!
//! Decides which icon source and which title suffix are active from system
//! properties, the environment and the stored preferences. Nothing is cached:
//! every call re-reads the [`InstanceContext`], and the caller decides when
//! to resolve again (at startup and after preferences change).

use std::fmt;
use std::path::PathBuf;

use crate::color::{ColorTriple, OverlaySpec};
use crate::context::{
    ENV_ICON, ENV_TITLE_SUFFIX, InstanceContext, SYSPROP_ICON, SYSPROP_TITLE_SUFFIX,
};

// ============================================================================
// IconSpec
// ============================================================================

/// Where the icon set comes from. Exactly one variant is active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSpec {
    /// The SVG template rendered with these colors and optional overlay text.
    CustomColors {
        primary: ColorTriple,
        secondary: ColorTriple,
        accent: ColorTriple,
        overlay: OverlaySpec,
    },
    /// A bundled raster theme, by name.
    Predefined(String),
    /// A raster image file chosen by the user.
    CustomFile(PathBuf),
    /// Nothing configured.
    Fallback,
}

impl IconSpec {
    /// The default template colors without overlay text.
    pub fn default_colors() -> Self {
        Self::CustomColors {
            primary: ColorTriple::DEFAULT_PRIMARY,
            secondary: ColorTriple::DEFAULT_SECONDARY,
            accent: ColorTriple::DEFAULT_ACCENT,
            overlay: OverlaySpec::none(),
        }
    }
}

impl fmt::Display for IconSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CustomColors {
                primary,
                secondary,
                accent,
                overlay,
            } => {
                write!(
                    f,
                    "colors {} {} {}",
                    primary.to_hex(),
                    secondary.to_hex(),
                    accent.to_hex()
                )?;
                if !overlay.is_empty() {
                    write!(f, " with text {:?}", overlay.text())?;
                }
                Ok(())
            }
            Self::Predefined(name) => write!(f, "predefined {name}"),
            Self::CustomFile(path) => write!(f, "file {}", path.display()),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

// ============================================================================
// TitleSuffix
// ============================================================================

/// A non-blank, trimmed window title suffix such as `[DEV]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TitleSuffix(String);

impl TitleSuffix {
    /// Returns `None` for blank input.
    pub fn new(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TitleSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Precedence
// ============================================================================

/// Whether the system property / environment icon path is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconPrecedence {
    /// Property, then environment, then preferences.
    #[default]
    OverrideFirst,
    /// Preferences only; the path override is ignored.
    PreferencesOnly,
}

/// The tier a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    SystemProperty,
    Environment,
    Preference,
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SystemProperty => "system property",
            Self::Environment => "environment variable",
            Self::Preference => "preference",
            Self::Default => "default",
        })
    }
}

// ============================================================================
// ConfigResolver
// ============================================================================

/// Resolves the active configuration from an [`InstanceContext`].
pub struct ConfigResolver<'a> {
    ctx: &'a InstanceContext,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(ctx: &'a InstanceContext) -> Self {
        Self { ctx }
    }

    /// The active icon source.
    pub fn resolve_icon_spec(&self) -> IconSpec {
        self.resolve_icon().0
    }

    /// The active icon source and the tier it came from.
    ///
    /// Order: path override (property, then environment, unless
    /// [`IconPrecedence::PreferencesOnly`]), predefined theme preference,
    /// custom path preference, custom colors (when enabled), fallback.
    pub fn resolve_icon(&self) -> (IconSpec, ConfigSource) {
        if self.ctx.precedence == IconPrecedence::OverrideFirst {
            if let Some(path) = self.property(SYSPROP_ICON) {
                log::info!("Using icon path from system property: {path}");
                return (IconSpec::CustomFile(path.into()), ConfigSource::SystemProperty);
            }
            if let Some(path) = self.env(ENV_ICON) {
                log::info!("Using icon path from environment variable: {path}");
                return (IconSpec::CustomFile(path.into()), ConfigSource::Environment);
            }
        }

        let prefs = self.ctx.preferences.get();
        if let Some(name) = non_blank(&prefs.predefined_icon) {
            log::info!("Using predefined icon from preferences: {name}");
            return (IconSpec::Predefined(name), ConfigSource::Preference);
        }
        if let Some(path) = non_blank(&prefs.icon_path) {
            log::info!("Using custom icon path from preferences: {path}");
            return (IconSpec::CustomFile(path.into()), ConfigSource::Preference);
        }
        if prefs.colors_enabled {
            let spec = IconSpec::CustomColors {
                primary: prefs.primary(),
                secondary: prefs.secondary(),
                accent: prefs.accent(),
                overlay: prefs.overlay(),
            };
            log::info!("Using custom icon colors from preferences: {spec}");
            return (spec, ConfigSource::Preference);
        }

        log::info!("No icon configured, using fallback icon");
        (IconSpec::Fallback, ConfigSource::Default)
    }

    /// The active title suffix, if any.
    pub fn resolve_title_suffix(&self) -> Option<TitleSuffix> {
        self.resolve_title().map(|(suffix, _)| suffix)
    }

    fn resolve_title(&self) -> Option<(TitleSuffix, ConfigSource)> {
        let candidates = [
            (self.property(SYSPROP_TITLE_SUFFIX), ConfigSource::SystemProperty),
            (self.env(ENV_TITLE_SUFFIX), ConfigSource::Environment),
            (non_blank(&self.ctx.preferences.get().title_suffix), ConfigSource::Preference),
        ];

        candidates.into_iter().find_map(|(value, source)| {
            let suffix = TitleSuffix::new(&value?)?;
            log::debug!("Using title suffix from {source}: {suffix}");
            Some((suffix, source))
        })
    }

    /// Reports every configuration tier and which one is active.
    pub fn describe(&self) -> ActiveConfiguration {
        let (icon, icon_source) = self.resolve_icon();
        let (title_suffix, title_source) = match self.resolve_title() {
            Some((suffix, source)) => (Some(suffix), source),
            None => (None, ConfigSource::Default),
        };

        ActiveConfiguration {
            icon_property: self.ctx.properties.get(SYSPROP_ICON).map(str::to_string),
            icon_env: self.ctx.environment.var(ENV_ICON),
            title_property: self.ctx.properties.get(SYSPROP_TITLE_SUFFIX).map(str::to_string),
            title_env: self.ctx.environment.var(ENV_TITLE_SUFFIX),
            icon,
            icon_source,
            title_suffix,
            title_source,
        }
    }

    fn property(&self, key: &str) -> Option<String> {
        self.ctx.properties.get(key).and_then(non_blank)
    }

    fn env(&self, key: &str) -> Option<String> {
        self.ctx.environment.var(key).as_deref().and_then(non_blank)
    }
}

/// Trims `value`, treating an empty result as absent.
fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ============================================================================
// ActiveConfiguration
// ============================================================================

/// Snapshot of the raw override values and the resolved result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveConfiguration {
    pub icon_property: Option<String>,
    pub icon_env: Option<String>,
    pub title_property: Option<String>,
    pub title_env: Option<String>,
    pub icon: IconSpec,
    pub icon_source: ConfigSource,
    pub title_suffix: Option<TitleSuffix>,
    pub title_source: ConfigSource,
}

impl fmt::Display for ActiveConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "(not set)".into());

        writeln!(f, "System property (icon):              {}", show(&self.icon_property))?;
        writeln!(f, "Environment variable (icon):         {}", show(&self.icon_env))?;
        writeln!(f, "System property (title suffix):      {}", show(&self.title_property))?;
        writeln!(f, "Environment variable (title suffix): {}", show(&self.title_env))?;
        writeln!(f, "Active icon:                         {} ({})", self.icon, self.icon_source)?;
        match &self.title_suffix {
            Some(suffix) => write!(
                f,
                "Active title suffix:                 {suffix} ({})",
                self.title_source
            ),
            None => write!(f, "Active title suffix:                 (none)"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
