//! Bundled resource access.
//!
//! The crate reads three kinds of resources by name: the SVG icon template,
//! the predefined raster themes, and optional raster fallbacks. Where they
//! come from is the host's business, so everything goes through
//! [`ResourceProvider`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Path of the SVG icon template.
pub const TEMPLATE_PATH: &str = "icons/eclipse_icon.svg";

/// Directory holding the predefined raster themes.
pub const THEME_DIR: &str = "icons/default/eclipse_icons";

const EMBEDDED_TEMPLATE: &str = include_str!("../assets/icons/eclipse_icon.svg");

/// Resource path of a predefined theme image.
pub fn theme_path(name: &str) -> String {
    format!("{THEME_DIR}/{name}.png")
}

/// Resource path of the bundled fallback raster for one icon size.
pub fn sized_fallback_path(size: u32) -> String {
    format!("icons/default/eclipse_icon_{size}.png")
}

// ============================================================================
// PredefinedTheme
// ============================================================================

/// The bundled raster themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredefinedTheme {
    Original,
    Blue,
    Sky,
    Green,
    Sage,
    Red,
    Rose,
}

impl PredefinedTheme {
    pub const ALL: [Self; 7] = [
        Self::Original,
        Self::Blue,
        Self::Sky,
        Self::Green,
        Self::Sage,
        Self::Red,
        Self::Rose,
    ];

    /// Persisted name, also the resource file stem.
    pub fn name(self) -> &'static str {
        match self {
            Self::Original => "eclipse_original",
            Self::Blue => "eclipse_blue",
            Self::Sky => "eclipse_sky",
            Self::Green => "eclipse_green",
            Self::Sage => "eclipse_sage",
            Self::Red => "eclipse_red",
            Self::Rose => "eclipse_rose",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Original => "Original (Purple)",
            Self::Blue => "Blue",
            Self::Sky => "Sky",
            Self::Green => "Green",
            Self::Sage => "Sage",
            Self::Red => "Red",
            Self::Rose => "Rose",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|theme| theme.name() == name)
    }

    pub fn resource_path(self) -> String {
        theme_path(self.name())
    }
}

impl fmt::Display for PredefinedTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// ResourceProvider
// ============================================================================

/// Read-only access to bundled resources and user files.
pub trait ResourceProvider {
    /// Reads a bundled resource by its slash-separated path.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Reads a user-supplied file from the filesystem.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }
}

/// Resources from an optional bundle directory, with the icon template
/// compiled into the crate.
///
/// Files under the bundle root win; the embedded template is used when the
/// root has none.
#[derive(Debug, Clone, Default)]
pub struct BundledResources {
    root: Option<PathBuf>,
}

impl BundledResources {
    /// Only the embedded template is available.
    pub fn embedded() -> Self {
        Self { root: None }
    }

    /// Resources are looked up under `root` first.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

impl ResourceProvider for BundledResources {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        if let Some(root) = &self.root {
            let full = root.join(path);
            if full.is_file() {
                return Ok(std::fs::read(full)?);
            }
        }
        if path == TEMPLATE_PATH {
            return Ok(EMBEDDED_TEMPLATE.as_bytes().to_vec());
        }
        Err(Error::ResourceMissing(path.to_string()))
    }
}

/// In-memory resources, for hosts that unpack their bundle themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.entries.insert(path.into(), data.into());
    }

    pub fn with(mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    /// Adds the embedded icon template under [`TEMPLATE_PATH`].
    pub fn with_embedded_template(self) -> Self {
        self.with(TEMPLATE_PATH, EMBEDDED_TEMPLATE)
    }
}

impl ResourceProvider for MemoryResources {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| Error::ResourceMissing(path.to_string()))
    }
}
