//! The icon manager: turns an [`IconSpec`] into a complete [`IconSet`].
//!
//! The manager owns the only live icon set. Every load releases the previous
//! generation before the first new image is produced, and every load yields
//! an image at each of [`ICON_SIZES`], falling back tier by tier:
//!
//! 1. the configured source (template, theme image or user file)
//! 2. the bundled raster fallback for that size
//! 3. the procedural circle-and-badge icon

use std::rc::Rc;

use image::RgbaImage;

use crate::color::{ColorTriple, OverlaySpec};
use crate::error::{Error, Result};
use crate::icon::{ICON_SIZES, IconImage, IconSet};
use crate::render::fallback::bundled_fallback;
use crate::render::{OverlayCompositor, TemplateRenderer, decode_image, procedural_icon, scale_to};
use crate::resolve::IconSpec;
use crate::resources::{PredefinedTheme, ResourceProvider};

/// What each size of a load is produced from.
enum Source {
    Template {
        renderer: TemplateRenderer,
        primary: ColorTriple,
        secondary: ColorTriple,
        accent: ColorTriple,
    },
    Raster(RgbaImage),
    Fallback,
}

// ============================================================================
// IconManager
// ============================================================================

/// Renders, caches and disposes the icon set.
pub struct IconManager {
    resources: Rc<dyn ResourceProvider>,
    icons: IconSet,
    using_fallback: bool,
    compositor: Option<OverlayCompositor>,
}

impl IconManager {
    pub fn new(resources: Rc<dyn ResourceProvider>) -> Self {
        Self {
            resources,
            icons: IconSet::new(),
            using_fallback: false,
            compositor: None,
        }
    }

    /// Uses `compositor` for overlay text instead of loading system fonts on
    /// first use.
    pub fn with_compositor(mut self, compositor: OverlayCompositor) -> Self {
        self.compositor = Some(compositor);
        self
    }

    /// Disposes the current set and produces a new one for `spec`.
    ///
    /// Never fails and never returns a partial set.
    pub fn load_from_spec(&mut self, spec: &IconSpec) -> &IconSet {
        self.dispose_all();
        self.icons.begin_generation();
        self.using_fallback = matches!(spec, IconSpec::Fallback);

        let source = match self.prepare(spec) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Cannot load icon source ({spec}): {e}; using fallback");
                self.using_fallback = true;
                Source::Fallback
            }
        };

        let overlay = match spec {
            IconSpec::CustomColors { overlay, .. } if !overlay.is_empty() => {
                self.compositor.get_or_insert_with(OverlayCompositor::with_system_fonts);
                Some(overlay)
            }
            _ => None,
        };

        for size in ICON_SIZES {
            let mut image = match self.render_size(&source, size) {
                Ok(image) => image,
                Err(e) => {
                    log::warn!("Failed to render {size}px icon: {e}; using fallback");
                    self.using_fallback = true;
                    self.fallback(size)
                }
            };
            if let (Some(overlay), Some(compositor)) = (overlay, &self.compositor) {
                compositor.apply(&mut image, overlay);
            }
            self.icons.insert(IconImage::new(image));
        }

        log::info!(
            "Loaded icon set generation {} ({spec}{})",
            self.icons.generation(),
            if self.using_fallback { ", fallback" } else { "" }
        );
        &self.icons
    }

    /// Releases every cached image. Safe to call repeatedly.
    pub fn dispose_all(&mut self) {
        if !self.icons.is_empty() {
            log::debug!("Disposing icon set generation {}", self.icons.generation());
        }
        self.icons.dispose_all();
    }

    /// Whether any fallback tier was used by the most recent load.
    pub fn is_using_fallback(&self) -> bool {
        self.using_fallback
    }

    /// The current icon set; empty before the first load and after disposal.
    pub fn icons(&self) -> &IconSet {
        &self.icons
    }

    /// Renders one custom-colors icon at any size without touching the
    /// cached set. `None` when the template cannot be rendered.
    pub fn render_preview(
        &mut self,
        size: u32,
        primary: ColorTriple,
        secondary: ColorTriple,
        accent: ColorTriple,
        overlay: &OverlaySpec,
    ) -> Option<RgbaImage> {
        let rendered = TemplateRenderer::load(self.resources.as_ref())
            .and_then(|renderer| renderer.render(size, primary, secondary, accent));
        let mut image = match rendered {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Failed to render icon preview: {e}");
                return None;
            }
        };

        if !overlay.is_empty() {
            self.compositor
                .get_or_insert_with(OverlayCompositor::with_system_fonts)
                .apply(&mut image, overlay);
        }
        Some(image)
    }

    fn prepare(&self, spec: &IconSpec) -> Result<Source> {
        match spec {
            IconSpec::CustomColors {
                primary,
                secondary,
                accent,
                ..
            } => Ok(Source::Template {
                renderer: TemplateRenderer::load(self.resources.as_ref())?,
                primary: *primary,
                secondary: *secondary,
                accent: *accent,
            }),
            IconSpec::Predefined(name) => {
                let theme = PredefinedTheme::from_name(name)
                    .ok_or_else(|| Error::UnknownTheme(name.clone()))?;
                let bytes = self.resources.read(&theme.resource_path())?;
                Ok(Source::Raster(decode_image(&bytes)?))
            }
            IconSpec::CustomFile(path) => {
                let bytes = self.resources.read_file(path)?;
                Ok(Source::Raster(decode_image(&bytes)?))
            }
            IconSpec::Fallback => Ok(Source::Fallback),
        }
    }

    fn render_size(&self, source: &Source, size: u32) -> Result<RgbaImage> {
        match source {
            Source::Template {
                renderer,
                primary,
                secondary,
                accent,
            } => renderer.render(size, *primary, *secondary, *accent),
            Source::Raster(image) => Ok(scale_to(image, size)),
            Source::Fallback => Ok(self.fallback(size)),
        }
    }

    fn fallback(&self, size: u32) -> RgbaImage {
        bundled_fallback(self.resources.as_ref(), size).unwrap_or_else(|e| {
            log::debug!("No bundled {size}px fallback ({e}); drawing icon");
            procedural_icon(size)
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
