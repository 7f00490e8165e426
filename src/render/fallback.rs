//! Fallback icons for when the configured source cannot be used.
//!
//! Two tiers: a bundled raster (sized, or the original theme scaled), and a
//! procedural circle-with-badge that needs no resources at all.

use image::{Rgba, RgbaImage};

use super::{decode_image, scale_to};
use crate::color::ColorTriple;
use crate::error::Result;
use crate::resources::{PredefinedTheme, ResourceProvider, sized_fallback_path};

/// Fill color of the procedural icon's disc.
pub const FALLBACK_BASE: ColorTriple = ColorTriple::DEFAULT_PRIMARY;
/// Fill color of the procedural icon's corner badge.
pub const FALLBACK_BADGE: ColorTriple = ColorTriple::DEFAULT_ACCENT;

/// Loads the bundled raster fallback for one size.
///
/// Prefers an image made for exactly this size, then scales the original
/// theme image.
pub fn bundled_fallback(resources: &dyn ResourceProvider, size: u32) -> Result<RgbaImage> {
    let bytes = match resources.read(&sized_fallback_path(size)) {
        Ok(bytes) => bytes,
        Err(_) => resources.read(&PredefinedTheme::Original.resource_path())?,
    };
    Ok(scale_to(&decode_image(&bytes)?, size))
}

/// Radius of the procedural icon's corner badge.
pub fn badge_radius(size: u32) -> u32 {
    (size / 5).max(3)
}

/// Draws the procedural fallback icon.
///
/// A disc in [`FALLBACK_BASE`] spanning the square minus a 1px margin, with a
/// [`FALLBACK_BADGE`] badge centered at `size - badge_radius - 1` on both
/// axes. Pixels are either fully opaque or fully transparent.
pub fn procedural_icon(size: u32) -> RgbaImage {
    let base = FALLBACK_BASE.to_rgba(255);
    let badge = FALLBACK_BADGE.to_rgba(255);

    let center = (size as f32 - 1.0) / 2.0;
    let radius = (size as f32 / 2.0 - 1.0).max(0.0);

    let badge_r = badge_radius(size) as i64;
    let badge_c = size as i64 - badge_r - 1;

    RgbaImage::from_fn(size, size, |x, y| {
        let (bx, by) = (x as i64 - badge_c, y as i64 - badge_c);
        if bx * bx + by * by <= badge_r * badge_r {
            return badge;
        }

        let (dx, dy) = (x as f32 - center, y as f32 - center);
        if dx * dx + dy * dy <= radius * radius {
            base
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}
