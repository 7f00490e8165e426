//! Text overlay compositing.
//!
//! Overlay text is laid out with usvg's text engine, cropped to its inked
//! bounds and centered on the icon. Three passes keep it readable on any
//! background: a black drop shadow, a black four-direction outline, then the
//! text in its own color.

use image::RgbaImage;
use image::imageops;
use resvg::usvg::Options;

use super::{composite_over, rasterize_svg};
use crate::color::{ColorTriple, OverlaySpec};

/// Font families tried in order for overlay text.
pub const FONT_FAMILIES: &str = "DejaVu Sans, Liberation Sans, Arial, Helvetica, sans-serif";

/// Opacity of the drop shadow pass (~63%).
pub const SHADOW_ALPHA: u8 = 160;
/// Opacity of the outline pass (~86%).
pub const OUTLINE_ALPHA: u8 = 220;

const OUTLINE_OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

// ============================================================================
// OverlayCompositor
// ============================================================================

/// Draws [`OverlaySpec`] text onto icon bitmaps.
///
/// Holds the font database, which is expensive to build; create one and
/// reuse it for every size of a set.
pub struct OverlayCompositor {
    options: Options<'static>,
}

impl OverlayCompositor {
    /// A compositor without fonts. Text cannot be drawn until fonts are loaded.
    pub fn new() -> Self {
        Self {
            options: Options::default(),
        }
    }

    /// A compositor using the fonts installed on the system.
    pub fn with_system_fonts() -> Self {
        let mut compositor = Self::new();
        compositor.options.fontdb_mut().load_system_fonts();
        log::debug!("Loaded {} font faces for overlay text", compositor.options.fontdb.len());
        compositor
    }

    /// Adds a font from raw TrueType/OpenType data.
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.options.fontdb_mut().load_font_data(data);
    }

    pub fn has_fonts(&self) -> bool {
        self.options.fontdb.len() > 0
    }

    /// Draws the overlay text centered on `image`.
    ///
    /// No-op for empty text or a zero-sized image. Returns whether any text
    /// was drawn; text that produced no glyphs (no usable font) is skipped.
    /// Text wider than the image is clipped symmetrically.
    pub fn apply(&self, image: &mut RgbaImage, spec: &OverlaySpec) -> bool {
        if spec.is_empty() || image.width() == 0 || image.height() == 0 {
            return false;
        }

        let font_px = spec.font_height(image.width());
        let Some(mask) = self.render_text_mask(spec.text(), font_px) else {
            log::warn!("No glyphs rendered for overlay text {:?}", spec.text());
            return false;
        };

        composite_passes(image, &mask, spec.color());
        true
    }

    /// Renders `text` in white at `font_px` and crops it to its inked bounds.
    fn render_text_mask(&self, text: &str, font_px: u32) -> Option<RgbaImage> {
        let width = font_px * (OverlaySpec::MAX_TEXT_LEN as u32 + 1);
        let height = font_px * 2;
        let svg = format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}"><text x="{x}" y="{y}" font-family="{FONT_FAMILIES}" font-weight="bold" font-size="{font_px}" text-anchor="middle" fill="#FFFFFF">{text}</text></svg>"##,
            x = width / 2,
            y = font_px * 3 / 2,
            text = escape_xml(text),
        );

        let canvas = match rasterize_svg(&svg, width, height, &self.options) {
            Ok(canvas) => canvas,
            Err(e) => {
                log::warn!("Failed to lay out overlay text: {e}");
                return None;
            }
        };
        crop_to_ink(&canvas)
    }
}

impl Default for OverlayCompositor {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Passes
// ============================================================================

/// Composites shadow, outline and fill passes of `mask`, centered on `image`.
fn composite_passes(image: &mut RgbaImage, mask: &RgbaImage, color: ColorTriple) {
    let x = (image.width() as i32 - mask.width() as i32) / 2;
    let y = (image.height() as i32 - mask.height() as i32) / 2;

    let shadow = tint(mask, ColorTriple::BLACK, SHADOW_ALPHA);
    composite_over(image, &shadow, x + 1, y + 1);

    let outline = tint(mask, ColorTriple::BLACK, OUTLINE_ALPHA);
    for (dx, dy) in OUTLINE_OFFSETS {
        composite_over(image, &outline, x + dx, y + dy);
    }

    let fill = tint(mask, color, 255);
    composite_over(image, &fill, x, y);
}

/// Paints `color` through the mask's alpha channel at the given opacity.
fn tint(mask: &RgbaImage, color: ColorTriple, opacity: u8) -> RgbaImage {
    RgbaImage::from_fn(mask.width(), mask.height(), |x, y| {
        let coverage = mask.get_pixel(x, y)[3] as u32;
        color.to_rgba((coverage * opacity as u32 / 255) as u8)
    })
}

/// Crops to the bounding box of non-transparent pixels. `None` if all clear.
fn crop_to_ink(img: &RgbaImage) -> Option<RgbaImage> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    let (x0, y0, x1, y1) = bounds?;
    Some(imageops::crop_imm(img, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image())
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
