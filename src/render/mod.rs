//! Pixel-producing building blocks.
//!
//! - [`template`]: color substitution and rasterization of the SVG template
//! - [`fallback`]: bundled raster fallbacks and the procedural icon
//! - [`overlay`]: centered text overlay with shadow and outline passes
//!
//! This module holds the helpers they share: SVG rasterization into an
//! [`RgbaImage`], high-quality scaling and source-over compositing.

pub mod fallback;
pub mod overlay;
pub mod template;

pub use fallback::{badge_radius, procedural_icon};
pub use overlay::OverlayCompositor;
pub use template::TemplateRenderer;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::{Error, Result};

// ============================================================================
// Rasterization
// ============================================================================

/// Parses `svg_data` and rasterizes it to exactly `width x height` pixels.
///
/// The document is stretched to the target on each axis independently, so a
/// square document rendered to a square target keeps its proportions.
pub(crate) fn rasterize_svg(
    svg_data: &str,
    width: u32,
    height: u32,
    opts: &Options,
) -> Result<RgbaImage> {
    let tree = Tree::from_str(svg_data, opts)?;

    let svg_size = tree.size();
    let scale_x = width as f32 / svg_size.width();
    let scale_y = height as f32 / svg_size.height();

    let mut pixmap = Pixmap::new(width, height).ok_or(Error::Pixmap(width.max(height)))?;
    resvg::render(&tree, Transform::from_scale(scale_x, scale_y), &mut pixmap.as_mut());

    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());

    // tiny_skia stores premultiplied alpha
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        dst.0 = [color.red(), color.green(), color.blue(), color.alpha()];
    }

    img
}

// ============================================================================
// Raster loading
// ============================================================================

/// Decodes raster bytes (PNG, or anything else `image` recognises).
pub(crate) fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Resamples `img` to `size x size` with a Lanczos filter.
///
/// Returns a copy when the image already has the requested size.
pub(crate) fn scale_to(img: &RgbaImage, size: u32) -> RgbaImage {
    if img.width() == size && img.height() == size {
        return img.clone();
    }
    imageops::resize(img, size, size, FilterType::Lanczos3)
}

// ============================================================================
// Compositing
// ============================================================================

/// Composites a source image onto a destination image at the specified position.
///
/// Uses standard alpha blending (source over destination). Pixels falling
/// outside the destination are clipped.
pub(crate) fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let dest_width = dest.width() as i32;
    let dest_height = dest.height() as i32;

    for (sx, sy, src_pixel) in src.enumerate_pixels() {
        let dx = x + sx as i32;
        let dy = y + sy as i32;

        if dx < 0 || dy < 0 || dx >= dest_width || dy >= dest_height {
            continue;
        }
        if src_pixel[3] == 0 {
            continue;
        }

        let dst_pixel = dest.get_pixel_mut(dx as u32, dy as u32);
        *dst_pixel = alpha_blend(*src_pixel, *dst_pixel);
    }
}

/// Alpha blends two RGBA pixels (source over destination).
fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;

    let out_a = sa + da * (1.0 - sa);

    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round() as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"><circle cx="50" cy="50" r="40" fill="#ff0000"/></svg>"##;

    #[test]
    fn rasterize_to_exact_size() {
        let img = rasterize_svg(SIMPLE_SVG, 24, 24, &Options::default()).unwrap();
        assert_eq!(img.dimensions(), (24, 24));

        // Corner is outside the circle and stays transparent
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        let center = img.get_pixel(12, 12);
        assert_eq!(center.0, [255, 0, 0, 255]);
    }

    #[test]
    fn rasterize_rejects_malformed_svg() {
        let result = rasterize_svg("<svg", 16, 16, &Options::default());
        assert!(matches!(result, Err(Error::Svg(_))));
    }

    #[test]
    fn rasterize_rejects_zero_size() {
        let result = rasterize_svg(SIMPLE_SVG, 0, 0, &Options::default());
        assert!(matches!(result, Err(Error::Pixmap(0))));
    }

    #[test]
    fn scale_to_resizes() {
        let img = RgbaImage::from_pixel(40, 20, Rgba([0, 0, 255, 255]));
        let scaled = scale_to(&img, 16);
        assert_eq!(scaled.dimensions(), (16, 16));
        assert_eq!(scale_to(&scaled, 16), scaled);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_image(b"not an image"), Err(Error::Image(_))));
    }

    #[test]
    fn composite_simple() {
        let mut dest = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));

        composite_over(&mut dest, &src, 3, 3);

        assert_eq!(dest.get_pixel(5, 5).0, [0, 0, 255, 255]);
        assert_eq!(dest.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn composite_with_transparency() {
        let mut dest = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 128]));

        composite_over(&mut dest, &src, 0, 0);

        let pixel = dest.get_pixel(0, 0);
        assert!(pixel[0] > 0, "Should have some red");
        assert!(pixel[2] > 0, "Should have some blue");
    }

    #[test]
    fn composite_clips_negative_offsets() {
        let mut dest = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255]));

        composite_over(&mut dest, &src, -2, -2);

        assert_eq!(dest.get_pixel(1, 1).0, [0, 255, 0, 255]);
        assert_eq!(dest.get_pixel(2, 2).0, [255, 0, 0, 255]);
    }
}
