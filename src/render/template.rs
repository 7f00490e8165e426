//! SVG icon template with three replaceable color regions.
//!
//! The template is an ordinary SVG document whose primary, secondary and
//! accent regions are painted with fixed placeholder colors. Rendering a
//! custom icon is a textual substitution of those placeholders followed by
//! rasterization at the requested size.

use resvg::usvg::Options;

use super::rasterize_svg;
use crate::color::ColorTriple;
use crate::error::Result;
use crate::resources::{ResourceProvider, TEMPLATE_PATH};

/// Placeholder for the primary color region.
pub const PRIMARY_TOKEN: &str = "#473788";
/// Placeholder for the secondary color region.
pub const SECONDARY_TOKEN: &str = "#2C2255";
/// Placeholder for the accent color region.
pub const ACCENT_TOKEN: &str = "#F7941E";

/// A loaded icon template, ready to be rendered at any size.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    svg: String,
}

impl TemplateRenderer {
    /// Wraps template markup.
    pub fn new(svg: impl Into<String>) -> Self {
        Self { svg: svg.into() }
    }

    /// Loads the template from [`TEMPLATE_PATH`].
    pub fn load(resources: &dyn ResourceProvider) -> Result<Self> {
        let bytes = resources.read(TEMPLATE_PATH)?;
        Ok(Self::new(String::from_utf8_lossy(&bytes).into_owned()))
    }

    pub fn source(&self) -> &str {
        &self.svg
    }

    /// Returns the template markup with the three placeholders replaced.
    ///
    /// Placeholders match case-insensitively. Substitution is a single pass,
    /// so a replacement color that happens to equal another placeholder is
    /// not replaced again.
    pub fn substitute(
        &self,
        primary: ColorTriple,
        secondary: ColorTriple,
        accent: ColorTriple,
    ) -> String {
        replace_tokens(
            &self.svg,
            &[
                (PRIMARY_TOKEN, primary.to_hex()),
                (SECONDARY_TOKEN, secondary.to_hex()),
                (ACCENT_TOKEN, accent.to_hex()),
            ],
        )
    }

    /// Renders a `size_px x size_px` icon with the given colors.
    ///
    /// Failures are returned, not logged; the caller picks the fallback.
    pub fn render(
        &self,
        size_px: u32,
        primary: ColorTriple,
        secondary: ColorTriple,
        accent: ColorTriple,
    ) -> Result<image::RgbaImage> {
        let svg = self.substitute(primary, secondary, accent);
        rasterize_svg(&svg, size_px, size_px, &Options::default())
    }
}

/// Replaces every ASCII-case-insensitive occurrence of each token in one pass.
fn replace_tokens(source: &str, replacements: &[(&str, String)]) -> String {
    let mut result = String::with_capacity(source.len());
    let mut remaining = source;

    'scan: while let Some(ch) = remaining.chars().next() {
        for (token, value) in replacements {
            let head = &remaining.as_bytes()[..token.len().min(remaining.len())];
            if head.eq_ignore_ascii_case(token.as_bytes()) {
                result.push_str(value);
                // tokens are ASCII, so this stays on a char boundary
                remaining = &remaining[token.len()..];
                continue 'scan;
            }
        }
        result.push(ch);
        remaining = &remaining[ch.len_utf8()..];
    }

    result
}
