//! Color and overlay-text value types.
//!
//! Colors are persisted as comma-joined decimal strings (`"71,55,136"`) and
//! substituted into the SVG template in hex form (`"#473788"`).

use std::fmt;
use std::str::FromStr;

use palette::Srgb;

// ============================================================================
// ColorTriple
// ============================================================================

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorTriple {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl ColorTriple {
    /// Default primary template color (`#473788`).
    pub const DEFAULT_PRIMARY: Self = Self::new(71, 55, 136);
    /// Default secondary template color (`#2C2255`).
    pub const DEFAULT_SECONDARY: Self = Self::new(44, 34, 85);
    /// Default accent template color (`#F7941E`).
    pub const DEFAULT_ACCENT: Self = Self::new(247, 148, 30);
    /// Default overlay text color.
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parses the persisted `"R,G,B"` form.
    ///
    /// Never fails: anything malformed resolves to [`Self::DEFAULT_PRIMARY`].
    pub fn parse(value: &str) -> Self {
        Self::parse_or(value, Self::DEFAULT_PRIMARY)
    }

    /// Parses the persisted `"R,G,B"` form, returning `default` when malformed.
    pub fn parse_or(value: &str, default: Self) -> Self {
        Self::try_parse(value).unwrap_or(default)
    }

    /// Strict variant of [`parse`](Self::parse).
    ///
    /// Requires exactly three integer components. Out-of-range integers are
    /// clamped to 0-255.
    pub fn try_parse(value: &str) -> Option<Self> {
        let mut parts = value.split(',');
        let (Some(r), Some(g), Some(b), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };

        let channel = |part: &str| -> Option<u8> {
            part.trim()
                .parse::<i64>()
                .ok()
                .map(|v| v.clamp(0, 255) as u8)
        };

        Some(Self::new(channel(r)?, channel(g)?, channel(b)?))
    }

    /// Parses a `#RRGGBB` (or `RRGGBB`, `#RGB`) hex color.
    pub fn from_hex(hex: &str) -> Option<Self> {
        Srgb::<u8>::from_str(hex.trim()).ok().map(Self::from)
    }

    /// Formats as uppercase `#RRGGBB`, the form substituted into the SVG template.
    pub fn to_hex(&self) -> String {
        format!("#{:X}", self.to_srgb())
    }

    pub fn to_srgb(&self) -> Srgb<u8> {
        Srgb::new(self.red, self.green, self.blue)
    }

    pub fn to_rgba(&self, alpha: u8) -> image::Rgba<u8> {
        image::Rgba([self.red, self.green, self.blue, alpha])
    }
}

impl From<Srgb<u8>> for ColorTriple {
    fn from(rgb: Srgb<u8>) -> Self {
        Self::new(rgb.red, rgb.green, rgb.blue)
    }
}

/// Formats the persisted `"R,G,B"` form.
impl fmt::Display for ColorTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.red, self.green, self.blue)
    }
}

// ============================================================================
// OverlaySpec
// ============================================================================

/// Short text drawn centered on the icon.
///
/// The text is normalized on construction: trimmed, uppercased and truncated
/// to [`MAX_TEXT_LEN`](Self::MAX_TEXT_LEN) characters. Empty text means no
/// overlay is drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlaySpec {
    text: String,
    color: ColorTriple,
    size_percent: u32,
}

impl OverlaySpec {
    pub const MAX_TEXT_LEN: usize = 4;
    pub const DEFAULT_SIZE_PERCENT: u32 = 33;
    pub const MIN_SIZE_PERCENT: u32 = 10;
    pub const MAX_SIZE_PERCENT: u32 = 100;
    /// Absolute lower bound for the overlay font height.
    pub const MIN_FONT_PX: u32 = 10;

    /// Creates an overlay spec. `size_percent` is clamped to 10-100.
    pub fn new(text: &str, color: ColorTriple, size_percent: i64) -> Self {
        Self {
            text: normalize_text(text),
            color,
            size_percent: size_percent.clamp(
                Self::MIN_SIZE_PERCENT as i64,
                Self::MAX_SIZE_PERCENT as i64,
            ) as u32,
        }
    }

    /// An overlay that draws nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> ColorTriple {
        self.color
    }

    pub fn size_percent(&self) -> u32 {
        self.size_percent
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Font pixel height for an icon `width_px` wide, never below 10px.
    pub fn font_height(&self, width_px: u32) -> u32 {
        (width_px * self.size_percent / 100).max(Self::MIN_FONT_PX)
    }
}

impl Default for OverlaySpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            color: ColorTriple::BLACK,
            size_percent: Self::DEFAULT_SIZE_PERCENT,
        }
    }
}

fn normalize_text(text: &str) -> String {
    let text: String = text
        .trim()
        .to_uppercase()
        .chars()
        .take(OverlaySpec::MAX_TEXT_LEN)
        .collect();
    // truncation can leave inner whitespace at the end
    text.trim_end().to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_then_parse_returns_same_color() {
        for color in [
            ColorTriple::DEFAULT_PRIMARY,
            ColorTriple::DEFAULT_SECONDARY,
            ColorTriple::new(0, 0, 0),
            ColorTriple::new(255, 255, 255),
            ColorTriple::new(1, 128, 254),
        ] {
            assert_eq!(ColorTriple::parse(&color.to_string()), color);
        }
    }

    #[test]
    fn malformed_strings_resolve_to_default() {
        for bad in ["", "1,2", "1,2,3,4", "a,b,c", "12,,3", "#473788", " , , "] {
            assert_eq!(ColorTriple::parse(bad), ColorTriple::DEFAULT_PRIMARY, "{bad:?}");
        }
    }

    #[test]
    fn parse_or_uses_given_default() {
        assert_eq!(
            ColorTriple::parse_or("garbage", ColorTriple::DEFAULT_ACCENT),
            ColorTriple::DEFAULT_ACCENT
        );
    }

    #[test]
    fn parse_tolerates_whitespace_and_clamps() {
        assert_eq!(ColorTriple::parse(" 10 , 20 ,30 "), ColorTriple::new(10, 20, 30));
        assert_eq!(ColorTriple::parse("300,-5,128"), ColorTriple::new(255, 0, 128));
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(ColorTriple::DEFAULT_PRIMARY.to_hex(), "#473788");
        assert_eq!(ColorTriple::DEFAULT_SECONDARY.to_hex(), "#2C2255");
        assert_eq!(ColorTriple::DEFAULT_ACCENT.to_hex(), "#F7941E");
        assert_eq!(ColorTriple::new(0, 10, 255).to_hex(), "#000AFF");
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(ColorTriple::from_hex("#f7941e"), Some(ColorTriple::DEFAULT_ACCENT));
        assert_eq!(ColorTriple::from_hex("2C2255"), Some(ColorTriple::DEFAULT_SECONDARY));
        assert_eq!(ColorTriple::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn overlay_text_is_normalized() {
        let spec = OverlaySpec::new("  dev  ", ColorTriple::BLACK, 33);
        assert_eq!(spec.text(), "DEV");

        let spec = OverlaySpec::new("production", ColorTriple::BLACK, 33);
        assert_eq!(spec.text(), "PROD");
        assert!(spec.text().chars().count() <= OverlaySpec::MAX_TEXT_LEN);
    }

    #[test]
    fn blank_overlay_text_is_empty() {
        assert!(OverlaySpec::new("   ", ColorTriple::BLACK, 33).is_empty());
        assert!(OverlaySpec::new("", ColorTriple::BLACK, 33).is_empty());
        assert!(OverlaySpec::none().is_empty());
    }

    #[test]
    fn size_percent_is_clamped() {
        assert_eq!(OverlaySpec::new("A", ColorTriple::BLACK, 0).size_percent(), 10);
        assert_eq!(OverlaySpec::new("A", ColorTriple::BLACK, 250).size_percent(), 100);
        assert_eq!(OverlaySpec::new("A", ColorTriple::BLACK, 50).size_percent(), 50);
    }

    #[test]
    fn font_height_follows_percentage() {
        let spec = OverlaySpec::new("DEV", ColorTriple::BLACK, 33);
        assert_eq!(spec.font_height(48), 15);
        assert_eq!(spec.font_height(128), 42);
    }

    #[test]
    fn font_height_has_floor() {
        let spec = OverlaySpec::new("DEV", ColorTriple::BLACK, 33);
        assert_eq!(spec.font_height(16), 10);
        assert_eq!(spec.font_height(24), 10);
    }

    #[test]
    fn truncated_overlay_text_has_no_trailing_space() {
        let spec = OverlaySpec::new("ab  cd", ColorTriple::BLACK, 33);
        assert_eq!(spec.text(), "AB");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn color_display_parses_back((r, g, b) in any::<(u8, u8, u8)>()) {
                let color = ColorTriple::new(r, g, b);
                prop_assert_eq!(ColorTriple::parse(&color.to_string()), color);
                prop_assert_eq!(ColorTriple::from_hex(&color.to_hex()), Some(color));
            }

            #[test]
            fn text_without_commas_is_default(value in "[^,]{0,20}") {
                prop_assert_eq!(ColorTriple::parse(&value), ColorTriple::DEFAULT_PRIMARY);
            }

            #[test]
            fn any_overlay_text_is_normalized(text in "[ a-zA-Z0-9\\t\\-éß]{0,12}") {
                let spec = OverlaySpec::new(&text, ColorTriple::BLACK, 33);
                let normalized = spec.text();

                prop_assert!(normalized.chars().count() <= OverlaySpec::MAX_TEXT_LEN);
                prop_assert_eq!(normalized.trim(), normalized);
                prop_assert_eq!(normalized.to_uppercase(), normalized);
                prop_assert_eq!(spec.is_empty(), text.trim().is_empty());

                let again = OverlaySpec::new(normalized, ColorTriple::BLACK, 33);
                prop_assert_eq!(again.text(), normalized);
            }
        }
    }
}
