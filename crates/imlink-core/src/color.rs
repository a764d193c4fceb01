//! Pastel swatch colors for links.
//!
//! Any color the user picks is mapped onto one pastel family: the hue is
//! kept, saturation and lightness are pinned. Borders and text use a
//! darker derivative of the same HSL string.

use lazy_static::lazy_static;
use regex::Regex;

/// Saturation (percent) every pastelized color is pinned to.
pub const PASTEL_SATURATION: u32 = 85;

/// Lightness (percent) every pastelized color is pinned to.
pub const PASTEL_LIGHTNESS: u32 = 75;

/// Returned by [`darker_color`] when the input is not an `hsl(...)` string.
pub const FALLBACK_GRAY: &str = "hsl(0, 0%, 50%)";

pub const DEFAULT_DARKNESS_FACTOR: f64 = 0.5;

/// Color picker default before the user chooses one.
pub const DEFAULT_LINK_COLOR: &str = "#6366f1";

lazy_static! {
    static ref HSL_PATTERN: Regex =
        Regex::new(r"hsl\((\d+),\s*([\d.]+)%,\s*([\d.]+)%\)").expect("valid hsl pattern");
}

/// Error for color strings that cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("Invalid hex color: {0:?} (expected #RRGGBB)")]
    InvalidHex(String),
}

/// Parse `#RRGGBB` into its channels.
pub fn parse_hex(hex: &str) -> Result<(u8, u8, u8), ColorError> {
    let invalid = || ColorError::InvalidHex(hex.to_string());
    let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
    Ok((channel(0)?, channel(2)?, channel(4)?))
}

/// Hue in whole degrees (0..360) of an RGB color. Grays have hue 0.
pub fn hue_of(r: u8, g: u8, b: u8) -> u32 {
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == min {
        return 0;
    }

    let d = max - min;
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    ((h * 60.0).round() as u32) % 360
}

/// Map a `#RRGGBB` color onto the pastel family, keeping only its hue.
///
/// ```
/// assert_eq!(imlink_core::pastelize("#ff0000").unwrap(), "hsl(0, 85%, 75%)");
/// ```
pub fn pastelize(hex: &str) -> Result<String, ColorError> {
    let (r, g, b) = parse_hex(hex)?;
    Ok(format!(
        "hsl({}, {}%, {}%)",
        hue_of(r, g, b),
        PASTEL_SATURATION,
        PASTEL_LIGHTNESS
    ))
}

/// Scale the lightness of an `hsl(h, s%, l%)` string by `factor`.
///
/// Lightness never drops below 0. The hue is passed through as written.
/// Strings that don't match the format, or whose hue doesn't fit in a
/// `u64`, yield [`FALLBACK_GRAY`].
pub fn darker_color(hsl: &str, factor: f64) -> String {
    let Some(caps) = HSL_PATTERN.captures(hsl) else {
        return FALLBACK_GRAY.to_string();
    };

    let parsed = (
        caps[1].parse::<u64>(),
        caps[2].parse::<f64>(),
        caps[3].parse::<f64>(),
    );
    let (Ok(h), Ok(s), Ok(l)) = parsed else {
        return FALLBACK_GRAY.to_string();
    };

    let mut l = (l * factor).max(0.0);
    if l == 0.0 {
        // normalize -0
        l = 0.0;
    }
    format!("hsl({}, {}%, {}%)", h, s, l)
}
