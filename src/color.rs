//! Cell colors.
//!
//! A [`PixelColor`] keeps the exact text the user (or a layer file) supplied,
//! so layer dumps round-trip byte-for-byte, alongside the resolved opaque RGB
//! value used for drawing. Accepted forms:
//! - Hex: `#RGB`, `#RRGGBB`, `#RRRGGGBBB`, `#RRRRGGGGBBBB` (high bits kept)
//! - Named: the common Tk/X11 color names (`black`, `grey`, `light blue`, ...)
//!
//! There is no alpha channel; every cell is fully opaque.

use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("empty color string")]
    Empty,
    #[error("invalid hex color length {0}, expected 3, 6, 9 or 12 digits")]
    InvalidLength(usize),
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
    #[error("unknown color name '{0}'")]
    UnknownName(String),
}

/// An opaque cell color plus the text it was parsed from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PixelColor {
    text: String,
    rgba: Rgba<u8>,
}

impl PixelColor {
    pub fn parse(text: &str) -> Result<Self, ColorError> {
        let rgba = parse_color(text)?;
        Ok(Self { text: text.to_string(), rgba })
    }

    /// Build from 8-bit RGB, using `#rrggbb` as the stored text.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            text: format!("#{:02x}{:02x}{:02x}", r, g, b),
            rgba: Rgba([r, g, b, 255]),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn rgba(&self) -> Rgba<u8> {
        self.rgba
    }

    pub fn rgb(&self) -> [u8; 3] {
        [self.rgba[0], self.rgba[1], self.rgba[2]]
    }
}

impl Default for PixelColor {
    fn default() -> Self {
        Self { text: "black".to_string(), rgba: Rgba([0, 0, 0, 255]) }
    }
}

impl fmt::Display for PixelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<String> for PixelColor {
    type Error = ColorError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        let rgba = parse_color(&text)?;
        Ok(Self { text, rgba })
    }
}

impl From<PixelColor> for String {
    fn from(color: PixelColor) -> Self {
        color.text
    }
}

/// Resolve a color string to an opaque RGBA value.
pub fn parse_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ColorError::Empty);
    }
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex_color(hex);
    }
    parse_named_color(s)
}

/// `hex` excludes the leading '#'. Each component uses 1-4 digits; only the
/// top 8 bits of wider components are kept.
fn parse_hex_color(hex: &str) -> Result<Rgba<u8>, ColorError> {
    if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex(c));
    }
    let len = hex.len();
    let digits = match len {
        3 | 6 | 9 | 12 => len / 3,
        _ => return Err(ColorError::InvalidLength(len)),
    };

    let mut rgb = [0u8; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        let part = &hex[i * digits..(i + 1) * digits];
        let value = u16::from_str_radix(part, 16).map_err(|_| ColorError::InvalidLength(len))?;
        *channel = match digits {
            1 => (value as u8) * 17,
            2 => value as u8,
            3 => (value >> 4) as u8,
            _ => (value >> 8) as u8,
        };
    }
    Ok(Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

fn parse_named_color(name: &str) -> Result<Rgba<u8>, ColorError> {
    let key: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == key)
        .map(|(_, [r, g, b])| Rgba([*r, *g, *b, 255]))
        .ok_or_else(|| ColorError::UnknownName(name.to_string()))
}

// X11 values, which is what Tk resolves names to (note grey/green/maroon/purple
// differ from CSS).
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("grey", [190, 190, 190]),
    ("gray", [190, 190, 190]),
    ("lightgrey", [211, 211, 211]),
    ("lightgray", [211, 211, 211]),
    ("darkgrey", [169, 169, 169]),
    ("darkgray", [169, 169, 169]),
    ("dimgrey", [105, 105, 105]),
    ("dimgray", [105, 105, 105]),
    ("orange", [255, 165, 0]),
    ("purple", [160, 32, 240]),
    ("pink", [255, 192, 203]),
    ("brown", [165, 42, 42]),
    ("navy", [0, 0, 128]),
    ("maroon", [176, 48, 96]),
    ("gold", [255, 215, 0]),
    ("violet", [238, 130, 238]),
    ("lightblue", [173, 216, 230]),
    ("skyblue", [135, 206, 235]),
    ("darkgreen", [0, 100, 0]),
    ("forestgreen", [34, 139, 34]),
    ("darkblue", [0, 0, 139]),
    ("darkred", [139, 0, 0]),
    ("salmon", [250, 128, 114]),
    ("tan", [210, 180, 140]),
    ("beige", [245, 245, 220]),
    ("turquoise", [64, 224, 208]),
];
