//! Annotation color handling shared by settings and the CLI.

use serde::{Deserialize, Serialize};

/// Simple RGBA color stored in 8-bit channels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RgbaColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl RgbaColor {
    /// Constructs an opaque RGB color.
    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 255,
        }
    }

    /// Converts into the `image` crate pixel type.
    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.red, self.green, self.blue, self.alpha])
    }

    /// Formats the color as `#RRGGBBAA`.
    pub fn to_hex(self) -> String {
        format!(
            "#{:02X}{:02X}{:02X}{:02X}",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

impl Default for RgbaColor {
    fn default() -> Self {
        // Matches the red used for detection overlays.
        Self::opaque(255, 0, 0)
    }
}

impl std::str::FromStr for RgbaColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_color(s).ok_or_else(|| {
            format!("invalid color '{s}'; expected #RGB, #RRGGBB or #RRGGBBAA")
        })
    }
}

/// Parse a hexadecimal color string. Accepts `#RGB`, `#RRGGBB`, `#RRGGBBAA`, with or without `#`.
pub fn parse_hex_color(input: &str) -> Option<RgbaColor> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let hex = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .unwrap_or(trimmed);
    match hex.len() {
        3 => Some(RgbaColor::opaque(
            replicate_nibble(hex.get(0..1)?)?,
            replicate_nibble(hex.get(1..2)?)?,
            replicate_nibble(hex.get(2..3)?)?,
        )),
        6 => Some(RgbaColor::opaque(
            parse_byte(hex.get(0..2)?)?,
            parse_byte(hex.get(2..4)?)?,
            parse_byte(hex.get(4..6)?)?,
        )),
        8 => Some(RgbaColor {
            red: parse_byte(hex.get(0..2)?)?,
            green: parse_byte(hex.get(2..4)?)?,
            blue: parse_byte(hex.get(4..6)?)?,
            alpha: parse_byte(hex.get(6..8)?)?,
        }),
        _ => None,
    }
}

fn parse_byte(slice: &str) -> Option<u8> {
    u8::from_str_radix(slice, 16).ok()
}

fn replicate_nibble(slice: &str) -> Option<u8> {
    let nib = u8::from_str_radix(slice, 16).ok()?;
    Some((nib << 4) | nib)
}
