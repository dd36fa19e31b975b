//! Packed RGB colors.

use serde::{Deserialize, Serialize};

/// 8-bit RGB color, written as `0xRRGGBB` literals in the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::hex(0xFFFFFF);

    /// Build a color from a packed `0xRRGGBB` value.
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    /// Packed `0xRRGGBB` value.
    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Linear 0.0-1.0 channels, the form most renderers want.
    pub fn to_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_unpacks_channels() {
        let c = Rgb::hex(0x87CEEB);
        assert_eq!((c.r, c.g, c.b), (0x87, 0xCE, 0xEB));
        assert_eq!(c.to_hex(), 0x87CEEB);
    }

    #[test]
    fn test_display_formats_css_hex() {
        assert_eq!(Rgb::hex(0x8B4513).to_string(), "#8B4513");
        assert_eq!(Rgb::WHITE.to_string(), "#FFFFFF");
    }
}
