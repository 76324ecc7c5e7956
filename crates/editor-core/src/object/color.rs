use serde::{Deserialize, Serialize};

/// 24-bit RGB color stored as `0xRRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const RED: Color = Color(0xff0000);
    pub const GREEN: Color = Color(0x00ff00);
    pub const BLUE: Color = Color(0x0000ff);

    pub const fn from_hex(hex: u32) -> Self {
        Self(hex & 0xffffff)
    }

    pub const fn hex(&self) -> u32 {
        self.0
    }

    /// Normalized RGB channels
    pub fn to_rgb(&self) -> [f32; 3] {
        [
            ((self.0 >> 16) & 0xff) as f32 / 255.0,
            ((self.0 >> 8) & 0xff) as f32 / 255.0,
            (self.0 & 0xff) as f32 / 255.0,
        ]
    }

    /// Normalized RGBA channels with the given opacity
    pub fn to_rgba(&self, opacity: f32) -> [f32; 4] {
        let [r, g, b] = self.to_rgb();
        [r, g, b, opacity]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_rgb() {
        assert_eq!(Color::from_hex(0xff0000).to_rgb(), [1.0, 0.0, 0.0]);
        let [r, g, b] = Color::from_hex(0x00aaff).to_rgb();
        assert_eq!(r, 0.0);
        assert!((g - 170.0 / 255.0).abs() < 1e-6);
        assert_eq!(b, 1.0);
    }

    #[test]
    fn test_from_hex_masks_alpha() {
        assert_eq!(Color::from_hex(0x12ffffff).hex(), 0xffffff);
    }
}
