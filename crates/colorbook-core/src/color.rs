//! RGBA color values and tolerance matching.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default fill tolerance.
///
/// Source line art is anti-aliased, so edge pixels are partially transparent
/// blends of ink and paper. A tolerance of 60 lets a fill swallow that fringe
/// instead of stopping one pixel short of every line.
pub const DEFAULT_TOLERANCE: u32 = 60;

/// Largest meaningful tolerance: the distance between transparent black and
/// opaque white, rounded up.
pub const MAX_TOLERANCE: u32 = 510;

/// Error parsing a hex color string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("Invalid hex color length in {0:?} (expected 3 or 6 digits)")]
    InvalidLength(String),
    #[error("Invalid hex digit in {0:?}")]
    InvalidDigit(String),
}

/// A device RGBA color, one raw byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a fully opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Same color with alpha forced to 255.
    pub const fn to_opaque(self) -> Self {
        Self::opaque(self.r, self.g, self.b)
    }

    /// Parse `#rrggbb`, `#rgb` or the same without the leading `#`.
    ///
    /// The result is always opaque.
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError::InvalidDigit(s.to_string()));
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(ColorParseError::InvalidLength(s.to_string())),
        };

        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| ColorParseError::InvalidDigit(s.to_string()))
        };

        Ok(Self::opaque(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Render as `#rrggbb` (alpha is dropped).
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Squared Euclidean distance over all four channels.
    pub fn distance_sq(&self, other: &Rgba) -> u32 {
        let d = |a: u8, b: u8| {
            let diff = a as i32 - b as i32;
            (diff * diff) as u32
        };
        d(self.r, other.r) + d(self.g, other.g) + d(self.b, other.b) + d(self.a, other.a)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_slice(px: &[u8]) -> Self {
        Self::new(px[0], px[1], px[2], px[3])
    }
}

impl From<[u8; 3]> for Rgba {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::opaque(r, g, b)
    }
}

impl From<(u8, u8, u8)> for Rgba {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::opaque(r, g, b)
    }
}

impl From<[u8; 4]> for Rgba {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Whether two colors are equal within `tolerance` (Euclidean RGBA distance).
pub fn colors_match(a: Rgba, b: Rgba, tolerance: u32) -> bool {
    u64::from(a.distance_sq(&b)) <= u64::from(tolerance) * u64::from(tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_hex() {
        assert_eq!(Rgba::from_hex("#ff8000").unwrap(), Rgba::opaque(255, 128, 0));
        assert_eq!(Rgba::from_hex("00FF00").unwrap(), Rgba::opaque(0, 255, 0));
    }

    #[test]
    fn test_parse_short_hex() {
        assert_eq!(Rgba::from_hex("#f00").unwrap(), Rgba::opaque(255, 0, 0));
        assert_eq!("#abc".parse::<Rgba>().unwrap(), Rgba::opaque(0xaa, 0xbb, 0xcc));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(Rgba::from_hex("#ff00"), Err(ColorParseError::InvalidLength(_))));
        assert!(matches!(Rgba::from_hex("#gg0000"), Err(ColorParseError::InvalidDigit(_))));
        assert!(matches!(Rgba::from_hex(""), Err(ColorParseError::InvalidLength(_))));
    }

    #[test]
    fn test_triple_is_opaque() {
        let c: Rgba = [10, 20, 30].into();
        assert_eq!(c.a, 255);
        assert_eq!(c.to_hex(), "#0a141e");
    }

    #[test]
    fn test_colors_match_reflexive_and_symmetric() {
        let samples = [
            Rgba::TRANSPARENT,
            Rgba::WHITE,
            Rgba::new(12, 200, 40, 128),
            Rgba::new(255, 0, 255, 3),
        ];
        for a in samples {
            assert!(colors_match(a, a, DEFAULT_TOLERANCE));
            for b in samples {
                assert_eq!(
                    colors_match(a, b, DEFAULT_TOLERANCE),
                    colors_match(b, a, DEFAULT_TOLERANCE)
                );
            }
        }
    }

    #[test]
    fn test_colors_match_tolerance_boundary() {
        let base = Rgba::opaque(100, 100, 100);
        // 60 on a single channel is exactly on the boundary.
        assert!(colors_match(base, Rgba::opaque(160, 100, 100), DEFAULT_TOLERANCE));
        assert!(!colors_match(base, Rgba::opaque(161, 100, 100), DEFAULT_TOLERANCE));
        // Alpha counts too.
        assert!(!colors_match(base, Rgba::new(100, 100, 100, 0), DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_colors_match_huge_tolerance_does_not_overflow() {
        assert!(colors_match(Rgba::TRANSPARENT, Rgba::WHITE, MAX_TOLERANCE));
        assert!(colors_match(Rgba::TRANSPARENT, Rgba::WHITE, 70_000));
        assert!(colors_match(Rgba::TRANSPARENT, Rgba::WHITE, u32::MAX));
    }
}
