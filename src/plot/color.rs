//! Colors used to distinguish sample groups.

use std::fmt;
use std::str::FromStr;

use crate::errors::Error;

/// The default palette, assigned to groups in order.
pub const DEFAULT_PALETTE: [Rgb; 12] = [
    Rgb(0xa6, 0xce, 0xe3),
    Rgb(0x1f, 0x78, 0xb4),
    Rgb(0xb2, 0xdf, 0x8a),
    Rgb(0x33, 0xa0, 0x2c),
    Rgb(0xfb, 0x9a, 0x99),
    Rgb(0xe3, 0x1a, 0x1c),
    Rgb(0xfd, 0xbf, 0x6f),
    Rgb(0xff, 0x7f, 0x00),
    Rgb(0xca, 0xb2, 0xd6),
    Rgb(0x6a, 0x3d, 0x9a),
    Rgb(0xff, 0xff, 0x99),
    Rgb(0xb1, 0x59, 0x28),
];

/// Basic color names accepted in place of a hex literal.
const NAMED_COLORS: [(&str, Rgb); 12] = [
    ("black", Rgb(0, 0, 0)),
    ("white", Rgb(255, 255, 255)),
    ("red", Rgb(255, 0, 0)),
    ("green", Rgb(0, 128, 0)),
    ("blue", Rgb(0, 0, 255)),
    ("orange", Rgb(255, 165, 0)),
    ("purple", Rgb(128, 0, 128)),
    ("gray", Rgb(128, 128, 128)),
    ("grey", Rgb(128, 128, 128)),
    ("brown", Rgb(165, 42, 42)),
    ("pink", Rgb(255, 192, 203)),
    ("navy", Rgb(0, 0, 128)),
];

/// An opaque RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// A CSS `rgba(...)` string for this color at the given opacity.
    pub fn to_css_rgba(self, alpha: f64) -> String {
        format!("rgba({}, {}, {}, {})", self.0, self.1, self.2, alpha)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidColor(s.to_string());
        let literal = s.trim();

        if let Some(hex) = literal.strip_prefix('#') {
            if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(invalid());
            }

            let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
            return match hex.len() {
                6 => Ok(Rgb(
                    channel(&hex[0..2])?,
                    channel(&hex[2..4])?,
                    channel(&hex[4..6])?,
                )),
                3 => {
                    let doubled = hex.chars().flat_map(|c| [c, c]).collect::<String>();
                    Ok(Rgb(
                        channel(&doubled[0..2])?,
                        channel(&doubled[2..4])?,
                        channel(&doubled[4..6])?,
                    ))
                }
                _ => Err(invalid()),
            };
        }

        NAMED_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(literal))
            .map(|(_, rgb)| *rgb)
            .ok_or_else(invalid)
    }
}

/// The default palette as an owned list.
pub fn default_palette() -> Vec<Rgb> {
    DEFAULT_PALETTE.to_vec()
}
