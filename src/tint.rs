use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TintParseError {
    #[error("colour must start with '#'")]
    MissingHash,
    #[error("colour must have 6 or 8 hex digits")]
    Length,
    #[error("colour contains a non-hex digit")]
    Digit,
}

/// sRGB colour applied to the status icon and count when notifications are pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconTint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for IconTint {
    // GitHub accent blue
    fn default() -> Self {
        Self {
            r: 0x09,
            g: 0x69,
            b: 0xDA,
            a: 0xFF,
        }
    }
}

impl IconTint {
    /// `#RRGGBB` when opaque, `#RRGGBBAA` otherwise.
    pub fn to_hex(self) -> String {
        if self.a == 0xFF {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    pub fn components(self) -> (f64, f64, f64, f64) {
        (
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
            f64::from(self.a) / 255.0,
        )
    }
}

impl fmt::Display for IconTint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for IconTint {
    type Err = TintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_prefix('#').ok_or(TintParseError::MissingHash)?;
        if digits.len() != 6 && digits.len() != 8 {
            return Err(TintParseError::Length);
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TintParseError::Digit);
        }

        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| TintParseError::Digit);
        Ok(Self {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: if digits.len() == 8 { byte(6)? } else { 0xFF },
        })
    }
}

fn blend(base: u8, over: u8, alpha: u16) -> u8 {
    let base = u16::from(base);
    let over = u16::from(over);
    ((over * alpha + base * (255 - alpha) + 127) / 255) as u8
}

/// Paints `tint` over every pixel of an RGBA buffer, keeping the pixel's own alpha.
///
/// Matches a "source-atop" fill: transparent pixels stay transparent and the tint's
/// alpha controls how much of the original colour shows through.
pub fn tint_rgba(pixels: &mut [u8], tint: IconTint) {
    let alpha = u16::from(tint.a);
    for px in pixels.chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        px[0] = blend(px[0], tint.r, alpha);
        px[1] = blend(px[1], tint.g, alpha);
        px[2] = blend(px[2], tint.b, alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_and_eight_digit_hex() {
        let tint: IconTint = "#ff8800".parse().unwrap();
        assert_eq!(tint, IconTint { r: 0xFF, g: 0x88, b: 0x00, a: 0xFF });

        let tint: IconTint = " #0969DA80 ".parse().unwrap();
        assert_eq!(tint.a, 0x80);
        assert_eq!(tint.to_hex(), "#0969DA80");
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!("0969DA".parse::<IconTint>(), Err(TintParseError::MissingHash));
        assert_eq!("#0969D".parse::<IconTint>(), Err(TintParseError::Length));
        assert_eq!("#0969DZ".parse::<IconTint>(), Err(TintParseError::Digit));
    }

    #[test]
    fn default_round_trips_through_hex() {
        let hex = IconTint::default().to_hex();
        assert_eq!(hex, "#0969DA");
        assert_eq!(hex.parse::<IconTint>().unwrap(), IconTint::default());
    }

    #[test]
    fn tint_rgba_preserves_alpha_and_skips_transparent_pixels() {
        let mut pixels = vec![0, 0, 0, 255, 10, 20, 30, 0, 255, 255, 255, 128];
        tint_rgba(&mut pixels, "#FF0000".parse().unwrap());
        assert_eq!(&pixels[0..4], &[255, 0, 0, 255]);
        assert_eq!(&pixels[4..8], &[10, 20, 30, 0]);
        assert_eq!(&pixels[8..12], &[255, 0, 0, 128]);
    }

    #[test]
    fn tint_rgba_blends_by_tint_alpha() {
        let mut pixels = vec![0, 0, 0, 255];
        tint_rgba(&mut pixels, "#FFFFFF00".parse().unwrap());
        assert_eq!(pixels, vec![0, 0, 0, 255]);

        let mut pixels = vec![0, 0, 0, 255];
        tint_rgba(&mut pixels, "#FFFFFF80".parse().unwrap());
        assert_eq!(pixels[0], 128);
    }

    #[test]
    fn components_are_unit_scaled() {
        let (r, g, b, a) = "#FF000080".parse::<IconTint>().unwrap().components();
        assert_eq!((r, g, b), (1.0, 0.0, 0.0));
        assert!((a - 128.0 / 255.0).abs() < f64::EPSILON);
    }
}
