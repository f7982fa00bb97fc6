//! CSS-style color parsing and premultiplied-alpha color values.
//!
//! Colors are stored premultiplied: `r`, `g`, `b` are already scaled by
//! `a`. This is what makes linear interpolation between two colors (used by
//! exponential curves, see `crate::curve`) correct without a separate
//! unpremultiply/premultiply round trip at every mix.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    /// Builds a premultiplied color from straight (non-premultiplied)
    /// 0-255 channel values and an alpha in `[0, 1]`.
    pub fn from_rgba(r: u8, g: u8, b: u8, a: f64) -> Color {
        let a = a.clamp(0.0, 1.0);
        Color {
            r: (r as f64 / 255.0) * a,
            g: (g as f64 / 255.0) * a,
            b: (b as f64 / 255.0) * a,
            a,
        }
    }

    pub fn black() -> Color {
        Color::from_rgba(0, 0, 0, 1.0)
    }

    /// Parses a CSS Color Module Level 3 color string: hex forms
    /// (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`), `rgb()`/`rgba()`
    /// functional notation, or one of a small set of named colors.
    pub fn parse(input: &str) -> Option<Color> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return Color::parse_hex(hex);
        }
        if let Some(inner) = s.strip_prefix("rgba(").and_then(|r| r.strip_suffix(')')) {
            return Color::parse_rgb_function(inner, true);
        }
        if let Some(inner) = s.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
            return Color::parse_rgb_function(inner, false);
        }
        Color::parse_named(s)
    }

    fn parse_hex(hex: &str) -> Option<Color> {
        let expand = |c: char| -> Option<u8> {
            let d = c.to_digit(16)? as u8;
            Some(d * 16 + d)
        };
        match hex.len() {
            3 => {
                let mut chars = hex.chars();
                let r = expand(chars.next()?)?;
                let g = expand(chars.next()?)?;
                let b = expand(chars.next()?)?;
                Some(Color::from_rgba(r, g, b, 1.0))
            }
            4 => {
                let mut chars = hex.chars();
                let r = expand(chars.next()?)?;
                let g = expand(chars.next()?)?;
                let b = expand(chars.next()?)?;
                let a = expand(chars.next()?)?;
                Some(Color::from_rgba(r, g, b, a as f64 / 255.0))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Color::from_rgba(r, g, b, 1.0))
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Color::from_rgba(r, g, b, a as f64 / 255.0))
            }
            _ => None,
        }
    }

    fn parse_rgb_function(inner: &str, has_alpha: bool) -> Option<Color> {
        let parts: Vec<&str> = inner.split(',').map(|p| p.trim()).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return None;
        }
        let channel = |s: &str| -> Option<u8> {
            let n: f64 = s.trim_end_matches('%').parse().ok()?;
            Some(n.clamp(0.0, 255.0) as u8)
        };
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = if has_alpha {
            parts[3].parse::<f64>().ok()?
        } else {
            1.0
        };
        Some(Color::from_rgba(r, g, b, a))
    }

    fn parse_named(s: &str) -> Option<Color> {
        let (r, g, b) = match s {
            "black" => (0, 0, 0),
            "white" => (255, 255, 255),
            "red" => (255, 0, 0),
            "green" => (0, 128, 0),
            "blue" => (0, 0, 255),
            "yellow" => (255, 255, 0),
            "gray" | "grey" => (128, 128, 128),
            "orange" => (255, 165, 0),
            "purple" => (128, 0, 128),
            "transparent" => return Some(Color::from_rgba(0, 0, 0, 0.0)),
            _ => return None,
        };
        Some(Color::from_rgba(r, g, b, 1.0))
    }

    /// Linear interpolation between two premultiplied colors, per channel.
    pub fn mix(a: &Color, b: &Color, t: f64) -> Color {
        Color {
            r: a.r + (b.r - a.r) * t,
            g: a.g + (b.g - a.g) * t,
            b: a.b + (b.b - a.b) * t,
            a: a.a + (b.a - a.a) * t,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b) = if self.a > 0.0 {
            (
                (self.r / self.a * 255.0).round() as i64,
                (self.g / self.a * 255.0).round() as i64,
                (self.b / self.a * 255.0).round() as i64,
            )
        } else {
            (0, 0, 0)
        };
        write!(f, "rgba({r},{g},{b},{})", self.a)
    }
}
