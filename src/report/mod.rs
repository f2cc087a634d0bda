pub mod html;
pub mod json;
pub mod text;

use std::fmt::Write;

use crate::model::settings::DashboardSettings;

/// WCAG AA threshold for normal text.
pub const MIN_TEXT_CONTRAST: f64 = 4.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    /// Parses `#rrggbb` or `#rgb`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => Some(Self {
                r: u8::from_str_radix(&hex[0..2], 16).ok()?,
                g: u8::from_str_radix(&hex[2..4], 16).ok()?,
                b: u8::from_str_radix(&hex[4..6], 16).ok()?,
            }),
            3 => {
                let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Self {
                    r: nibble(0)?,
                    g: nibble(1)?,
                    b: nibble(2)?,
                })
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        let mut out = String::with_capacity(7);
        let _ = write!(out, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b);
        out
    }

    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }

    pub fn relative_luminance(self) -> f64 {
        fn channel(c: u8) -> f64 {
            let c = c as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }
}

pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = a.relative_luminance();
    let lb = b.relative_luminance();
    let (hi, lo) = if la >= lb { (la, lb) } else { (lb, la) };
    (hi + 0.05) / (lo + 0.05)
}

/// White on dark backgrounds, black otherwise.
pub fn text_color(background: Rgb) -> Rgb {
    if contrast_ratio(background, Rgb::WHITE) > MIN_TEXT_CONTRAST {
        Rgb::WHITE
    } else {
        Rgb::BLACK
    }
}

/// Diverging scale anchored at 0 over `[-max_abs, max_abs]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub negative: Rgb,
    pub midpoint: Rgb,
    pub positive: Rgb,
    pub max_abs: f64,
}

impl ColorScale {
    pub fn diverging(settings: &DashboardSettings, max_abs: f64) -> Self {
        Self {
            negative: Rgb::from_hex(&settings.negative_color).unwrap_or(Rgb {
                r: 0x00,
                g: 0x8a,
                b: 0xe5,
            }),
            midpoint: Rgb::from_hex(&settings.midpoint_color).unwrap_or(Rgb::WHITE),
            positive: Rgb::from_hex(&settings.positive_color).unwrap_or(Rgb {
                r: 0xe5,
                g: 0x00,
                b: 0x00,
            }),
            max_abs,
        }
    }

    pub fn color_for(&self, value: f64) -> Rgb {
        if self.max_abs.is_nan() || self.max_abs <= 0.0 || !value.is_finite() {
            return self.midpoint;
        }
        let t = (value / self.max_abs).clamp(-1.0, 1.0);
        if t < 0.0 {
            self.midpoint.lerp(self.negative, -t)
        } else {
            self.midpoint.lerp(self.positive, t)
        }
    }

    /// Plotly colorscale stops for `zmin..zmax`.
    pub fn stops(&self) -> [(f64, String); 3] {
        [
            (0.0, self.negative.to_hex()),
            (0.5, self.midpoint.to_hex()),
            (1.0, self.positive.to_hex()),
        ]
    }
}

/// Fixed precision without a signed zero.
pub fn format_value(v: f64, precision: usize) -> String {
    let s = format!("{:.*}", precision, v);
    if s.starts_with('-') && s[1..].chars().all(|c| c == '0' || c == '.') {
        s[1..].to_string()
    } else {
        s
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
