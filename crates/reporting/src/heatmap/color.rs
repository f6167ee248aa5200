use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn hex(v: u32) -> Self {
        Self::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    pub fn lerp(a: Color, b: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: u8, y: u8| (f64::from(x) * (1.0 - t) + f64::from(y) * t).round() as u8;
        Color::rgb(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
    }

    /// WCAG relative luminance in [0, 1].
    pub fn luminance(&self) -> f64 {
        let channel = |c: u8| {
            let c = f64::from(c) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }

    /// Annotation color readable on top of this fill.
    pub fn contrasting_text(&self) -> Color {
        if self.luminance() > 0.408 {
            Color::BLACK
        } else {
            Color::WHITE
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// ColorBrewer YlGnBu, 9 classes.
const YLGNBU: [Color; 9] = [
    Color::hex(0xffffd9),
    Color::hex(0xedf8b1),
    Color::hex(0xc7e9b4),
    Color::hex(0x7fcdbb),
    Color::hex(0x41b6c4),
    Color::hex(0x1d91c0),
    Color::hex(0x225ea8),
    Color::hex(0x253494),
    Color::hex(0x081d58),
];

/// Sequential yellow → green → blue map over [0, 1].
pub fn ylgnbu(t: f64) -> Color {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (YLGNBU.len() - 1) as f64;
    let lo = (scaled.floor() as usize).min(YLGNBU.len() - 2);
    Color::lerp(YLGNBU[lo], YLGNBU[lo + 1], scaled - lo as f64)
}

/// Linear value → color scale shared by every cell of one heatmap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn color(&self, value: f64) -> Color {
        let span = self.max - self.min;
        if span <= 0.0 {
            return ylgnbu(0.0);
        }
        ylgnbu((value - self.min) / span)
    }
}
