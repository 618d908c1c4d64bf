//! HSL color parsing and hex preview for token values.

use serde::Serialize;

/// An HSL color as written in a token value. Saturation and lightness are percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HslColor {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl HslColor {
    /// Parse an `hsl(...)` / `hsla(...)` value.
    ///
    /// Accepts space or comma separated components. Anything after an alpha
    /// separator (`\/` or `/`) is dropped.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if !value.get(..3)?.eq_ignore_ascii_case("hsl") {
            return None;
        }
        let open = value.find('(')?;
        let mut inner = &value[open + 1..];
        if let Some(close) = inner.find(')') {
            inner = &inner[..close];
        }
        if let Some(alpha) = inner.find(['\\', '/']) {
            inner = &inner[..alpha];
        }

        let mut parts = inner
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .map(parse_component);

        let hue = parts.next()??;
        let saturation = parts.next()??;
        let lightness = parts.next()??;
        Some(Self {
            hue,
            saturation,
            lightness,
        })
    }

    /// Convert to `(r, g, b)` channels.
    pub fn to_rgb(&self) -> (u8, u8, u8) {
        let hue = if self.hue.is_finite() {
            self.hue.rem_euclid(360.0)
        } else {
            0.0
        };
        let s = self.saturation.clamp(0.0, 100.0) / 100.0;
        let l = self.lightness.clamp(0.0, 100.0) / 100.0;

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let sector = hue / 60.0;
        let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
        let (r, g, b) = match sector as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        let (r, g, b) = self.to_rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

fn parse_component(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_end_matches('%').trim_end_matches("deg");
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// How a token value is presented next to its name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenPreview {
    Color { hex: String },
    Literal { text: String },
}

impl TokenPreview {
    /// The text shown as completion detail.
    pub fn detail(&self) -> &str {
        match self {
            TokenPreview::Color { hex } => hex,
            TokenPreview::Literal { text } => text,
        }
    }
}

/// Preview for a raw token value: hex for HSL colors, trimmed literal otherwise.
pub fn preview(value: &str) -> TokenPreview {
    let value = value.trim();
    if value.starts_with("hsl") {
        if let Some(color) = HslColor::parse(value) {
            return TokenPreview::Color {
                hex: color.to_hex(),
            };
        }
    }
    TokenPreview::Literal {
        text: strip_terminators(value).to_string(),
    }
}

/// Remove trailing `;` / `}` statement terminators and surrounding whitespace.
pub fn strip_terminators(value: &str) -> &str {
    value
        .trim()
        .trim_end_matches(|c: char| c == ';' || c == '}' || c.is_whitespace())
}
