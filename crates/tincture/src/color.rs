//! Color literal validation and conversion.
//!
//! Five textual syntaxes are understood:
//! - hex: `#3b82f6`, `#fff`
//! - `rgb(59, 130, 246)` and `rgba(59, 130, 246, 0.5)`
//! - `hsl(217, 91%, 60%)` and `hsla(217, 91%, 60%, 0.5)`
//! - a fixed set of named colors and CSS keywords (`transparent`, `currentColor`, ...)
//!
//! Function syntaxes accept both the comma form and the space form
//! (`hsl(217 91% 60%)`, `rgb(59 130 246 / 0.5)`). Channel ranges are checked:
//! rgb channels must be within 0-255, saturation and lightness within 0-100%,
//! hue within 0-360 and alpha within 0-1.
//!
//! # Example
//!
//! ```rust
//! use tincture::color::{color_to_hsl_variable, is_valid_color};
//!
//! assert!(is_valid_color("#3B82F6"));
//! assert!(!is_valid_color("rgb(999, 0, 0)"));
//! assert_eq!(color_to_hsl_variable("#3B82F6").unwrap(), "217 91% 60%");
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(rgba?|hsla?)\(\s*([^()]*?)\s*\)$").expect("color function regex")
});

static COMPONENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?|\.\d+)(%?)$").expect("color component regex"));

static HEX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^#(?:[0-9a-f]{3}|[0-9a-f]{6})$").expect("hex color regex")
});

/// Named colors with a static value.
const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("white", "#ffffff"),
    ("red", "#ff0000"),
    ("green", "#008000"),
    ("blue", "#0000ff"),
    ("yellow", "#ffff00"),
    ("cyan", "#00ffff"),
    ("aqua", "#00ffff"),
    ("magenta", "#ff00ff"),
    ("fuchsia", "#ff00ff"),
    ("gray", "#808080"),
    ("grey", "#808080"),
    ("orange", "#ffa500"),
    ("purple", "#800080"),
    ("pink", "#ffc0cb"),
    ("brown", "#a52a2a"),
    ("navy", "#000080"),
    ("teal", "#008080"),
    ("lime", "#00ff00"),
    ("maroon", "#800000"),
    ("olive", "#808000"),
    ("silver", "#c0c0c0"),
];

/// CSS keywords accepted as colors that resolve at render time.
const COLOR_KEYWORDS: &[&str] = &["currentcolor", "inherit", "initial", "unset"];

/// The syntax a color literal is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSyntax {
    Hex,
    Rgb,
    Rgba,
    Hsl,
    Hsla,
    Named,
}

impl fmt::Display for ColorSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorSyntax::Hex => "hex",
            ColorSyntax::Rgb => "rgb",
            ColorSyntax::Rgba => "rgba",
            ColorSyntax::Hsl => "hsl",
            ColorSyntax::Hsla => "hsla",
            ColorSyntax::Named => "named",
        };
        f.write_str(name)
    }
}

/// Hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub const fn new(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l }
    }

    /// Components rounded to whole numbers, with a hue of 360 wrapped to 0.
    pub fn rounded(&self) -> (i64, i64, i64) {
        let mut h = self.h.round() as i64;
        if h >= 360 {
            h -= 360;
        }
        (h, self.s.round() as i64, self.l.round() as i64)
    }

    /// Formats as a style-variable triplet, `H S% L%`.
    pub fn to_variable(&self) -> String {
        let (h, s, l) = self.rounded();
        format!("{h} {s}% {l}%")
    }

    /// Formats as an `hsl(H S% L%)` literal.
    pub fn to_css(&self) -> String {
        format!("hsl({})", self.to_variable())
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Error converting a color literal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("Invalid color value '{0}'")]
    Invalid(String),
    #[error("Invalid hex color '{0}'")]
    InvalidHex(String),
    #[error("Color '{0}' has no static value")]
    NoStaticValue(String),
}

/// A color literal broken into its components.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ParsedColor {
    Rgb {
        r: f64,
        g: f64,
        b: f64,
        alpha: Option<f64>,
    },
    Hsl {
        h: f64,
        s: f64,
        l: f64,
        alpha: Option<f64>,
    },
    Named(&'static str),
    Transparent,
    Keyword,
}

fn parse_color(input: &str) -> Option<(ColorSyntax, ParsedColor)> {
    let raw = input.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.starts_with('#') {
        if !HEX_RE.is_match(raw) {
            return None;
        }
        let (r, g, b) = parse_hex(raw)?;
        let color = ParsedColor::Rgb {
            r: f64::from(r),
            g: f64::from(g),
            b: f64::from(b),
            alpha: None,
        };
        return Some((ColorSyntax::Hex, color));
    }

    if let Some(caps) = FUNCTION_RE.captures(raw) {
        let function = caps[1].to_ascii_lowercase();
        let (components, alpha) = split_components(&caps[2])?;
        return match function.as_str() {
            "rgb" if alpha.is_none() => parse_rgb(&components, None).map(|c| (ColorSyntax::Rgb, c)),
            "rgba" => {
                let alpha = parse_alpha(alpha?)?;
                parse_rgb(&components, Some(alpha)).map(|c| (ColorSyntax::Rgba, c))
            }
            "hsl" if alpha.is_none() => parse_hsl(&components, None).map(|c| (ColorSyntax::Hsl, c)),
            "hsla" => {
                let alpha = parse_alpha(alpha?)?;
                parse_hsl(&components, Some(alpha)).map(|c| (ColorSyntax::Hsla, c))
            }
            _ => None,
        };
    }

    let lower = raw.to_ascii_lowercase();
    if lower == "transparent" {
        return Some((ColorSyntax::Named, ParsedColor::Transparent));
    }
    if COLOR_KEYWORDS.contains(&lower.as_str()) {
        return Some((ColorSyntax::Named, ParsedColor::Keyword));
    }
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, hex)| (ColorSyntax::Named, ParsedColor::Named(hex)))
}

/// Splits function arguments into the three color components and an optional alpha.
///
/// Comma form puts alpha in the fourth slot; space form puts it after a `/`.
fn split_components(args: &str) -> Option<(Vec<&str>, Option<&str>)> {
    if args.contains(',') {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        return match parts.len() {
            3 => Some((parts, None)),
            4 => Some((parts[..3].to_vec(), Some(parts[3]))),
            _ => None,
        };
    }

    let (channels, alpha) = match args.split_once('/') {
        Some((channels, alpha)) => (channels, Some(alpha.trim())),
        None => (args, None),
    };
    let parts: Vec<&str> = channels.split_whitespace().collect();
    (parts.len() == 3).then_some((parts, alpha))
}

/// Parses a numeric component, returning its value and whether it had a `%`.
fn parse_component(text: &str) -> Option<(f64, bool)> {
    let caps = COMPONENT_RE.captures(text)?;
    let value = caps[1].parse::<f64>().ok()?;
    Some((value, !caps[2].is_empty()))
}

fn parse_alpha(text: &str) -> Option<f64> {
    match parse_component(text)? {
        (value, false) if (0.0..=1.0).contains(&value) => Some(value),
        _ => None,
    }
}

fn parse_rgb(components: &[&str], alpha: Option<f64>) -> Option<ParsedColor> {
    let mut channels = [0.0; 3];
    for (slot, text) in channels.iter_mut().zip(components) {
        match parse_component(text)? {
            (value, false) if value <= 255.0 => *slot = value,
            _ => return None,
        }
    }
    let [r, g, b] = channels;
    Some(ParsedColor::Rgb { r, g, b, alpha })
}

fn parse_hsl(components: &[&str], alpha: Option<f64>) -> Option<ParsedColor> {
    let h = match parse_component(components[0])? {
        (value, false) if value <= 360.0 => value,
        _ => return None,
    };
    let s = match parse_component(components[1])? {
        (value, true) if value <= 100.0 => value,
        _ => return None,
    };
    let l = match parse_component(components[2])? {
        (value, true) if value <= 100.0 => value,
        _ => return None,
    };
    Some(ParsedColor::Hsl { h, s, l, alpha })
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let s = hex.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }
    match s.len() {
        6 => {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some((r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Returns true if `color` is a valid literal in one of the supported syntaxes.
pub fn is_valid_color(color: &str) -> bool {
    parse_color(color).is_some()
}

/// Returns the syntax of a valid color literal.
pub fn color_syntax(color: &str) -> Option<ColorSyntax> {
    parse_color(color).map(|(syntax, _)| syntax)
}

#[allow(clippy::many_single_char_names)]
fn hsl_from_channels(r: u8, g: u8, b: u8) -> Hsl {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < f64::EPSILON {
        return Hsl::new(0.0, 0.0, l * 100.0);
    }

    let diff = max - min;
    let s = if l > 0.5 {
        diff / (2.0 - max - min)
    } else {
        diff / (max + min)
    };

    let mut h = if (max - r).abs() < f64::EPSILON {
        (g - b) / diff + if g < b { 6.0 } else { 0.0 }
    } else if (max - g).abs() < f64::EPSILON {
        (b - r) / diff + 2.0
    } else {
        (r - g) / diff + 4.0
    };

    h /= 6.0;
    Hsl::new(h * 360.0, s * 100.0, l * 100.0)
}

/// Converts a 3 or 6 digit hex color (leading `#` optional) to HSL.
///
/// # Errors
/// Returns `ColorError::InvalidHex` if the string is not a hex color.
pub fn hex_to_hsl(hex: &str) -> Result<Hsl, ColorError> {
    let (r, g, b) = parse_hex(hex).ok_or_else(|| ColorError::InvalidHex(hex.to_string()))?;
    Ok(hsl_from_channels(r, g, b))
}

/// Converts an RGB triplet to HSL through its hex encoding.
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> Hsl {
    let hex = format!("#{r:02x}{g:02x}{b:02x}");
    hex_to_hsl(&hex).unwrap_or_else(|_| hsl_from_channels(r, g, b))
}

/// Converts HSL (degrees, percent, percent) to an RGB triplet.
#[allow(clippy::many_single_char_names, clippy::suboptimal_flops)]
pub fn hsl_to_rgb(hsl: Hsl) -> (u8, u8, u8) {
    let h = hsl.h.rem_euclid(360.0) / 360.0;
    let s = (hsl.s / 100.0).clamp(0.0, 1.0);
    let l = (hsl.l / 100.0).clamp(0.0, 1.0);

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

/// Converts HSL to a `#rrggbb` string.
pub fn hsl_to_hex(hsl: Hsl) -> String {
    let (r, g, b) = hsl_to_rgb(hsl);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Normalizes any color with a static value to `#rrggbb`. Alpha is dropped.
///
/// # Errors
/// Returns `ColorError::Invalid` for invalid literals and
/// `ColorError::NoStaticValue` for `transparent` and render-time keywords.
pub fn to_hex(color: &str) -> Result<String, ColorError> {
    let (_, parsed) = parse_color(color).ok_or_else(|| ColorError::Invalid(color.to_string()))?;
    match parsed {
        ParsedColor::Rgb { r, g, b, .. } => Ok(format!(
            "#{:02x}{:02x}{:02x}",
            r.round() as u8,
            g.round() as u8,
            b.round() as u8
        )),
        ParsedColor::Hsl { h, s, l, .. } => Ok(hsl_to_hex(Hsl::new(h, s, l))),
        ParsedColor::Named(hex) => Ok(hex.to_string()),
        ParsedColor::Transparent | ParsedColor::Keyword => {
            Err(ColorError::NoStaticValue(color.trim().to_string()))
        }
    }
}

/// Decomposes any color with a static value into HSL.
///
/// HSL literals keep their exact components; every other syntax is first
/// normalized to hex and converted with [`hex_to_hsl`].
///
/// # Errors
/// Same as [`to_hex`].
pub fn to_hsl(color: &str) -> Result<Hsl, ColorError> {
    match parse_color(color) {
        Some((_, ParsedColor::Hsl { h, s, l, .. })) => Ok(Hsl::new(h, s, l)),
        _ => hex_to_hsl(&to_hex(color)?),
    }
}

/// Renders a number without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let text = format!("{value:.3}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn with_alpha(triplet: String, alpha: Option<f64>) -> String {
    match alpha {
        Some(a) if a < 1.0 => format!("{triplet} / {}", format_number(a)),
        _ => triplet,
    }
}

/// Converts a color literal to the `H S% L%` form used as a style-variable value.
///
/// HSL input is re-assembled from its components without recomputation.
/// Colors with an alpha below 1 get a ` / A` suffix. `currentColor`,
/// `inherit`, `initial` and `unset` are returned unchanged.
///
/// # Errors
/// Returns `ColorError::Invalid` if `color` fails [`is_valid_color`].
pub fn color_to_hsl_variable(color: &str) -> Result<String, ColorError> {
    let (_, parsed) = parse_color(color).ok_or_else(|| ColorError::Invalid(color.to_string()))?;
    let value = match parsed {
        ParsedColor::Hsl { h, s, l, alpha } => with_alpha(
            format!(
                "{} {}% {}%",
                format_number(h),
                format_number(s),
                format_number(l)
            ),
            alpha,
        ),
        ParsedColor::Rgb { r, g, b, alpha } => {
            let hsl = rgb_to_hsl(r.round() as u8, g.round() as u8, b.round() as u8);
            with_alpha(hsl.to_variable(), alpha)
        }
        ParsedColor::Named(hex) => hex_to_hsl(hex)?.to_variable(),
        ParsedColor::Transparent => "0 0% 0% / 0".to_string(),
        ParsedColor::Keyword => color.trim().to_string(),
    };
    Ok(value)
}
