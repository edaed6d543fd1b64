//! Tonal scale generation.
//!
//! A single base color is expanded into a ten-shade family (`50` to `900`)
//! by shifting lightness and saturation by fixed amounts. The `500` shade is
//! the base color itself.

use tracing::{trace, warn};

use crate::color::{self, ColorError, Hsl};
use crate::theme::ColorFamily;

/// Shade key, lightness delta, saturation delta.
const ADJUSTMENTS: [(&str, f64, f64); 10] = [
    ("50", 40.0, -30.0),
    ("100", 30.0, -20.0),
    ("200", 20.0, -10.0),
    ("300", 10.0, 0.0),
    // Always +5 rather than toward the midpoint. Above L 90 it clamps to the
    // 95 ceiling like the lighter shades, while 500 keeps the base.
    ("400", 5.0, 0.0),
    ("500", 0.0, 0.0),
    ("600", -10.0, 5.0),
    ("700", -20.0, 10.0),
    ("800", -30.0, 15.0),
    ("900", -40.0, 20.0),
];

const MIN_SATURATION: f64 = 10.0;
const MAX_SATURATION: f64 = 100.0;
const MIN_LIGHTNESS: f64 = 5.0;
const MAX_LIGHTNESS: f64 = 95.0;

/// Used when the base color cannot be decomposed.
const FALLBACK_SCALE: [(&str, &str); 10] = [
    ("50", "#eff6ff"),
    ("100", "#dbeafe"),
    ("200", "#bfdbfe"),
    ("300", "#93c5fd"),
    ("400", "#60a5fa"),
    ("500", "#3b82f6"),
    ("600", "#2563eb"),
    ("700", "#1d4ed8"),
    ("800", "#1e40af"),
    ("900", "#1e3a8a"),
];

/// Builds the tonal family for an already decomposed base color.
pub fn scale_from_hsl(base: Hsl) -> ColorFamily {
    ADJUSTMENTS
        .iter()
        .map(|&(key, dl, ds)| {
            let shade = if key == "500" {
                base
            } else {
                Hsl::new(
                    base.h,
                    (base.s + ds).clamp(MIN_SATURATION, MAX_SATURATION),
                    (base.l + dl).clamp(MIN_LIGHTNESS, MAX_LIGHTNESS),
                )
            };
            (key.to_string(), shade.to_css())
        })
        .collect()
}

/// Generates a tonal family, reporting why the base color was unusable.
///
/// # Errors
/// Returns `ColorError` if `base` is invalid or has no static value
/// (`transparent`, `currentColor`, ...).
pub fn try_generate_color_scale(base: &str) -> Result<ColorFamily, ColorError> {
    let hsl = color::to_hsl(base)?;
    trace!(color.base = %base, color.hsl = %hsl, "Generating tonal scale");
    Ok(scale_from_hsl(hsl))
}

/// Generates a tonal family from any valid color literal.
///
/// Never fails: an unusable base color yields the default blue scale and a
/// warning is logged.
pub fn generate_color_scale(base: &str) -> ColorFamily {
    try_generate_color_scale(base).unwrap_or_else(|err| {
        warn!(color.base = %base, error = %err, "Unusable base color, using default scale");
        fallback_scale()
    })
}

/// The default blue scale.
pub fn fallback_scale() -> ColorFamily {
    FALLBACK_SCALE
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}
