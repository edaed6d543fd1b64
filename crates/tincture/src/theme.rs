//! Theme data model and the built-in default theme.
//!
//! A [`Theme`] is the canonical token tree: color families, typography,
//! spacing, border radii and shadows. Every section is an insertion-ordered
//! map so that compiled variables and exported JSON keep a stable order.
//! Unknown keys are preserved in `extra` and survive a round trip.
//!
//! [`ThemePatch`] is the partial form accepted by the merger and by
//! [`ThemeManager::update_theme`](crate::manager::ThemeManager::update_theme).
//!
//! # Example
//!
//! ```rust
//! use tincture::theme::{default_theme, ThemePatch};
//! use tincture::merge::merge_with_default_theme;
//!
//! let patch = ThemePatch::new()
//!     .with_name("Brand")
//!     .with_color("primary", "500", "#ff5500");
//! let theme = merge_with_default_theme(&patch);
//!
//! assert_eq!(theme.name, "Brand");
//! assert_eq!(theme.colors["primary"]["500"], "#ff5500");
//! assert_eq!(theme.colors["primary"]["50"], default_theme().colors["primary"]["50"]);
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::schema::{self, ValidationError};

/// Shade keys of a tonal family, lightest first.
pub const SHADE_KEYS: [&str; 10] = [
    "50", "100", "200", "300", "400", "500", "600", "700", "800", "900",
];

/// A named set of tonal variants, shade key to color literal.
pub type ColorFamily = IndexMap<String, String>;

/// A flat token map, token name to CSS value.
pub type TokenMap = IndexMap<String, String>;

/// A token that may be written as a number or a string (`600`, `"bold"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Number(serde_json::Number),
    Text(String),
}

impl TokenValue {
    /// Creates a numeric token, falling back to text for non-finite values.
    pub fn from_f64(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map_or_else(|| TokenValue::Text(value.to_string()), TokenValue::Number)
    }
}

impl From<i64> for TokenValue {
    fn from(value: i64) -> Self {
        TokenValue::Number(value.into())
    }
}

impl From<&str> for TokenValue {
    fn from(value: &str) -> Self {
        TokenValue::Text(value.to_string())
    }
}

impl From<String> for TokenValue {
    fn from(value: String) -> Self {
        TokenValue::Text(value)
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Number(n) => write!(f, "{n}"),
            TokenValue::Text(s) => f.write_str(s),
        }
    }
}

/// Typography tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    /// Font stacks, most preferred first.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub font_family: IndexMap<String, Vec<String>>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub font_size: TokenMap,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub font_weight: IndexMap<String, TokenValue>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub line_height: IndexMap<String, TokenValue>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub letter_spacing: TokenMap,

    /// Unrecognized typography keys, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Typography {
    /// Returns true if no typography token is set.
    pub fn is_empty(&self) -> bool {
        self.font_family.is_empty()
            && self.font_size.is_empty()
            && self.font_weight.is_empty()
            && self.line_height.is_empty()
            && self.letter_spacing.is_empty()
            && self.extra.is_empty()
    }

    fn token_count(&self) -> usize {
        self.font_family.len()
            + self.font_size.len()
            + self.font_weight.len()
            + self.line_height.len()
            + self.letter_spacing.len()
    }
}

/// A complete, canonical theme.
///
/// Absent sections deserialize as empty maps and are skipped on
/// serialization, so an absent section and an empty one are equivalent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    /// Human-readable theme name.
    pub name: String,

    /// Color families keyed by role (`primary`, `secondary`, ...).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub colors: IndexMap<String, ColorFamily>,

    #[serde(default, skip_serializing_if = "Typography::is_empty")]
    pub typography: Typography,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub spacing: TokenMap,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub border_radius: TokenMap,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub shadows: TokenMap,

    /// Unrecognized top-level keys, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Theme {
    /// Creates an empty theme with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            colors: IndexMap::new(),
            typography: Typography::default(),
            spacing: TokenMap::new(),
            border_radius: TokenMap::new(),
            shadows: TokenMap::new(),
            extra: Map::new(),
        }
    }

    /// Sets the theme name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of leaf tokens across colors, typography, spacing, radii and shadows.
    pub fn token_count(&self) -> usize {
        self.colors.values().map(IndexMap::len).sum::<usize>()
            + self.typography.token_count()
            + self.spacing.len()
            + self.border_radius.len()
            + self.shadows.len()
    }

    /// Load a canonical theme from JSON text, validating it against the schema.
    ///
    /// # Errors
    /// Returns `ThemeError` if JSON parsing or validation fails.
    pub fn from_json(json: &str) -> Result<Self, ThemeError> {
        let value: Value = serde_json::from_str(json)?;
        schema::validate_theme(&value).map_err(ThemeError::Validation)
    }

    /// Load a canonical theme from TOML text, validating it against the schema.
    ///
    /// # Errors
    /// Returns `ThemeError` if TOML parsing or validation fails.
    pub fn from_toml(toml: &str) -> Result<Self, ThemeError> {
        let value: Value = toml::from_str(toml)?;
        schema::validate_theme(&value).map_err(ThemeError::Validation)
    }

    /// Serialize this theme to pretty-printed JSON.
    ///
    /// # Errors
    /// Returns `ThemeError` if serialization fails.
    pub fn to_json(&self) -> Result<String, ThemeError> {
        serde_json::to_string_pretty(self).map_err(ThemeError::Json)
    }

    /// Serialize this theme to TOML.
    ///
    /// # Errors
    /// Returns `ThemeError` if serialization fails.
    pub fn to_toml(&self) -> Result<String, ThemeError> {
        toml::to_string_pretty(self).map_err(ThemeError::TomlSerialize)
    }

    /// Load a canonical theme from YAML text, validating it against the schema.
    ///
    /// # Errors
    /// Returns `ThemeError` if YAML parsing or validation fails.
    #[cfg(feature = "yaml")]
    pub fn from_yaml(yaml: &str) -> Result<Self, ThemeError> {
        let value: Value = serde_yaml::from_str(yaml)?;
        schema::validate_theme(&value).map_err(ThemeError::Validation)
    }

    /// Serialize this theme to YAML.
    ///
    /// # Errors
    /// Returns `ThemeError` if serialization fails.
    #[cfg(feature = "yaml")]
    pub fn to_yaml(&self) -> Result<String, ThemeError> {
        serde_yaml::to_string(self).map_err(ThemeError::Yaml)
    }

    /// Serialize this theme in the given format.
    ///
    /// # Errors
    /// Returns `ThemeError` if serialization fails or the format is not compiled in.
    pub fn to_format(&self, format: ThemeFormat) -> Result<String, ThemeError> {
        match format {
            ThemeFormat::Json => self.to_json(),
            ThemeFormat::Toml => self.to_toml(),
            #[cfg(feature = "yaml")]
            ThemeFormat::Yaml => self.to_yaml(),
            #[cfg(not(feature = "yaml"))]
            ThemeFormat::Yaml => Err(ThemeError::UnsupportedFormat("yaml".into())),
        }
    }
}

/// Text formats a theme document can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeFormat {
    #[default]
    Json,
    Toml,
    Yaml,
}

impl ThemeFormat {
    /// Infers the format from a file extension (`json`, `toml`, `yaml`/`yml`).
    ///
    /// # Errors
    /// Returns `ThemeError::UnsupportedFormat` for any other extension.
    pub fn from_extension(ext: &str) -> Result<Self, ThemeError> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Ok(ThemeFormat::Json),
            "toml" => Ok(ThemeFormat::Toml),
            "yaml" | "yml" => Ok(ThemeFormat::Yaml),
            other => Err(ThemeError::UnsupportedFormat(other.into())),
        }
    }

    /// Infers the format from a path; paths without an extension are JSON.
    ///
    /// # Errors
    /// Returns `ThemeError::UnsupportedFormat` for unknown extensions.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ThemeError> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(Ok(ThemeFormat::Json), Self::from_extension)
    }

    /// Parses a document into the JSON value model without validating it.
    ///
    /// # Errors
    /// Returns `ThemeError` if the text is malformed or the format is not compiled in.
    pub fn parse_value(self, text: &str) -> Result<Value, ThemeError> {
        match self {
            ThemeFormat::Json => Ok(serde_json::from_str(text)?),
            ThemeFormat::Toml => Ok(toml::from_str(text)?),
            #[cfg(feature = "yaml")]
            ThemeFormat::Yaml => Ok(serde_yaml::from_str(text)?),
            #[cfg(not(feature = "yaml"))]
            ThemeFormat::Yaml => Err(ThemeError::UnsupportedFormat("yaml".into())),
        }
    }
}

impl fmt::Display for ThemeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThemeFormat::Json => "json",
            ThemeFormat::Toml => "toml",
            ThemeFormat::Yaml => "yaml",
        })
    }
}

impl FromStr for ThemeFormat {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s)
    }
}

impl Default for Theme {
    fn default() -> Self {
        default_theme()
    }
}

/// A partial theme. Every field is optional; empty sections contribute nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub colors: IndexMap<String, ColorFamily>,

    #[serde(default, skip_serializing_if = "Typography::is_empty")]
    pub typography: Typography,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub spacing: TokenMap,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub border_radius: TokenMap,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub shadows: TokenMap,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ThemePatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the theme name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a single color shade.
    pub fn with_color(
        mut self,
        family: impl Into<String>,
        shade: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.colors
            .entry(family.into())
            .or_default()
            .insert(shade.into(), value.into());
        self
    }

    /// Replaces a whole color family.
    pub fn with_family(mut self, family: impl Into<String>, shades: ColorFamily) -> Self {
        self.colors.insert(family.into(), shades);
        self
    }

    /// Sets a spacing token.
    pub fn with_spacing(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spacing.insert(key.into(), value.into());
        self
    }

    /// Sets a border radius token.
    pub fn with_radius(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.border_radius.insert(key.into(), value.into());
        self
    }

    /// Returns true if the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.colors.is_empty()
            && self.typography.is_empty()
            && self.spacing.is_empty()
            && self.border_radius.is_empty()
            && self.shadows.is_empty()
            && self.extra.is_empty()
    }
}

impl From<Theme> for ThemePatch {
    fn from(theme: Theme) -> Self {
        Self {
            name: Some(theme.name),
            colors: theme.colors,
            typography: theme.typography,
            spacing: theme.spacing,
            border_radius: theme.border_radius,
            shadows: theme.shadows,
            extra: theme.extra,
        }
    }
}

impl From<&Theme> for ThemePatch {
    fn from(theme: &Theme) -> Self {
        Self::from(theme.clone())
    }
}

fn family(shades: [&str; 10]) -> ColorFamily {
    SHADE_KEYS
        .iter()
        .zip(shades)
        .map(|(key, value)| ((*key).to_string(), value.to_string()))
        .collect()
}

fn tokens(pairs: &[(&str, &str)]) -> TokenMap {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}

fn stack(fonts: &[&str]) -> Vec<String> {
    fonts.iter().map(|f| (*f).to_string()).collect()
}

static DEFAULT_THEME: LazyLock<Theme> = LazyLock::new(|| {
    let mut colors = IndexMap::new();
    colors.insert(
        "primary".to_string(),
        family([
            "#eff6ff", "#dbeafe", "#bfdbfe", "#93c5fd", "#60a5fa", "#3b82f6", "#2563eb",
            "#1d4ed8", "#1e40af", "#1e3a8a",
        ]),
    );
    colors.insert(
        "secondary".to_string(),
        family([
            "#f8fafc", "#f1f5f9", "#e2e8f0", "#cbd5e1", "#94a3b8", "#64748b", "#475569",
            "#334155", "#1e293b", "#0f172a",
        ]),
    );
    colors.insert(
        "accent".to_string(),
        family([
            "#f5f3ff", "#ede9fe", "#ddd6fe", "#c4b5fd", "#a78bfa", "#8b5cf6", "#7c3aed",
            "#6d28d9", "#5b21b6", "#4c1d95",
        ]),
    );
    colors.insert(
        "neutral".to_string(),
        family([
            "#f9fafb", "#f3f4f6", "#e5e7eb", "#d1d5db", "#9ca3af", "#6b7280", "#4b5563",
            "#374151", "#1f2937", "#111827",
        ]),
    );

    let mut typography = Typography::default();
    typography.font_family.insert(
        "sans".to_string(),
        stack(&["Inter", "system-ui", "sans-serif"]),
    );
    typography
        .font_family
        .insert("serif".to_string(), stack(&["Georgia", "serif"]));
    typography
        .font_family
        .insert("mono".to_string(), stack(&["JetBrains Mono", "monospace"]));
    typography.font_size = tokens(&[
        ("xs", "0.75rem"),
        ("sm", "0.875rem"),
        ("base", "1rem"),
        ("lg", "1.125rem"),
        ("xl", "1.25rem"),
        ("2xl", "1.5rem"),
        ("3xl", "1.875rem"),
        ("4xl", "2.25rem"),
    ]);
    for (key, weight) in [
        ("light", 300_i64),
        ("normal", 400),
        ("medium", 500),
        ("semibold", 600),
        ("bold", 700),
    ] {
        typography
            .font_weight
            .insert(key.to_string(), TokenValue::from(weight));
    }
    for (key, height) in [("tight", 1.25), ("normal", 1.5), ("relaxed", 1.75)] {
        typography
            .line_height
            .insert(key.to_string(), TokenValue::from_f64(height));
    }
    typography.letter_spacing = tokens(&[
        ("tight", "-0.025em"),
        ("normal", "0em"),
        ("wide", "0.025em"),
    ]);

    Theme {
        name: "Default".to_string(),
        colors,
        typography,
        spacing: tokens(&[
            ("xs", "0.25rem"),
            ("sm", "0.5rem"),
            ("md", "1rem"),
            ("lg", "1.5rem"),
            ("xl", "2rem"),
            ("2xl", "3rem"),
        ]),
        border_radius: tokens(&[
            ("none", "0"),
            ("sm", "0.125rem"),
            ("md", "0.375rem"),
            ("lg", "0.5rem"),
            ("xl", "0.75rem"),
            ("full", "9999px"),
        ]),
        shadows: tokens(&[
            ("sm", "0 1px 2px 0 rgb(0 0 0 / 0.05)"),
            (
                "md",
                "0 4px 6px -1px rgb(0 0 0 / 0.1), 0 2px 4px -2px rgb(0 0 0 / 0.1)",
            ),
            (
                "lg",
                "0 10px 15px -3px rgb(0 0 0 / 0.1), 0 4px 6px -4px rgb(0 0 0 / 0.1)",
            ),
            (
                "xl",
                "0 20px 25px -5px rgb(0 0 0 / 0.1), 0 8px 10px -6px rgb(0 0 0 / 0.1)",
            ),
        ]),
        extra: Map::new(),
    }
});

/// Returns a fresh copy of the built-in default theme.
pub fn default_theme() -> Theme {
    DEFAULT_THEME.clone()
}

/// Error loading or saving a theme.
#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[cfg(feature = "yaml")]
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Unsupported theme format: {0}")]
    UnsupportedFormat(String),
    #[error("Validation failed: {}", schema::summarize(.0))]
    Validation(Vec<ValidationError>),
}
