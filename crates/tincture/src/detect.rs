//! Input shape detection and simple-format normalization.
//!
//! Themes arrive in one of two shapes. The canonical shape nests every color
//! family as a shade map and is checked by [`crate::schema`]. The simple
//! shape carries a single color per role (`"primary": "#3b82f6"`), font
//! stacks as comma-separated strings and a handful of flat role keys
//! borrowed from UI kits (`ring`, `background`, ...). The simple shape is
//! rewritten into a full [`Theme`] starting from the default theme.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::color::is_valid_color;
use crate::scale::generate_color_scale;
use crate::schema::{is_valid_token_name, validate_theme, ValidationError};
use crate::theme::{default_theme, ColorFamily, Theme, TokenMap, TokenValue};

/// Flat keys that derive the `accent` family, highest precedence first.
pub const ACCENT_SOURCES: [&str; 6] = [
    "accent",
    "primaryDark",
    "secondaryMedium",
    "ring",
    "destructive",
    "destructiveForeground",
];

/// Flat keys that derive the `neutral` family, highest precedence first.
pub const NEUTRAL_SOURCES: [&str; 6] = [
    "background",
    "foreground",
    "muted",
    "mutedForeground",
    "border",
    "input",
];

/// Colors that take a single base value and expand to a scale of the same name.
const SCALED_ROLES: [&str; 2] = ["primary", "secondary"];

const STRUCTURAL_KEYS: [&str; 6] = [
    "name",
    "colors",
    "typography",
    "spacing",
    "borderRadius",
    "shadows",
];

/// Returns true if `value` looks like the simple, flat theme shape.
///
/// A canonical theme whose `colors.primary` is a shade map is not simple.
pub fn is_simple_json_format(value: &Value) -> bool {
    let flat_colors = value.get("colors").is_some_and(|colors| {
        SCALED_ROLES
            .iter()
            .any(|role| colors.get(role).is_some_and(Value::is_string))
            || ["accent", "background", "primaryDark"]
                .iter()
                .any(|key| colors.get(key).is_some())
    });
    let flat_fonts = ["primary", "heading"].iter().any(|key| {
        value
            .pointer(&format!("/typography/fontFamily/{key}"))
            .is_some()
    });
    flat_colors || flat_fonts
}

/// Returns true if `value` carries at least one single-value entry that only
/// the simple shape can express.
///
/// Stricter than [`is_simple_json_format`], which also matches on the bare
/// presence of `accent`, `background` or `primaryDark`. Those names are
/// ordinary shade-map families in a canonical theme, so presence alone must
/// not turn a failed canonical document into a simple one.
fn has_flat_values(value: &Value) -> bool {
    let flat_colors = value.get("colors").is_some_and(|colors| {
        SCALED_ROLES
            .iter()
            .chain(&["accent", "background", "primaryDark"])
            .any(|key| colors.get(key).is_some_and(Value::is_string))
    });
    let flat_fonts = ["primary", "heading"].iter().any(|key| {
        value
            .pointer(&format!("/typography/fontFamily/{key}"))
            .is_some_and(Value::is_string)
    });
    flat_colors || flat_fonts
}

/// Result of rewriting a simple-shape theme.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleConversion {
    pub theme: Theme,
    /// Entries that were skipped or overridden during conversion.
    pub warnings: Vec<String>,
}

/// A parsed theme document, tagged by the shape it was recognized as.
#[derive(Debug, Clone, PartialEq)]
pub enum ThemeInput {
    Canonical(Theme),
    Simple(SimpleConversion),
    /// Neither shape; carries the canonical schema violations.
    Invalid(Vec<ValidationError>),
}

impl ThemeInput {
    /// Classifies a parsed document. Canonical validation is tried first.
    ///
    /// A document that fails it is converted as the simple shape only when it
    /// holds a flat string entry; otherwise the schema errors are returned.
    pub fn classify(value: &Value) -> Self {
        match validate_theme(value) {
            Ok(theme) => {
                debug!(theme.name = %theme.name, "Input matches canonical schema");
                ThemeInput::Canonical(theme)
            }
            Err(errors) if is_simple_json_format(value) && has_flat_values(value) => {
                debug!(
                    schema.errors = errors.len(),
                    "Input is not canonical, converting simple format"
                );
                ThemeInput::Simple(convert_simple_json_to_theme(value))
            }
            Err(errors) => {
                debug!(schema.errors = errors.len(), "Input matches no theme shape");
                ThemeInput::Invalid(errors)
            }
        }
    }

    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ThemeInput::Canonical(_) => "canonical",
            ThemeInput::Simple(_) => "simple",
            ThemeInput::Invalid(_) => "invalid",
        }
    }
}

/// Rewrites a simple-shape document into a complete theme.
///
/// Never fails. Unusable entries are skipped and reported in
/// [`SimpleConversion::warnings`].
pub fn convert_simple_json_to_theme(value: &Value) -> SimpleConversion {
    let mut normalizer = Normalizer {
        theme: default_theme(),
        warnings: Vec::new(),
    };
    let Some(root) = value.as_object() else {
        normalizer.warn(String::from("document is not an object, using default theme"));
        return normalizer.finish();
    };

    if let Some(name) = root
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
    {
        normalizer.theme.name = name.to_string();
    }
    if let Some(colors) = normalizer.section(root, "colors") {
        normalizer.colors(colors);
    }
    if let Some(typography) = normalizer.section(root, "typography") {
        normalizer.typography(typography);
    }
    for key in ["spacing", "borderRadius", "shadows"] {
        if let Some(tokens) = normalizer.section(root, key) {
            let mut target = std::mem::take(normalizer.token_section(key));
            normalizer.string_tokens(key, tokens, &mut target);
            *normalizer.token_section(key) = target;
        }
    }
    for (key, extra) in root {
        if !STRUCTURAL_KEYS.contains(&key.as_str()) {
            normalizer.theme.extra.insert(key.clone(), extra.clone());
        }
    }

    normalizer.finish()
}

struct Normalizer {
    theme: Theme,
    warnings: Vec<String>,
}

impl Normalizer {
    fn warn(&mut self, message: String) {
        warn!(warning = %message, "Simple theme conversion");
        self.warnings.push(message);
    }

    fn finish(self) -> SimpleConversion {
        SimpleConversion {
            theme: self.theme,
            warnings: self.warnings,
        }
    }

    fn section<'v>(
        &mut self,
        root: &'v Map<String, Value>,
        key: &str,
    ) -> Option<&'v Map<String, Value>> {
        let value = root.get(key)?;
        let section = value.as_object();
        if section.is_none() {
            self.warn(format!("{key}: expected an object, section ignored"));
        }
        section
    }

    fn token_section(&mut self, key: &str) -> &mut TokenMap {
        match key {
            "spacing" => &mut self.theme.spacing,
            "borderRadius" => &mut self.theme.border_radius,
            _ => &mut self.theme.shadows,
        }
    }

    fn accept_key(&mut self, path: &str, key: &str) -> bool {
        let ok = is_valid_token_name(key);
        if !ok {
            self.warn(format!("{path}.{key}: invalid token name, entry ignored"));
        }
        ok
    }

    /// A flat color value that can seed a scale.
    fn base_color<'v>(&mut self, key: &str, value: &'v Value) -> Option<&'v str> {
        match value {
            Value::String(color) if is_valid_color(color) => Some(color.as_str()),
            Value::String(color) => {
                self.warn(format!("colors.{key}: invalid color '{color}', entry ignored"));
                None
            }
            other => {
                self.warn(format!("colors.{key}: expected a color string, got {other}"));
                None
            }
        }
    }

    fn colors(&mut self, colors: &Map<String, Value>) {
        for role in SCALED_ROLES {
            if let Some(value) = colors.get(role).filter(|value| value.is_string()) {
                if let Some(base) = self.base_color(role, value) {
                    let scale = generate_color_scale(base);
                    self.theme.colors.insert(role.to_string(), scale);
                }
            }
        }

        self.derive_family(colors, "accent", &ACCENT_SOURCES);
        self.derive_family(colors, "neutral", &NEUTRAL_SOURCES);

        for (key, value) in colors {
            let flat_role = SCALED_ROLES.contains(&key.as_str())
                || ACCENT_SOURCES.contains(&key.as_str())
                || NEUTRAL_SOURCES.contains(&key.as_str());
            match value {
                Value::Object(shades) => self.overlay_family(key, shades),
                _ if flat_role => {}
                Value::String(_) => {
                    if !self.accept_key("colors", key) {
                        continue;
                    }
                    if let Some(base) = self.base_color(key, value) {
                        let scale = generate_color_scale(base);
                        self.theme.colors.insert(key.clone(), scale);
                    }
                }
                other => self.warn(format!(
                    "colors.{key}: expected a color or shade map, got {other}"
                )),
            }
        }
    }

    /// Fills `family` from the first usable flat key in `sources`.
    fn derive_family(&mut self, colors: &Map<String, Value>, family: &str, sources: &[&str]) {
        let mut winner: Option<&str> = None;
        for &key in sources {
            let Some(value) = colors.get(key) else {
                continue;
            };
            if value.is_object() {
                continue;
            }
            if let Some(source) = winner {
                self.warn(format!(
                    "colors.{key}: ignored, {family} family already derived from colors.{source}"
                ));
                continue;
            }
            if let Some(base) = self.base_color(key, value) {
                let scale = generate_color_scale(base);
                self.theme.colors.insert(family.to_string(), scale);
                winner = Some(key);
            }
        }
    }

    fn overlay_family(&mut self, family: &str, shades: &Map<String, Value>) {
        if !self.accept_key("colors", family) {
            return;
        }
        let mut target: ColorFamily = self
            .theme
            .colors
            .get(family)
            .cloned()
            .unwrap_or_default();
        for (shade, literal) in shades {
            if !self.accept_key(&format!("colors.{family}"), shade) {
                continue;
            }
            match literal {
                Value::String(color) if is_valid_color(color) => {
                    target.insert(shade.clone(), color.clone());
                }
                other => self.warn(format!(
                    "colors.{family}.{shade}: invalid color {other}, shade dropped"
                )),
            }
        }
        if !target.is_empty() {
            self.theme.colors.insert(family.to_string(), target);
        }
    }

    fn typography(&mut self, typography: &Map<String, Value>) {
        for (key, value) in typography {
            match key.as_str() {
                "fontFamily" => self.font_families(value),
                "fontWeight" => {
                    let mut target = std::mem::take(&mut self.theme.typography.font_weight);
                    self.number_tokens("typography.fontWeight", value, &mut target, true);
                    self.theme.typography.font_weight = target;
                }
                "lineHeight" => {
                    let mut target = std::mem::take(&mut self.theme.typography.line_height);
                    self.number_tokens("typography.lineHeight", value, &mut target, false);
                    self.theme.typography.line_height = target;
                }
                "fontSize" | "letterSpacing" => {
                    let path = format!("typography.{key}");
                    let Some(tokens) = value.as_object() else {
                        self.warn(format!("{path}: expected an object, section ignored"));
                        continue;
                    };
                    let mut target = if key == "fontSize" {
                        std::mem::take(&mut self.theme.typography.font_size)
                    } else {
                        std::mem::take(&mut self.theme.typography.letter_spacing)
                    };
                    self.string_tokens(&path, tokens, &mut target);
                    if key == "fontSize" {
                        self.theme.typography.font_size = target;
                    } else {
                        self.theme.typography.letter_spacing = target;
                    }
                }
                _ => {
                    self.theme.typography.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }

    fn font_families(&mut self, value: &Value) {
        let Some(families) = value.as_object() else {
            self.warn(String::from(
                "typography.fontFamily: expected an object, section ignored",
            ));
            return;
        };
        for (key, stack) in families {
            if !self.accept_key("typography.fontFamily", key) {
                continue;
            }
            let fonts: Vec<String> = match stack {
                Value::String(list) => list
                    .split(',')
                    .map(str::trim)
                    .filter(|font| !font.is_empty())
                    .map(ToString::to_string)
                    .collect(),
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| item.as_str().map(ToString::to_string))
                    .collect(),
                other => {
                    self.warn(format!(
                        "typography.fontFamily.{key}: expected a font list, got {other}"
                    ));
                    continue;
                }
            };
            self.theme.typography.font_family.insert(key.clone(), fonts);
        }

        let sans_source = if families.contains_key("sans") {
            None
        } else if families.contains_key("primary") {
            Some("primary")
        } else if families.contains_key("heading") {
            Some("heading")
        } else {
            None
        };
        if let Some(source) = sans_source {
            if let Some(fonts) = self.theme.typography.font_family.get(source).cloned() {
                self.theme
                    .typography
                    .font_family
                    .insert("sans".to_string(), fonts);
            }
        }
    }

    fn string_tokens(&mut self, path: &str, tokens: &Map<String, Value>, target: &mut TokenMap) {
        for (key, token) in tokens {
            if !self.accept_key(path, key) {
                continue;
            }
            match token {
                Value::String(text) => {
                    target.insert(key.clone(), text.clone());
                }
                Value::Number(number) => {
                    target.insert(key.clone(), number.to_string());
                }
                other => self.warn(format!("{path}.{key}: expected a string, got {other}")),
            }
        }
    }

    /// Tokens that may be numbers; with `parse_integers`, integer strings become numbers.
    fn number_tokens(
        &mut self,
        path: &str,
        value: &Value,
        target: &mut IndexMap<String, TokenValue>,
        parse_integers: bool,
    ) {
        let Some(tokens) = value.as_object() else {
            self.warn(format!("{path}: expected an object, section ignored"));
            return;
        };
        for (key, token) in tokens {
            if !self.accept_key(path, key) {
                continue;
            }
            let parsed = match token {
                Value::Number(number) => TokenValue::Number(number.clone()),
                Value::String(text) if parse_integers => text
                    .trim()
                    .parse::<i64>()
                    .map_or_else(|_| TokenValue::Text(text.clone()), TokenValue::from),
                Value::String(text) => TokenValue::Text(text.clone()),
                other => {
                    self.warn(format!("{path}.{key}: expected a string or number, got {other}"));
                    continue;
                }
            };
            target.insert(key.clone(), parsed);
        }
    }
}
