//! Canonical theme schema validation.
//!
//! [`validate_theme`] walks a parsed JSON value and collects one
//! [`ValidationError`] per violated constraint instead of stopping at the
//! first. The schema is open: keys it does not know are passed through.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::color::is_valid_color;
use crate::theme::Theme;

/// Kind of violation reported by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCode {
    /// The input text is not JSON.
    InvalidJson,
    /// A value has the wrong JSON type, or a required value is missing.
    InvalidType,
    /// A string is shorter than allowed.
    TooSmall,
    /// A color literal failed color validation.
    Custom,
    /// A token name cannot form a style-variable name.
    InvalidString,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::InvalidJson => "invalid_json",
            ValidationCode::InvalidType => "invalid_type",
            ValidationCode::TooSmall => "too_small",
            ValidationCode::Custom => "custom",
            ValidationCode::InvalidString => "invalid_string",
        }
    }
}

impl std::fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single schema violation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}{message}", path_prefix(.path))]
pub struct ValidationError {
    /// Location of the offending value, outermost key first.
    pub path: Vec<String>,
    pub message: String,
    pub code: ValidationCode,
}

fn path_prefix(path: &[String]) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{}: ", path.join("."))
    }
}

impl ValidationError {
    pub fn new(path: Vec<String>, code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            code,
        }
    }

    /// The error reported when input text fails to parse.
    pub fn invalid_json(err: &serde_json::Error) -> Self {
        Self::new(
            Vec::new(),
            ValidationCode::InvalidJson,
            format!("Invalid JSON: {err}"),
        )
    }

    /// The path joined with dots, empty for the root.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

/// Joins error descriptions with `; `.
pub fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// What went wrong at a given path.
enum Violation {
    Required,
    Type {
        expected: &'static str,
        received: &'static str,
    },
    EmptyString,
    InvalidColor(String),
    InvalidKey(String),
}

impl Violation {
    fn code(&self) -> ValidationCode {
        match self {
            Violation::Required | Violation::Type { .. } => ValidationCode::InvalidType,
            Violation::EmptyString => ValidationCode::TooSmall,
            Violation::InvalidColor(_) => ValidationCode::Custom,
            Violation::InvalidKey(_) => ValidationCode::InvalidString,
        }
    }

    fn message(&self) -> String {
        match self {
            Violation::Required => "Required".to_string(),
            Violation::Type { expected, received } => {
                format!("Expected {expected}, received {received}")
            }
            Violation::EmptyString => "String must contain at least 1 character(s)".to_string(),
            Violation::InvalidColor(value) => format!("Invalid color format: {value}"),
            Violation::InvalidKey(key) => format!(
                "Invalid token name '{key}': use letters, digits, '-', '_' or '.'"
            ),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Returns true if `key` can be embedded in a style-variable name.
pub fn is_valid_token_name(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[derive(Default)]
struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    fn report(&mut self, path: &[&str], violation: Violation) {
        self.errors.push(ValidationError::new(
            path.iter().map(|p| (*p).to_string()).collect(),
            violation.code(),
            violation.message(),
        ));
    }

    fn expect_object<'v>(
        &mut self,
        path: &[&str],
        value: &'v Value,
    ) -> Option<&'v Map<String, Value>> {
        let object = value.as_object();
        if object.is_none() {
            self.report(
                path,
                Violation::Type {
                    expected: "object",
                    received: json_type(value),
                },
            );
        }
        object
    }

    fn check_key(&mut self, path: &[&str], key: &str) -> bool {
        let ok = is_valid_token_name(key);
        if !ok {
            self.report(path, Violation::InvalidKey(key.to_string()));
        }
        ok
    }

    fn check_name(&mut self, root: &Map<String, Value>) {
        match root.get("name") {
            None => self.report(&["name"], Violation::Required),
            Some(Value::String(name)) if name.is_empty() => {
                self.report(&["name"], Violation::EmptyString);
            }
            Some(Value::String(_)) => {}
            Some(other) => self.report(
                &["name"],
                Violation::Type {
                    expected: "string",
                    received: json_type(other),
                },
            ),
        }
    }

    fn check_colors(&mut self, value: &Value) {
        let Some(families) = self.expect_object(&["colors"], value) else {
            return;
        };
        for (family, shades) in families {
            let family_path = ["colors", family.as_str()];
            self.check_key(&family_path, family);
            let Some(shades) = self.expect_object(&family_path, shades) else {
                continue;
            };
            for (shade, literal) in shades {
                let path = ["colors", family.as_str(), shade.as_str()];
                self.check_key(&path, shade);
                match literal {
                    Value::String(s) if is_valid_color(s) => {}
                    Value::String(s) => self.report(&path, Violation::InvalidColor(s.clone())),
                    other => self.report(
                        &path,
                        Violation::Type {
                            expected: "string",
                            received: json_type(other),
                        },
                    ),
                }
            }
        }
    }

    /// A map whose values must satisfy `accepts`; `expected` names the accepted type.
    fn check_token_map(
        &mut self,
        path: &[&str],
        value: &Value,
        expected: &'static str,
        accepts: fn(&Value) -> bool,
    ) {
        let Some(tokens) = self.expect_object(path, value) else {
            return;
        };
        for (key, token) in tokens {
            let mut token_path = path.to_vec();
            token_path.push(key);
            self.check_key(&token_path, key);
            if !accepts(token) {
                self.report(
                    &token_path,
                    Violation::Type {
                        expected,
                        received: json_type(token),
                    },
                );
            }
        }
    }

    fn check_font_families(&mut self, value: &Value) {
        let path = ["typography", "fontFamily"];
        let Some(families) = self.expect_object(&path, value) else {
            return;
        };
        for (key, stack) in families {
            let family_path = ["typography", "fontFamily", key.as_str()];
            self.check_key(&family_path, key);
            let Some(fonts) = stack.as_array() else {
                self.report(
                    &family_path,
                    Violation::Type {
                        expected: "array",
                        received: json_type(stack),
                    },
                );
                continue;
            };
            for (index, font) in fonts.iter().enumerate() {
                if !font.is_string() {
                    let index = index.to_string();
                    self.report(
                        &["typography", "fontFamily", key.as_str(), index.as_str()],
                        Violation::Type {
                            expected: "string",
                            received: json_type(font),
                        },
                    );
                }
            }
        }
    }

    fn check_typography(&mut self, value: &Value) {
        let Some(typography) = self.expect_object(&["typography"], value) else {
            return;
        };
        if let Some(families) = typography.get("fontFamily") {
            self.check_font_families(families);
        }
        let string_only: fn(&Value) -> bool = Value::is_string;
        let string_or_number: fn(&Value) -> bool = |v| v.is_string() || v.is_number();
        for (key, expected, accepts) in [
            ("fontSize", "string", string_only),
            ("fontWeight", "string or number", string_or_number),
            ("lineHeight", "string or number", string_or_number),
            ("letterSpacing", "string", string_only),
        ] {
            if let Some(tokens) = typography.get(key) {
                self.check_token_map(&["typography", key], tokens, expected, accepts);
            }
        }
    }
}

/// Validates a canonical-shaped theme.
///
/// # Errors
/// Returns every violated constraint when `value` does not satisfy the schema.
pub fn validate_theme(value: &Value) -> Result<Theme, Vec<ValidationError>> {
    let mut validator = Validator::default();
    let Some(root) = validator.expect_object(&[], value) else {
        return Err(validator.errors);
    };

    validator.check_name(root);
    if let Some(colors) = root.get("colors") {
        validator.check_colors(colors);
    }
    if let Some(typography) = root.get("typography") {
        validator.check_typography(typography);
    }
    for key in ["spacing", "borderRadius", "shadows"] {
        if let Some(tokens) = root.get(key) {
            validator.check_token_map(&[key], tokens, "string", Value::is_string);
        }
    }

    if !validator.errors.is_empty() {
        return Err(validator.errors);
    }

    serde_json::from_value(value.clone()).map_err(|err| {
        vec![ValidationError::new(
            Vec::new(),
            ValidationCode::InvalidType,
            err.to_string(),
        )]
    })
}
