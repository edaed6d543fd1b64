//! Compiles a theme into CSS custom properties.
//!
//! Variable names follow a fixed scheme:
//!
//! | Section | Variable |
//! |---|---|
//! | `colors` | `--color-{family}-{shade}` |
//! | `typography.fontFamily` | `--font-{key}` |
//! | `typography.fontSize` | `--text-{key}` |
//! | `typography.fontWeight` | `--font-weight-{key}` |
//! | `typography.lineHeight` | `--line-height-{key}` |
//! | `typography.letterSpacing` | `--letter-spacing-{key}` |
//! | `spacing` | `--spacing-{key}` |
//! | `borderRadius` | `--radius-{key}` |
//! | `shadows` | `--shadow-{key}` |
//!
//! Color values are emitted as bare `H S% L%` triplets so they can be wrapped
//! by the consumer (`hsl(var(--color-primary-500))`).

use std::fmt::{self, Write as _};
use std::ops::Deref;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::color::color_to_hsl_variable;
use crate::theme::{Theme, TokenMap};

/// Style-variable name to value, in theme order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CssVariables(IndexMap<String, String>);

impl CssVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Renders a `:root` declaration block.
    pub fn to_css_string(&self) -> String {
        let mut css = String::from(":root {\n");
        for (name, value) in &self.0 {
            let _ = writeln!(css, "  {name}: {value};");
        }
        css.push_str("}\n");
        css
    }

    pub fn into_inner(self) -> IndexMap<String, String> {
        self.0
    }
}

impl Deref for CssVariables {
    type Target = IndexMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<(String, String)> for CssVariables {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CssVariables {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for CssVariables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css_string())
    }
}

fn push_tokens<V: fmt::Display>(
    vars: &mut CssVariables,
    prefix: &str,
    tokens: &IndexMap<String, V>,
) {
    for (key, value) in tokens {
        vars.insert(format!("--{prefix}-{key}"), value.to_string());
    }
}

/// Flattens `theme` into style variables.
///
/// A color leaf that cannot be converted is logged and left out.
pub fn generate_css_variables(theme: &Theme) -> CssVariables {
    let mut vars = CssVariables::new();

    for (family, shades) in &theme.colors {
        for (shade, literal) in shades {
            match color_to_hsl_variable(literal) {
                Ok(value) => vars.insert(format!("--color-{family}-{shade}"), value),
                Err(err) => warn!(
                    color.family = %family,
                    color.shade = %shade,
                    error = %err,
                    "Skipping color variable"
                ),
            }
        }
    }

    let typography = &theme.typography;
    for (key, fonts) in &typography.font_family {
        vars.insert(format!("--font-{key}"), fonts.join(", "));
    }
    push_tokens(&mut vars, "text", &typography.font_size);
    push_tokens(&mut vars, "font-weight", &typography.font_weight);
    push_tokens(&mut vars, "line-height", &typography.line_height);
    push_tokens(&mut vars, "letter-spacing", &typography.letter_spacing);

    let sections: [(&str, &TokenMap); 3] = [
        ("spacing", &theme.spacing),
        ("radius", &theme.border_radius),
        ("shadow", &theme.shadows),
    ];
    for (prefix, tokens) in sections {
        push_tokens(&mut vars, prefix, tokens);
    }

    vars
}

/// Renders `theme` as a `:root { ... }` block, one declaration per line.
pub fn generate_css_string(theme: &Theme) -> String {
    generate_css_variables(theme).to_css_string()
}
