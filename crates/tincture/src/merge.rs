//! Deep merge of partial themes.
//!
//! Patch entries overwrite identically named base entries; every other base
//! entry survives. Color families and typography sub-maps merge one level
//! further, so a single shade can be replaced without restating its family.

use indexmap::IndexMap;

use crate::theme::{default_theme, Theme, ThemePatch, Typography};

fn overlay<V: Clone>(base: &mut IndexMap<String, V>, patch: &IndexMap<String, V>) {
    for (key, value) in patch {
        base.insert(key.clone(), value.clone());
    }
}

fn merge_typography(base: &mut Typography, patch: &Typography) {
    overlay(&mut base.font_family, &patch.font_family);
    overlay(&mut base.font_size, &patch.font_size);
    overlay(&mut base.font_weight, &patch.font_weight);
    overlay(&mut base.line_height, &patch.line_height);
    overlay(&mut base.letter_spacing, &patch.letter_spacing);
    for (key, value) in &patch.extra {
        base.extra.insert(key.clone(), value.clone());
    }
}

/// Applies `patch` over `base`.
pub fn merge_theme(base: &Theme, patch: &ThemePatch) -> Theme {
    let mut merged = base.clone();
    if let Some(name) = &patch.name {
        merged.name.clone_from(name);
    }
    for (family, shades) in &patch.colors {
        overlay(merged.colors.entry(family.clone()).or_default(), shades);
    }
    merge_typography(&mut merged.typography, &patch.typography);
    overlay(&mut merged.spacing, &patch.spacing);
    overlay(&mut merged.border_radius, &patch.border_radius);
    overlay(&mut merged.shadows, &patch.shadows);
    for (key, value) in &patch.extra {
        merged.extra.insert(key.clone(), value.clone());
    }
    merged
}

/// Applies `patch` over the built-in default theme.
///
/// Every key of the default theme is present in the result.
pub fn merge_with_default_theme(patch: &ThemePatch) -> Theme {
    merge_theme(&default_theme(), patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{TokenValue, SHADE_KEYS};
    use serde_json::json;

    #[test]
    fn test_empty_patch_yields_default() {
        assert_eq!(merge_with_default_theme(&ThemePatch::default()), default_theme());
    }

    #[test]
    fn test_single_shade_keeps_siblings() {
        let patch = ThemePatch::new().with_color("primary", "500", "#000000");
        let merged = merge_with_default_theme(&patch);
        let defaults = default_theme();

        assert_eq!(merged.colors["primary"]["500"], "#000000");
        for shade in SHADE_KEYS.iter().filter(|s| **s != "500") {
            assert_eq!(merged.colors["primary"][*shade], defaults.colors["primary"][*shade]);
        }
        assert_eq!(merged.colors["secondary"], defaults.colors["secondary"]);
        assert_eq!(merged.name, "Default");
    }

    #[test]
    fn test_new_entries_are_appended() {
        let mut shades = IndexMap::new();
        shades.insert("500".to_string(), "#22c55e".to_string());
        let patch = ThemePatch::new()
            .with_name("Fresh")
            .with_family("success", shades)
            .with_spacing("3xl", "4rem");
        let merged = merge_with_default_theme(&patch);

        assert_eq!(merged.name, "Fresh");
        assert_eq!(merged.colors.keys().last().map(String::as_str), Some("success"));
        assert_eq!(merged.spacing.keys().last().map(String::as_str), Some("3xl"));
        assert_eq!(merged.spacing.len(), default_theme().spacing.len() + 1);
    }

    #[test]
    fn test_typography_merges_per_entry() {
        let mut patch = ThemePatch::new();
        patch
            .typography
            .font_weight
            .insert("bold".to_string(), TokenValue::from(800_i64));
        patch
            .typography
            .font_family
            .insert("mono".to_string(), vec!["Fira Code".to_string()]);
        let merged = merge_with_default_theme(&patch);

        assert_eq!(merged.typography.font_weight["bold"], TokenValue::from(800_i64));
        assert_eq!(merged.typography.font_weight["light"], TokenValue::from(300_i64));
        assert_eq!(merged.typography.font_family["mono"], ["Fira Code"]);
        assert_eq!(
            merged.typography.font_family["sans"],
            default_theme().typography.font_family["sans"]
        );
    }

    #[test]
    fn test_pass_through_keys_survive() {
        let mut patch = ThemePatch::new();
        patch.extra.insert("version".to_string(), json!(2));
        let merged = merge_with_default_theme(&patch);
        assert_eq!(merged.extra["version"], json!(2));
    }

    #[test]
    fn test_merge_over_custom_base() {
        let base = Theme::new("Base");
        let merged = merge_theme(&base, &ThemePatch::new().with_radius("sm", "2px"));
        assert_eq!(merged.name, "Base");
        assert_eq!(merged.border_radius.len(), 1);
        assert!(merged.colors.is_empty());
    }
}
