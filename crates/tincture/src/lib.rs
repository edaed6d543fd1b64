#![forbid(unsafe_code)]
// Allow these clippy lints for API ergonomics and color math
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::use_self)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::new_without_default)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::significant_drop_tightening)]

//! # Tincture
//!
//! Live design-token theming: turn a loosely structured JSON theme into a
//! canonical token tree and a flat set of CSS custom properties, then keep a
//! rendering surface in sync with it.
//!
//! Tincture is organized leaves first:
//! - **Colors**: validation and conversion of hex, `rgb()`, `rgba()`, `hsl()`,
//!   `hsla()` and named colors ([`color`])
//! - **Scales**: ten-shade tonal families from one base color ([`scale`])
//! - **Input shapes**: simple flat tokens vs. the canonical schema ([`detect`], [`schema`])
//! - **Merging** over the built-in default theme ([`merge`])
//! - **Compilation** to style variables ([`css`])
//! - **Live state**: validation errors, rollback, animated transitions and
//!   debounced updates ([`manager`])
//!
//! ## Quick Start
//!
//! ```rust
//! use tincture::{ThemeManager, MemorySurface, UpdateOptions};
//!
//! let surface = MemorySurface::new();
//! let manager = ThemeManager::new(surface.clone());
//!
//! assert!(manager.update_theme_from_json(
//!     r##"{"name": "T", "colors": {"primary": "#3B82F6"}}"##,
//!     UpdateOptions::instant(),
//! ));
//! assert_eq!(
//!     manager.state().current_theme.colors["primary"]["500"],
//!     "hsl(217 91% 60%)"
//! );
//! assert_eq!(surface.property("--color-primary-500").as_deref(), Some("217 91% 60%"));
//! ```
//!
//! ## Rejected input
//!
//! Invalid documents never replace the current theme:
//!
//! ```rust
//! use tincture::{ThemeManager, MemorySurface, UpdateOptions, ValidationCode};
//!
//! let manager = ThemeManager::new(MemorySurface::new());
//! assert!(!manager.update_theme_from_json("{not valid json", UpdateOptions::instant()));
//!
//! let state = manager.state();
//! assert!(!state.is_valid);
//! assert_eq!(state.errors[0].code, ValidationCode::InvalidJson);
//! assert_eq!(state.current_theme.name, "Default");
//! ```
//!
//! ## Compiling without a manager
//!
//! ```rust
//! use tincture::{default_theme, generate_css_variables};
//!
//! let vars = generate_css_variables(&default_theme());
//! assert_eq!(vars["--spacing-md"], "1rem");
//! ```

pub mod color;
pub mod css;
pub mod detect;
pub mod manager;
pub mod merge;
pub mod scale;
pub mod schema;
pub mod surface;
pub mod theme;

// Re-exports
pub use color::{
    ColorError, ColorSyntax, Hsl, color_to_hsl_variable, hex_to_hsl, is_valid_color, rgb_to_hsl,
};
pub use css::{CssVariables, generate_css_string, generate_css_variables};
pub use detect::{SimpleConversion, ThemeInput, convert_simple_json_to_theme, is_simple_json_format};
pub use manager::{
    DebouncedUpdater, ListenerId, ManagerConfig, Subscription, ThemeManager, ThemeState,
    ThemeStateListener, UpdateOptions,
};
pub use merge::{merge_theme, merge_with_default_theme};
pub use scale::{generate_color_scale, try_generate_color_scale};
pub use schema::{ValidationCode, ValidationError, validate_theme};
pub use surface::{MemorySurface, StyleSurface};
pub use theme::{
    ColorFamily, Theme, ThemeError, ThemeFormat, ThemePatch, TokenMap, TokenValue, Typography,
    default_theme,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::color::{Hsl, is_valid_color};
    pub use crate::css::{CssVariables, generate_css_variables};
    pub use crate::manager::{ManagerConfig, Subscription, ThemeManager, ThemeState, UpdateOptions};
    pub use crate::scale::generate_color_scale;
    pub use crate::schema::{ValidationCode, ValidationError};
    pub use crate::surface::{MemorySurface, StyleSurface};
    pub use crate::theme::{Theme, ThemePatch, default_theme};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_scenario_end_to_end() {
        let surface = MemorySurface::new();
        let manager = ThemeManager::new(surface.clone());
        assert!(manager.update_theme_from_json(
            r##"{"name":"T","colors":{"primary":"#3B82F6"}}"##,
            UpdateOptions::instant()
        ));

        let state = manager.state();
        assert_eq!(state.current_theme.name, "T");
        assert_eq!(state.current_theme.colors["primary"]["500"], "hsl(217 91% 60%)");
        assert_eq!(
            state.current_theme.colors["secondary"],
            default_theme().colors["secondary"]
        );
        assert_eq!(surface.properties().len(), 78);
    }

    #[test]
    fn test_canonical_partial_is_completed() {
        let manager = ThemeManager::new(MemorySurface::new());
        assert!(manager.update_theme_from_json(
            r##"{"name":"Mono","colors":{"primary":{"500":"#000000"}}}"##,
            UpdateOptions::instant()
        ));
        let theme = manager.current_theme();
        assert_eq!(theme.colors["primary"]["500"], "#000000");
        assert_eq!(theme.colors["primary"]["50"], "#eff6ff");
        assert_eq!(theme.token_count(), 78);
    }
}
