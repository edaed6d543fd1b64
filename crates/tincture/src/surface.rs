//! Rendering surface abstraction.
//!
//! A [`StyleSurface`] is whatever holds the live style variables: a DOM root
//! element, a native style sheet, a terminal palette. The manager only ever
//! sets and removes single properties and toggles one global transition rule.
//!
//! # Example
//!
//! ```rust
//! use tincture::surface::{MemorySurface, StyleSurface};
//!
//! let surface = MemorySurface::new();
//! surface.set_property("--color-primary-500", "217 91% 60%");
//! assert_eq!(surface.property("--color-primary-500").as_deref(), Some("217 91% 60%"));
//! assert_eq!(surface.write_count(), 1);
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

/// Target for style-variable writes.
///
/// Implementations use interior mutability; the manager shares one surface
/// between its update path and its timer tasks.
pub trait StyleSurface: Send + Sync {
    /// Set a style variable on the surface root.
    fn set_property(&self, name: &str, value: &str);

    /// Remove a style variable from the surface root.
    fn remove_property(&self, name: &str);

    /// Install the global transition rule, replacing any installed one.
    fn install_transition(&self, rule: &str);

    /// Remove the global transition rule if installed.
    fn remove_transition(&self);
}

impl<S: StyleSurface + ?Sized> StyleSurface for Arc<S> {
    fn set_property(&self, name: &str, value: &str) {
        (**self).set_property(name, value);
    }

    fn remove_property(&self, name: &str) {
        (**self).remove_property(name);
    }

    fn install_transition(&self, rule: &str) {
        (**self).install_transition(rule);
    }

    fn remove_transition(&self) {
        (**self).remove_transition();
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    properties: IndexMap<String, String>,
    transition: Option<String>,
    writes: usize,
    removals: usize,
}

/// In-memory surface. Clones share the same state.
#[derive(Clone, Default)]
pub struct MemorySurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a property.
    pub fn property(&self, name: &str) -> Option<String> {
        self.state.lock().properties.get(name).cloned()
    }

    /// Snapshot of every property, in first-write order.
    pub fn properties(&self) -> IndexMap<String, String> {
        self.state.lock().properties.clone()
    }

    /// The installed transition rule.
    pub fn transition(&self) -> Option<String> {
        self.state.lock().transition.clone()
    }

    /// Number of `set_property` calls so far.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    /// Number of `remove_property` calls so far.
    pub fn removal_count(&self) -> usize {
        self.state.lock().removals
    }

    /// Resets the write and removal counters.
    pub fn reset_counts(&self) {
        let mut state = self.state.lock();
        state.writes = 0;
        state.removals = 0;
    }

    /// Renders the properties as a `:root` declaration block.
    pub fn to_css_string(&self) -> String {
        let state = self.state.lock();
        state
            .properties
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect::<crate::css::CssVariables>()
            .to_css_string()
    }
}

impl StyleSurface for MemorySurface {
    fn set_property(&self, name: &str, value: &str) {
        let mut state = self.state.lock();
        state.writes += 1;
        state.properties.insert(name.to_string(), value.to_string());
    }

    fn remove_property(&self, name: &str) {
        let mut state = self.state.lock();
        state.removals += 1;
        state.properties.shift_remove(name);
    }

    fn install_transition(&self, rule: &str) {
        self.state.lock().transition = Some(rule.to_string());
    }

    fn remove_transition(&self) {
        self.state.lock().transition = None;
    }
}

impl fmt::Debug for MemorySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemorySurface")
            .field("properties", &state.properties.len())
            .field("transition", &state.transition.is_some())
            .field("writes", &state.writes)
            .finish()
    }
}
