//! Live theme state machine.
//!
//! [`ThemeManager`] owns the current theme of one [`StyleSurface`] and runs
//! every update through the same pipeline:
//!
//! ```text
//! JSON text -> classify -> (convert | validate) -> merge -> compile -> apply -> notify
//! ```
//!
//! Applying diffs the compiled variables against the values last written, so
//! re-applying an identical theme performs no surface writes. Animated updates
//! install a global transition rule and tear it down from a tokio timer task.
//! Each apply bumps a generation counter; a teardown timer only acts if its
//! generation is still the newest, so an earlier timer never ends a later
//! transition.
//!
//! # Example
//!
//! ```rust
//! use tincture::manager::{ThemeManager, UpdateOptions};
//! use tincture::surface::MemorySurface;
//!
//! let surface = MemorySurface::new();
//! let manager = ThemeManager::new(surface.clone());
//!
//! let ok = manager.update_theme_from_json(
//!     r##"{"name": "Ocean", "colors": {"primary": "#0ea5e9"}}"##,
//!     UpdateOptions::instant(),
//! );
//! assert!(ok);
//! assert_eq!(manager.state().current_theme.name, "Ocean");
//! assert_eq!(surface.property("--color-primary-500").as_deref(), Some("199 89% 48%"));
//! ```

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::css::{CssVariables, generate_css_string, generate_css_variables};
use crate::detect::{SimpleConversion, ThemeInput};
use crate::merge::merge_with_default_theme;
use crate::schema::ValidationError;
use crate::surface::StyleSurface;
use crate::theme::{Theme, ThemeError, ThemePatch, default_theme};

/// Default length of an animated transition.
pub const DEFAULT_ANIMATION_DURATION: Duration = Duration::from_millis(300);

/// Default quiet period of a debounced updater.
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

/// Properties animated while a transition rule is installed.
pub const TRANSITION_PROPERTIES: [&str; 11] = [
    "background-color",
    "border-color",
    "color",
    "fill",
    "stroke",
    "box-shadow",
    "border-radius",
    "font-size",
    "font-weight",
    "line-height",
    "letter-spacing",
];

/// The global transition rule installed for an animated update.
pub fn transition_rule(duration: Duration) -> String {
    format!(
        "*, *::before, *::after {{ transition-property: {}; transition-duration: {}ms; transition-timing-function: ease-in-out; }}",
        TRANSITION_PROPERTIES.join(", "),
        duration.as_millis()
    )
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Manager-wide defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManagerConfig {
    /// Whether updates animate unless told otherwise.
    pub animate: bool,
    #[serde(rename = "animationDurationMs", with = "duration_ms")]
    pub animation_duration: Duration,
    #[serde(rename = "debounceDelayMs", with = "duration_ms")]
    pub debounce_delay: Duration,
    /// Runtime for timer tasks. Defaults to the runtime the manager is built on.
    #[serde(skip)]
    pub runtime: Option<Handle>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            animate: true,
            animation_duration: DEFAULT_ANIMATION_DURATION,
            debounce_delay: DEFAULT_DEBOUNCE_DELAY,
            runtime: None,
        }
    }
}

impl ManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn animate(mut self, animate: bool) -> Self {
        self.animate = animate;
        self
    }

    pub fn animation_duration(mut self, duration: Duration) -> Self {
        self.animation_duration = duration;
        self
    }

    pub fn debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Per-call options matching these defaults.
    pub fn update_options(&self) -> UpdateOptions {
        UpdateOptions {
            animate: self.animate,
            animation_duration: self.animation_duration,
        }
    }
}

/// Per-update options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    pub animate: bool,
    pub animation_duration: Duration,
}

impl UpdateOptions {
    /// Apply without a transition.
    pub fn instant() -> Self {
        Self {
            animate: false,
            animation_duration: Duration::ZERO,
        }
    }

    /// Apply with a transition of the given length.
    pub fn animated(duration: Duration) -> Self {
        Self {
            animate: true,
            animation_duration: duration,
        }
    }
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self::animated(DEFAULT_ANIMATION_DURATION)
    }
}

/// Snapshot of the manager state handed to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeState {
    pub current_theme: Theme,
    /// The theme replaced by the last successful update; one level deep.
    pub previous_theme: Option<Theme>,
    /// False after a rejected update until the next successful one.
    pub is_valid: bool,
    /// Diagnostics of the last rejected update.
    pub errors: Vec<ValidationError>,
    /// Non-fatal diagnostics of the last successful update.
    pub warnings: Vec<String>,
    pub is_transitioning: bool,
}

impl ThemeState {
    fn initial() -> Self {
        Self {
            current_theme: default_theme(),
            previous_theme: None,
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            is_transitioning: false,
        }
    }
}

/// Identifier for a registered state listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener callback for state changes.
pub trait ThemeStateListener: Send + Sync {
    fn on_state_change(&self, state: &ThemeState);
}

impl<F> ThemeStateListener for F
where
    F: Fn(&ThemeState) + Send + Sync,
{
    fn on_state_change(&self, state: &ThemeState) {
        self(state);
    }
}

/// How an apply treats the history slot.
#[derive(Clone, Copy)]
enum History {
    /// Keep the replaced theme for rollback.
    Snapshot,
    /// Empty the slot (used by rollback itself).
    Clear,
}

struct Inner {
    surface: Box<dyn StyleSurface>,
    config: ManagerConfig,
    runtime: Option<Handle>,
    state: RwLock<ThemeState>,
    /// Last value written for every variable on the surface.
    applied: Mutex<CssVariables>,
    listeners: RwLock<IndexMap<ListenerId, Arc<dyn ThemeStateListener>>>,
    next_listener_id: AtomicU64,
    generation: AtomicU64,
    /// Parent token of every timer task; replaced on cleanup.
    cancel: Mutex<CancellationToken>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel.get_mut().cancel();
        if self.state.get_mut().is_transitioning {
            self.surface.remove_transition();
        }
    }
}

/// Handle to the theme of one surface. Clones share the same state.
#[derive(Clone)]
pub struct ThemeManager {
    inner: Arc<Inner>,
}

impl fmt::Debug for ThemeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("ThemeManager")
            .field("theme", &state.current_theme.name)
            .field("is_valid", &state.is_valid)
            .field("is_transitioning", &state.is_transitioning)
            .field("listeners", &self.inner.listeners.read().len())
            .field("generation", &self.inner.generation.load(Ordering::SeqCst))
            .finish()
    }
}

impl ThemeManager {
    /// Creates a manager with default configuration and applies the default theme.
    pub fn new(surface: impl StyleSurface + 'static) -> Self {
        Self::with_config(surface, ManagerConfig::default())
    }

    /// Creates a manager and applies the default theme without animation.
    pub fn with_config(surface: impl StyleSurface + 'static, config: ManagerConfig) -> Self {
        let runtime = config
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok());
        if runtime.is_none() {
            debug!("No tokio runtime, animated and debounced updates run immediately");
        }
        let manager = Self {
            inner: Arc::new(Inner {
                surface: Box::new(surface),
                config,
                runtime,
                state: RwLock::new(ThemeState::initial()),
                applied: Mutex::new(CssVariables::new()),
                listeners: RwLock::new(IndexMap::new()),
                next_listener_id: AtomicU64::new(1),
                generation: AtomicU64::new(0),
                cancel: Mutex::new(CancellationToken::new()),
            }),
        };
        let initial = generate_css_variables(&manager.inner.state.read().current_theme);
        manager.write_variables(&mut manager.inner.applied.lock(), &initial);
        manager
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ThemeState {
        self.inner.state.read().clone()
    }

    pub fn current_theme(&self) -> Theme {
        self.inner.state.read().current_theme.clone()
    }

    /// The current theme as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns `ThemeError` if serialization fails.
    pub fn export_theme(&self) -> Result<String, ThemeError> {
        self.inner.state.read().current_theme.to_json()
    }

    /// The current theme as a `:root` declaration block.
    pub fn export_css(&self) -> String {
        generate_css_string(&self.inner.state.read().current_theme)
    }

    /// Variables as last written to the surface.
    pub fn applied_variables(&self) -> CssVariables {
        self.inner.applied.lock().clone()
    }

    /// Parses, validates and applies a theme document.
    ///
    /// Returns false if the document was rejected; the current theme is then
    /// unchanged and the diagnostics are in [`ThemeState::errors`].
    pub fn update_theme_from_json(&self, json: &str, options: UpdateOptions) -> bool {
        match serde_json::from_str::<Value>(json) {
            Ok(value) => self.update_theme_from_value(&value, options),
            Err(err) => {
                self.reject(vec![ValidationError::invalid_json(&err)]);
                false
            }
        }
    }

    /// Same as [`update_theme_from_json`](Self::update_theme_from_json) for an
    /// already parsed document.
    pub fn update_theme_from_value(&self, value: &Value, options: UpdateOptions) -> bool {
        let input = ThemeInput::classify(value);
        debug!(theme.input = input.kind(), "Routing theme update");
        match input {
            ThemeInput::Canonical(theme) => {
                let merged = merge_with_default_theme(&ThemePatch::from(theme));
                self.commit(merged, Vec::new(), History::Snapshot, options)
            }
            ThemeInput::Simple(SimpleConversion { theme, warnings }) => {
                let merged = merge_with_default_theme(&ThemePatch::from(theme));
                self.commit(merged, warnings, History::Snapshot, options)
            }
            ThemeInput::Invalid(errors) => {
                self.reject(errors);
                false
            }
        }
    }

    /// Merges `patch` over the default theme and applies the result.
    pub fn update_theme(&self, patch: &ThemePatch, options: UpdateOptions) -> bool {
        self.commit(
            merge_with_default_theme(patch),
            Vec::new(),
            History::Snapshot,
            options,
        )
    }

    /// Restores the previous theme. Returns false if there is none.
    pub fn rollback(&self, options: UpdateOptions) -> bool {
        // The snapshot is read under the apply lock so a concurrent update or
        // rollback cannot slip in between the read and the commit.
        let applied = self.inner.applied.lock();
        let Some(previous) = self.inner.state.read().previous_theme.clone() else {
            debug!("Nothing to roll back");
            return false;
        };
        info!(theme.name = %previous.name, "Rolling back theme");
        self.commit_locked(applied, previous, Vec::new(), History::Clear, options)
    }

    /// Applies the built-in default theme.
    pub fn reset_to_default(&self, options: UpdateOptions) -> bool {
        self.update_theme(&ThemePatch::from(default_theme()), options)
    }

    /// Returns an updater that coalesces bursts of JSON updates.
    pub fn create_debounced_updater(&self, delay: Duration) -> DebouncedUpdater {
        DebouncedUpdater {
            manager: self.clone(),
            delay,
            pending: Arc::new(Mutex::new(None)),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A debounced updater using the configured delay.
    pub fn debounced_updater(&self) -> DebouncedUpdater {
        self.create_debounced_updater(self.inner.config.debounce_delay)
    }

    /// Registers a state listener. It stays registered until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ThemeState) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.write().insert(id, Arc::new(callback));
        debug!(theme.listener_id = id.0, "Theme listener registered");
        Subscription {
            inner: Arc::downgrade(&self.inner),
            id,
            active: true,
        }
    }

    /// Drops every listener and cancels pending timers.
    ///
    /// An installed transition rule is removed. The manager stays usable.
    pub fn cleanup(&self) {
        {
            let mut cancel = self.inner.cancel.lock();
            cancel.cancel();
            *cancel = CancellationToken::new();
        }
        let removed = {
            let mut listeners = self.inner.listeners.write();
            let count = listeners.len();
            listeners.clear();
            count
        };
        let mut state = self.inner.state.write();
        if state.is_transitioning {
            self.inner.surface.remove_transition();
            state.is_transitioning = false;
        }
        debug!(theme.listeners_removed = removed, "Theme manager cleaned up");
    }

    fn commit(
        &self,
        theme: Theme,
        warnings: Vec<String>,
        history: History,
        options: UpdateOptions,
    ) -> bool {
        let applied = self.inner.applied.lock();
        self.commit_locked(applied, theme, warnings, history, options)
    }

    /// Applies `theme` while holding the apply lock until the surface
    /// matches the new state.
    fn commit_locked(
        &self,
        mut applied: MutexGuard<'_, CssVariables>,
        theme: Theme,
        warnings: Vec<String>,
        history: History,
        options: UpdateOptions,
    ) -> bool {
        let vars = generate_css_variables(&theme);
        let animate = options.animate && !options.animation_duration.is_zero();
        if animate && self.inner.runtime.is_none() {
            debug!("No tokio runtime, applying without transition");
        }
        let animate = animate && self.inner.runtime.is_some();

        let generation = {
            let mut state = self.inner.state.write();
            let from = std::mem::replace(&mut state.current_theme, theme);
            info!(theme.from = %from.name, theme.to = %state.current_theme.name, "Theme switched");
            state.previous_theme = match history {
                History::Snapshot => Some(from),
                History::Clear => None,
            };
            state.is_valid = true;
            state.errors.clear();
            state.warnings = warnings;

            let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if animate {
                self.inner
                    .surface
                    .install_transition(&transition_rule(options.animation_duration));
                state.is_transitioning = true;
            } else if state.is_transitioning {
                self.inner.surface.remove_transition();
                state.is_transitioning = false;
            }
            generation
        };

        self.write_variables(&mut applied, &vars);
        drop(applied);
        if animate {
            self.schedule_teardown(generation, options.animation_duration);
        }
        self.notify();
        true
    }

    fn reject(&self, errors: Vec<ValidationError>) {
        debug!(
            theme.errors = errors.len(),
            theme.first_error = %errors.first().map(ToString::to_string).unwrap_or_default(),
            "Theme update rejected"
        );
        {
            let mut state = self.inner.state.write();
            state.is_valid = false;
            state.errors = errors;
        }
        self.notify();
    }

    /// Writes changed variables and removes ones no longer produced.
    fn write_variables(&self, applied: &mut CssVariables, vars: &CssVariables) {
        let surface = &self.inner.surface;
        let mut written = 0_usize;
        for (name, value) in vars {
            if applied.get(name) != Some(value) {
                surface.set_property(name, value);
                written += 1;
            }
        }
        let stale: Vec<String> = applied
            .keys()
            .filter(|name| !vars.contains_key(*name))
            .cloned()
            .collect();
        for name in &stale {
            surface.remove_property(name);
        }
        trace!(css.unchanged = vars.len() - written, "Style variable cache hits");
        debug!(
            css.written = written,
            css.removed = stale.len(),
            "Applied style variables"
        );
        *applied = vars.clone();
    }

    fn schedule_teardown(&self, generation: u64, duration: Duration) {
        let Some(runtime) = &self.inner.runtime else {
            return;
        };
        let token = self.inner.cancel.lock().clone();
        let weak = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    trace!(theme.generation = generation, "Transition teardown cancelled");
                }
                () = tokio::time::sleep(duration) => {
                    if let Some(inner) = weak.upgrade() {
                        ThemeManager { inner }.finish_transition(generation);
                    }
                }
            }
        });
        debug!(
            theme.generation = generation,
            theme.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "Scheduled transition teardown"
        );
    }

    fn finish_transition(&self, generation: u64) {
        {
            let mut state = self.inner.state.write();
            let current = self.inner.generation.load(Ordering::SeqCst);
            if current != generation || !state.is_transitioning {
                trace!(
                    theme.generation = generation,
                    theme.current_generation = current,
                    "Stale transition teardown ignored"
                );
                return;
            }
            self.inner.surface.remove_transition();
            state.is_transitioning = false;
        }
        debug!(theme.generation = generation, "Transition finished");
        self.notify();
    }

    fn notify(&self) {
        let listeners: Vec<(ListenerId, Arc<dyn ThemeStateListener>)> = self
            .inner
            .listeners
            .read()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();
        if listeners.is_empty() {
            return;
        }
        let snapshot = self.state();
        for (id, listener) in listeners {
            let result = catch_unwind(AssertUnwindSafe(|| listener.on_state_change(&snapshot)));
            if result.is_err() {
                warn!(
                    theme.listener_id = id.0,
                    theme.name = %snapshot.current_theme.name,
                    "Theme listener panicked"
                );
            }
        }
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    inner: Weak<Inner>,
    id: ListenerId,
    active: bool,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Removes the listener now.
    pub fn unsubscribe(mut self) {
        self.remove();
    }

    /// Keeps the listener registered until [`ThemeManager::cleanup`].
    pub fn detach(mut self) {
        self.active = false;
    }

    fn remove(&mut self) {
        if !std::mem::replace(&mut self.active, false) {
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            if inner.listeners.write().shift_remove(&self.id).is_some() {
                debug!(theme.listener_id = self.id.0, "Theme listener removed");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

struct PendingUpdate {
    json: String,
    options: UpdateOptions,
    sequence: u64,
    token: CancellationToken,
}

/// Coalesces bursts of JSON updates into one trailing update.
///
/// Every [`call`](Self::call) restarts the quiet period; only the last
/// document of a burst is applied. Without a runtime, calls apply at once.
#[derive(Clone)]
pub struct DebouncedUpdater {
    manager: ThemeManager,
    delay: Duration,
    pending: Arc<Mutex<Option<PendingUpdate>>>,
    sequence: Arc<AtomicU64>,
}

impl fmt::Debug for DebouncedUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedUpdater")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl DebouncedUpdater {
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `json` to be applied after the quiet period.
    pub fn call(&self, json: impl Into<String>, options: UpdateOptions) {
        let json = json.into();
        let Some(runtime) = self.manager.inner.runtime.clone() else {
            debug!("No tokio runtime, applying debounced update immediately");
            self.manager.update_theme_from_json(&json, options);
            return;
        };

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let token = self.manager.inner.cancel.lock().child_token();
        {
            let mut pending = self.pending.lock();
            if let Some(previous) = pending.replace(PendingUpdate {
                json,
                options,
                sequence,
                token: token.clone(),
            }) {
                previous.token.cancel();
                trace!(debounce.sequence = previous.sequence, "Debounced update superseded");
            }
        }

        let slot = Arc::downgrade(&self.pending);
        let manager = Arc::downgrade(&self.manager.inner);
        let delay = self.delay;
        runtime.spawn(async move {
            let fired = tokio::select! {
                () = token.cancelled() => false,
                () = tokio::time::sleep(delay) => true,
            };
            let Some(slot) = slot.upgrade() else { return };
            // A cancelled job still owns the slot after cleanup; release it.
            let job = take_if_current(&slot, sequence);
            if !fired {
                trace!(debounce.sequence = sequence, "Debounced update cancelled");
                return;
            }
            if let (Some(job), Some(inner)) = (job, manager.upgrade()) {
                ThemeManager { inner }.update_theme_from_json(&job.json, job.options);
            }
        });
        debug!(
            debounce.sequence = sequence,
            debounce.delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Debounced update scheduled"
        );
    }

    /// Applies the pending update now. Returns its result, or `None` if
    /// nothing was pending.
    pub fn flush(&self) -> Option<bool> {
        let job = self.take_live()?;
        job.token.cancel();
        Some(self.manager.update_theme_from_json(&job.json, job.options))
    }

    /// Discards the pending update. Returns true if one was pending.
    pub fn cancel(&self) -> bool {
        self.take_live().map(|job| job.token.cancel()).is_some()
    }

    /// False once the update ran, was cancelled, or the manager was cleaned up.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|job| !job.token.is_cancelled())
    }

    /// Empties the slot, returning the job only if its token is still live.
    fn take_live(&self) -> Option<PendingUpdate> {
        self.pending
            .lock()
            .take()
            .filter(|job| !job.token.is_cancelled())
    }
}

fn take_if_current(slot: &Mutex<Option<PendingUpdate>>, sequence: u64) -> Option<PendingUpdate> {
    let mut pending = slot.lock();
    if pending.as_ref().is_some_and(|job| job.sequence == sequence) {
        pending.take()
    } else {
        None
    }
}
