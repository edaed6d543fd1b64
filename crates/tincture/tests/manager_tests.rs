//! Timer-driven behavior of `ThemeManager`, run on paused tokio time.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tincture::{
    ManagerConfig, MemorySurface, Subscription, ThemeManager, ThemePatch, ThemeState,
    UpdateOptions, ValidationCode, default_theme, generate_css_variables,
};
use tokio::time::sleep;

const ANIMATION: Duration = Duration::from_millis(300);

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn setup() -> (ThemeManager, MemorySurface) {
    let surface = MemorySurface::new();
    (ThemeManager::new(surface.clone()), surface)
}

fn record(manager: &ThemeManager) -> (Subscription, Arc<Mutex<Vec<ThemeState>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = manager.subscribe(move |state| sink.lock().push(state.clone()));
    (subscription, seen)
}

fn named(name: &str) -> ThemePatch {
    ThemePatch::new().with_name(name)
}

fn simple_json(name: &str, primary: &str) -> String {
    format!(r#"{{"name": "{name}", "colors": {{"primary": "{primary}"}}}}"#)
}

// =============================================================================
// Animated transitions
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_animated_update_tears_down_transition() {
    let (manager, surface) = setup();
    let (_sub, seen) = record(&manager);

    assert!(manager.update_theme(&named("Anim"), UpdateOptions::animated(ANIMATION)));
    assert!(manager.state().is_transitioning);
    let rule = surface.transition().expect("transition installed");
    assert!(rule.contains("transition-duration: 300ms"));

    sleep(ms(299)).await;
    assert!(manager.state().is_transitioning);

    sleep(ms(2)).await;
    assert!(!manager.state().is_transitioning);
    assert!(surface.transition().is_none());

    let flags: Vec<bool> = seen.lock().iter().map(|s| s.is_transitioning).collect();
    assert_eq!(flags, vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn test_earlier_timer_does_not_end_later_transition() {
    let (manager, surface) = setup();

    manager.update_theme(&named("A"), UpdateOptions::animated(ANIMATION));
    sleep(ms(200)).await;
    manager.update_theme(&named("B"), UpdateOptions::animated(ANIMATION));

    // A's teardown fires at 300ms and must be ignored.
    sleep(ms(150)).await;
    assert!(manager.state().is_transitioning);
    assert!(surface.transition().is_some());

    sleep(ms(200)).await;
    assert!(!manager.state().is_transitioning);
    assert!(surface.transition().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_instant_update_ends_running_transition() {
    let (manager, surface) = setup();
    let (_sub, seen) = record(&manager);

    manager.update_theme(&named("A"), UpdateOptions::animated(ANIMATION));
    manager.update_theme(&named("B"), UpdateOptions::instant());
    assert!(!manager.state().is_transitioning);
    assert!(surface.transition().is_none());

    sleep(ms(500)).await;
    // The stale teardown neither notifies nor reinstalls anything.
    assert_eq!(seen.lock().len(), 2);
    assert_eq!(manager.state().current_theme.name, "B");
}

#[tokio::test(start_paused = true)]
async fn test_zero_duration_is_instant() {
    let (manager, surface) = setup();
    manager.update_theme(&named("Z"), UpdateOptions::animated(Duration::ZERO));
    assert!(!manager.state().is_transitioning);
    assert!(surface.transition().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_cleanup_cancels_teardown() {
    let (manager, surface) = setup();
    let (_sub, seen) = record(&manager);

    manager.update_theme(&named("A"), UpdateOptions::animated(ANIMATION));
    manager.cleanup();
    assert!(!manager.state().is_transitioning);
    assert!(surface.transition().is_none());

    sleep(ms(500)).await;
    assert_eq!(seen.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_manager_with_pending_timer() {
    let (manager, surface) = setup();
    manager.update_theme(&named("Gone"), UpdateOptions::animated(ANIMATION));
    drop(manager);
    assert!(surface.transition().is_none());

    sleep(ms(500)).await;
    assert!(surface.transition().is_none());
}

#[test]
fn test_explicit_runtime_handle_drives_timers() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("build runtime");
    let surface = MemorySurface::new();
    let config = ManagerConfig::new()
        .animation_duration(ms(100))
        .runtime(runtime.handle().clone());
    let manager = ThemeManager::with_config(surface.clone(), config);

    let options = manager.config().update_options();
    manager.update_theme(&named("Handle"), options);
    assert!(manager.state().is_transitioning);

    runtime.block_on(async { sleep(ms(150)).await });
    assert!(!manager.state().is_transitioning);
    assert!(surface.transition().is_none());
}

// =============================================================================
// Debounced updates
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_debounced_burst_applies_once() {
    let (manager, _surface) = setup();
    let (_sub, seen) = record(&manager);
    let updater = manager.create_debounced_updater(ms(300));

    updater.call(simple_json("One", "#ef4444"), UpdateOptions::instant());
    sleep(ms(100)).await;
    updater.call(simple_json("Two", "#22c55e"), UpdateOptions::instant());
    sleep(ms(100)).await;
    updater.call(simple_json("Three", "#3b82f6"), UpdateOptions::instant());
    assert!(updater.is_pending());

    sleep(ms(299)).await;
    assert_eq!(manager.state().current_theme.name, "Default");
    assert!(seen.lock().is_empty());

    sleep(ms(2)).await;
    assert_eq!(manager.state().current_theme.name, "Three");
    assert_eq!(seen.lock().len(), 1);
    assert!(!updater.is_pending());

    sleep(ms(1000)).await;
    assert_eq!(seen.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_debounced_flush_applies_now() {
    let (manager, _surface) = setup();
    let updater = manager.debounced_updater();
    assert_eq!(updater.delay(), ms(300));
    assert_eq!(updater.flush(), None);

    updater.call(simple_json("Flushed", "#000000"), UpdateOptions::instant());
    assert_eq!(updater.flush(), Some(true));
    assert_eq!(manager.state().current_theme.name, "Flushed");

    manager.update_theme(&named("After"), UpdateOptions::instant());
    sleep(ms(1000)).await;
    assert_eq!(manager.state().current_theme.name, "After");
}

#[tokio::test(start_paused = true)]
async fn test_debounced_cancel_discards() {
    let (manager, _surface) = setup();
    let updater = manager.create_debounced_updater(ms(50));

    updater.call(simple_json("Never", "#000000"), UpdateOptions::instant());
    assert!(updater.cancel());
    assert!(!updater.cancel());

    sleep(ms(200)).await;
    assert_eq!(manager.state().current_theme.name, "Default");
}

#[tokio::test(start_paused = true)]
async fn test_debounced_invalid_json_is_reported() {
    let (manager, _surface) = setup();
    let (_sub, seen) = record(&manager);
    let updater = manager.create_debounced_updater(ms(50));

    updater.call("{\"name\": ", UpdateOptions::instant());
    sleep(ms(100)).await;

    let states = seen.lock();
    assert_eq!(states.len(), 1);
    assert!(!states[0].is_valid);
    assert_eq!(states[0].errors[0].code, ValidationCode::InvalidJson);
}

#[tokio::test(start_paused = true)]
async fn test_cleanup_cancels_debounce() {
    let (manager, _surface) = setup();
    let updater = manager.create_debounced_updater(ms(50));

    updater.call(simple_json("Late", "#000000"), UpdateOptions::instant());
    manager.cleanup();
    assert!(!updater.is_pending());

    sleep(ms(200)).await;
    assert!(!updater.is_pending());
    assert_eq!(updater.flush(), None);
    assert!(!updater.cancel());
    assert_eq!(manager.state().current_theme.name, "Default");
}

#[tokio::test(start_paused = true)]
async fn test_flush_after_cleanup_discards_update() {
    let (manager, _surface) = setup();
    let updater = manager.create_debounced_updater(ms(50));

    updater.call(simple_json("Discarded", "#000000"), UpdateOptions::instant());
    manager.cleanup();
    assert_eq!(updater.flush(), None);
    assert_eq!(manager.state().current_theme.name, "Default");

    // The updater keeps working against the fresh token.
    updater.call(simple_json("Fresh", "#000000"), UpdateOptions::instant());
    assert!(updater.is_pending());
    sleep(ms(100)).await;
    assert_eq!(manager.state().current_theme.name, "Fresh");
}

// =============================================================================
// Apply path
// =============================================================================

#[tokio::test]
async fn test_reapplying_snapshot_writes_nothing() {
    let (manager, surface) = setup();
    manager.update_theme_from_json(&simple_json("Snap", "#8b5cf6"), UpdateOptions::instant());
    let snapshot = ThemePatch::from(manager.current_theme());

    manager.update_theme(&snapshot, UpdateOptions::instant());
    let applied = manager.applied_variables();
    surface.reset_counts();

    manager.update_theme(&snapshot, UpdateOptions::instant());
    assert_eq!(surface.write_count(), 0);
    assert_eq!(surface.removal_count(), 0);
    assert_eq!(manager.applied_variables(), applied);
}

#[tokio::test]
async fn test_rejected_update_notifies_and_keeps_surface() {
    let (manager, surface) = setup();
    let (_sub, seen) = record(&manager);
    let before = surface.properties();

    assert!(!manager.update_theme_from_json(
        r#"{"name": "Bad", "colors": {"primary": {"500": "not-a-color"}}}"#,
        UpdateOptions::default()
    ));

    let states = seen.lock();
    assert_eq!(states.len(), 1);
    assert!(!states[0].is_valid);
    assert_eq!(states[0].errors[0].code, ValidationCode::Custom);
    assert_eq!(states[0].current_theme, default_theme());
    assert_eq!(surface.properties(), before);
}

#[tokio::test]
async fn test_edited_export_with_bad_shade_is_rejected() {
    let (manager, surface) = setup();
    let before = surface.properties();
    let mut document: serde_json::Value =
        serde_json::from_str(&manager.export_theme().expect("export theme")).expect("reparse");
    document["colors"]["primary"]["500"] = serde_json::json!("nope");

    assert!(!manager.update_theme_from_json(&document.to_string(), UpdateOptions::instant()));
    let state = manager.state();
    assert!(!state.is_valid);
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors[0].code, ValidationCode::Custom);
    assert_eq!(state.errors[0].dotted_path(), "colors.primary.500");
    assert!(state.warnings.is_empty());
    assert_eq!(state.current_theme, default_theme());
    assert_eq!(surface.properties(), before);
}

#[tokio::test]
async fn test_unnamed_shade_map_document_is_rejected() {
    let (manager, _surface) = setup();
    assert!(!manager.update_theme_from_json(
        r##"{"colors": {"accent": {"500": "#ffffff"}}}"##,
        UpdateOptions::instant()
    ));
    let state = manager.state();
    assert_eq!(state.errors[0].dotted_path(), "name");
    assert_eq!(state.errors[0].code, ValidationCode::InvalidType);
}

#[tokio::test]
async fn test_simple_update_records_warnings() {
    let (manager, _surface) = setup();
    assert!(manager.update_theme_from_json(
        r##"{"colors": {"primaryDark": "#1e3a8a", "ring": "#f43f5e"}}"##,
        UpdateOptions::instant()
    ));
    let state = manager.state();
    assert_eq!(state.warnings.len(), 1);
    assert!(state.warnings[0].contains("colors.ring"));

    manager.reset_to_default(UpdateOptions::instant());
    assert!(manager.state().warnings.is_empty());
}

#[tokio::test]
async fn test_export_reloads_to_same_theme() {
    let (manager, _surface) = setup();
    manager.update_theme_from_json(&simple_json("Export", "#0ea5e9"), UpdateOptions::instant());
    let exported = manager.export_theme().expect("export theme");

    let (other, _surface) = setup();
    assert!(other.update_theme_from_json(&exported, UpdateOptions::instant()));
    assert_eq!(other.current_theme(), manager.current_theme());
    assert_eq!(other.export_css(), manager.export_css());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_leave_consistent_state() {
    let (manager, surface) = setup();
    let mut tasks = Vec::new();
    for i in 0..16_u8 {
        let manager = manager.clone();
        tasks.push(tokio::spawn(async move {
            let color = format!("#{:02x}{:02x}{:02x}", i * 15, 255 - i * 15, 128);
            manager.update_theme(
                &ThemePatch::new().with_name(format!("T{i}")).with_color("primary", "500", color),
                UpdateOptions::instant(),
            )
        }));
    }
    for task in tasks {
        assert!(task.await.expect("update task"));
    }

    let state = manager.state();
    assert!(state.is_valid);
    let expected = generate_css_variables(&state.current_theme);
    assert_eq!(manager.applied_variables(), expected);
    assert_eq!(surface.properties().len(), expected.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rollbacks_restore_once() {
    let (manager, surface) = setup();
    manager.update_theme(&named("A"), UpdateOptions::instant());
    manager.update_theme(
        &named("B").with_color("primary", "500", "#000000"),
        UpdateOptions::instant(),
    );

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let manager = manager.clone();
        tasks.push(tokio::spawn(async move { manager.rollback(UpdateOptions::instant()) }));
    }
    let mut restored = 0;
    for task in tasks {
        if task.await.expect("rollback task") {
            restored += 1;
        }
    }

    assert_eq!(restored, 1);
    let state = manager.state();
    assert_eq!(state.current_theme.name, "A");
    assert!(state.previous_theme.is_none());
    assert_eq!(surface.property("--color-primary-500").as_deref(), Some("217 91% 60%"));
}
