//! Integration tests for the preload scheduler.
//!
//! These tests verify the debounce/cancel timing behavior:
//! - A repeated hover coalesces into one load, fired after the last hover
//! - Cancelling before the debounce elapses yields zero loads
//! - Teardown clears every pending timer
//!
//! Run with: `cargo test --test preload_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashload::config::PreloadConfig;
use dashload::error::PreloadError;
use dashload::preload::{PanelLoader, PreloadEntry, PreloadScheduler, PreloadState};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Loader that records each invocation's timestamp.
fn timestamped_loader(timestamps: Arc<Mutex<Vec<Instant>>>) -> PanelLoader {
    Arc::new(move || {
        timestamps.lock().unwrap().push(Instant::now());
        Box::pin(async { Ok(()) })
    })
}

/// Loader that counts invocations.
fn counting_loader(counter: Arc<AtomicUsize>) -> PanelLoader {
    Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    })
}

/// Loader that sleeps before succeeding.
fn slow_loader(delay: Duration, counter: Arc<AtomicUsize>) -> PanelLoader {
    Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Ok(())
        })
    })
}

fn test_scheduler(debounce: Duration) -> Arc<PreloadScheduler> {
    PreloadScheduler::new(PreloadConfig::default().with_hover_debounce(debounce))
}

// ============================================================================
// Hover debounce
// ============================================================================

#[tokio::test]
async fn repeated_hover_coalesces_into_one_load() {
    let scheduler = test_scheduler(Duration::from_millis(60));
    let timestamps = Arc::new(Mutex::new(Vec::new()));
    scheduler.register(
        PreloadEntry::new("financial", 1),
        timestamped_loader(Arc::clone(&timestamps)),
    );

    scheduler.preload_on_hover("financial");
    tokio::time::sleep(Duration::from_millis(30)).await;
    // Second hover inside the window resets the timer
    let second_hover = Instant::now();
    scheduler.preload_on_hover("financial");

    tokio::time::sleep(Duration::from_millis(150)).await;

    let timestamps = timestamps.lock().unwrap();
    assert_eq!(timestamps.len(), 1, "exactly one load should fire");
    // The load fired roughly one debounce window after the second hover
    let fired_after = timestamps[0].duration_since(second_hover);
    assert!(
        fired_after >= Duration::from_millis(55),
        "fired only {:?} after the second hover",
        fired_after
    );
    assert_eq!(scheduler.stats().debounce_resets, 1);
    assert!(scheduler.is_loaded("financial"));
}

#[tokio::test]
async fn hover_for_different_panels_do_not_interfere() {
    let scheduler = test_scheduler(Duration::from_millis(30));
    let financial = Arc::new(AtomicUsize::new(0));
    let clients = Arc::new(AtomicUsize::new(0));
    scheduler.register(PreloadEntry::new("financial", 1), counting_loader(Arc::clone(&financial)));
    scheduler.register(PreloadEntry::new("clients", 2), counting_loader(Arc::clone(&clients)));

    scheduler.preload_on_hover("financial");
    scheduler.preload_on_hover("clients");

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(financial.load(Ordering::SeqCst), 1);
    assert_eq!(clients.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.stats().debounce_resets, 0);
}

#[tokio::test]
async fn hover_for_unregistered_panel_is_harmless() {
    let scheduler = test_scheduler(Duration::from_millis(20));

    scheduler.preload_on_hover("ghost");
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert!(scheduler.record("ghost").is_none());
    assert_eq!(scheduler.stats().loads_triggered, 0);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn cancel_before_debounce_elapses_prevents_load() {
    let scheduler = test_scheduler(Duration::from_millis(60));
    let counter = Arc::new(AtomicUsize::new(0));
    scheduler.register(PreloadEntry::new("financial", 1), counting_loader(Arc::clone(&counter)));

    scheduler.preload_on_hover("financial");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(scheduler.cancel_preload("financial"));

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_eq!(counter.load(Ordering::SeqCst), 0);
    assert!(scheduler.record("financial").is_none());
    assert_eq!(scheduler.stats().timers_cancelled, 1);
    assert_eq!(scheduler.pending_timer_count(), 0);
}

#[tokio::test]
async fn cancel_does_not_abort_inflight_load() {
    let scheduler = test_scheduler(Duration::from_millis(10));
    let counter = Arc::new(AtomicUsize::new(0));
    scheduler.register(
        PreloadEntry::new("financial", 1),
        slow_loader(Duration::from_millis(50), Arc::clone(&counter)),
    );

    scheduler.preload_on_hover("financial");
    // Let the timer fire and the load start
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    // The timer is gone; cancel is a no-op and the load still settles
    assert!(!scheduler.cancel_preload("financial"));
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(scheduler.is_loaded("financial"));
}

#[tokio::test]
async fn teardown_clears_all_pending_timers() {
    let scheduler = test_scheduler(Duration::from_millis(40));
    let financial = Arc::new(AtomicUsize::new(0));
    let clients = Arc::new(AtomicUsize::new(0));
    scheduler.register(PreloadEntry::new("financial", 1), counting_loader(Arc::clone(&financial)));
    scheduler.register(PreloadEntry::new("clients", 2), counting_loader(Arc::clone(&clients)));

    scheduler.preload_on_hover("financial");
    scheduler.preload_on_hover("clients");
    assert_eq!(scheduler.pending_timer_count(), 2);

    scheduler.teardown();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(financial.load(Ordering::SeqCst), 0);
    assert_eq!(clients.load(Ordering::SeqCst), 0);
    assert_eq!(scheduler.pending_timer_count(), 0);
}

// ============================================================================
// Eager preloading
// ============================================================================

#[tokio::test]
async fn eager_pass_loads_top_priorities_and_records_duration() {
    let scheduler = PreloadScheduler::new(
        PreloadConfig::default()
            .with_eager_count(2)
            .with_hover_debounce(Duration::from_millis(20)),
    );
    let loaded = Arc::new(AtomicUsize::new(0));
    let skipped = Arc::new(AtomicUsize::new(0));

    scheduler.register(PreloadEntry::new("settings", 9), counting_loader(Arc::clone(&skipped)));
    scheduler.register(PreloadEntry::new("financial", 1), counting_loader(Arc::clone(&loaded)));
    scheduler.register(PreloadEntry::new("clients", 2), counting_loader(Arc::clone(&loaded)));
    scheduler.register(PreloadEntry::new("reports", 5), counting_loader(Arc::clone(&skipped)));

    let triggered = scheduler.preload_high_priority();
    assert_eq!(triggered, 2);

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(loaded.load(Ordering::SeqCst), 2);
    assert_eq!(skipped.load(Ordering::SeqCst), 0);

    let record = scheduler.record("financial").unwrap();
    assert_eq!(record.state, PreloadState::Loaded);
    assert!(record.duration.is_some());
    assert!(scheduler.record("settings").is_none());
}

#[tokio::test]
async fn hover_and_eager_share_one_inflight_load() {
    let scheduler = PreloadScheduler::new(
        PreloadConfig::default()
            .with_eager_count(1)
            .with_hover_debounce(Duration::from_millis(10)),
    );
    let counter = Arc::new(AtomicUsize::new(0));
    scheduler.register(
        PreloadEntry::new("financial", 1),
        slow_loader(Duration::from_millis(60), Arc::clone(&counter)),
    );

    scheduler.preload_high_priority();
    scheduler.preload_on_hover("financial");

    tokio::time::sleep(Duration::from_millis(120)).await;

    // The hover timer fired while the eager load was in flight; the
    // in-flight guard kept it to a single execution
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(scheduler.is_loaded("financial"));
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn preload_failure_stays_silent_and_recorded() {
    let scheduler = test_scheduler(Duration::from_millis(10));
    scheduler.register(
        PreloadEntry::new("financial", 1),
        Arc::new(|| Box::pin(async { Err(PreloadError("dynamic import failed".to_string())) })),
    );

    scheduler.preload_on_hover("financial");
    tokio::time::sleep(Duration::from_millis(50)).await;

    let record = scheduler.record("financial").unwrap();
    assert_eq!(record.state, PreloadState::Error);
    assert_eq!(
        record.error.as_deref(),
        Some("preload failed: dynamic import failed")
    );
    assert_eq!(scheduler.stats().loads_failed, 1);
}
