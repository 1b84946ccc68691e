use std::time::Duration;

use course_core::model::UserProgressionPartial;
use course_core::time::fixed_clock;
use remote::{ActivityRecord, InMemoryBackend, Operation, Remote};
use services::{AppServices, MergeOutcome, ProgressionConfig, ProgressionEvent};
use tokio::time::sleep;

fn services(backend: &InMemoryBackend) -> AppServices {
    AppServices::new(
        Remote::in_memory(backend.clone()),
        fixed_clock(),
        ProgressionConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn refreshes_on_interval_until_disposed() {
    let backend = InMemoryBackend::new(fixed_clock()).with_total_xp(600);
    let services = services(&backend);

    services.start();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.calls().fetch_progression, 1);
    assert_eq!(services.tracker().snapshot().total_xp, 600);

    sleep(Duration::from_secs(120)).await;
    assert_eq!(backend.calls().fetch_progression, 2);

    sleep(Duration::from_secs(240)).await;
    assert_eq!(backend.calls().fetch_progression, 4);

    services.dispose();
    sleep(Duration::from_secs(600)).await;
    assert_eq!(backend.calls().fetch_progression, 4);
}

#[tokio::test(start_paused = true)]
async fn starting_twice_keeps_one_timer() {
    let backend = InMemoryBackend::new(fixed_clock());
    let services = services(&backend);

    services.start();
    services.start();
    sleep(Duration::from_secs(121)).await;
    assert_eq!(backend.calls().fetch_progression, 2);
    services.dispose();
}

#[tokio::test(start_paused = true)]
async fn background_level_jump_emits_single_event() {
    let backend = InMemoryBackend::new(fixed_clock()).with_total_xp(100);
    let services = services(&backend);
    let tracker = services.tracker();
    let mut events = tracker.subscribe();

    services.start();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(tracker.snapshot().level, 1);

    // 1700 XP is level 4.
    backend.set_total_xp(1700);
    sleep(Duration::from_secs(120)).await;

    assert_eq!(events.try_recv().unwrap(), ProgressionEvent::LevelUp(4));
    assert!(events.try_recv().is_err());
    assert_eq!(tracker.snapshot().level, 4);
    assert_eq!(tracker.pending_level_up(), Some(4));
    assert_eq!(backend.activity(), vec![ActivityRecord::LevelUp { level: 4 }]);
    services.dispose();
}

#[tokio::test(start_paused = true)]
async fn failing_refresh_keeps_last_good_state() {
    let backend = InMemoryBackend::new(fixed_clock()).with_total_xp(1075);
    let services = services(&backend);
    let tracker = services.tracker();

    services.start();
    sleep(Duration::from_secs(1)).await;
    let good = tracker.snapshot();
    assert_eq!(good.level, 3);

    backend.set_failing(Operation::FetchProgression, true);
    sleep(Duration::from_secs(120)).await;
    assert!(tracker.error().is_some());
    assert_eq!(tracker.snapshot(), good);

    backend.set_failing(Operation::FetchProgression, false);
    sleep(Duration::from_secs(120)).await;
    assert!(tracker.error().is_none());
    services.dispose();
}

#[tokio::test]
async fn slow_response_cannot_clobber_newer_refresh() {
    let backend = InMemoryBackend::new(fixed_clock()).with_total_xp(1075);
    let services = services(&backend);
    let tracker = services.tracker();

    // Issued first, answered last.
    let slow = tracker.next_sequence();
    tracker.refresh().await.unwrap();

    let stale = UserProgressionPartial {
        level: Some(1),
        total_xp: Some(10),
        ..UserProgressionPartial::default()
    };
    assert_eq!(tracker.merge(&stale, slow), MergeOutcome::Stale);
    assert_eq!(tracker.snapshot().total_xp, 1075);
    assert_eq!(tracker.snapshot().level, 3);
}
