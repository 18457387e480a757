//! Tests driving a live engine over real filesystem activity.

#![cfg(any(target_os = "linux", target_os = "android"))]

use std::sync::mpsc;
use std::time::{Duration, Instant};

use inobus::{
    Category, ClassifiedEvent, DeliveryMode, Engine, Error, ErrorKind, EventBus, EventKind,
    EventMask,
};

const DEADLINE: Duration = Duration::from_secs(10);

/// Receive events until one matches, ignoring the rest. Panics when the
/// deadline passes first.
fn recv_until<T>(rx: &mpsc::Receiver<T>, mut matching: impl FnMut(&T) -> bool) -> T {
    let deadline = Instant::now() + DEADLINE;
    loop {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .unwrap_or(Duration::ZERO);
        match rx.recv_timeout(remaining) {
            Ok(item) if matching(&item) => return item,
            Ok(_) => continue,
            Err(e) => panic!("did not receive expected event: {e}"),
        }
    }
}

fn engine_with_category(
    mode: DeliveryMode,
    category: Category,
) -> (Engine, mpsc::Receiver<ClassifiedEvent>) {
    let (tx, rx) = mpsc::channel();
    let mut bus = EventBus::new(mode);
    bus.subscribe(category, tx);
    let engine = Engine::new(bus, |e: Error| panic!("stream failure: {e}")).expect("engine");
    (engine, rx)
}

#[test]
fn create_file_event_carries_the_entry_name() {
    let tmpdir = tempfile::tempdir().expect("tempdir");
    let (mut engine, rx) = engine_with_category(DeliveryMode::PerEvent, Category::DirectoryChange);

    let wd = engine
        .watch(tmpdir.path(), EventMask::ALL_EVENTS)
        .expect("watch");

    std::fs::File::create(tmpdir.path().join("entry")).expect("create");

    let event = recv_until(&rx, |ev| ev.kind == EventKind::Create);
    assert_eq!(event.name.as_deref(), Some("entry".as_ref()));
    assert!(!event.is_dir);
    assert_eq!(event.wd, wd.as_raw());
}

#[test]
fn create_dir_sets_the_directory_flag() {
    let tmpdir = tempfile::tempdir().expect("tempdir");
    let (mut engine, rx) = engine_with_category(DeliveryMode::PerEvent, Category::DirectoryChange);

    engine
        .watch(tmpdir.path(), EventMask::ALL_EVENTS)
        .expect("watch");

    std::fs::create_dir(tmpdir.path().join("child")).expect("create_dir");

    let event = recv_until(&rx, |ev| ev.kind == EventKind::Create);
    assert_eq!(event.name.as_deref(), Some("child".as_ref()));
    assert!(event.is_dir);
}

#[test]
fn writing_a_file_reports_close_write() {
    let tmpdir = tempfile::tempdir().expect("tempdir");
    let (mut engine, rx) = engine_with_category(DeliveryMode::PerEvent, Category::AccessOrClose);

    engine
        .watch(tmpdir.path(), EventMask::ALL_EVENTS)
        .expect("watch");

    std::fs::write(tmpdir.path().join("entry"), b"123").expect("write");

    let event = recv_until(&rx, |ev| ev.kind == EventKind::CloseWrite);
    assert_eq!(event.name.as_deref(), Some("entry".as_ref()));
}

#[test]
fn renaming_pairs_the_two_halves_through_the_cookie() {
    let tmpdir = tempfile::tempdir().expect("tempdir");
    std::fs::File::create(tmpdir.path().join("from")).expect("create");

    let (mut engine, rx) = engine_with_category(DeliveryMode::PerEvent, Category::DirectoryChange);
    engine
        .watch(tmpdir.path(), EventMask::ALL_EVENTS)
        .expect("watch");

    std::fs::rename(tmpdir.path().join("from"), tmpdir.path().join("to")).expect("rename");

    let moved_from = recv_until(&rx, |ev| ev.kind == EventKind::MovedFrom);
    let moved_to = recv_until(&rx, |ev| ev.kind == EventKind::MovedTo);
    assert_eq!(moved_from.name.as_deref(), Some("from".as_ref()));
    assert_eq!(moved_to.name.as_deref(), Some("to".as_ref()));
    assert_ne!(moved_from.cookie, 0);
    assert_eq!(moved_from.cookie, moved_to.cookie);
}

#[test]
fn batch_mode_delivers_whole_reads() {
    let tmpdir = tempfile::tempdir().expect("tempdir");

    let (tx, rx) = mpsc::channel();
    let mut bus = EventBus::new(DeliveryMode::Batch);
    bus.subscribe_batch(tx);
    let mut engine = Engine::new(bus, |e: Error| panic!("stream failure: {e}")).expect("engine");

    engine
        .watch(tmpdir.path(), EventMask::ALL_EVENTS)
        .expect("watch");

    std::fs::File::create(tmpdir.path().join("entry")).expect("create");

    let batch = recv_until(&rx, |batch: &Vec<ClassifiedEvent>| {
        batch.iter().any(|ev| ev.kind == EventKind::Create)
    });
    let created = batch
        .iter()
        .find(|ev| ev.kind == EventKind::Create)
        .expect("create in batch");
    assert_eq!(created.name.as_deref(), Some("entry".as_ref()));
}

#[test]
fn unwatch_reports_ignored_and_the_loop_keeps_running() {
    let tmpdir = tempfile::tempdir().expect("tempdir");

    let (info_tx, info_rx) = mpsc::channel();
    let (dir_tx, dir_rx) = mpsc::channel();
    let mut bus = EventBus::new(DeliveryMode::PerEvent);
    bus.subscribe(Category::Informational, info_tx);
    bus.subscribe(Category::DirectoryChange, dir_tx);
    let mut engine = Engine::new(bus, |e: Error| panic!("stream failure: {e}")).expect("engine");

    let wd = engine
        .watch(tmpdir.path(), EventMask::ALL_EVENTS)
        .expect("watch");
    engine.unwatch(wd).expect("unwatch");

    // The kernel acknowledges the removal with a final ignored event.
    let ignored = recv_until(&info_rx, |ev| ev.kind == EventKind::Ignored);
    assert_eq!(ignored.wd, wd.as_raw());

    // Removing it again is an error, not a crash.
    assert!(matches!(
        engine.unwatch(wd),
        Err(Error {
            kind: ErrorKind::WatchNotFound,
            ..
        })
    ));

    // The read loop is still alive and serves a fresh watch.
    engine
        .watch(tmpdir.path(), EventMask::ALL_EVENTS)
        .expect("rewatch");
    std::fs::File::create(tmpdir.path().join("entry")).expect("create");
    let event = recv_until(&dir_rx, |ev| ev.kind == EventKind::Create);
    assert_eq!(event.name.as_deref(), Some("entry".as_ref()));
}

#[test]
fn delivery_mode_can_be_switched_at_runtime() {
    let tmpdir = tempfile::tempdir().expect("tempdir");

    let (event_tx, event_rx) = mpsc::channel();
    let (batch_tx, batch_rx) = mpsc::channel();
    let mut bus = EventBus::new(DeliveryMode::PerEvent);
    bus.subscribe(Category::DirectoryChange, event_tx);
    bus.subscribe_batch(batch_tx);
    let mut engine = Engine::new(bus, |e: Error| panic!("stream failure: {e}")).expect("engine");

    engine.set_delivery_mode(DeliveryMode::Batch).expect("mode");
    // The mode change and the watch travel the same queue, so the watch
    // round-trip guarantees the switch has been applied.
    engine
        .watch(tmpdir.path(), EventMask::ALL_EVENTS)
        .expect("watch");

    std::fs::File::create(tmpdir.path().join("entry")).expect("create");

    let batch = recv_until(&batch_rx, |batch: &Vec<ClassifiedEvent>| {
        batch.iter().any(|ev| ev.kind == EventKind::Create)
    });
    assert!(!batch.is_empty());
    assert!(
        event_rx.try_recv().is_err(),
        "per-category listeners are silent in batch mode"
    );
}
