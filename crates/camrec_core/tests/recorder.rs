//! End-to-end recorder tests against a real directory.

use camrec_core::{
    CamLine, Direction, FileKind, ManualClock, Recorder, RecorderConfig, RecordingCatalog,
    SessionOwner, Timestamp,
};
use camrec_storage::{DirectoryStore, RecordingStore};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const START: i64 = 1_700_000_000_000;

fn owner(owner_id: u32) -> SessionOwner {
    SessionOwner::new(owner_id, 10, 500 + owner_id, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)))
}

/// A recorder over `dir` whose sweeper never ticks on its own.
fn manual_recorder(dir: &Path, config: RecorderConfig) -> (Recorder, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Timestamp::from_millis(START)));
    let store = DirectoryStore::open(dir).unwrap();
    let recorder = Recorder::open_with_store(
        config.directory(dir).tick_interval(Duration::from_secs(3600)),
        Arc::new(store),
        clock.clone(),
    );
    (recorder, clock)
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

#[test]
fn idle_session_is_closed_into_permanent_file() {
    let temp = tempdir().unwrap();
    let (recorder, clock) = manual_recorder(
        temp.path(),
        RecorderConfig::new().idle_timeout(Duration::from_secs(30)),
    );

    let id = recorder.start_session(owner(42));
    clock.advance_millis(5);
    recorder.append_input(id, &[0x0a, 0xff]);
    clock.advance_millis(20);
    recorder.append_output(id, &[0x01, 0x02, 0x03]);

    clock.advance(Duration::from_secs(30));
    recorder.sweep_now();
    assert_eq!(recorder.active_sessions(), 1);

    clock.advance(Duration::from_secs(1));
    let report = recorder.sweep_now();
    assert_eq!(report.closed, 1);

    let expected = format!("42.{START}.cam");
    assert_eq!(file_names(temp.path()), vec![expected.clone()]);
    assert_eq!(
        std::fs::read_to_string(temp.path().join(expected)).unwrap(),
        "> 5 0aff\n< 25 010203\n"
    );
}

#[test]
fn appends_after_close_are_ignored() {
    let temp = tempdir().unwrap();
    let (recorder, clock) = manual_recorder(
        temp.path(),
        RecorderConfig::new().idle_timeout(Duration::from_secs(1)),
    );

    let id = recorder.start_session(owner(1));
    recorder.append_output(id, &[0x01]);
    clock.advance(Duration::from_secs(2));
    recorder.sweep_now();

    recorder.append_output(id, &[0x02]);
    recorder.sweep_now();
    recorder.request_shutdown();

    let path = temp.path().join(format!("1.{START}.cam"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), "< 0 01\n");
    assert_eq!(recorder.stats().packets_dropped, 1);
}

#[test]
fn mid_session_flushes_concatenate_without_loss() {
    let temp = tempdir().unwrap();
    let (recorder, clock) = manual_recorder(temp.path(), RecorderConfig::new().max_buffered_packets(3));

    let id = recorder.start_session(owner(7));
    let mut expected = Vec::new();
    for i in 0..20u8 {
        clock.advance_millis(1);
        let direction = if i % 3 == 0 { Direction::Input } else { Direction::Output };
        match direction {
            Direction::Input => recorder.append_input(id, &[i]),
            Direction::Output => recorder.append_output(id, &[i]),
        }
        expected.push(CamLine::new(direction, i64::from(i) + 1, vec![i]));
        recorder.sweep_now();
    }

    let working = format!("7.{START}.cam.tmp");
    assert!(temp.path().join(&working).exists());
    recorder.request_shutdown();

    let catalog = RecordingCatalog::open(temp.path()).unwrap();
    let entries = catalog.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, FileKind::Permanent);
    assert_eq!(catalog.load(&entries[0]).unwrap(), expected);
}

#[test]
fn shutdown_flushes_and_renames_all_active_sessions() {
    let temp = tempdir().unwrap();
    let (recorder, clock) = manual_recorder(temp.path(), RecorderConfig::new());

    let a = recorder.start_session(owner(1));
    clock.advance_millis(3);
    let b = recorder.start_session(owner(2));
    recorder.append_input(a, &[0xaa]);
    recorder.append_output(b, &[0xbb]);

    let report = recorder.request_shutdown().unwrap();
    assert_eq!(report.closed, 2);
    assert_eq!(report.finalized, 2);

    assert_eq!(
        file_names(temp.path()),
        vec![format!("1.{START}.cam"), format!("2.{}.cam", START + 3)]
    );
    assert!(recorder.start_session(owner(3)).is_disabled());
}

#[test]
fn same_owner_sessions_in_one_millisecond_keep_separate_files() {
    let temp = tempdir().unwrap();
    let (recorder, clock) = manual_recorder(
        temp.path(),
        RecorderConfig::new().idle_timeout(Duration::from_secs(10)),
    );

    let a = recorder.start_session(owner(7));
    let b = recorder.start_session(owner(7));
    recorder.append_output(a, &[0xaa]);
    clock.advance_millis(5_000);
    recorder.append_output(b, &[0xb0]);

    clock.advance_millis(6_000);
    assert_eq!(recorder.sweep_now().finalized, 1);
    clock.advance_millis(9_000);
    recorder.append_output(b, &[0xbb]);
    recorder.request_shutdown();

    let first = format!("7.{START}.cam");
    let second = format!("7.{}.cam", START + 1);
    assert_eq!(file_names(temp.path()), vec![first.clone(), second.clone()]);
    assert_eq!(std::fs::read_to_string(temp.path().join(first)).unwrap(), "< 0 aa\n");
    assert_eq!(
        std::fs::read_to_string(temp.path().join(second)).unwrap(),
        "< 4999 b0\n< 19999 bb\n"
    );
    let stats = recorder.stats();
    assert_eq!(stats.renames, 2);
    assert_eq!(stats.rename_failures, 0);
}

#[test]
fn session_without_packets_still_yields_a_file() {
    let temp = tempdir().unwrap();
    let (recorder, _clock) = manual_recorder(temp.path(), RecorderConfig::new());

    recorder.start_session(owner(9));
    recorder.request_shutdown();

    let path = temp.path().join(format!("9.{START}.cam"));
    assert_eq!(std::fs::read(path).unwrap(), b"");
}

#[test]
fn bad_directory_disables_recording() {
    let temp = tempdir().unwrap();
    let recorder = Recorder::open(RecorderConfig::new().directory(temp.path().join("missing")));

    let id = recorder.start_session(owner(1));
    assert!(id.is_disabled());
    recorder.append_input(id, &[1]);
    recorder.request_shutdown();

    assert!(file_names(temp.path()).is_empty());
}

#[test]
fn background_sweeper_closes_idle_sessions() {
    let temp = tempdir().unwrap();
    let recorder = Recorder::open(
        RecorderConfig::new()
            .directory(temp.path())
            .idle_timeout(Duration::from_millis(20))
            .tick_interval(Duration::from_millis(5)),
    );

    let id = recorder.start_session(owner(5));
    recorder.append_output(id, &[0x55]);

    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while recorder.active_sessions() > 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(recorder.active_sessions(), 0);

    let store = DirectoryStore::open(temp.path()).unwrap();
    let names = store.list().unwrap();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("5.") && names[0].ends_with(".cam"));
    let text = String::from_utf8(store.read(&names[0]).unwrap()).unwrap();
    assert!(text.ends_with(" 55\n"));
}
