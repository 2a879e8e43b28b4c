mod common;

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, UNIX_EPOCH};

use bigfiles::model::{ScanEvent, ScanOptions, ScanState};
use bigfiles::scanner::{ScanEngine, run_scan_blocking};
use tempfile::TempDir;

use common::{GIB, RecordingSink, all_matches, done_summary, sparse_file};

#[test]
fn only_files_over_threshold_outside_ignored_dirs_match() {
    let temp = TempDir::new().expect("temp dir");
    let root = temp.path();
    sparse_file(&root.join("a.bin"), 2 * GIB);
    fs::write(root.join("b.txt"), vec![0_u8; 10 * 1024]).expect("write b");
    sparse_file(&root.join("node_modules").join("c.bin"), 3 * GIB);

    let (events, session) = run_scan_blocking(ScanOptions::new(root, GIB)).expect("scan");

    let matches = all_matches(&events);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].name, "a.bin");
    assert_eq!(matches[0].path, root.join("a.bin"));
    assert_eq!(matches[0].size_bytes, 2 * GIB);

    // c.bin was never listed, so only a.bin and b.txt were counted.
    let summary = done_summary(&events).expect("done");
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.matches, 1);
    assert!(!summary.cancelled);
    assert!(!session.is_allowed(&root.join("node_modules").join("c.bin")));
}

#[test]
fn match_records_reflect_file_metadata() {
    let temp = TempDir::new().expect("temp dir");
    let root = temp.path();
    for dir in ["x", "x/y", "z"] {
        fs::create_dir_all(root.join(dir)).expect("dir");
    }
    let expected = [
        root.join("top.dat"),
        root.join("x").join("one.dat"),
        root.join("x").join("y").join("two.dat"),
        root.join("z").join("three.dat"),
    ];
    for (index, path) in expected.iter().enumerate() {
        fs::write(path, vec![7_u8; 1000 + index]).expect("write");
    }
    fs::write(root.join("z").join("tiny.dat"), b"no").expect("tiny");

    let (events, session) = run_scan_blocking(ScanOptions::new(root, 1000)).expect("scan");
    let mut matches = all_matches(&events);
    matches.sort_by(|a, b| a.path.cmp(&b.path));

    let mut expected_sorted = expected.to_vec();
    expected_sorted.sort();
    let found: Vec<_> = matches.iter().map(|record| record.path.clone()).collect();
    assert_eq!(found, expected_sorted);

    for record in &matches {
        let metadata = fs::metadata(&record.path).expect("metadata");
        assert_eq!(record.size_bytes, metadata.len());
        let mtime = metadata
            .modified()
            .expect("mtime")
            .duration_since(UNIX_EPOCH)
            .expect("after epoch")
            .as_millis() as i64;
        assert_eq!(record.modified_at_millis, mtime);
        assert!(session.is_allowed(&record.path));
    }

    let summary = done_summary(&events).expect("done");
    assert_eq!(summary.processed, 5);
    assert!(summary.matches <= summary.processed);
    assert_eq!(session.progress().pending, 0);
}

#[test]
fn git_metadata_is_skipped() {
    let temp = TempDir::new().expect("temp dir");
    fs::create_dir_all(temp.path().join(".git").join("objects")).expect("git dir");
    fs::write(temp.path().join(".git").join("objects").join("pack"), vec![0_u8; 64])
        .expect("pack");

    let (events, _) = run_scan_blocking(ScanOptions::new(temp.path(), 1)).expect("scan");
    assert!(all_matches(&events).is_empty());
    assert_eq!(done_summary(&events).expect("done").processed, 0);
}

#[cfg(unix)]
#[test]
fn symlinks_are_never_matched_or_followed() {
    let temp = TempDir::new().expect("temp dir");
    let outside = TempDir::new().expect("outside dir");
    fs::write(outside.path().join("huge.bin"), vec![0_u8; 256]).expect("outside file");
    fs::write(temp.path().join("real.bin"), vec![0_u8; 256]).expect("real");
    std::os::unix::fs::symlink(temp.path().join("real.bin"), temp.path().join("alias.bin"))
        .expect("file link");
    std::os::unix::fs::symlink(outside.path(), temp.path().join("elsewhere")).expect("dir link");

    let (events, _) = run_scan_blocking(ScanOptions::new(temp.path(), 128)).expect("scan");
    let matches = all_matches(&events);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].path, temp.path().join("real.bin"));
}

#[test]
fn empty_root_finishes_immediately() {
    let temp = TempDir::new().expect("temp dir");
    let (events, session) = run_scan_blocking(ScanOptions::new(temp.path(), 1)).expect("scan");

    assert_eq!(events.len(), 1);
    let summary = done_summary(&events).expect("done");
    assert_eq!(summary.processed, 0);
    assert_eq!(session.state(), ScanState::Done);
    assert_eq!(session.progress().percent, 0.0);
}

#[test]
fn stop_mid_scan_reports_cancellation_and_nothing_after_done() {
    let temp = TempDir::new().expect("temp dir");
    for index in 0..10 {
        fs::write(temp.path().join(format!("{index}.bin")), vec![1_u8; 32]).expect("file");
    }
    fs::create_dir(temp.path().join("later")).expect("dir");
    fs::write(temp.path().join("later").join("x.bin"), vec![1_u8; 32]).expect("file");

    let (sink, gate) = RecordingSink::gated();
    let sink = Arc::new(sink);
    let engine = ScanEngine::new(sink.clone());
    let mut options = ScanOptions::new(temp.path(), 1);
    options.concurrency = 1;
    engine.start_with(options).expect("start");

    gate.reached
        .recv_timeout(Duration::from_secs(10))
        .expect("first file processed");
    engine.stop();
    gate.release.send(()).expect("release");

    let summary = engine.wait().expect("summary");
    assert!(summary.cancelled);
    assert!(summary.processed < 11);
    assert_eq!(engine.state(), ScanState::Done);

    let events = sink.events();
    assert!(matches!(events.last(), Some(ScanEvent::Done { .. })));
    let done_count = events
        .iter()
        .filter(|event| matches!(event, ScanEvent::Done { .. }))
        .count();
    assert_eq!(done_count, 1);

    // Matches seen before the stop are still delivered and still operable.
    let session = engine.session().expect("session");
    for record in all_matches(&events) {
        assert!(session.is_allowed(&record.path));
    }
    assert_eq!(session.progress().pending, 0);

    // Stopping a finished scan changes nothing.
    engine.stop();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(sink.events().len(), events.len());
}

#[test]
fn pause_then_resume_matches_uninterrupted_scan() {
    let temp = TempDir::new().expect("temp dir");
    for dir in 0..5 {
        let sub = temp.path().join(format!("dir{dir}"));
        fs::create_dir(&sub).expect("dir");
        for file in 0..6 {
            let len = if file % 2 == 0 { 512 } else { 16 };
            fs::write(sub.join(format!("f{file}.bin")), vec![0_u8; len]).expect("file");
        }
    }
    for file in 0..4 {
        fs::write(temp.path().join(format!("root{file}.bin")), vec![0_u8; 512]).expect("file");
    }

    let baseline = Arc::new(RecordingSink::new());
    let engine = ScanEngine::new(baseline.clone());
    engine.start(temp.path(), 256).expect("baseline start");
    engine.wait().expect("baseline done");
    let expected = baseline.matched_paths();
    assert_eq!(expected.len(), 19);

    let (sink, gate) = RecordingSink::gated();
    let sink = Arc::new(sink);
    let engine = ScanEngine::new(sink.clone());
    let mut options = ScanOptions::new(temp.path(), 256);
    options.concurrency = 1;
    engine.start_with(options).expect("start");

    gate.reached
        .recv_timeout(Duration::from_secs(10))
        .expect("first file processed");
    engine.pause();
    gate.release.send(()).expect("release");

    thread::sleep(Duration::from_millis(100));
    assert_eq!(engine.state(), ScanState::Paused);
    let frozen = engine.progress().processed;
    thread::sleep(Duration::from_millis(100));
    assert_eq!(engine.progress().processed, frozen);
    assert!(frozen < 34);

    engine.resume();
    let summary = engine.wait().expect("summary");
    assert!(!summary.cancelled);
    assert_eq!(summary.processed, 34);
    assert_eq!(sink.matched_paths(), expected);
}

#[test]
fn stop_while_paused_unblocks_workers() {
    let temp = TempDir::new().expect("temp dir");
    for index in 0..5 {
        fs::write(temp.path().join(format!("{index}.bin")), vec![1_u8; 8]).expect("file");
    }

    let (sink, gate) = RecordingSink::gated();
    let engine = ScanEngine::new(Arc::new(sink));
    engine.start(temp.path(), 1).expect("start");

    gate.reached
        .recv_timeout(Duration::from_secs(10))
        .expect("first file processed");
    engine.pause();
    gate.release.send(()).expect("release");
    engine.stop();

    let session = engine.session().expect("session");
    let summary = session
        .wait_timeout(Duration::from_secs(10))
        .expect("stopped scan must finish");
    assert!(summary.cancelled);
}

#[test]
fn many_workers_find_every_match_once() {
    let temp = TempDir::new().expect("temp dir");
    let mut expected = Vec::new();
    for branch in 0..8 {
        let mut dir = temp.path().join(format!("b{branch}"));
        for depth in 0..6 {
            dir = dir.join(format!("d{depth}"));
            fs::create_dir_all(&dir).expect("dir");
            let big = dir.join("big.bin");
            fs::write(&big, vec![0_u8; 300]).expect("big");
            fs::write(dir.join("small.bin"), vec![0_u8; 3]).expect("small");
            expected.push(big);
        }
    }
    expected.sort();

    let mut options = ScanOptions::new(temp.path(), 100);
    options.concurrency = 16;
    options.flush_interval = Duration::from_millis(1);
    let (events, session) = run_scan_blocking(options).expect("scan");

    let mut found: Vec<_> = all_matches(&events)
        .into_iter()
        .map(|record| record.path)
        .collect();
    found.sort();
    assert_eq!(found, expected);

    let mut allowed = session.allowed_paths();
    allowed.sort();
    assert_eq!(allowed, expected);

    let summary = done_summary(&events).expect("done");
    assert_eq!(summary.processed, 96);
    assert_eq!(summary.matches, 48);
}

#[test]
fn buffered_match_is_flushed_without_waiting_for_another_match() {
    let temp = TempDir::new().expect("temp dir");
    fs::write(temp.path().join("m1.bin"), vec![0_u8; 256]).expect("m1");
    fs::write(temp.path().join("m2.bin"), vec![0_u8; 256]).expect("m2");
    let filler = temp.path().join("filler");
    fs::create_dir(&filler).expect("filler dir");
    for index in 0..200 {
        fs::write(filler.join(format!("{index}.txt")), b"x").expect("small");
    }

    let sink = Arc::new(RecordingSink::with_progress_delay(Duration::from_millis(2)));
    let engine = ScanEngine::new(sink.clone());
    let mut options = ScanOptions::new(temp.path(), 128);
    options.concurrency = 1;
    options.flush_interval = Duration::from_millis(20);
    engine.start_with(options).expect("start");
    engine.wait().expect("summary");

    let events = sink.events();
    let batch_positions: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, event)| matches!(event, ScanEvent::MatchBatch { .. }))
        .map(|(index, _)| index)
        .collect();
    assert_eq!(all_matches(&events).len(), 2);

    // Each progress callback sleeps 2ms, so a 20ms interval has elapsed after
    // at most ten more files. The filler directory alone has 200.
    let last_batch = *batch_positions.last().expect("a batch");
    let progress_before_last_batch = events[..last_batch]
        .iter()
        .filter(|event| matches!(event, ScanEvent::Progress { .. }))
        .count();
    assert!(
        progress_before_last_batch <= 16,
        "second match held back for {progress_before_last_batch} files"
    );
}

#[cfg(unix)]
#[test]
fn unreadable_directory_is_skipped_without_failing_the_scan() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().expect("temp dir");
    let locked = temp.path().join("locked");
    fs::create_dir(&locked).expect("locked dir");
    fs::write(locked.join("hidden.bin"), vec![0_u8; 256]).expect("hidden");
    let open = temp.path().join("open");
    fs::create_dir(&open).expect("open dir");
    fs::write(open.join("visible.bin"), vec![0_u8; 256]).expect("visible");

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");
    // Privileged users read through permission bits, so there is nothing to skip.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("restore");
        return;
    }

    let result = run_scan_blocking(ScanOptions::new(temp.path(), 128));
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("restore");
    let (events, _) = result.expect("scan");

    let matches = all_matches(&events);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].path, open.join("visible.bin"));
    let summary = done_summary(&events).expect("done");
    assert!(!summary.cancelled);
    assert_eq!(summary.processed, 1);
}
