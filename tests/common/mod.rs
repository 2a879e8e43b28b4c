#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use bigfiles::model::{MatchRecord, ProgressSnapshot, ScanEvent, ScanSummary, SessionId};
use bigfiles::scanner::EventSink;
use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

pub const GIB: u64 = 1024 * 1024 * 1024;

/// Creates a file of the given length without writing its contents.
pub fn sparse_file(path: &Path, len: u64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    let file = File::create(path).expect("create sparse file");
    file.set_len(len).expect("set sparse length");
}

/// Sink that records every event and can hold the first progress callback
/// until the test releases it.
pub struct RecordingSink {
    events: Mutex<Vec<ScanEvent>>,
    gate: Option<Gate>,
    progress_delay: Duration,
}

struct Gate {
    tripped: AtomicBool,
    reached: Sender<()>,
    release: Receiver<()>,
}

pub struct GateHandle {
    pub reached: Receiver<()>,
    pub release: Sender<()>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            gate: None,
            progress_delay: Duration::ZERO,
        }
    }

    /// Slows the scan down by sleeping in every progress callback.
    pub fn with_progress_delay(delay: Duration) -> Self {
        Self {
            progress_delay: delay,
            ..Self::new()
        }
    }

    pub fn gated() -> (Self, GateHandle) {
        let (reached_tx, reached_rx) = unbounded();
        let (release_tx, release_rx) = unbounded();
        let sink = Self {
            events: Mutex::new(Vec::new()),
            gate: Some(Gate {
                tripped: AtomicBool::new(false),
                reached: reached_tx,
                release: release_rx,
            }),
            progress_delay: Duration::ZERO,
        };
        (
            sink,
            GateHandle {
                reached: reached_rx,
                release: release_tx,
            },
        )
    }

    pub fn events(&self) -> Vec<ScanEvent> {
        self.events.lock().clone()
    }

    pub fn matched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .events()
            .into_iter()
            .filter_map(|event| match event {
                ScanEvent::MatchBatch { matches, .. } => Some(matches),
                _ => None,
            })
            .flatten()
            .map(|record| record.path)
            .collect();
        paths.sort();
        paths
    }
}

impl EventSink for RecordingSink {
    fn match_batch(&self, session: SessionId, matches: Vec<MatchRecord>) {
        self.events
            .lock()
            .push(ScanEvent::MatchBatch { session, matches });
    }

    fn progress(&self, session: SessionId, progress: ProgressSnapshot) {
        self.events
            .lock()
            .push(ScanEvent::Progress { session, progress });

        if let Some(gate) = &self.gate
            && !gate.tripped.swap(true, Ordering::SeqCst)
        {
            let _ = gate.reached.send(());
            let _ = gate.release.recv();
        }
        if !self.progress_delay.is_zero() {
            thread::sleep(self.progress_delay);
        }
    }

    fn done(&self, session: SessionId, summary: ScanSummary) {
        self.events.lock().push(ScanEvent::Done { session, summary });
    }
}

pub fn all_matches(events: &[ScanEvent]) -> Vec<MatchRecord> {
    events
        .iter()
        .filter_map(|event| match event {
            ScanEvent::MatchBatch { matches, .. } => Some(matches.clone()),
            _ => None,
        })
        .flatten()
        .collect()
}

pub fn done_summary(events: &[ScanEvent]) -> Option<ScanSummary> {
    events.iter().find_map(|event| match event {
        ScanEvent::Done { summary, .. } => Some(*summary),
        _ => None,
    })
}
