use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock};

use crate::model::{MatchRecord, ProgressSnapshot, ScanState, ScanSummary, SessionId};
use crate::scanner::sink::EventSink;

#[derive(Debug, Default)]
struct Counters {
    processed: u64,
    pending: u64,
    matches: u64,
}

#[derive(Debug, Default)]
pub(crate) struct WorkQueue {
    pub(crate) dirs: VecDeque<PathBuf>,
    pub(crate) in_flight: usize,
}

struct MatchBuffer {
    records: Vec<MatchRecord>,
    last_flush: Option<Instant>,
}

/// One scan invocation: its flags, counters, work queue and allow-list.
///
/// Workers mutate it concurrently while the scan runs. Once done it stays
/// readable so guarded operations can consult the allow-list.
pub struct ScanSession {
    id: SessionId,
    root: PathBuf,
    threshold_bytes: u64,
    flush_interval: Duration,
    sink: Arc<dyn EventSink>,
    running: AtomicBool,
    paused: AtomicBool,
    cancelled: AtomicBool,
    counters: Mutex<Counters>,
    allowed: RwLock<HashSet<PathBuf>>,
    buffer: Mutex<MatchBuffer>,
    pub(crate) work: Mutex<WorkQueue>,
    pub(crate) wake: Condvar,
    finished: Mutex<Option<ScanSummary>>,
    finished_cv: Condvar,
}

impl ScanSession {
    pub(crate) fn new(
        id: SessionId,
        root: PathBuf,
        threshold_bytes: u64,
        flush_interval: Duration,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let mut dirs = VecDeque::new();
        dirs.push_back(root.clone());
        Self {
            id,
            root,
            threshold_bytes,
            flush_interval,
            sink,
            running: AtomicBool::new(true),
            paused: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            counters: Mutex::new(Counters::default()),
            allowed: RwLock::new(HashSet::new()),
            buffer: Mutex::new(MatchBuffer {
                records: Vec::new(),
                last_flush: None,
            }),
            work: Mutex::new(WorkQueue {
                dirs,
                in_flight: 0,
            }),
            wake: Condvar::new(),
            finished: Mutex::new(None),
            finished_cv: Condvar::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn threshold_bytes(&self) -> u64 {
        self.threshold_bytes
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn state(&self) -> ScanState {
        if self.finished.lock().is_some() {
            ScanState::Done
        } else if self.is_paused() {
            ScanState::Paused
        } else {
            ScanState::Running
        }
    }

    pub fn progress(&self) -> ProgressSnapshot {
        let counters = self.counters.lock();
        ProgressSnapshot::new(counters.processed, counters.pending)
    }

    pub fn summary(&self) -> Option<ScanSummary> {
        *self.finished.lock()
    }

    pub fn is_allowed(&self, path: &Path) -> bool {
        self.allowed.read().contains(path)
    }

    /// Point-in-time copy of the allow-list.
    pub fn allowed_paths(&self) -> Vec<PathBuf> {
        self.allowed.read().iter().cloned().collect()
    }

    /// Removes a path after it has been deleted, trashed or moved away.
    pub fn revoke(&self, path: &Path) -> bool {
        self.allowed.write().remove(path)
    }

    /// Blocks until the terminal event has been emitted.
    pub fn wait(&self) -> ScanSummary {
        let mut finished = self.finished.lock();
        loop {
            if let Some(summary) = *finished {
                return summary;
            }
            self.finished_cv.wait(&mut finished);
        }
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<ScanSummary> {
        let deadline = Instant::now() + timeout;
        let mut finished = self.finished.lock();
        while finished.is_none() {
            if self.finished_cv.wait_until(&mut finished, deadline).timed_out() {
                break;
            }
        }
        *finished
    }

    // Flag changes happen under the queue lock so a worker cannot miss the
    // wakeup between checking a flag and parking on the condvar.

    pub(crate) fn stop(&self) {
        let _work = self.work.lock();
        self.running.store(false, Ordering::Release);
        self.wake.notify_all();
    }

    pub(crate) fn pause(&self) {
        let _work = self.work.lock();
        self.paused.store(true, Ordering::Release);
    }

    pub(crate) fn resume(&self) {
        let _work = self.work.lock();
        self.paused.store(false, Ordering::Release);
        self.wake.notify_all();
    }

    pub(crate) fn mark_cancelled(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Per-entry checkpoint. Parks while paused; returns `false` once the
    /// session has been stopped.
    pub(crate) fn checkpoint(&self) -> bool {
        if self.is_paused() {
            let mut work = self.work.lock();
            while self.is_paused() && self.is_running() {
                self.wake.wait(&mut work);
            }
        }

        if !self.is_running() {
            self.mark_cancelled();
            return false;
        }
        true
    }

    pub(crate) fn enqueue(&self, dir: PathBuf) {
        let mut work = self.work.lock();
        work.dirs.push_back(dir);
        self.wake.notify_one();
    }

    pub(crate) fn file_discovered(&self) {
        let mut counters = self.counters.lock();
        counters.pending = counters.pending.saturating_add(1);
    }

    /// Settles one pending file. A match is added to the allow-list before
    /// it can reach the sink.
    ///
    /// Every settled file also checks the flush deadline, so a buffered match
    /// never waits much longer than one interval for the next match.
    pub(crate) fn file_processed(&self, found: Option<MatchRecord>) {
        let mut counters = self.counters.lock();
        if let Some(record) = &found {
            self.allowed.write().insert(record.path.clone());
            counters.matches = counters.matches.saturating_add(1);
        }
        self.buffer_match(found);
        counters.processed = counters.processed.saturating_add(1);
        counters.pending = counters.pending.saturating_sub(1);

        // Emitting under the counter lock keeps delivered progress monotonic.
        let snapshot = ProgressSnapshot::new(counters.processed, counters.pending);
        self.sink.progress(self.id, snapshot);
    }

    fn buffer_match(&self, found: Option<MatchRecord>) {
        let mut buffer = self.buffer.lock();
        buffer.records.extend(found);
        let due = buffer
            .last_flush
            .is_none_or(|last| last.elapsed() >= self.flush_interval);
        if due {
            self.flush_locked(&mut buffer);
        }
    }

    pub(crate) fn flush(&self) {
        let mut buffer = self.buffer.lock();
        self.flush_locked(&mut buffer);
    }

    fn flush_locked(&self, buffer: &mut MatchBuffer) {
        if buffer.records.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut buffer.records);
        buffer.last_flush = Some(Instant::now());
        self.sink.match_batch(self.id, batch);
    }

    /// Emits the terminal event. Called once, after every worker has exited.
    pub(crate) fn finish(&self) -> ScanSummary {
        self.flush();
        self.running.store(false, Ordering::Release);

        let summary = {
            let counters = self.counters.lock();
            ScanSummary {
                processed: counters.processed,
                matches: counters.matches,
                cancelled: self.cancelled.load(Ordering::Acquire),
            }
        };

        self.sink.done(self.id, summary);

        let mut finished = self.finished.lock();
        *finished = Some(summary);
        self.finished_cv.notify_all();
        summary
    }
}
