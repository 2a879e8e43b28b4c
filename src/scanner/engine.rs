use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;
use tracing::info;

use crate::errors::AppError;
use crate::model::{ProgressSnapshot, ScanEvent, ScanOptions, ScanState, ScanSummary, SessionId};
use crate::scanner::session::ScanSession;
use crate::scanner::sink::{ChannelSink, EventSink};
use crate::scanner::worker::worker_loop;

struct ActiveScan {
    session: Arc<ScanSession>,
    join: Option<JoinHandle<()>>,
}

/// Runs at most one scan session at a time and reports it to an [`EventSink`].
pub struct ScanEngine {
    sink: Arc<dyn EventSink>,
    next_id: AtomicU64,
    current: Mutex<Option<ActiveScan>>,
}

impl ScanEngine {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            next_id: AtomicU64::new(1),
            current: Mutex::new(None),
        }
    }

    /// Starts a scan with the default pool width and flush interval.
    pub fn start(&self, root: &Path, threshold_bytes: u64) -> Result<SessionId, AppError> {
        self.start_with(ScanOptions::new(root, threshold_bytes))
    }

    /// Validates the request, retires any previous session and launches the
    /// worker pool. Returns as soon as the pool is spawned.
    pub fn start_with(&self, options: ScanOptions) -> Result<SessionId, AppError> {
        validate(&options)?;

        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let session = Arc::new(ScanSession::new(
            id,
            options.root.clone(),
            options.threshold_bytes,
            options.flush_interval,
            Arc::clone(&self.sink),
        ));

        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            // Old workers wind down on their own; their handle is detached.
            previous.session.stop();
            info!("session {} superseded by {id}", previous.session.id());
        }

        let workers = options.concurrency.max(1);
        info!(
            "session {id} scanning {} (threshold {} bytes, {workers} workers)",
            options.root.display(),
            options.threshold_bytes
        );

        let session_for_thread = Arc::clone(&session);
        let join = thread::spawn(move || run_pool(&session_for_thread, workers));

        *current = Some(ActiveScan {
            session,
            join: Some(join),
        });
        Ok(id)
    }

    pub fn stop(&self) {
        if let Some(active) = self.current.lock().as_ref() {
            active.session.stop();
        }
    }

    pub fn pause(&self) {
        if let Some(active) = self.current.lock().as_ref() {
            active.session.pause();
        }
    }

    pub fn resume(&self) {
        if let Some(active) = self.current.lock().as_ref() {
            active.session.resume();
        }
    }

    pub fn state(&self) -> ScanState {
        self.current
            .lock()
            .as_ref()
            .map_or(ScanState::Idle, |active| active.session.state())
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.current
            .lock()
            .as_ref()
            .map_or(ProgressSnapshot::new(0, 0), |active| {
                active.session.progress()
            })
    }

    /// The current (possibly finished) session.
    pub fn session(&self) -> Option<Arc<ScanSession>> {
        self.current
            .lock()
            .as_ref()
            .map(|active| Arc::clone(&active.session))
    }

    /// Blocks until the current session is done. `None` when idle.
    pub fn wait(&self) -> Option<ScanSummary> {
        let session = self.session()?;
        Some(session.wait())
    }
}

impl Drop for ScanEngine {
    fn drop(&mut self) {
        if let Some(mut active) = self.current.lock().take() {
            active.session.stop();
            if let Some(join) = active.join.take() {
                let _ = join.join();
            }
        }
    }
}

fn validate(options: &ScanOptions) -> Result<(), AppError> {
    if options.threshold_bytes == 0 {
        return Err(AppError::InvalidInput(
            "threshold must be greater than zero".to_string(),
        ));
    }

    let metadata = fs::metadata(&options.root).map_err(|_| {
        AppError::InvalidInput(format!("Directory not found: {}", options.root.display()))
    })?;
    if !metadata.is_dir() {
        return Err(AppError::InvalidInput(format!(
            "Not a directory: {}",
            options.root.display()
        )));
    }
    Ok(())
}

fn run_pool(session: &ScanSession, workers: usize) {
    let started = Instant::now();

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| worker_loop(session));
        }
    });

    let summary = session.finish();
    info!(
        "session {} done in {:.2}s: {} files, {} matches{}",
        session.id(),
        started.elapsed().as_secs_f64(),
        summary.processed,
        summary.matches,
        if summary.cancelled { " (cancelled)" } else { "" }
    );
}

/// Runs one scan to completion on the calling thread's behalf and returns
/// every event it produced together with the finished session.
pub fn run_scan_blocking(
    options: ScanOptions,
) -> Result<(Vec<ScanEvent>, Arc<ScanSession>), AppError> {
    let (sink, rx) = ChannelSink::unbounded();
    let engine = ScanEngine::new(Arc::new(sink));
    engine.start_with(options)?;
    engine.wait();

    let session = engine
        .session()
        .ok_or_else(|| AppError::InvalidInput("scan did not start".to_string()))?;
    drop(engine);
    Ok((rx.try_iter().collect(), session))
}
