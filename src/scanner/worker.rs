use std::fs;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use tracing::{debug, trace};

use crate::classifier::should_ignore_subtree;
use crate::model::{EntryKind, MatchRecord};
use crate::scanner::enumerate::{DirEntryInfo, enumerate};
use crate::scanner::session::ScanSession;

enum Claim {
    Dir(PathBuf),
    Exhausted,
    Stopped,
}

/// Body of one pool thread: claim a directory, enumerate it, repeat.
///
/// Returns once the queue is empty with nothing in flight, or once the
/// session has been stopped.
pub(crate) fn worker_loop(session: &ScanSession) {
    loop {
        match claim(session) {
            Claim::Dir(dir) => {
                scan_dir(session, &dir);
                let mut work = session.work.lock();
                work.in_flight -= 1;
                // Siblings may be parked waiting for either new work or exhaustion.
                session.wake.notify_all();
            }
            Claim::Exhausted | Claim::Stopped => return,
        }
    }
}

fn claim(session: &ScanSession) -> Claim {
    let mut work = session.work.lock();
    loop {
        if work.dirs.is_empty() && work.in_flight == 0 {
            session.wake.notify_all();
            return Claim::Exhausted;
        }

        if !session.is_running() {
            session.mark_cancelled();
            return Claim::Stopped;
        }

        if !session.is_paused()
            && let Some(dir) = work.dirs.pop_front()
        {
            work.in_flight += 1;
            return Claim::Dir(dir);
        }

        session.wake.wait(&mut work);
    }
}

fn scan_dir(session: &ScanSession, dir: &std::path::Path) {
    trace!("enumerating {}", dir.display());

    for entry in enumerate(dir) {
        if !session.checkpoint() {
            return;
        }

        match entry.kind {
            EntryKind::Dir => {
                if should_ignore_subtree(&entry.path) {
                    debug!("ignoring subtree {}", entry.path.display());
                } else {
                    session.enqueue(entry.path);
                }
            }
            EntryKind::File => scan_file(session, entry),
            EntryKind::Symlink | EntryKind::Other => {}
        }
    }
}

fn scan_file(session: &ScanSession, entry: DirEntryInfo) {
    session.file_discovered();

    let metadata = match fs::symlink_metadata(&entry.path) {
        Ok(metadata) => metadata,
        Err(error) => {
            debug!("file vanished before stat {}: {error}", entry.path.display());
            session.file_processed(None);
            return;
        }
    };

    let found = (metadata.is_file() && metadata.len() >= session.threshold_bytes()).then(|| {
        MatchRecord {
            name: entry.name,
            path: entry.path,
            size_bytes: metadata.len(),
            modified_at_millis: modified_millis(&metadata),
        }
    });

    session.file_processed(found);
}

fn modified_millis(metadata: &fs::Metadata) -> i64 {
    let Ok(modified) = metadata.modified() else {
        return 0;
    };
    match modified.duration_since(UNIX_EPOCH) {
        Ok(since) => i64::try_from(since.as_millis()).unwrap_or(i64::MAX),
        Err(before) => -i64::try_from(before.duration().as_millis()).unwrap_or(i64::MAX),
    }
}
