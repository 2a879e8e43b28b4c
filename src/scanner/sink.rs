use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use crate::model::{MatchRecord, ProgressSnapshot, ScanEvent, ScanSummary, SessionId};

/// Consumer of scan output.
///
/// For a given session, calls arrive as any interleaving of `match_batch`
/// and `progress`, followed by exactly one `done`. Implementations are
/// called from worker threads and must not block for long.
pub trait EventSink: Send + Sync {
    fn match_batch(&self, session: SessionId, matches: Vec<MatchRecord>);
    fn progress(&self, session: SessionId, progress: ProgressSnapshot);
    fn done(&self, session: SessionId, summary: ScanSummary);
}

/// Forwards every callback as a [`ScanEvent`] over a crossbeam channel.
#[derive(Clone)]
pub struct ChannelSink {
    tx: Sender<ScanEvent>,
}

impl ChannelSink {
    /// A bounded queue applies backpressure to the workers instead of
    /// growing without limit on huge trees.
    pub fn bounded(capacity: usize) -> (Self, Receiver<ScanEvent>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx }, rx)
    }

    pub fn unbounded() -> (Self, Receiver<ScanEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    fn send(&self, event: ScanEvent) {
        let _ = self.tx.send(event);
    }
}

impl EventSink for ChannelSink {
    fn match_batch(&self, session: SessionId, matches: Vec<MatchRecord>) {
        self.send(ScanEvent::MatchBatch { session, matches });
    }

    fn progress(&self, session: SessionId, progress: ProgressSnapshot) {
        self.send(ScanEvent::Progress { session, progress });
    }

    fn done(&self, session: SessionId, summary: ScanSummary) {
        self.send(ScanEvent::Done { session, summary });
    }
}
