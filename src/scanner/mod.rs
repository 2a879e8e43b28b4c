mod engine;
mod enumerate;
mod session;
mod sink;
mod worker;

pub use engine::{ScanEngine, run_scan_blocking};
pub use enumerate::{DirEntryInfo, Entries, enumerate};
pub use session::ScanSession;
pub use sink::{ChannelSink, EventSink};
