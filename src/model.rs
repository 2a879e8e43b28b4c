use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_THRESHOLD_BYTES: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ScanState {
    Idle,
    Running,
    Paused,
    Done,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Other,
}

/// A file that met the size threshold, as observed at scan time.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MatchRecord {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified_at_millis: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub processed: u64,
    pub pending: u64,
    pub percent: f64,
}

impl ProgressSnapshot {
    pub fn new(processed: u64, pending: u64) -> Self {
        let total = processed.saturating_add(pending);
        let percent = if total == 0 {
            0.0
        } else {
            processed as f64 / total as f64
        };
        Self {
            processed,
            pending,
            percent,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ScanSummary {
    pub processed: u64,
    pub matches: u64,
    pub cancelled: bool,
}

#[derive(Debug, Clone)]
pub enum ScanEvent {
    MatchBatch {
        session: SessionId,
        matches: Vec<MatchRecord>,
    },
    Progress {
        session: SessionId,
        progress: ProgressSnapshot,
    },
    Done {
        session: SessionId,
        summary: ScanSummary,
    },
}

impl ScanEvent {
    pub fn session(&self) -> SessionId {
        match self {
            Self::MatchBatch { session, .. }
            | Self::Progress { session, .. }
            | Self::Done { session, .. } => *session,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub threshold_bytes: u64,
    pub concurrency: usize,
    pub flush_interval: Duration,
}

impl ScanOptions {
    pub fn new(root: impl Into<PathBuf>, threshold_bytes: u64) -> Self {
        Self {
            root: root.into(),
            threshold_bytes,
            concurrency: DEFAULT_CONCURRENCY,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

/// Result of a guarded file operation on a single path.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OpOutcome {
    pub path: PathBuf,
    pub ok: bool,
    pub error: Option<String>,
    pub to: Option<PathBuf>,
}

impl OpOutcome {
    pub fn success(path: PathBuf) -> Self {
        Self {
            path,
            ok: true,
            error: None,
            to: None,
        }
    }

    pub fn moved(path: PathBuf, to: PathBuf) -> Self {
        Self {
            path,
            ok: true,
            error: None,
            to: Some(to),
        }
    }

    pub fn failure(path: PathBuf, error: impl Into<String>) -> Self {
        Self {
            path,
            ok: false,
            error: Some(error.into()),
            to: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FileType {
    Video,
    Audio,
    Image,
    Document,
    Archive,
    Executable,
    Other,
}

impl FileType {
    pub fn from_name(name: &str) -> Self {
        let ext = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return Self::Other,
        };
        match ext.as_str() {
            "mp4" | "mkv" | "avi" | "mov" | "wmv" | "flv" | "webm" | "m4v" | "mpg" | "mpeg" => {
                Self::Video
            }
            "mp3" | "wav" | "flac" | "m4a" | "aac" | "ogg" | "wma" => Self::Audio,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "svg" | "tiff" | "heic" => {
                Self::Image
            }
            "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "txt" | "md" | "rtf"
            | "csv" | "pages" | "numbers" | "key" => Self::Document,
            "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "iso" | "dmg" | "pkg" => Self::Archive,
            "exe" | "app" | "msi" | "bat" | "sh" | "apk" => Self::Executable,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Document => "document",
            Self::Archive => "archive",
            Self::Executable => "executable",
            Self::Other => "other",
        }
    }
}
