//! Path rules shared by the scanner and its consumers.
//!
//! Two independent decisions live here: which directories the scanner never
//! descends into, and how risky it is to remove a given file. Both are pure
//! functions of the path string and the host platform.

use std::fmt;
use std::path::Path;

const NOISE_DIRS: [&str; 2] = ["node_modules", ".git"];
const MACOS_SYSTEM_ROOTS: [&str; 3] = ["/System", "/Library", "/Applications"];
const WINDOWS_SYSTEM_ROOTS: [&str; 3] = [
    "c:/windows",
    "c:/program files",
    "c:/program files (x86)",
];

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Platform {
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Other
        }
    }
}

pub fn should_ignore_subtree(path: &Path) -> bool {
    should_ignore_subtree_on(path, Platform::current())
}

pub fn should_ignore_subtree_on(path: &Path, platform: Platform) -> bool {
    let has_noise_segment = path.components().any(|component| {
        let name = component.as_os_str();
        NOISE_DIRS.iter().any(|noise| name == *noise)
    });
    if has_noise_segment {
        return true;
    }

    let normalized = path.to_string_lossy().replace('\\', "/");
    match platform {
        Platform::MacOs => MACOS_SYSTEM_ROOTS
            .iter()
            .any(|root| has_prefix(&normalized, root)),
        Platform::Windows => {
            let lowered = normalized.to_lowercase();
            WINDOWS_SYSTEM_ROOTS
                .iter()
                .any(|root| has_prefix(&lowered, root))
        }
        Platform::Other => false,
    }
}

fn has_prefix(path: &str, root: &str) -> bool {
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
pub enum Cleanliness {
    Safe,
    Caution,
    SystemCritical,
    Unknown,
}

impl Cleanliness {
    pub fn priority(self) -> u8 {
        match self {
            Self::Safe => 1,
            Self::Caution => 2,
            Self::SystemCritical => 3,
            Self::Unknown => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Caution => "caution",
            Self::SystemCritical => "system",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Cleanliness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Advice {
    pub category: Cleanliness,
    pub rationale: &'static str,
}

impl Advice {
    const fn new(category: Cleanliness, rationale: &'static str) -> Self {
        Self {
            category,
            rationale,
        }
    }
}

const SYSTEM_PREFIXES: [&str; 6] = ["/system", "/bin", "/sbin", "/usr", "/var", "/private"];
const BUILD_ARTIFACTS: [&str; 4] = [
    "/node_modules/",
    "/target/debug/",
    "/build/outputs/",
    "/deriveddata/",
];
const USER_CACHES: [&str; 3] = [
    "/library/caches/",
    "/library/logs/",
    "/library/saved application state/",
];
const INSTALLER_SUFFIXES: [&str; 6] = [".dmg", ".pkg", ".iso", ".zip", ".rar", ".7z"];
const USER_FOLDERS: [&str; 5] = [
    "/documents/",
    "/desktop/",
    "/pictures/",
    "/music/",
    "/movies/",
];

/// Rules are checked top to bottom and the first hit wins.
pub fn classify_cleanliness(path: &Path) -> Advice {
    let p = path.to_string_lossy().replace('\\', "/").to_lowercase();
    if p.is_empty() {
        return Advice::new(Cleanliness::Unknown, "empty path");
    }

    if SYSTEM_PREFIXES.iter().any(|prefix| p.starts_with(prefix)) {
        return Advice::new(Cleanliness::SystemCritical, "operating system files");
    }

    if p == "/library" || p.starts_with("/library/") {
        if p.contains("/caches/") || p.contains("/logs/") {
            return Advice::new(Cleanliness::Caution, "system-wide caches or logs");
        }
        return Advice::new(Cleanliness::SystemCritical, "system library");
    }

    if BUILD_ARTIFACTS.iter().any(|marker| p.contains(marker)) {
        return Advice::new(Cleanliness::Safe, "regenerable build artifact");
    }

    if USER_CACHES.iter().any(|marker| p.contains(marker)) {
        return Advice::new(Cleanliness::Safe, "user cache or log");
    }

    if p.contains("/.trash/") {
        return Advice::new(Cleanliness::Safe, "already in the trash");
    }

    if p.contains("/downloads/") {
        if INSTALLER_SUFFIXES.iter().any(|suffix| p.ends_with(suffix)) {
            return Advice::new(Cleanliness::Safe, "downloaded installer or archive");
        }
        return Advice::new(Cleanliness::Caution, "downloaded file");
    }

    if p.starts_with("/applications") || p.contains("/applications/") {
        return Advice::new(Cleanliness::Caution, "installed application");
    }

    if USER_FOLDERS.iter().any(|marker| p.contains(marker)) {
        return Advice::new(Cleanliness::Caution, "user document");
    }

    if p.contains("/library/application support/") {
        return Advice::new(Cleanliness::Caution, "application data");
    }

    Advice::new(Cleanliness::Unknown, "no rule matched")
}
