//! error — structured error records for the salvage pipeline.
//!
//! Contains:
//! - ErrorKind / Severity taxonomy used by the pager and the WAL overlay.
//! - RepairError: kind + severity + message + info map (source/path/page tags).
//! - Per-thread slot for the most recent unclassified I/O failure. The mapping
//!   layer stores it there; the pager pulls it into last_error when a map call
//!   reports total failure (zero-size buffer).
//!
//! Policy:
//! - Corrupt records carry severity Ignore on purpose: the pipeline keeps
//!   extracting whatever is still readable. Fatality is a policy layered on
//!   top (wal importance), not a property of the kind.

use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::Path;

// ---- Info map keys ----

pub const INFO_KEY_SOURCE: &str = "Source";
pub const INFO_KEY_PATH: &str = "Path";
pub const INFO_KEY_PAGE: &str = "Page";

/// Fixed source tag carried by every record this crate publishes.
pub const SOURCE_SALVAGE: &str = "Salvage";

/// Classification of an anomaly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Base file has zero length.
    Empty,
    /// Header signature mismatch.
    NotADatabase,
    /// Recoverable damage in expected data shape (bad geometry, out-of-range
    /// page, short read, corrupt WAL).
    Corrupt,
    /// Purely observational record (diagnostic hints).
    Notice,
    /// Unclassified I/O failure propagated from open/stat/map primitives.
    Io,
}

/// How the surrounding pipeline should treat a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Continue with partial data.
    Ignore,
    /// Informational only.
    Notice,
    /// The operation cannot proceed.
    Fatal,
}

/// A value attached to a record under a string key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InfoValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Int(v) => write!(f, "{}", v),
            InfoValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One structured error record.
#[derive(Clone, Debug, Serialize)]
pub struct RepairError {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: String,
    pub infos: BTreeMap<String, InfoValue>,
}

impl RepairError {
    pub fn new(kind: ErrorKind, severity: Severity) -> Self {
        Self {
            kind,
            severity,
            message: String::new(),
            infos: BTreeMap::new(),
        }
    }

    /// Build an unclassified I/O record from a std error (severity Fatal).
    pub fn from_io(err: &io::Error, path: &Path) -> Self {
        Self::new(ErrorKind::Io, Severity::Fatal)
            .with_message(err.to_string())
            .with_info(INFO_KEY_SOURCE, SOURCE_SALVAGE)
            .with_info(INFO_KEY_PATH, path.display().to_string())
    }

    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_info<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<InfoValue>,
    {
        self.infos.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn is_corruption(&self) -> bool {
        self.kind == ErrorKind::Corrupt
    }

    /// Page number tag, if the record carries one.
    pub fn page(&self) -> Option<i64> {
        match self.infos.get(INFO_KEY_PAGE) {
            Some(InfoValue::Int(v)) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for RepairError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}/{:?}] {}", self.kind, self.severity, self.message)?;
        for (k, v) in &self.infos {
            write!(f, " {}={}", k, v)?;
        }
        Ok(())
    }
}

impl From<i64> for InfoValue {
    fn from(v: i64) -> Self {
        InfoValue::Int(v)
    }
}

impl From<u64> for InfoValue {
    fn from(v: u64) -> Self {
        InfoValue::Int(v.min(i64::MAX as u64) as i64)
    }
}

impl From<u32> for InfoValue {
    fn from(v: u32) -> Self {
        InfoValue::Int(v as i64)
    }
}

impl From<&str> for InfoValue {
    fn from(v: &str) -> Self {
        InfoValue::Text(v.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(v: String) -> Self {
        InfoValue::Text(v)
    }
}

// ---- Per-thread unclassified I/O slot ----

thread_local! {
    static THREADED_ERROR: RefCell<Option<RepairError>> = const { RefCell::new(None) };
}

/// Store the most recent unclassified I/O failure for this thread.
pub fn set_threaded_error(error: RepairError) {
    THREADED_ERROR.with(|slot| *slot.borrow_mut() = Some(error));
}

/// Take (and clear) the most recent unclassified I/O failure for this thread.
pub fn take_threaded_error() -> Option<RepairError> {
    THREADED_ERROR.with(|slot| slot.borrow_mut().take())
}
