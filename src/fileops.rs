//! fileops — small file utilities shared by the pager and the WAL overlay.
//!
//! Contains:
//! - file_size(): stat-based byte length.
//! - apply_first_access_protection(): platform file-protection hook. Some
//!   mobile platforms restrict access to files created before the first
//!   user unlock; on the targets we build for this is a documented no-op,
//!   kept so call sites mirror the intended open sequence.

use std::fs;
use std::io;
use std::path::Path;

/// Byte length of a file (stat).
#[inline]
pub fn file_size(path: &Path) -> io::Result<u64> {
    fs::metadata(path).map(|m| m.len())
}

/// Relax the platform's first-access protection class for `path`, where such
/// a concept exists. No-op everywhere this crate currently builds.
#[inline]
pub fn apply_first_access_protection(_path: &Path) {}
