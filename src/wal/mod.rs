//! wal — Log Overlay over a SQLite-format write-ahead log.
//!
//! Split:
//! - frame.rs   — format codecs: file header, frame header, the cumulative
//!   dual-accumulator checksum.
//! - overlay.rs — the Wal object: salvage-tolerant frame walk, page override
//!   map, salt/frame introspection, dispose(), hint().
//!
//! In this mod.rs:
//! - public format constants (importable as crate::wal::*),
//! - companion-path helpers (<db>-wal, <db>-shm),
//! - re-exports of the public types.

use std::path::{Path, PathBuf};

mod frame;
mod overlay;

pub use frame::{checksum_step, FrameHeader, WalHeader};
pub use overlay::Wal;

// -------------------- Format constants --------------------

/// Header magic with little-endian checksum ordering.
pub const WAL_MAGIC_LE: u32 = 0x377f_0682;
/// Header magic with big-endian checksum ordering.
pub const WAL_MAGIC_BE: u32 = 0x377f_0683;
/// The only file format version this overlay understands.
pub const WAL_VERSION: u32 = 3_007_000;

pub const WAL_HDR_SIZE: usize = 32;
pub const WAL_FRAME_HDR_SIZE: usize = 24;

// Offsets within the 32-byte file header (all fields big-endian)
pub const WAL_HDR_OFF_MAGIC: usize = 0;
pub const WAL_HDR_OFF_VERSION: usize = 4;
pub const WAL_HDR_OFF_PAGE_SIZE: usize = 8;
pub const WAL_HDR_OFF_CKPT_SEQ: usize = 12;
pub const WAL_HDR_OFF_SALT1: usize = 16;
pub const WAL_HDR_OFF_SALT2: usize = 20;
pub const WAL_HDR_OFF_CKSUM1: usize = 24;
pub const WAL_HDR_OFF_CKSUM2: usize = 28;

// Offsets within the 24-byte frame header
pub const WAL_FRAME_OFF_PAGENO: usize = 0;
pub const WAL_FRAME_OFF_DB_SIZE: usize = 4;
pub const WAL_FRAME_OFF_SALT1: usize = 8;
pub const WAL_FRAME_OFF_SALT2: usize = 12;
pub const WAL_FRAME_OFF_CKSUM1: usize = 16;
pub const WAL_FRAME_OFF_CKSUM2: usize = 20;

// -------------------- Companion paths --------------------

/// `<db>-wal` next to the base file.
pub fn wal_path(db: &Path) -> PathBuf {
    let mut os = db.as_os_str().to_os_string();
    os.push("-wal");
    PathBuf::from(os)
}

/// `<db>-shm` next to the base file.
pub fn shm_path(db: &Path) -> PathBuf {
    let mut os = db.as_os_str().to_os_string();
    os.push("-shm");
    PathBuf::from(os)
}
