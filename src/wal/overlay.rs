//! wal/overlay — the Log Overlay object.
//!
//! Salvage posture: the walk keeps every fully-committed transaction up to
//! the first frame that fails its salt or cumulative checksum, and silently
//! drops the rest. Only structural damage that makes the whole log
//! untrustworthy (bad magic/version/page size, broken header checksum) is
//! classified as Corrupt; the pager decides whether that is fatal.

use log::debug;
use std::collections::HashMap;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{
    take_threaded_error, ErrorKind, RepairError, Severity, INFO_KEY_PAGE, INFO_KEY_PATH,
    INFO_KEY_SOURCE, SOURCE_SALVAGE,
};
use crate::fileops;
use crate::mapped::{FileHandle, MappedBuffer};
use crate::notify::Notifier;
use crate::pager::PageGeometry;

use super::frame::{frame_checksum_step, FrameHeader, WalHeader};
use super::{shm_path, wal_path, WAL_FRAME_HDR_SIZE, WAL_HDR_SIZE, WAL_VERSION};

/// Read-only overlay over `<db>-wal`: newest committed version of each page.
pub struct Wal {
    handle: FileHandle,
    shm: PathBuf,
    notifier: Arc<Notifier>,
    geometry: Option<PageGeometry>,

    salt: (u32, u32),
    /// Index of the last trusted commit frame.
    frame_count: u32,
    /// page number -> frame holding its newest committed image
    page_to_frame: HashMap<u32, u32>,
    max_overridden_page: u32,
    disposed_pages: usize,

    max_allowed_frame: u32,
    shm_legal: bool,
    initialized: bool,
    disposed: bool,
}

impl Wal {
    pub fn new(db_path: &std::path::Path, notifier: Arc<Notifier>) -> Self {
        Self {
            handle: FileHandle::new(wal_path(db_path)),
            shm: shm_path(db_path),
            notifier,
            geometry: None,
            salt: (0, 0),
            frame_count: 0,
            page_to_frame: HashMap::new(),
            max_overridden_page: 0,
            disposed_pages: 0,
            max_allowed_frame: u32::MAX,
            shm_legal: true,
            initialized: false,
            disposed: false,
        }
    }

    /// Cap how many frames are trusted. Must be set before initialize().
    pub fn set_max_allowed_frame(&mut self, max_frame: u32) {
        debug_assert!(!self.initialized);
        self.max_allowed_frame = max_frame;
    }

    /// Whether a companion `-shm` file is a legitimate, expected artifact.
    pub fn set_shm_legality(&mut self, legal: bool) {
        self.shm_legal = legal;
    }

    // ---- Introspection ----

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn contains_page(&self, number: u32) -> bool {
        !self.disposed && self.page_to_frame.contains_key(&number)
    }

    /// Highest page number overridden by a committed frame (0 after dispose).
    pub fn max_overridden_page(&self) -> u32 {
        if self.disposed {
            0
        } else {
            self.max_overridden_page
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn salt(&self) -> (u32, u32) {
        self.salt
    }

    pub fn disposed_page_count(&self) -> usize {
        self.disposed_pages
    }

    // ---- Lifecycle ----

    /// Parse the log and build the page override map.
    ///
    /// A missing wal file, or one shorter than its 32-byte header, is a
    /// successful empty overlay: there is simply nothing to fold in.
    pub fn initialize(&mut self, geometry: PageGeometry) -> Result<(), RepairError> {
        debug_assert!(!self.initialized);
        self.geometry = Some(geometry);

        if !self.shm_legal && self.shm.exists() {
            let notice = RepairError::new(ErrorKind::Notice, Severity::Notice)
                .with_message("unexpected shm companion will be ignored")
                .with_info(INFO_KEY_SOURCE, SOURCE_SALVAGE)
                .with_info(INFO_KEY_PATH, self.shm.display().to_string());
            self.notifier.notify(&notice);
        }

        let wal_size = match fileops::file_size(self.handle.path()) {
            Ok(n) => n,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                self.initialized = true;
                return Ok(());
            }
            Err(e) => return Err(RepairError::from_io(&e, self.handle.path())),
        };
        if wal_size < WAL_HDR_SIZE as u64 {
            self.initialized = true;
            return Ok(());
        }

        if !self.handle.open() {
            return Err(self.take_io_error());
        }

        let raw = self.handle.map_range(0, WAL_HDR_SIZE);
        if raw.len() != WAL_HDR_SIZE {
            return Err(self.take_io_error());
        }
        let header = WalHeader::parse(&raw);
        if !header.magic_is_valid() {
            return Err(self.mark_as_corrupted(
                None,
                format!("wal magic: {:#010x} is not recognized", header.magic),
            ));
        }
        if header.version != WAL_VERSION {
            return Err(self.mark_as_corrupted(
                None,
                format!("wal version: {} is not supported", header.version),
            ));
        }
        if header.page_size != geometry.page_size {
            return Err(self.mark_as_corrupted(
                None,
                format!(
                    "wal page size: {} does not match the database page size: {}",
                    header.page_size, geometry.page_size
                ),
            ));
        }
        if !header.verify_self_checksum(&raw) {
            return Err(self.mark_as_corrupted(None, "wal header checksum mismatch".to_string()));
        }

        self.salt = header.salt;
        self.walk_frames(&header, wal_size);
        self.initialized = true;
        Ok(())
    }

    /// Frame walk: verify salts and the cumulative checksum frame by frame,
    /// fold pages into the override map only at commit frames, stop quietly
    /// at the first invalid or truncated frame.
    fn walk_frames(&mut self, header: &WalHeader, wal_size: u64) {
        let ps = self.geometry.expect("geometry set").page_size as usize;
        let frame_size = (WAL_FRAME_HDR_SIZE + ps) as u64;
        let total = ((wal_size - WAL_HDR_SIZE as u64) / frame_size) as u32;
        let big_endian = header.checksum_big_endian();

        let mut running = header.checksum;
        let mut pending: Vec<(u32, u32)> = Vec::new();

        for index in 1..=total {
            if index > self.max_allowed_frame {
                debug!(
                    "wal frame {} beyond the allowed maximum {}, stopping",
                    index, self.max_allowed_frame
                );
                break;
            }
            let offset = WAL_HDR_SIZE as u64 + u64::from(index - 1) * frame_size;
            let raw = self.handle.map_range(offset, frame_size as usize);
            if raw.len() != frame_size as usize {
                debug!("wal frame {} truncated, stopping", index);
                break;
            }
            let frame = FrameHeader::parse(&raw);
            if frame.salt != self.salt {
                debug!("wal frame {} has stale salt, stopping", index);
                break;
            }
            running = frame_checksum_step(
                running,
                &raw[..WAL_FRAME_HDR_SIZE],
                &raw[WAL_FRAME_HDR_SIZE..],
                big_endian,
            );
            if running != frame.checksum {
                debug!("wal frame {} failed its checksum, stopping", index);
                break;
            }

            pending.push((frame.page_number, index));
            if frame.is_commit() {
                for (page, frame_no) in pending.drain(..) {
                    self.page_to_frame.insert(page, frame_no);
                    self.max_overridden_page = self.max_overridden_page.max(page);
                }
                self.frame_count = index;
            }
        }
        if !pending.is_empty() {
            debug!(
                "wal tail holds {} uncommitted frames, dropped",
                pending.len()
            );
        }
    }

    /// Discard all overlay state; subsequent reads see the base file only.
    pub fn dispose(&mut self) {
        self.disposed_pages += self.page_to_frame.len();
        self.page_to_frame.clear();
        self.frame_count = 0;
        self.max_overridden_page = 0;
        self.disposed = true;
    }

    // ---- Page access ----

    /// Map `size` bytes at `offset` within the newest committed image of
    /// page `number`. Asking for a page the overlay does not hold is a
    /// Corrupt-classified failure, not a panic.
    pub fn acquire_page_data(
        &mut self,
        number: u32,
        offset: u64,
        size: usize,
    ) -> Result<MappedBuffer, RepairError> {
        debug_assert!(self.initialized);
        let frame = match self.page_to_frame.get(&number) {
            Some(f) if !self.disposed => *f,
            _ => {
                return Err(self.mark_as_corrupted(
                    Some(number),
                    format!("acquired page number: {} is not in the wal", number),
                ))
            }
        };
        let ps = self.geometry.expect("geometry set").page_size as u64;
        let frame_size = WAL_FRAME_HDR_SIZE as u64 + ps;
        let data_offset =
            WAL_HDR_SIZE as u64 + u64::from(frame - 1) * frame_size + WAL_FRAME_HDR_SIZE as u64;

        let data = self.handle.map_range(data_offset + offset, size);
        if data.len() == size {
            return Ok(data);
        }
        if data.is_empty() {
            return Err(self.take_io_error());
        }
        Err(self.mark_as_corrupted(
            Some(number),
            format!(
                "acquired wal page data with size: {} is less than the expected size: {}",
                data.len(),
                size
            ),
        ))
    }

    // ---- Diagnostics ----

    /// Publish a Notice with the overlay's state. Never changes state.
    pub fn hint(&self) {
        if !self.initialized {
            return;
        }
        let error = RepairError::new(ErrorKind::Notice, Severity::Notice)
            .with_message("wal hint")
            .with_info(INFO_KEY_SOURCE, SOURCE_SALVAGE)
            .with_info(INFO_KEY_PATH, self.handle.path().display().to_string())
            .with_info("FrameCount", self.frame_count)
            .with_info("Salt1", self.salt.0)
            .with_info("Salt2", self.salt.1)
            .with_info("OverriddenPages", self.page_to_frame.len() as u64)
            .with_info("DisposedPages", self.disposed_pages as u64);
        self.notifier.notify(&error);
    }

    // ---- Error marking ----

    fn mark_as_corrupted(&self, page: Option<u32>, message: String) -> RepairError {
        let mut error = RepairError::new(ErrorKind::Corrupt, Severity::Ignore)
            .with_message(message)
            .with_info(INFO_KEY_SOURCE, SOURCE_SALVAGE)
            .with_info(INFO_KEY_PATH, self.handle.path().display().to_string());
        if let Some(page) = page {
            error = error.with_info(INFO_KEY_PAGE, page);
        }
        self.notifier.notify(&error);
        error
    }

    fn take_io_error(&self) -> RepairError {
        take_threaded_error().unwrap_or_else(|| {
            RepairError::new(ErrorKind::Io, Severity::Fatal)
                .with_message("unknown I/O failure")
                .with_info(INFO_KEY_SOURCE, SOURCE_SALVAGE)
                .with_info(INFO_KEY_PATH, self.handle.path().display().to_string())
        })
    }
}
