//! pager/core — the Pager struct, lifecycle state and common surface.

use std::path::Path;
use std::sync::Arc;

use crate::error::{
    take_threaded_error, ErrorKind, RepairError, Severity, INFO_KEY_PAGE, INFO_KEY_PATH,
    INFO_KEY_SOURCE, SOURCE_SALVAGE,
};
use crate::fileops;
use crate::mapped::FileHandle;
use crate::notify::Notifier;
use crate::wal::Wal;

/// One-shot initialization lifecycle. The transition is triggered exactly
/// once by initialize() and is not reversible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    Initializing,
    Initialized,
    Failed,
}

/// Read-only, page-granular access to one base file plus its WAL overlay.
/// One instance per salvage target; callers serialize access themselves.
pub struct Pager {
    pub(crate) handle: FileHandle,
    pub(crate) notifier: Arc<Notifier>,
    pub(crate) wal: Wal,

    pub(crate) page_size: Option<u32>,
    pub(crate) reserved_bytes: Option<u8>,
    /// Base-file byte length snapshotted at initialization.
    pub(crate) file_size: u64,
    /// Base-file page count (independent of overlay overrides).
    pub(crate) base_pages: u32,

    /// If true, a corrupt or unavailable log aborts initialization; if
    /// false, a corrupt log is discarded and reads degrade to the base file.
    pub(crate) wal_importance: bool,

    pub(crate) state: InitState,
    pub(crate) last_error: Option<RepairError>,
}

impl Pager {
    pub fn new<P: AsRef<Path>>(path: P, notifier: Arc<Notifier>) -> Self {
        let path = path.as_ref();
        Self {
            handle: FileHandle::new(path),
            wal: Wal::new(path, notifier.clone()),
            notifier,
            page_size: None,
            reserved_bytes: None,
            file_size: 0,
            base_pages: 0,
            wal_importance: true,
            state: InitState::Uninitialized,
            last_error: None,
        }
    }

    /// Construct with a `SalvageConfig` applied.
    pub fn with_config<P: AsRef<Path>>(
        path: P,
        notifier: Arc<Notifier>,
        config: &crate::config::SalvageConfig,
    ) -> Self {
        let mut pager = Self::new(path, notifier);
        if let Some(ps) = config.page_size {
            pager.set_page_size(ps);
        }
        if let Some(rb) = config.reserved_bytes {
            pager.set_reserved_bytes(rb);
        }
        pager.set_wal_importance(config.wal_importance);
        pager.set_max_wal_frame(config.max_wal_frame);
        pager
    }

    #[inline]
    pub fn path(&self) -> &Path {
        self.handle.path()
    }

    // ---- Pre-initialization configuration ----

    /// Fix the page size instead of discovering it from the header.
    pub fn set_page_size(&mut self, page_size: u32) {
        assert_eq!(self.state, InitState::Uninitialized);
        self.page_size = Some(page_size);
    }

    /// Fix the reserved-byte count instead of discovering it.
    pub fn set_reserved_bytes(&mut self, reserved_bytes: u8) {
        assert_eq!(self.state, InitState::Uninitialized);
        self.reserved_bytes = Some(reserved_bytes);
    }

    /// WAL fatality policy; also tells the overlay whether its shm
    /// companion is a legitimate artifact.
    pub fn set_wal_importance(&mut self, important: bool) {
        self.wal_importance = important;
        self.wal.set_shm_legality(important);
    }

    /// Trust at most `max_frame` overlay frames. Must precede initialize().
    pub fn set_max_wal_frame(&mut self, max_frame: u32) {
        assert_eq!(self.state, InitState::Uninitialized);
        self.wal.set_max_allowed_frame(max_frame);
    }

    // ---- Lifecycle queries ----

    #[inline]
    pub fn state(&self) -> InitState {
        self.state
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.state == InitState::Initialized
    }

    #[inline]
    pub fn is_initializing(&self) -> bool {
        self.state == InitState::Initializing
    }

    // ---- Geometry accessors ----
    // Size geometry is usable as soon as initialization has started (the
    // discovery path itself reads ranges); page counts only once it is done.
    // Calling earlier is a programming error, not a runtime failure.

    pub fn page_size(&self) -> u32 {
        assert!(self.is_initialized() || self.is_initializing());
        self.page_size.expect("page size fixed during initialization")
    }

    pub fn usable_size(&self) -> u32 {
        self.page_size() - u32::from(self.reserved_bytes.unwrap_or(0))
    }

    pub fn reserved_bytes(&self) -> u8 {
        assert!(self.is_initialized());
        self.reserved_bytes
            .expect("reserved bytes fixed during initialization")
    }

    /// Base-file byte length observed at initialization.
    pub fn file_size(&self) -> u64 {
        assert!(self.is_initialized());
        self.file_size
    }

    /// Effective page count: the overlay may reference pages committed to
    /// the log but never folded back into the base file.
    pub fn number_of_pages(&self) -> u32 {
        assert!(self.is_initialized());
        self.wal.max_overridden_page().max(self.base_pages)
    }

    // ---- WAL control surface ----

    pub fn dispose_wal(&mut self) {
        self.wal.dispose();
    }

    pub fn disposed_wal_page_count(&self) -> usize {
        self.wal.disposed_page_count()
    }

    pub fn wal_frame_count(&self) -> u32 {
        self.wal.frame_count()
    }

    pub fn wal_salt(&self) -> (u32, u32) {
        self.wal.salt()
    }

    // ---- Errors ----

    /// Most recent classified error, if any.
    pub fn last_error(&self) -> Option<&RepairError> {
        self.last_error.as_ref()
    }

    /// Build, publish and store a Corrupt record tagged with `page`.
    pub(crate) fn mark_as_corrupted(&mut self, page: u32, message: String) -> RepairError {
        let error = RepairError::new(ErrorKind::Corrupt, Severity::Ignore)
            .with_message(message)
            .with_info(INFO_KEY_SOURCE, SOURCE_SALVAGE)
            .with_info(INFO_KEY_PATH, self.path().display().to_string())
            .with_info(INFO_KEY_PAGE, page);
        self.notifier.notify(&error);
        self.last_error = Some(error.clone());
        error
    }

    /// Same publication path for non-page-specific classifications.
    pub(crate) fn mark_as_error(&mut self, kind: ErrorKind) -> RepairError {
        let error = RepairError::new(kind, Severity::Ignore)
            .with_info(INFO_KEY_SOURCE, SOURCE_SALVAGE)
            .with_info(INFO_KEY_PATH, self.path().display().to_string());
        self.notifier.notify(&error);
        self.last_error = Some(error.clone());
        error
    }

    /// Adopt the unclassified I/O failure left in the per-thread slot by
    /// the mapping/stat layer. Recorded locally only, never published.
    pub(crate) fn assign_with_threaded_error(&mut self) -> RepairError {
        let error = take_threaded_error().unwrap_or_else(|| {
            RepairError::new(ErrorKind::Io, Severity::Fatal)
                .with_message("unknown I/O failure")
                .with_info(INFO_KEY_SOURCE, SOURCE_SALVAGE)
                .with_info(INFO_KEY_PATH, self.path().display().to_string())
        });
        self.last_error = Some(error.clone());
        error
    }

    // ---- Diagnostics ----

    /// Publish a Notice describing the pager's view of the file, then let
    /// the overlay add its own. Purely observational; no state changes.
    pub fn hint(&self) {
        if !self.is_initialized() {
            return;
        }
        let mut error = RepairError::new(ErrorKind::Notice, Severity::Notice)
            .with_message("pager hint")
            .with_info(INFO_KEY_SOURCE, SOURCE_SALVAGE)
            .with_info(INFO_KEY_PATH, self.path().display().to_string())
            .with_info("NumberOfPages", self.base_pages)
            .with_info("OriginFileSize", self.file_size);
        if let Ok(current) = fileops::file_size(self.path()) {
            error = error.with_info("CurrentFileSize", current);
        }
        self.notifier.notify(&error);
        self.wal.hint();
    }
}
