//! pager/init — one-shot geometry discovery and overlay initialization.

use byteorder::{BigEndian, ByteOrder};
use log::debug;

use crate::error::{ErrorKind, RepairError};
use crate::fileops;

use super::core::{InitState, Pager};
use super::{
    page_size_is_valid, PageGeometry, DB_HDR_OFF_PAGE_SIZE, DB_HDR_OFF_RESERVED_BYTES,
    DB_HDR_PROBE_SIZE, DB_SIGNATURE,
};

impl Pager {
    /// Runs at most once per instance. On failure the pager stays Failed
    /// and last_error() explains why; re-initialization is unsupported.
    pub fn initialize(&mut self) -> Result<(), RepairError> {
        assert_eq!(self.state, InitState::Uninitialized);
        self.state = InitState::Initializing;
        match self.do_initialize() {
            Ok(()) => {
                self.state = InitState::Initialized;
                Ok(())
            }
            Err(error) => {
                self.state = InitState::Failed;
                Err(error)
            }
        }
    }

    fn do_initialize(&mut self) -> Result<(), RepairError> {
        self.file_size = match fileops::file_size(self.path()) {
            Ok(n) => n,
            Err(e) => {
                // stat failure is unclassified: recorded locally, not published
                let error = RepairError::from_io(&e, self.path());
                self.last_error = Some(error.clone());
                return Err(error);
            }
        };
        if self.file_size == 0 {
            return Err(self.mark_as_error(ErrorKind::Empty));
        }

        if !self.handle.open() {
            return Err(self.assign_with_threaded_error());
        }
        fileops::apply_first_access_protection(self.path());

        if self.page_size.is_none() || self.reserved_bytes.is_none() {
            let data = match self.acquire_data(0, DB_HDR_PROBE_SIZE) {
                Some(d) => d,
                None => {
                    return Err(self
                        .last_error
                        .clone()
                        .expect("acquire_data records its failure"))
                }
            };
            if &data[..DB_SIGNATURE.len()] != DB_SIGNATURE {
                return Err(self.mark_as_error(ErrorKind::NotADatabase));
            }
            if self.page_size.is_none() {
                let raw = BigEndian::read_u16(
                    &data[DB_HDR_OFF_PAGE_SIZE..DB_HDR_OFF_PAGE_SIZE + 2],
                );
                self.page_size = Some(u32::from(raw));
            }
            if self.reserved_bytes.is_none() {
                self.reserved_bytes = Some(data[DB_HDR_OFF_RESERVED_BYTES]);
            }
        }

        let page_size = self.page_size.expect("page size resolved above");
        if !page_size_is_valid(page_size) {
            return Err(self.mark_as_corrupted(
                1,
                format!(
                    "page size: {} is not a power of two or out of [512, 65536]",
                    page_size
                ),
            ));
        }
        // reserved_bytes is u8, so the [0, 255] bound holds by construction
        let reserved_bytes = self.reserved_bytes.unwrap_or(0);
        self.reserved_bytes = Some(reserved_bytes);

        self.handle.set_page_size(page_size);
        self.base_pages =
            ((self.file_size + u64::from(page_size) - 1) / u64::from(page_size)) as u32;
        debug!(
            "pager geometry: page_size={} reserved={} file_size={} pages={}",
            page_size, reserved_bytes, self.file_size, self.base_pages
        );

        let geometry = PageGeometry {
            page_size,
            reserved_bytes,
        };
        match self.wal.initialize(geometry) {
            Ok(()) => Ok(()),
            Err(error) => {
                self.last_error = Some(error.clone());
                if self.wal_importance || !error.is_corruption() {
                    return Err(error);
                }
                // Unimportant, corruption-class log: throw the overlay away
                // and keep serving the base file.
                debug!("wal discarded after corruption, degrading to base-file reads");
                self.dispose_wal();
                Ok(())
            }
        }
    }
}
