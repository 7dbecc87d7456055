//! pager/io — page and raw-range acquisition.
//!
//! Delegation order for page reads: overlay first (overlay always wins),
//! then the base-file bounds check, then the mapping itself. Every anomaly
//! is classified and recorded rather than thrown away:
//! - out-of-range page number => Corrupt (logical bound violation, the
//!   mapping primitive is never touched),
//! - non-empty short result   => Corrupt on the offending page,
//! - empty result             => unclassified I/O failure adopted from the
//!   per-thread slot (the map call itself failed).

use crate::mapped::MappedBuffer;

use super::core::Pager;

impl Pager {
    /// Whole-page read: acquire_page_data_range(number, 0, page_size).
    pub fn acquire_page_data(&mut self, number: u32) -> Option<MappedBuffer> {
        let size = self.page_size() as usize;
        self.acquire_page_data_range(number, 0, size)
    }

    /// Read `size` bytes of page `number` starting at `offset` in the page,
    /// overlay-aware. None means failure with last_error() set.
    pub fn acquire_page_data_range(
        &mut self,
        number: u32,
        offset: u64,
        size: usize,
    ) -> Option<MappedBuffer> {
        assert!(self.is_initialized());
        assert!(number > 0);
        assert!(offset + size as u64 <= u64::from(self.page_size()));

        if self.wal.contains_page(number) {
            return match self.wal.acquire_page_data(number, offset, size) {
                Ok(data) => Some(data),
                Err(error) => {
                    self.last_error = Some(error);
                    None
                }
            };
        }
        if number > self.base_pages {
            self.mark_as_corrupted(
                number,
                format!(
                    "acquired page number: {} exceeds the page count: {}",
                    number, self.base_pages
                ),
            );
            return None;
        }
        let data = self.handle.map_page(number, offset, size);
        self.finish_read(data, offset, size)
    }

    /// Map an arbitrary byte range of the base file, bypassing the overlay
    /// and page bounds. Valid as soon as the file is open (geometry
    /// discovery itself uses this).
    pub fn acquire_data(&mut self, offset: u64, size: usize) -> Option<MappedBuffer> {
        assert!(self.handle.is_opened());
        let data = self.handle.map_range(offset, size);
        self.finish_read(data, offset, size)
    }

    /// A short read is attributed to page `offset / page_size + 1`, where
    /// `offset` is the range start as the caller addressed it: page-relative
    /// for page reads (so a whole-page short read always lands on page 1),
    /// absolute for raw-range reads.
    fn finish_read(
        &mut self,
        data: MappedBuffer,
        offset: u64,
        size: usize,
    ) -> Option<MappedBuffer> {
        if data.len() == size {
            return Some(data);
        }
        if data.is_empty() {
            self.assign_with_threaded_error();
        } else {
            // During geometry discovery the page size is still unknown and
            // offset is 0, which lands on page 1.
            let number = self
                .page_size
                .map(|ps| (offset / u64::from(ps)) as u32)
                .unwrap_or(0)
                + 1;
            self.mark_as_corrupted(
                number,
                format!(
                    "acquired page data with size: {} is less than the expected size: {}",
                    data.len(),
                    size
                ),
            );
        }
        None
    }
}
