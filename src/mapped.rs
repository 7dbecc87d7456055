//! mapped — read-only file mapping for page and range access.
//!
//! Strategy: map the WHOLE file once at open (offset 0, page-aligned) and
//! hand out MappedBuffer views into it. Views clamp at end of file:
//! - a request reaching past EOF yields a buffer SHORTER than asked for
//!   (callers classify that as a short read),
//! - a request fully outside the file, or against an unopened handle,
//!   yields an EMPTY buffer after recording an unclassified I/O error in
//!   the per-thread slot.
//!
//! Buffers stay valid for as long as the caller holds them (shared Mmap);
//! nothing is copied.

use memmap2::{Mmap, MmapOptions};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{set_threaded_error, RepairError};

/// A borrowed view into a mapped file: shared map + byte range.
/// Cloning is cheap (Arc bump); an empty buffer signals total failure.
#[derive(Clone, Debug)]
pub struct MappedBuffer {
    map: Option<Arc<Mmap>>,
    offset: usize,
    len: usize,
}

impl MappedBuffer {
    pub fn empty() -> Self {
        Self {
            map: None,
            offset: 0,
            len: 0,
        }
    }

    fn new(map: Arc<Mmap>, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len <= map.len());
        Self {
            map: Some(map),
            offset,
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        match &self.map {
            Some(m) => &m[self.offset..self.offset + self.len],
            None => &[],
        }
    }
}

impl std::ops::Deref for MappedBuffer {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// Read-only handle over one base or WAL file.
pub struct FileHandle {
    path: PathBuf,
    map: Option<Arc<Mmap>>,
    page_size: Option<u32>,
    opened: bool,
}

impl FileHandle {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            map: None,
            page_size: None,
            opened: false,
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// Fix the page size used by map_page (set after geometry discovery).
    pub fn set_page_size(&mut self, page_size: u32) {
        debug_assert!(page_size > 0);
        self.page_size = Some(page_size);
    }

    /// Open read-only and map the whole file. Returns false on failure with
    /// the underlying error recorded in the per-thread slot.
    pub fn open(&mut self) -> bool {
        let file = match OpenOptions::new().read(true).open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                set_threaded_error(RepairError::from_io(&e, &self.path));
                return false;
            }
        };
        let len = match file.metadata() {
            Ok(m) => m.len(),
            Err(e) => {
                set_threaded_error(RepairError::from_io(&e, &self.path));
                return false;
            }
        };
        if len > 0 {
            // SAFETY: the handle is read-only and the salvage model assumes
            // exclusive ownership of the target file for the session.
            let map = match unsafe { MmapOptions::new().len(len as usize).map(&file) } {
                Ok(m) => m,
                Err(e) => {
                    set_threaded_error(RepairError::from_io(&e, &self.path));
                    return false;
                }
            };
            self.map = Some(Arc::new(map));
        }
        self.opened = true;
        true
    }

    /// Map `size` bytes of page `number` (1-based) starting at `offset`
    /// within the page. Requires set_page_size() first.
    pub fn map_page(&self, number: u32, offset: u64, size: usize) -> MappedBuffer {
        debug_assert!(number > 0);
        let ps = self
            .page_size
            .expect("map_page requires a fixed page size") as u64;
        self.map_range((u64::from(number) - 1) * ps + offset, size)
    }

    /// Map an arbitrary byte range. Clamps at EOF; see module docs for the
    /// short/empty semantics.
    pub fn map_range(&self, offset: u64, size: usize) -> MappedBuffer {
        let map = match (&self.map, self.opened) {
            (Some(m), true) => m.clone(),
            _ => {
                set_threaded_error(RepairError::from_io(
                    &std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "file is not opened or not mapped",
                    ),
                    &self.path,
                ));
                return MappedBuffer::empty();
            }
        };
        let file_len = map.len() as u64;
        if offset >= file_len {
            set_threaded_error(RepairError::from_io(
                &std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "map offset {} is beyond end of file (len {})",
                        offset, file_len
                    ),
                ),
                &self.path,
            ));
            return MappedBuffer::empty();
        }
        let avail = (file_len - offset).min(size as u64) as usize;
        MappedBuffer::new(map, offset as usize, avail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::take_threaded_error;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn map_range_exact_and_short() {
        let p = unique_path("map");
        fs::write(&p, vec![0xABu8; 100]).unwrap();

        let mut h = FileHandle::new(&p);
        assert!(h.open());
        assert!(h.is_opened());

        let full = h.map_range(0, 100);
        assert_eq!(full.len(), 100);
        assert_eq!(full[0], 0xAB);

        // short read past EOF
        let short = h.map_range(40, 100);
        assert_eq!(short.len(), 60);

        // fully past EOF: empty + threaded error
        let _ = take_threaded_error();
        let none = h.map_range(200, 10);
        assert!(none.is_empty());
        assert!(take_threaded_error().is_some());

        fs::remove_file(&p).unwrap();
    }

    #[test]
    fn map_page_uses_fixed_page_size() {
        let p = unique_path("map-page");
        let mut content = vec![0u8; 64];
        content.extend(vec![1u8; 64]);
        fs::write(&p, &content).unwrap();

        let mut h = FileHandle::new(&p);
        assert!(h.open());
        h.set_page_size(64);

        let page2 = h.map_page(2, 0, 64);
        assert_eq!(page2.len(), 64);
        assert!(page2.iter().all(|&b| b == 1));

        let tail = h.map_page(2, 32, 32);
        assert_eq!(tail.len(), 32);

        fs::remove_file(&p).unwrap();
    }

    #[test]
    fn unopened_handle_maps_empty() {
        let h = FileHandle::new(unique_path("map-unopened"));
        let _ = take_threaded_error();
        assert!(h.map_range(0, 16).is_empty());
        assert!(take_threaded_error().is_some());
    }

    fn unique_path(prefix: &str) -> PathBuf {
        let pid = std::process::id();
        let t = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("salvager-{}-{}-{}", prefix, pid, t))
    }
}
