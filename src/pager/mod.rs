//! pager — the read-only page-access orchestrator for corruption salvage.
//!
//! Split:
//! - core.rs — the Pager struct, one-shot lifecycle state, geometry
//!   accessors, WAL control surface, error marking, hint().
//! - init.rs — geometry discovery/validation and overlay initialization.
//! - io.rs   — page and raw-range acquisition with overlay delegation and
//!   short-read classification.
//!
//! In this mod.rs: base-file header constants and the PageGeometry
//! capability handed to the overlay (the overlay never sees the Pager).

mod core;
mod init;
mod io;

pub use self::core::{InitState, Pager};

// -------------------- Base-file header (all fields big-endian) --------------------

/// 16-byte signature at offset 0; exact match required.
pub const DB_SIGNATURE: &[u8; 16] = b"SQLite format 3\0";
/// Geometry probe: first 100 bytes of the file.
pub const DB_HDR_PROBE_SIZE: usize = 100;
pub const DB_HDR_OFF_PAGE_SIZE: usize = 16;
pub const DB_HDR_OFF_RESERVED_BYTES: usize = 20;

pub const MIN_PAGE_SIZE: u32 = 512;
pub const MAX_PAGE_SIZE: u32 = 65536;

/// Power of two in [512, 65536].
#[inline]
pub fn page_size_is_valid(page_size: u32) -> bool {
    page_size.is_power_of_two() && (MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size)
}

/// Narrow read-only geometry capability passed to the WAL overlay at its
/// initialization, instead of a back-pointer to the Pager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageGeometry {
    pub page_size: u32,
    pub reserved_bytes: u8,
}

impl PageGeometry {
    /// Page size minus the format's reserved tail.
    #[inline]
    pub fn usable_size(&self) -> u32 {
        self.page_size - u32::from(self.reserved_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_bounds() {
        for shift in 9..=16 {
            assert!(page_size_is_valid(1 << shift));
        }
        assert!(!page_size_is_valid(0));
        assert!(!page_size_is_valid(256));
        assert!(!page_size_is_valid(1000));
        assert!(!page_size_is_valid(131072));
    }

    #[test]
    fn usable_size_subtracts_reserved() {
        let g = PageGeometry {
            page_size: 4096,
            reserved_bytes: 32,
        };
        assert_eq!(g.usable_size(), 4064);
    }
}
