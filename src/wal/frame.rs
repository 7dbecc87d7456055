//! wal/frame — WAL format codecs.
//!
//! All header and frame fields are serialized big-endian. The cumulative
//! checksum is the dual-accumulator scheme over 8-byte chunks; whether each
//! chunk's two u32 words are read little- or big-endian is selected by the
//! low bit of the header magic.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::{
    WAL_FRAME_HDR_SIZE, WAL_FRAME_OFF_CKSUM1, WAL_FRAME_OFF_CKSUM2, WAL_FRAME_OFF_DB_SIZE,
    WAL_FRAME_OFF_PAGENO, WAL_FRAME_OFF_SALT1, WAL_FRAME_OFF_SALT2, WAL_HDR_OFF_CKPT_SEQ,
    WAL_HDR_OFF_CKSUM1, WAL_HDR_OFF_CKSUM2, WAL_HDR_OFF_MAGIC, WAL_HDR_OFF_PAGE_SIZE,
    WAL_HDR_OFF_SALT1, WAL_HDR_OFF_SALT2, WAL_HDR_OFF_VERSION, WAL_HDR_SIZE, WAL_MAGIC_BE,
    WAL_MAGIC_LE,
};

/// Advance the running (s1, s2) checksum over `data`.
///
/// `data` length must be a multiple of 8. `big_endian` selects the word
/// order inside each 8-byte chunk (from the header magic, NOT the field
/// serialization, which is always big-endian).
#[inline]
pub fn checksum_step(state: (u32, u32), data: &[u8], big_endian: bool) -> (u32, u32) {
    debug_assert!(data.len() % 8 == 0);
    let (mut s1, mut s2) = state;
    for chunk in data.chunks_exact(8) {
        let (x0, x1) = if big_endian {
            (
                BigEndian::read_u32(&chunk[0..4]),
                BigEndian::read_u32(&chunk[4..8]),
            )
        } else {
            (
                LittleEndian::read_u32(&chunk[0..4]),
                LittleEndian::read_u32(&chunk[4..8]),
            )
        };
        s1 = s1.wrapping_add(x0).wrapping_add(s2);
        s2 = s2.wrapping_add(x1).wrapping_add(s1);
    }
    (s1, s2)
}

/// Parsed 32-byte WAL file header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalHeader {
    pub magic: u32,
    pub version: u32,
    pub page_size: u32,
    pub checkpoint_seq: u32,
    pub salt: (u32, u32),
    pub checksum: (u32, u32),
}

impl WalHeader {
    pub fn parse(raw: &[u8]) -> Self {
        debug_assert!(raw.len() >= WAL_HDR_SIZE);
        Self {
            magic: BigEndian::read_u32(&raw[WAL_HDR_OFF_MAGIC..WAL_HDR_OFF_MAGIC + 4]),
            version: BigEndian::read_u32(&raw[WAL_HDR_OFF_VERSION..WAL_HDR_OFF_VERSION + 4]),
            page_size: BigEndian::read_u32(&raw[WAL_HDR_OFF_PAGE_SIZE..WAL_HDR_OFF_PAGE_SIZE + 4]),
            checkpoint_seq: BigEndian::read_u32(&raw[WAL_HDR_OFF_CKPT_SEQ..WAL_HDR_OFF_CKPT_SEQ + 4]),
            salt: (
                BigEndian::read_u32(&raw[WAL_HDR_OFF_SALT1..WAL_HDR_OFF_SALT1 + 4]),
                BigEndian::read_u32(&raw[WAL_HDR_OFF_SALT2..WAL_HDR_OFF_SALT2 + 4]),
            ),
            checksum: (
                BigEndian::read_u32(&raw[WAL_HDR_OFF_CKSUM1..WAL_HDR_OFF_CKSUM1 + 4]),
                BigEndian::read_u32(&raw[WAL_HDR_OFF_CKSUM2..WAL_HDR_OFF_CKSUM2 + 4]),
            ),
        }
    }

    #[inline]
    pub fn magic_is_valid(&self) -> bool {
        self.magic == WAL_MAGIC_LE || self.magic == WAL_MAGIC_BE
    }

    /// Word order used by the cumulative checksum.
    #[inline]
    pub fn checksum_big_endian(&self) -> bool {
        self.magic == WAL_MAGIC_BE
    }

    /// Recompute the self-checksum over the first 24 header bytes.
    pub fn verify_self_checksum(&self, raw: &[u8]) -> bool {
        debug_assert!(raw.len() >= WAL_HDR_SIZE);
        checksum_step((0, 0), &raw[..WAL_HDR_OFF_CKSUM1], self.checksum_big_endian())
            == self.checksum
    }
}

/// Parsed 24-byte frame header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub page_number: u32,
    /// Database size in pages after this frame; non-zero marks a commit.
    pub db_size: u32,
    pub salt: (u32, u32),
    pub checksum: (u32, u32),
}

impl FrameHeader {
    pub fn parse(raw: &[u8]) -> Self {
        debug_assert!(raw.len() >= WAL_FRAME_HDR_SIZE);
        Self {
            page_number: BigEndian::read_u32(&raw[WAL_FRAME_OFF_PAGENO..WAL_FRAME_OFF_PAGENO + 4]),
            db_size: BigEndian::read_u32(&raw[WAL_FRAME_OFF_DB_SIZE..WAL_FRAME_OFF_DB_SIZE + 4]),
            salt: (
                BigEndian::read_u32(&raw[WAL_FRAME_OFF_SALT1..WAL_FRAME_OFF_SALT1 + 4]),
                BigEndian::read_u32(&raw[WAL_FRAME_OFF_SALT2..WAL_FRAME_OFF_SALT2 + 4]),
            ),
            checksum: (
                BigEndian::read_u32(&raw[WAL_FRAME_OFF_CKSUM1..WAL_FRAME_OFF_CKSUM1 + 4]),
                BigEndian::read_u32(&raw[WAL_FRAME_OFF_CKSUM2..WAL_FRAME_OFF_CKSUM2 + 4]),
            ),
        }
    }

    #[inline]
    pub fn is_commit(&self) -> bool {
        self.db_size != 0
    }
}

/// Advance the running checksum across one frame: the first 8 header bytes
/// (page number + db size) followed by the page image.
pub fn frame_checksum_step(
    state: (u32, u32),
    frame_header: &[u8],
    page_data: &[u8],
    big_endian: bool,
) -> (u32, u32) {
    let s = checksum_step(state, &frame_header[..8], big_endian);
    checksum_step(s, page_data, big_endian)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, ByteOrder};

    #[test]
    fn checksum_known_vector() {
        // one chunk, big-endian words: x0=1, x1=2
        let mut chunk = [0u8; 8];
        BigEndian::write_u32(&mut chunk[0..4], 1);
        BigEndian::write_u32(&mut chunk[4..8], 2);
        let (s1, s2) = checksum_step((0, 0), &chunk, true);
        // s1 = 0 + 1 + 0 = 1; s2 = 0 + 2 + 1 = 3
        assert_eq!((s1, s2), (1, 3));

        // chained second chunk
        let (s1, s2) = checksum_step((s1, s2), &chunk, true);
        assert_eq!(s1, 1 + 1 + 3);
        assert_eq!(s2, 3 + 2 + s1);
    }

    #[test]
    fn word_order_follows_flag() {
        let chunk = [0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00];
        let be = checksum_step((0, 0), &chunk, true);
        let le = checksum_step((0, 0), &chunk, false);
        assert_ne!(be, le);
        assert_eq!(le, (1, 3));
    }

    #[test]
    fn header_parse_and_verify() {
        let mut raw = [0u8; WAL_HDR_SIZE];
        BigEndian::write_u32(&mut raw[0..4], WAL_MAGIC_BE);
        BigEndian::write_u32(&mut raw[4..8], super::super::WAL_VERSION);
        BigEndian::write_u32(&mut raw[8..12], 4096);
        BigEndian::write_u32(&mut raw[12..16], 7);
        BigEndian::write_u32(&mut raw[16..20], 0xAAAA_AAAA);
        BigEndian::write_u32(&mut raw[20..24], 0xBBBB_BBBB);
        let cks = checksum_step((0, 0), &raw[..24], true);
        BigEndian::write_u32(&mut raw[24..28], cks.0);
        BigEndian::write_u32(&mut raw[28..32], cks.1);

        let h = WalHeader::parse(&raw);
        assert!(h.magic_is_valid());
        assert!(h.checksum_big_endian());
        assert_eq!(h.page_size, 4096);
        assert_eq!(h.checkpoint_seq, 7);
        assert_eq!(h.salt, (0xAAAA_AAAA, 0xBBBB_BBBB));
        assert!(h.verify_self_checksum(&raw));

        // flip one salt byte: self-checksum must fail
        raw[17] ^= 0xFF;
        let h2 = WalHeader::parse(&raw);
        assert!(!h2.verify_self_checksum(&raw));
    }

    #[test]
    fn frame_parse_commit_flag() {
        let mut raw = [0u8; WAL_FRAME_HDR_SIZE];
        BigEndian::write_u32(&mut raw[0..4], 12);
        BigEndian::write_u32(&mut raw[4..8], 0);
        let f = FrameHeader::parse(&raw);
        assert_eq!(f.page_number, 12);
        assert!(!f.is_commit());

        BigEndian::write_u32(&mut raw[4..8], 34);
        assert!(FrameHeader::parse(&raw).is_commit());
    }
}
