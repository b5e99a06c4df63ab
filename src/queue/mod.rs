//! A bounded blocking FIFO queue persisted in a memory-mapped file.
//!
//! The file is managed in fixed-size blocks. A 20-byte header at offset
//! zero records the file geometry and the live cursors; the rest of the
//! file is a ring of length-prefixed records threaded by the `head` and
//! `tail` cursors. Space is accounted in whole blocks by a producer
//! semaphore, enqueued records by a consumer semaphore, and the header
//! metadata by a read/write lock. See [`PersistentQueue`] for the
//! operation contract.

mod iter;
mod persistent;
pub(crate) mod view;

pub use iter::Iter;
pub use persistent::PersistentQueue;

use crate::error::{Error, Result};

/// Width of the record length prefix and of each header field.
pub(crate) const INT_SIZE: i32 = 4;

/// Bytes of the file header: five big-endian `i32`s, in order
/// `file_size`, `block_size`, `count`, `head`, `tail`.
pub(crate) const HEADER_LEN: usize = 20;

/// Fixed geometry of a queue file, validated at construction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Geometry {
    pub file_size: i32,
    pub block_size: i32,
    /// First byte past the header's reserved blocks; the ring area
    /// spans from here to `file_size`.
    pub first_usable_block: i32,
}

impl Geometry {
    pub fn new(block_size: i32, file_size: i32) -> Result<Self> {
        if block_size < INT_SIZE {
            return Err(Error::InvalidArgument(
                "block size must be >= 4 bytes".to_string(),
            ));
        }

        if file_size < block_size {
            return Err(Error::InvalidArgument(
                "file size must have enough space for one block".to_string(),
            ));
        }

        if file_size % block_size != 0 {
            return Err(Error::InvalidArgument(format!(
                "file size {file_size} is not a multiple of block size {block_size}"
            )));
        }

        let header_blocks = (HEADER_LEN as i32 + block_size - 1) / block_size;

        let geometry = Self {
            file_size,
            block_size,
            first_usable_block: header_blocks * block_size,
        };

        if geometry.usable_blocks() <= 0 {
            return Err(Error::InvalidArgument(
                "given sizes do not have enough blocks beyond the header".to_string(),
            ));
        }

        Ok(geometry)
    }

    /// Number of blocks the given number of bytes consumes, padded up.
    pub fn blocks(&self, bytes: i32) -> i32 {
        let blocks = bytes / self.block_size;

        if bytes % self.block_size > 0 {
            blocks + 1
        } else {
            blocks
        }
    }

    /// Round the given byte count up to the nearest block boundary.
    pub fn normalize(&self, bytes: i32) -> i32 {
        self.blocks(bytes) * self.block_size
    }

    /// Blocks available for records once the header is reserved.
    pub fn usable_blocks(&self) -> i32 {
        self.blocks(self.file_size) - self.blocks(HEADER_LEN as i32)
    }

    /// Bytes available for records once the header is reserved.
    pub fn usable_bytes(&self) -> i32 {
        self.usable_blocks() * self.block_size
    }
}

/// The persisted file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub file_size: i32,
    pub block_size: i32,
    pub count: i32,
    pub head: i32,
    pub tail: i32,
}

impl Header {
    pub fn read(bytes: &[u8]) -> Self {
        let field = |at: usize| {
            i32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        Self {
            file_size: field(0),
            block_size: field(4),
            count: field(8),
            head: field(12),
            tail: field(16),
        }
    }

    pub fn write(&self, bytes: &mut [u8]) {
        for (at, value) in [
            self.file_size,
            self.block_size,
            self.count,
            self.head,
            self.tail,
        ]
        .into_iter()
        .enumerate()
        {
            bytes[at * 4..at * 4 + 4].copy_from_slice(&value.to_be_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_rejects_bad_parameters() {
        assert!(Geometry::new(3, 300).is_err());
        assert!(Geometry::new(8, 4).is_err());
        assert!(Geometry::new(8, 100).is_err());
        // One block of 20 fits only the header.
        assert!(Geometry::new(20, 20).is_err());
    }

    #[test]
    fn geometry_reserves_header_blocks() {
        let geometry = Geometry::new(4, 4096).unwrap();
        assert_eq!(geometry.first_usable_block, 20);
        assert_eq!(geometry.usable_blocks(), 1019);

        let geometry = Geometry::new(10, 110).unwrap();
        assert_eq!(geometry.first_usable_block, 20);
        assert_eq!(geometry.usable_blocks(), 9);

        // Header spills into a third block when blocks are small.
        let geometry = Geometry::new(9, 4104).unwrap();
        assert_eq!(geometry.first_usable_block, 27);
    }

    #[test]
    fn block_math_pads_up() {
        let geometry = Geometry::new(10, 110).unwrap();

        assert_eq!(geometry.blocks(0), 0);
        assert_eq!(geometry.blocks(1), 1);
        assert_eq!(geometry.blocks(10), 1);
        assert_eq!(geometry.blocks(11), 2);
        assert_eq!(geometry.normalize(23), 30);
    }

    #[test]
    fn header_round_trips() {
        let header = Header {
            file_size: 8192,
            block_size: 4,
            count: 17,
            head: 40,
            tail: 2048,
        };

        let mut bytes = [0u8; HEADER_LEN];
        header.write(&mut bytes);

        assert_eq!(Header::read(&bytes), header);
        // Big-endian layout, file size first.
        assert_eq!(&bytes[0..4], &[0, 0, 0x20, 0]);
    }
}
