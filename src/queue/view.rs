//! Per-operation cursors over the shared mapping.
//!
//! Every queue operation works through a short-lived view that carries
//! its own position and the ring's wrap mark, so cursor bookkeeping is
//! never shared between threads even though the underlying bytes are.
//! A view's mark is always the first usable block: bulk reads and
//! writes that run past the end of the file resume there, which is
//! exactly the record-wrapping rule of the on-disk format. The length
//! prefix itself is never wrapped; block alignment and the 4-byte
//! minimum block size guarantee it fits contiguously.

/// A read cursor over the mapped file.
pub(crate) struct ReadView<'a> {
    bytes: &'a [u8],
    position: usize,
    mark: usize,
}

impl<'a> ReadView<'a> {
    pub fn new(bytes: &'a [u8], mark: usize) -> Self {
        Self {
            bytes,
            position: mark,
            mark,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        debug_assert!(position <= self.bytes.len());
        self.position = position;
    }

    /// Read a big-endian `i32` at the cursor. The caller guarantees
    /// four contiguous bytes remain (true at any block-aligned cursor).
    pub fn get_i32(&mut self) -> i32 {
        let at = self.position;
        self.position += 4;

        i32::from_be_bytes([
            self.bytes[at],
            self.bytes[at + 1],
            self.bytes[at + 2],
            self.bytes[at + 3],
        ])
    }

    /// Read `len` bytes starting at the cursor, resuming at the mark if
    /// the end of the file intervenes.
    pub fn read_wrapping(&mut self, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        let contiguous = len.min(self.bytes.len() - self.position);

        out[..contiguous]
            .copy_from_slice(&self.bytes[self.position..self.position + contiguous]);
        self.position += contiguous;

        if contiguous < len {
            let wrapped = len - contiguous;

            out[contiguous..].copy_from_slice(&self.bytes[self.mark..self.mark + wrapped]);
            self.position = self.mark + wrapped;
        }

        out
    }
}

/// A write cursor over the mapped file.
pub(crate) struct WriteView<'a> {
    bytes: &'a mut [u8],
    position: usize,
    mark: usize,
}

impl<'a> WriteView<'a> {
    pub fn new(bytes: &'a mut [u8], mark: usize) -> Self {
        Self {
            bytes,
            position: mark,
            mark,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        debug_assert!(position <= self.bytes.len());
        self.position = position;
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    pub fn reset_to_mark(&mut self) {
        self.position = self.mark;
    }

    /// Write a big-endian `i32` at the cursor. The caller guarantees
    /// four contiguous bytes remain.
    pub fn put_i32(&mut self, value: i32) {
        let at = self.position;
        self.bytes[at..at + 4].copy_from_slice(&value.to_be_bytes());
        self.position += 4;
    }

    /// Write `src` starting at the cursor, resuming at the mark if the
    /// end of the file intervenes.
    pub fn put_wrapping(&mut self, src: &[u8]) {
        let contiguous = src.len().min(self.remaining());

        self.bytes[self.position..self.position + contiguous]
            .copy_from_slice(&src[..contiguous]);
        self.position += contiguous;

        if contiguous < src.len() {
            let wrapped = src.len() - contiguous;

            self.bytes[self.mark..self.mark + wrapped].copy_from_slice(&src[contiguous..]);
            self.position = self.mark + wrapped;
        }
    }
}
