//! Growable output buffer for container encoding.

use crate::error::{Result, ShaderError};
use crate::limits::{MAX_OUTPUT_BYTES, WRITER_GROW_ALIGN};

fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// A zero-filled buffer with a commit cursor.
///
/// Callers probe with [`ByteWriter::can_write`], fill the returned space through
/// [`ByteWriter::uncommitted_mut`], then [`ByteWriter::commit`]. Growth copies only committed
/// bytes, so nothing written past the cursor may be relied on across a probe.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
    committed: usize,
}

impl ByteWriter {
    pub fn with_capacity(initial: usize) -> Result<Self> {
        let mut writer = ByteWriter::default();
        writer.can_write(initial)?;
        Ok(writer)
    }

    /// Committed bytes.
    pub fn size(&self) -> usize {
        self.committed
    }

    pub fn allocated(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.committed
    }

    /// Ensures `count` more bytes fit past the cursor, growing by `count` rounded up to
    /// [`WRITER_GROW_ALIGN`] if needed.
    ///
    /// The allocation never exceeds [`MAX_OUTPUT_BYTES`].
    pub fn can_write(&mut self, count: usize) -> Result<()> {
        if count <= self.remaining() {
            return Ok(());
        }

        if count >= MAX_OUTPUT_BYTES {
            return Err(ShaderError::OutOfMemory { requested: count });
        }
        let grow = align_up(count, WRITER_GROW_ALIGN);
        if grow > MAX_OUTPUT_BYTES - self.buf.len() {
            return Err(ShaderError::OutOfMemory { requested: grow });
        }

        let new_len = self.buf.len() + grow;
        let mut grown = Vec::new();
        grown
            .try_reserve_exact(new_len)
            .map_err(|_| ShaderError::OutOfMemory { requested: new_len })?;
        grown.extend_from_slice(&self.buf[..self.committed]);
        grown.resize(new_len, 0);
        self.buf = grown;
        Ok(())
    }

    /// Space past the cursor.
    pub fn uncommitted_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.committed..]
    }

    /// Bytes already committed, for patching headers in place.
    pub fn committed_mut(&mut self) -> &mut [u8] {
        &mut self.buf[..self.committed]
    }

    pub fn commit(&mut self, count: usize) {
        debug_assert!(count <= self.remaining(), "commit past probed capacity");
        self.committed += count.min(self.remaining());
    }

    /// Frees the buffer.
    pub fn reset(&mut self) {
        *self = ByteWriter::default();
    }

    /// Moves the committed bytes out, leaving the writer empty.
    pub fn fetch(&mut self) -> Vec<u8> {
        let mut buf = core::mem::take(&mut self.buf);
        buf.truncate(self.committed);
        self.committed = 0;
        buf
    }
}
