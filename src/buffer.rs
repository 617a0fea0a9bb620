//! Growable byte buffer with independent read and write cursors.
//!
//! ```text
//! +-------------------+------------------+------------------+
//! | prependable bytes |  readable bytes  |  writable bytes  |
//! |                   |     (CONTENT)    |                  |
//! +-------------------+------------------+------------------+
//! 0      <=      read_pos     <=     write_pos    <=    capacity
//! ```
//!
//! The buffer is owned by a single connection. Bytes read from a socket are
//! appended at the write cursor and consumed by the parser from the read
//! cursor; the same type collects serialized responses on the way out.

use std::io::{self, IoSliceMut, Read, Write};

/// Default capacity used by [`ByteBuffer::default`].
pub const DEFAULT_CAPACITY: usize = 1024;

/// Size of the stack area a single read may spill into.
const EXTRA_READ: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ByteBuffer {
    buf: Vec<u8>,
    read_pos: usize,
    write_pos: usize,
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ByteBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            read_pos: 0,
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn readable_bytes(&self) -> usize {
        self.write_pos - self.read_pos
    }

    pub fn writable_bytes(&self) -> usize {
        self.buf.len() - self.write_pos
    }

    /// Bytes already consumed at the front, reclaimable by compaction.
    pub fn prependable_bytes(&self) -> usize {
        self.read_pos
    }

    /// The readable region. Does not consume anything.
    pub fn peek(&self) -> &[u8] {
        &self.buf[self.read_pos..self.write_pos]
    }

    /// Consumes `len` readable bytes.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds [`readable_bytes`](Self::readable_bytes).
    pub fn retrieve(&mut self, len: usize) {
        assert!(
            len <= self.readable_bytes(),
            "retrieve({len}) beyond {} readable bytes",
            self.readable_bytes()
        );
        self.read_pos += len;
    }

    /// Consumes everything before `end`, an offset into [`peek`](Self::peek).
    pub fn retrieve_until(&mut self, end: usize) {
        self.retrieve(end);
    }

    pub fn retrieve_all(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
    }

    pub fn retrieve_all_as_string(&mut self) -> String {
        let text = String::from_utf8_lossy(self.peek()).into_owned();
        self.retrieve_all();
        text
    }

    /// The writable region, to be filled before calling
    /// [`has_written`](Self::has_written).
    pub fn begin_write(&mut self) -> &mut [u8] {
        &mut self.buf[self.write_pos..]
    }

    pub fn has_written(&mut self, len: usize) {
        assert!(len <= self.writable_bytes());
        self.write_pos += len;
    }

    /// Makes room for at least `len` more bytes, compacting when the consumed
    /// prefix is enough and reallocating otherwise.
    pub fn ensure_writable(&mut self, len: usize) {
        if self.writable_bytes() < len {
            self.make_space(len);
        }
        debug_assert!(self.writable_bytes() >= len);
    }

    fn make_space(&mut self, len: usize) {
        if self.writable_bytes() + self.prependable_bytes() < len {
            self.buf.resize(self.write_pos + len + 1, 0);
        } else {
            let readable = self.readable_bytes();
            self.buf.copy_within(self.read_pos..self.write_pos, 0);
            self.read_pos = 0;
            self.write_pos = readable;
        }
    }

    pub fn append(&mut self, data: &[u8]) {
        self.ensure_writable(data.len());
        self.buf[self.write_pos..self.write_pos + data.len()].copy_from_slice(data);
        self.write_pos += data.len();
    }

    pub fn append_str(&mut self, s: &str) {
        self.append(s.as_bytes());
    }

    /// Appends the readable region of another buffer without consuming it.
    pub fn append_buffer(&mut self, other: &ByteBuffer) {
        self.append(other.peek());
    }

    /// Performs one scatter read into the writable region followed by a
    /// 64 KiB overflow area, so a single call can take in more than is
    /// currently writable. Overflow bytes are appended, growing the buffer.
    ///
    /// `read` receives the two target slices and returns how many bytes it
    /// filled; on error no cursor moves and the error is handed back.
    pub fn read_with<F>(&mut self, read: F) -> io::Result<usize>
    where
        F: FnOnce(&mut [IoSliceMut<'_>]) -> io::Result<usize>,
    {
        let mut extra = [0u8; EXTRA_READ];
        let writable = self.writable_bytes();

        let n = {
            let tail = &mut self.buf[self.write_pos..];
            let mut bufs = [IoSliceMut::new(tail), IoSliceMut::new(&mut extra)];
            read(&mut bufs)?
        };

        if n <= writable {
            self.write_pos += n;
        } else {
            self.write_pos = self.buf.len();
            self.append(&extra[..n - writable]);
        }
        Ok(n)
    }

    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> io::Result<usize> {
        self.read_with(|bufs| reader.read_vectored(bufs))
    }

    /// Hands the readable region to `write` and consumes however many bytes
    /// it reports accepted. A short write leaves the rest for the next call.
    pub fn write_with<F>(&mut self, write: F) -> io::Result<usize>
    where
        F: FnOnce(&[u8]) -> io::Result<usize>,
    {
        let n = write(self.peek())?;
        self.retrieve(n);
        Ok(n)
    }

    pub fn write_to<W: Write>(&mut self, writer: &mut W) -> io::Result<usize> {
        self.write_with(|bytes| writer.write(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compaction_keeps_capacity() {
        let mut buf = ByteBuffer::new(16);
        buf.append(b"0123456789");
        buf.retrieve(8);
        buf.ensure_writable(12);

        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.prependable_bytes(), 0);
        assert_eq!(buf.peek(), b"89");
    }

    #[test]
    fn growth_sizes_past_write_cursor() {
        let mut buf = ByteBuffer::new(8);
        buf.append(b"abcd");
        buf.ensure_writable(10);

        assert_eq!(buf.capacity(), 4 + 10 + 1);
        assert_eq!(buf.peek(), b"abcd");
    }
}
