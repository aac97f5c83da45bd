// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-capacity ring buffers for the bulk data path.
//!
//! Both sides of the bulk channel (host-to-device and device-to-host) move
//! data through one of these. The device stack produces into the RX ring and
//! consumes from the TX ring; the echo engine does the opposite. Rather than
//! handing out raw indices into the backing array, the buffer exposes
//! _contiguous windows_ -- the longest readable or writable slice that
//! doesn't cross the physical end of storage -- plus commit operations that
//! advance the cursors with wraparound.

use core::cmp;

/// A circular byte buffer with a compile-time capacity.
///
/// Internally this stores the read cursor and the number of unread bytes;
/// the write cursor is always `(read + unread) % N`. Keeping the count
/// instead of a second cursor sidesteps the classic full-vs-empty ambiguity
/// when both cursors coincide.
pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    /// Index of the oldest unread byte.
    read: usize,
    /// Number of unread bytes. Never exceeds `N`.
    unread: usize,
}

impl<const N: usize> RingBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            read: 0,
            unread: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of bytes that have been produced but not yet consumed.
    pub fn unread(&self) -> usize {
        self.unread
    }

    /// Number of bytes that can still be produced before the buffer is full.
    pub fn space(&self) -> usize {
        N - self.unread
    }

    pub fn is_empty(&self) -> bool {
        self.unread == 0
    }

    /// Discards all unread data and rewinds both cursors.
    pub fn flush(&mut self) {
        self.read = 0;
        self.unread = 0;
    }

    /// The longest contiguous run of readable bytes, starting at the read
    /// cursor and stopping at either the write cursor or the physical end of
    /// storage. May be shorter than `unread()`; call again after `consume`
    /// to see the wrapped remainder.
    pub fn readable(&self) -> &[u8] {
        let end = cmp::min(self.read + self.unread, N);
        &self.buf[self.read..end]
    }

    /// The longest contiguous run of writable bytes, starting at the write
    /// cursor. May be shorter than `space()`; call again after `produce` to
    /// see the wrapped remainder.
    pub fn writable(&mut self) -> &mut [u8] {
        let write = (self.read + self.unread) % N;
        let end = cmp::min(write + self.space(), N);
        &mut self.buf[write..end]
    }

    /// Commits `n` bytes as consumed, advancing the read cursor with wrap.
    /// Saturates at the unread count rather than overtaking the writer.
    pub fn consume(&mut self, n: usize) {
        let n = cmp::min(n, self.unread);
        self.read = (self.read + n) % N;
        self.unread -= n;
    }

    /// Commits `n` bytes as produced, advancing the write cursor with wrap.
    /// Saturates at the available space rather than overtaking the reader.
    pub fn produce(&mut self, n: usize) {
        self.unread += cmp::min(n, self.space());
    }

    /// Copies as much of `data` in as fits, committing it. Returns the
    /// number of bytes accepted.
    pub fn write_slice(&mut self, data: &[u8]) -> usize {
        let mut written = 0;
        while written < data.len() {
            let window = self.writable();
            if window.is_empty() {
                break;
            }
            let n = cmp::min(window.len(), data.len() - written);
            window[..n].copy_from_slice(&data[written..written + n]);
            self.produce(n);
            written += n;
        }
        written
    }

    /// Copies up to `out.len()` unread bytes out, committing the read.
    /// Returns the number of bytes copied.
    pub fn read_slice(&mut self, out: &mut [u8]) -> usize {
        let mut taken = 0;
        while taken < out.len() {
            let window = self.readable();
            if window.is_empty() {
                break;
            }
            let n = cmp::min(window.len(), out.len() - taken);
            out[taken..taken + n].copy_from_slice(&window[..n]);
            self.consume(n);
            taken += n;
        }
        taken
    }
}

impl<const N: usize> core::fmt::Debug for RingBuffer<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &N)
            .field("read", &self.read)
            .field("unread", &self.unread)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let rb = RingBuffer::<8>::new();
        assert_eq!(rb.unread(), 0);
        assert_eq!(rb.space(), 8);
        assert!(rb.readable().is_empty());
    }

    #[test]
    fn fill_and_drain() {
        let mut rb = RingBuffer::<8>::new();
        assert_eq!(rb.write_slice(b"abcdefgh"), 8);
        assert_eq!(rb.space(), 0);
        // Full buffer refuses more.
        assert_eq!(rb.write_slice(b"x"), 0);

        let mut out = [0; 8];
        assert_eq!(rb.read_slice(&mut out), 8);
        assert_eq!(&out, b"abcdefgh");
        assert!(rb.is_empty());
    }

    #[test]
    fn windows_split_at_physical_end() {
        let mut rb = RingBuffer::<8>::new();
        rb.write_slice(b"abcdef");
        rb.consume(4);
        // Read cursor at 4, two unread bytes left, six free. The writable
        // region wraps, so the first window runs only to the end of storage.
        assert_eq!(rb.writable().len(), 2);
        rb.produce(2);
        assert_eq!(rb.writable().len(), 4);
        rb.produce(4);
        assert_eq!(rb.space(), 0);
        // Readable side likewise stops at the end of storage.
        assert_eq!(rb.readable().len(), 4);
        rb.consume(4);
        assert_eq!(rb.readable().len(), 4);
    }

    #[test]
    fn wrap_preserves_ordering() {
        let mut rb = RingBuffer::<8>::new();
        let mut out = [0; 16];
        // Push the cursors past the wrap point several times.
        rb.write_slice(b"01234");
        rb.read_slice(&mut out[..5]);
        rb.write_slice(b"abcdefgh");
        let n = rb.read_slice(&mut out);
        assert_eq!(&out[..n], b"abcdefgh");
    }

    #[test]
    fn commits_saturate() {
        let mut rb = RingBuffer::<8>::new();
        rb.write_slice(b"abc");
        rb.consume(100);
        assert!(rb.is_empty());
        rb.produce(100);
        assert_eq!(rb.unread(), 8);
    }

    #[test]
    fn flush_empties() {
        let mut rb = RingBuffer::<8>::new();
        rb.write_slice(b"abc");
        rb.flush();
        assert_eq!(rb.unread(), 0);
        assert_eq!(rb.space(), 8);
    }
}
