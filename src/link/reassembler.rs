//! Streaming reassembly of zero-delimited frames.
//!
//! Bytes arrive from the UART in arbitrary chunks. The reassembler
//! accumulates them until the `0x00` delimiter and yields the frame body
//! (still COBS-encoded, delimiter stripped). A frame longer than the
//! buffer is dropped whole: everything up to the next delimiter is
//! discarded, which is how the receiver resynchronizes after line noise.

/// Receive-side frame accumulator with a fixed `N`-byte buffer.
pub struct FrameReassembler<const N: usize> {
    buf: [u8; N],
    len: usize,
    overflowed: bool,
}

impl<const N: usize> FrameReassembler<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            len: 0,
            overflowed: false,
        }
    }

    /// Feed one byte. Returns the encoded frame body when `byte` closes a
    /// non-empty, non-oversized frame. The slice is valid until the next
    /// call.
    pub fn push(&mut self, byte: u8) -> Option<&[u8]> {
        if byte == 0 {
            let len = self.len;
            let dropped = self.overflowed;
            self.len = 0;
            self.overflowed = false;
            if dropped || len == 0 {
                return None;
            }
            return Some(&self.buf[..len]);
        }

        if self.len == N {
            self.overflowed = true;
        } else if !self.overflowed {
            self.buf[self.len] = byte;
            self.len += 1;
        }
        None
    }

    /// Bytes buffered for the frame in progress.
    pub fn pending(&self) -> usize {
        self.len
    }

    /// Drop any partial frame, e.g. after the UART is restarted.
    pub fn reset(&mut self) {
        self.len = 0;
        self.overflowed = false;
    }
}

impl<const N: usize> Default for FrameReassembler<N> {
    fn default() -> Self {
        Self::new()
    }
}
