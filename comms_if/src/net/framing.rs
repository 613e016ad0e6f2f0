//! # Stream framing
//!
//! Streams carry newline delimited frames, but the bytes arrive in chunks of arbitrary size. A
//! [`StreamBuffer`] accumulates the chunks of one connection and hands back every frame completed
//! by each new chunk.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Byte marking the end of a frame.
pub const FRAME_DELIMITER: u8 = b'\n';

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fixed capacity accumulator for one stream connection.
///
/// The buffer never holds more than `capacity` bytes. If a frame grows past the capacity the
/// buffer is cleared and the rest of that frame, up to and including its delimiter, is thrown
/// away so that the next frame starts cleanly.
#[derive(Debug)]
pub struct StreamBuffer {
    buf: Vec<u8>,
    capacity: usize,

    /// Set while skipping the tail of an oversized frame
    discarding: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StreamBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            discarding: false,
        }
    }

    /// Number of bytes of the current partial frame.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a chunk of received bytes, returning every frame it completes.
    ///
    /// Frames are returned in arrival order with the delimiter stripped. Empty frames are
    /// returned as empty vectors. Bytes after the last delimiter stay buffered until a later
    /// chunk completes them.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();

        let mut segments = chunk.split(|b| *b == FRAME_DELIMITER).peekable();

        while let Some(segment) = segments.next() {
            // The last segment is the only one not followed by a delimiter
            let complete = segments.peek().is_some();

            self.append(segment);

            if complete {
                if self.discarding {
                    self.discarding = false;
                } else {
                    frames.push(std::mem::take(&mut self.buf));
                    self.buf.reserve(self.capacity);
                }
            }
        }

        frames
    }

    /// Append part of a frame, handling overflow.
    fn append(&mut self, part: &[u8]) {
        if self.discarding || part.is_empty() {
            return;
        }

        if self.buf.len() + part.len() > self.capacity {
            warn!(
                "Stream frame exceeds the {} byte buffer, discarding {} buffered bytes",
                self.capacity,
                self.buf.len()
            );
            self.buf.clear();
            self.discarding = true;
            return;
        }

        self.buf.extend_from_slice(part);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_frames_across_chunks() {
        let mut sb = StreamBuffer::new(1024);

        assert_eq!(sb.push(b"10\n"), vec![b"10".to_vec()]);
        assert_eq!(sb.push(b"20\n"), vec![b"20".to_vec()]);
        assert!(sb.is_empty());

        // A frame split over three chunks
        assert!(sb.push(b"FW").is_empty());
        assert!(sb.push(b"D 1").is_empty());
        assert_eq!(sb.len(), 5);
        assert_eq!(sb.push(b"00\nRT"), vec![b"FWD 100".to_vec()]);
        assert_eq!(sb.push(b" 9\n"), vec![b"RT 9".to_vec()]);
    }

    #[test]
    fn test_many_frames_in_one_chunk() {
        let mut sb = StreamBuffer::new(16);

        assert_eq!(
            sb.push(b"1\n0\n\n1"),
            vec![b"1".to_vec(), b"0".to_vec(), Vec::new()]
        );
        assert_eq!(sb.len(), 1);
    }

    #[test]
    fn test_overflow() {
        let mut sb = StreamBuffer::new(8);

        // Overflow without a delimiter yields nothing and the buffer stays bounded
        assert!(sb.push(b"0123456789").is_empty());
        assert!(sb.len() <= sb.capacity());
        assert!(sb.push(b"abcdefghijklmnop").is_empty());
        assert!(sb.len() <= sb.capacity());

        // The tail of the oversized frame is dropped, the next frame is intact
        assert_eq!(sb.push(b"xyz\n1\n"), vec![b"1".to_vec()]);
    }

    #[test]
    fn test_overflow_over_several_chunks() {
        let mut sb = StreamBuffer::new(4);

        assert!(sb.push(b"ab").is_empty());
        assert!(sb.push(b"cd").is_empty());
        assert_eq!(sb.len(), 4);
        assert!(sb.push(b"e").is_empty());
        assert_eq!(sb.len(), 0);
        assert_eq!(sb.push(b"\nok\n"), vec![b"ok".to_vec()]);
    }

    #[test]
    fn test_frame_at_capacity() {
        let mut sb = StreamBuffer::new(4);
        assert_eq!(sb.push(b"abcd\n"), vec![b"abcd".to_vec()]);
    }
}
