//! Framer for the PIM byte stream.
//!
//! The PIM talks in ASCII lines terminated by a carriage return. The
//! [`LineFramer`] accumulates partial reads in a single `BytesMut` buffer
//! and hands out complete frames with the delimiter stripped; nothing is
//! emitted until its `\r` has arrived.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::FrameError;

/// Buffer that splits incoming bytes into CR-delimited frames.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: BytesMut,
}

impl LineFramer {
    /// Create an empty framer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(256),
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Returns every frame whose delimiter arrived (may be empty if the
    /// buffer still holds only a partial frame). Partial data is kept for
    /// the next push.
    pub fn push(&mut self, data: &[u8]) -> Vec<Bytes> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(i) = self.buffer.iter().position(|&b| b == b'\r') {
            let frame = self.buffer.split_to(i).freeze();
            self.buffer.advance(1); // drop the delimiter
            frames.push(frame);
        }
        frames
    }

    /// Signal end-of-stream.
    ///
    /// Fails with [`FrameError::Truncated`] if an unterminated frame is
    /// still buffered (the leftover is discarded); a clean end with an
    /// empty buffer is `Ok`.
    pub fn finish(&mut self) -> Result<(), FrameError> {
        if self.buffer.is_empty() {
            Ok(())
        } else {
            self.buffer.clear();
            Err(FrameError::Truncated)
        }
    }

    /// Number of buffered bytes awaiting a delimiter.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame_keeps_remainder() {
        let mut framer = LineFramer::new();
        let frames = framer.push(b"AB\rCD");
        assert_eq!(frames, vec![Bytes::from_static(b"AB")]);
        assert_eq!(framer.buffered(), 2);
    }

    #[test]
    fn test_no_frame_until_delimiter() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"PK").is_empty());
        let frames = framer.push(b"\r");
        assert_eq!(frames, vec![Bytes::from_static(b"PK")]);
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut framer = LineFramer::new();
        let frames = framer.push(b"PA\rPK\rPU8904\r");
        assert_eq!(
            frames,
            vec![
                Bytes::from_static(b"PA"),
                Bytes::from_static(b"PK"),
                Bytes::from_static(b"PU8904"),
            ]
        );
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut framer = LineFramer::new();
        let mut all = Vec::new();
        for b in b"PA\rPN\r" {
            all.extend(framer.push(&[*b]));
        }
        assert_eq!(all, vec![Bytes::from_static(b"PA"), Bytes::from_static(b"PN")]);
    }

    #[test]
    fn test_finish_clean() {
        let mut framer = LineFramer::new();
        framer.push(b"PK\r");
        assert_eq!(framer.finish(), Ok(()));
    }

    #[test]
    fn test_finish_truncated() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"EF").is_empty());
        assert_eq!(framer.finish(), Err(FrameError::Truncated));
        // Leftover is gone; a second finish is clean.
        assert_eq!(framer.finish(), Ok(()));
    }

    #[test]
    fn test_empty_frame() {
        let mut framer = LineFramer::new();
        let frames = framer.push(b"\r");
        assert_eq!(frames, vec![Bytes::new()]);
    }
}
