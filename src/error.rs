//! Error types for the PIM driver.

use thiserror::Error;

/// Main error type for all driver operations.
///
/// Every [`send`](crate::Connection::send) resolves to `Ok(())` or one of
/// these. Malformed *inbound* data never reaches a caller — see
/// [`FrameError`].
#[derive(Debug, Error)]
pub enum UpbError {
    /// I/O failure opening, reading, or writing the serial stream.
    ///
    /// Fatal to the affected send only, not to the connection.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The PIM answered `PB`: it is busy and dropped the frame.
    #[error("PIM busy")]
    Busy,

    /// The PIM answered `PE`: it rejected the frame.
    #[error("PIM error")]
    PimError,

    /// The PIM answered `PN` to a message that requested an Ack Pulse:
    /// the destination device never acknowledged.
    #[error("missing Ack Pulse")]
    MissingAck,

    /// No terminal response from the PIM within the configured window.
    #[error("request timed out")]
    Timeout,

    /// The connection has been closed; no request was or will be sent.
    #[error("connection closed")]
    Closed,
}

/// Malformed inbound data.
///
/// These are logged and discarded by the session loop rather than surfaced
/// to a waiting caller; they appear in public signatures only through the
/// [`codec`](crate::codec) and [`protocol`](crate::protocol) building
/// blocks.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    /// End of stream reached with an unterminated frame buffered.
    #[error("truncated frame at end of stream")]
    Truncated,

    /// Report payload is not valid hexadecimal.
    #[error("malformed hex: {0}")]
    MalformedHex(#[from] hex::FromHexError),

    /// Decoded report is shorter than a header plus checksum.
    #[error("message too short: {0} bytes")]
    ShortMessage(usize),

    /// The length field disagrees with the decoded byte count.
    #[error("length field says {declared} bytes, got {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// The trailing checksum byte disagrees with the computed checksum.
    #[error("checksum mismatch: computed {computed:#04x}, stored {stored:#04x}")]
    ChecksumMismatch { computed: u8, stored: u8 },
}

/// Result type alias using [`UpbError`].
pub type Result<T> = std::result::Result<T, UpbError>;
