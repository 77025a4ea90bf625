//! UPB message layout.
//!
//! A message is a 6-byte packet header followed by command arguments:
//!
//! ```text
//! ┌─────┬─────────┬─────────┬─────┬─────┬─────┬──────────┐
//! │ LEN │ CONTROL │ NETWORK │ DST │ SRC │ CMD │ ARGS...  │
//! └─────┴─────────┴─────────┴─────┴─────┴─────┴──────────┘
//! ```
//!
//! `LEN` counts the whole wire packet including the trailing checksum byte
//! in its low five bits; bit 7 flags a link-addressed packet. Only the wire
//! form carries the checksum — a [`Message`] never does.

use std::fmt;

use crate::error::FrameError;

/// Packet header length in bytes (fixed, exactly 6).
pub const HEADER_LEN: usize = 6;

/// Source ID the host writes into outbound messages.
pub const SOURCE_HOST: u8 = 0xFF;

/// Low five bits of the `LEN` byte carry the packet length.
pub const LENGTH_MASK: u8 = 0x1F;

/// Bit 7 of the `LEN` byte: set for link-addressed packets.
pub const LINK_BIT: u8 = 0x80;

/// Control byte bits.
pub mod control {
    /// "Acknowledge with an ACK Pulse".
    pub const ACK_PULSE: u8 = 0x10;
    /// Retransmit counter (non-zero on repeated transmissions).
    pub const REPEAT_MASK: u8 = 0x03;
}

/// UPB message data IDs used by this driver.
///
/// Section numbers refer to the UPB protocol description at
/// <http://www.simply-automated.com/tech_specs/>.
pub mod command {
    /// 11.1.1. "The Activate Link Command"
    pub const ACTIVATE: u8 = 0x20;
    /// 11.1.2. "The Deactivate Link Command"
    pub const DEACTIVATE: u8 = 0x21;
    /// 11.1.3. "The Goto Command"
    pub const GOTO: u8 = 0x22;
    /// 11.1.9. "The Report State Command"
    pub const REPORT_STATE: u8 = 0x30;
    /// 11.2.4. "The Device State Report" — seen in inbound reports.
    pub const DEVICE_STATE: u8 = 0x86;
}

/// A UPB message: packet header plus command arguments, without the wire
/// checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    bytes: Vec<u8>,
}

impl Message {
    /// Build an outbound message addressed to `dst` on `network`.
    ///
    /// The header requests an Ack Pulse and carries [`SOURCE_HOST`] as the
    /// source ID; `LEN` accounts for the checksum byte appended at encode
    /// time.
    pub fn build(network: u8, dst: u8, cmd: u8, args: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(HEADER_LEN + args.len());
        bytes.extend_from_slice(&[
            (HEADER_LEN + args.len() + 1) as u8,
            control::ACK_PULSE,
            network,
            dst,
            SOURCE_HOST,
            cmd,
        ]);
        bytes.extend_from_slice(args);
        Self { bytes }
    }

    /// Wrap raw message bytes (header + args, no checksum).
    ///
    /// Fails with [`FrameError::ShortMessage`] if `bytes` cannot hold a
    /// full header. No other validation: callers that hand-craft messages
    /// get them transmitted as-is, checksummed by the codec.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, FrameError> {
        if bytes.len() < HEADER_LEN {
            return Err(FrameError::ShortMessage(bytes.len()));
        }
        Ok(Self { bytes })
    }

    /// The message bytes (header + args).
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume into the raw bytes.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Declared packet length: low five bits of the `LEN` byte.
    #[inline]
    pub fn length_field(&self) -> u8 {
        self.bytes[0] & LENGTH_MASK
    }

    /// Whether this packet is link-addressed (bit 7 of the `LEN` byte).
    #[inline]
    pub fn is_link(&self) -> bool {
        self.bytes[0] & LINK_BIT != 0
    }

    /// The control byte.
    #[inline]
    pub fn control(&self) -> u8 {
        self.bytes[1]
    }

    /// Whether the control byte requests an Ack Pulse.
    #[inline]
    pub fn wants_ack(&self) -> bool {
        self.control() & control::ACK_PULSE != 0
    }

    /// Retransmit counter from the control byte.
    #[inline]
    pub fn repeat_count(&self) -> u8 {
        self.control() & control::REPEAT_MASK
    }

    /// Network ID.
    #[inline]
    pub fn network(&self) -> u8 {
        self.bytes[2]
    }

    /// Destination ID.
    #[inline]
    pub fn destination(&self) -> u8 {
        self.bytes[3]
    }

    /// Source ID (0xFF for host-originated messages).
    #[inline]
    pub fn source(&self) -> u8 {
        self.bytes[4]
    }

    /// Message data ID.
    #[inline]
    pub fn command(&self) -> u8 {
        self.bytes[5]
    }

    /// Command arguments following the header.
    #[inline]
    pub fn args(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..]
    }
}

impl fmt::Display for Message {
    /// Uppercase hex, as the message appears on the wire (sans checksum).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.bytes))
    }
}
