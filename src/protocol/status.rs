//! Classification of inbound PIM frames.
//!
//! After framing, every line from the PIM is either a two-character status
//! code or a message report:
//!
//! | Code | Meaning |
//! |------|---------|
//! | `PA` | Accept — the PIM took the frame; Ack or Nak follows |
//! | `PB` | Busy — the PIM dropped the frame |
//! | `PE` | Error — the PIM rejected the frame |
//! | `PK` | Ack Response |
//! | `PN` | Nak Response |
//! | `PU` | Message Report — hex payload follows the code |

use bytes::Bytes;

/// One classified inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PimFrame {
    /// `PA` — transmit frame accepted; a terminal response follows.
    Accept,
    /// `PB` — PIM busy.
    Busy,
    /// `PE` — PIM error.
    Error,
    /// `PK` — Ack Response.
    Ack,
    /// `PN` — Nak Response.
    Nak,
    /// `PU` — unsolicited message report; the payload is the hex text
    /// after the status code, not yet decoded.
    Report(Bytes),
}

impl PimFrame {
    /// Classify one CR-stripped frame.
    ///
    /// Returns `None` for anything that is not a recognizable PIM frame;
    /// the session logs and discards those.
    pub fn parse(frame: &Bytes) -> Option<Self> {
        if frame.len() < 2 || frame[0] != b'P' {
            return None;
        }
        match frame[1] {
            b'A' => Some(Self::Accept),
            b'B' => Some(Self::Busy),
            b'E' => Some(Self::Error),
            b'K' => Some(Self::Ack),
            b'N' => Some(Self::Nak),
            b'U' => Some(Self::Report(frame.slice(2..))),
            _ => None,
        }
    }
}
