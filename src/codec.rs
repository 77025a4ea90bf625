//! UPB wire codec: packet checksum and the hex transmit/report encoding.
//!
//! Outbound, a message is sent as the PIM "Transmit UPB Message" op-code
//! byte followed by the message and its checksum rendered as two-digit
//! uppercase hex, terminated by a carriage return. Inbound, a `PU` report
//! carries the same hex rendering (checksum included) as its payload.

use crate::error::FrameError;
use crate::protocol::{Message, LENGTH_MASK};

/// Host-to-PIM command bytes (6.3. "Host-To-PIM Commands").
pub mod pim_command {
    /// "Transmit UPB Message"
    pub const TRANSMIT: u8 = 0x14;
    /// "Read PIM Registers"
    pub const READ_REGISTERS: u8 = 0x12;
    /// "Write PIM Registers"
    pub const WRITE_REGISTERS: u8 = 0x17;
}

/// Smallest decodable report: a full header plus the checksum byte.
const MIN_REPORT_LEN: usize = crate::protocol::HEADER_LEN + 1;

/// Compute a UPB Packet Checksum.
///
/// "Sum all of the bytes of the Packet Header and UPB Message fields
/// together. Then take the 2's complement of the sum and truncate the
/// result to 8-bits."
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |sum, &b| sum.wrapping_add(b))
        .wrapping_neg()
}

/// Encode a message as a complete transmit command for the PIM.
///
/// Produces the op-code byte, the message bytes and checksum in uppercase
/// hex, and the trailing CR — ready to write to the serial line.
pub fn encode_transmit(msg: &[u8]) -> Vec<u8> {
    let mut wire = Vec::with_capacity(2 * msg.len() + 4);
    wire.push(pim_command::TRANSMIT);
    wire.extend_from_slice(hex::encode_upper(msg).as_bytes());
    wire.extend_from_slice(hex::encode_upper([checksum(msg)]).as_bytes());
    wire.push(b'\r');
    wire
}

/// Decode and validate the hex payload of a `PU` message report.
///
/// Checks, in order: hex encoding, minimum length, the length field
/// against the decoded byte count, and the trailing checksum. On success
/// the checksum byte is stripped and the remaining bytes returned as a
/// [`Message`].
pub fn decode_report(payload: &[u8]) -> Result<Message, FrameError> {
    let raw = hex::decode(payload)?;
    if raw.len() < MIN_REPORT_LEN {
        return Err(FrameError::ShortMessage(raw.len()));
    }
    // Only the low five bits of the LEN byte carry the length; the top
    // bits hold the link flag and repeater fields.
    let declared = (raw[0] & LENGTH_MASK) as usize;
    if declared != raw.len() {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: raw.len(),
        });
    }
    let (body, sum) = raw.split_at(raw.len() - 1);
    let computed = checksum(body);
    if computed != sum[0] {
        return Err(FrameError::ChecksumMismatch {
            computed,
            stored: sum[0],
        });
    }
    Message::from_bytes(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hex-render a valid report for `decode_report`: body + checksum.
    fn report_hex(body: &[u8]) -> Vec<u8> {
        let mut wire = body.to_vec();
        wire.push(checksum(body));
        hex::encode_upper(wire).into_bytes()
    }

    #[test]
    fn test_checksum_known_vector() {
        // Goto 100% for device 1 on network 0xB4.
        assert_eq!(
            checksum(&[0x08, 0x10, 0xB4, 0x01, 0xFF, 0x22, 0x64]),
            0x97
        );
    }

    #[test]
    fn test_checksum_sums_to_zero() {
        // Appending the checksum makes the byte sum wrap to zero.
        let msg = [0x07, 0x10, 0xB4, 0x0B, 0xFF, 0x30];
        let sum = checksum(&msg);
        let total = msg
            .iter()
            .chain(std::iter::once(&sum))
            .fold(0u8, |acc, &b| acc.wrapping_add(b));
        assert_eq!(total, 0);
    }

    #[test]
    fn test_checksum_detects_single_bit_flips() {
        let msg = [0x08, 0x10, 0xB4, 0x01, 0xFF, 0x22, 0x64];
        let sum = checksum(&msg);
        for i in 0..msg.len() {
            for bit in 0..8 {
                let mut corrupted = msg;
                corrupted[i] ^= 1 << bit;
                assert_ne!(checksum(&corrupted), sum, "flip byte {i} bit {bit}");
            }
        }
        // Flipping the checksum byte itself must also fail verification.
        for bit in 0..8 {
            assert_ne!(sum ^ (1 << bit), sum);
        }
    }

    #[test]
    fn test_encode_transmit_wire_text() {
        let wire = encode_transmit(&[0x08, 0x10, 0xB4, 0x01, 0xFF, 0x22, 0x64]);
        assert_eq!(wire, b"\x140810B401FF226497\r");
    }

    #[test]
    fn test_encode_transmit_uppercase() {
        let wire = encode_transmit(&[0xAB, 0xCD, 0xEF]);
        assert_eq!(wire[0], pim_command::TRANSMIT);
        assert!(wire[1..].iter().all(|b| !b.is_ascii_lowercase()));
    }

    #[test]
    fn test_decode_report_roundtrip() {
        let body = [0x08, 0x00, 0xB4, 0xFF, 0x0B, 0x86, 0x64];
        let msg = decode_report(&report_hex(&body)).unwrap();
        assert_eq!(msg.as_bytes(), &body);
    }

    #[test]
    fn test_decode_report_accepts_lowercase_hex() {
        let body = [0x08, 0x00, 0xB4, 0xFF, 0x0B, 0x86, 0x64];
        let lower = String::from_utf8(report_hex(&body))
            .unwrap()
            .to_ascii_lowercase();
        assert!(decode_report(lower.as_bytes()).is_ok());
    }

    #[test]
    fn test_decode_report_malformed_hex() {
        assert!(matches!(
            decode_report(b"08ZZ"),
            Err(FrameError::MalformedHex(_))
        ));
        // Odd-length payloads are not valid hex either.
        assert!(matches!(
            decode_report(b"0800B"),
            Err(FrameError::MalformedHex(_))
        ));
    }

    #[test]
    fn test_decode_report_too_short() {
        // Six bytes decode fine as hex but cannot hold header + checksum.
        assert_eq!(
            decode_report(b"080010B401FF"),
            Err(FrameError::ShortMessage(6))
        );
    }

    #[test]
    fn test_decode_report_length_mismatch() {
        // LEN claims 9 bytes but only 8 arrive.
        let mut body = vec![0x09, 0x00, 0xB4, 0xFF, 0x0B, 0x86, 0x64];
        let hex_wire = report_hex(&body);
        assert_eq!(
            decode_report(&hex_wire),
            Err(FrameError::LengthMismatch {
                declared: 9,
                actual: 8
            })
        );
        // Fixing the field makes the same bytes decode.
        body[0] = 0x08;
        assert!(decode_report(&report_hex(&body)).is_ok());
    }

    #[test]
    fn test_decode_report_length_field_masks_link_bit() {
        // Bit 7 of LEN is the link flag, not part of the length.
        let body = [0x88, 0x00, 0xB4, 0xFF, 0x0B, 0x86, 0x64];
        let msg = decode_report(&report_hex(&body)).unwrap();
        assert!(msg.is_link());
    }

    #[test]
    fn test_decode_report_checksum_mismatch() {
        let body = [0x08, 0x00, 0xB4, 0xFF, 0x0B, 0x86, 0x64];
        let mut wire = body.to_vec();
        wire.push(checksum(&body) ^ 0x01);
        let result = decode_report(hex::encode_upper(wire).as_bytes());
        assert!(matches!(result, Err(FrameError::ChecksumMismatch { .. })));
    }
}
