//! PIM line protocol: message layout, CR framing, and inbound frame
//! classification.
//!
//! This module implements the text protocol spoken on the serial link:
//! - the 6-byte UPB message header and its bit fields
//! - the carriage-return framer for the inbound byte stream
//! - typed classification of the PIM's status codes and reports

mod framer;
mod message;
mod status;

pub use framer::LineFramer;
pub use message::{command, control, Message, HEADER_LEN, LENGTH_MASK, LINK_BIT, SOURCE_HOST};
pub use status::PimFrame;
