//! Serial transport for the PIM link.
//!
//! The session runs over any bidirectional byte stream; [`open_serial`]
//! produces the real one, an async serial port at the PIM's fixed line
//! settings. Tests inject in-memory streams instead.

use std::io;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

/// The PIM's fixed line speed.
pub const BAUD_RATE: u32 = 4800;

/// An open bidirectional byte stream the driver can run over.
///
/// Blanket-implemented for everything async-readable and -writable; the
/// serial port, a TCP bridge, or a test `duplex` all qualify.
pub trait Transport: AsyncRead + AsyncWrite + Send + 'static {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Send + 'static {}

/// Open the named serial device with the PIM's settings (4800 8N1, no
/// flow control).
pub fn open_serial(path: &str) -> io::Result<SerialStream> {
    tokio_serial::new(path, BAUD_RATE)
        .data_bits(DataBits::Eight)
        .stop_bits(StopBits::One)
        .parity(Parity::None)
        .flow_control(FlowControl::None)
        .open_native_async()
        .map_err(io::Error::from)
}
