//! # upb-pim
//!
//! Async driver for Universal Powerline Bus (UPB) devices behind a
//! serial-attached Powerline Interface Module (PIM).
//!
//! See the "UPB Powerline Interface Module (PIM) Description" at
//! <http://www.simply-automated.com/tech_specs/> for the protocol this
//! implements.
//!
//! ## Architecture
//!
//! - **Protocol** ([`protocol`]): message layout, CR framing, inbound
//!   frame classification
//! - **Codec** ([`codec`]): packet checksum and the hex wire encoding
//! - **Transport** ([`transport`]): the serial port, or any injected
//!   byte stream
//! - **Session** (internal): a single-task control loop that owns the
//!   transport, serializes requests one-in-flight, and correlates the
//!   PIM's replies
//! - **[`Connection`]**: the public handle — `open`/`connect`, `send`,
//!   the command helpers, `close`
//!
//! ## Example
//!
//! ```ignore
//! use upb_pim::{Config, Connection};
//!
//! #[tokio::main]
//! async fn main() -> upb_pim::Result<()> {
//!     let conn = Connection::open("/dev/ttyUSB0", Config::new(0xB4))?;
//!     conn.goto_level(1, 100).await?; // family lights to 100%
//!     conn.close().await;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod protocol;
pub mod sink;
pub mod transport;

mod connection;
mod session;

pub use connection::{Config, Connection, DEFAULT_RESPONSE_TIMEOUT};
pub use error::{FrameError, Result, UpbError};
pub use protocol::Message;
pub use sink::{LogSink, NoopSink, ReportSink};
