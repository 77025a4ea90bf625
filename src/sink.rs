//! Consumer-facing sinks.
//!
//! A [`Connection`](crate::Connection) is configured with two narrow
//! interfaces: a [`LogSink`] that streams protocol activity lines and a
//! [`ReportSink`] that receives validated unsolicited message reports.
//! Both default to [`NoopSink`]. Plain functions work too:
//!
//! ```
//! use std::sync::Arc;
//! use upb_pim::Config;
//!
//! let config = Config::new(0xB4)
//!     .log_sink(Arc::new(|line: &str| println!("{line}")));
//! # let _ = config;
//! ```

use crate::protocol::Message;

/// Receives one formatted line per protocol event (transmits, received
/// frames, delivered responses).
///
/// Called from the session loop; implementations should return quickly.
pub trait LogSink: Send + Sync {
    fn log(&self, line: &str);
}

/// Receives validated unsolicited message reports, checksum stripped.
///
/// Each report is delivered on its own spawned task; deliveries may run
/// concurrently and in any order relative to each other.
pub trait ReportSink: Send + Sync {
    fn report(&self, msg: Message);
}

impl<F> LogSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, line: &str) {
        self(line)
    }
}

impl<F> ReportSink for F
where
    F: Fn(Message) + Send + Sync,
{
    fn report(&self, msg: Message) {
        self(msg)
    }
}

/// Discards everything; the default for both sinks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn log(&self, _line: &str) {}
}

impl ReportSink for NoopSink {
    fn report(&self, _msg: Message) {}
}
