//! Connection handle and configuration.
//!
//! A [`Connection`] owns one physical PIM link for its whole lifetime:
//! the transport, the background reader, and the session control loop.
//! Callers on any task talk to it purely by message passing — there is no
//! shared protocol state to lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, UpbError};
use crate::protocol::{command, Message};
use crate::session::{self, Request, Session};
use crate::sink::{LogSink, NoopSink, ReportSink};
use crate::transport::{self, Transport};

/// Default window for a PIM to deliver a terminal response.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outbound request queue depth. `send` waits for space when full, which
/// is the backpressure for over-eager callers.
const REQUEST_QUEUE: usize = 32;

/// Configuration for a connection.
#[derive(Clone)]
pub struct Config {
    network: u8,
    log: Arc<dyn LogSink>,
    reports: Arc<dyn ReportSink>,
    response_timeout: Option<Duration>,
}

impl Config {
    /// Create a configuration for the given network ID. Both sinks
    /// default to no-ops and the response timeout to
    /// [`DEFAULT_RESPONSE_TIMEOUT`].
    pub fn new(network: u8) -> Self {
        Self {
            network,
            log: Arc::new(NoopSink),
            reports: Arc::new(NoopSink),
            response_timeout: Some(DEFAULT_RESPONSE_TIMEOUT),
        }
    }

    /// Set the sink that receives protocol activity lines.
    #[must_use]
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log = sink;
        self
    }

    /// Set the sink that receives unsolicited message reports.
    #[must_use]
    pub fn report_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.reports = sink;
        self
    }

    /// Set the response timeout; `None` waits for the PIM forever.
    #[must_use]
    pub fn response_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.response_timeout = timeout;
        self
    }
}

struct Tasks {
    reader: JoinHandle<()>,
    session: JoinHandle<()>,
}

/// A live session with a PIM.
pub struct Connection {
    requests: mpsc::Sender<Request>,
    network: u8,
    closed: AtomicBool,
    cancel: CancellationToken,
    tasks: Mutex<Option<Tasks>>,
}

impl Connection {
    /// Open the named serial device at the PIM's fixed baud rate and wrap
    /// it as [`connect`](Self::connect).
    pub fn open(path: &str, config: Config) -> Result<Self> {
        let port = transport::open_serial(path)?;
        Ok(Self::connect(port, config))
    }

    /// Take ownership of an already-open byte stream and start the driver
    /// over it: the background reader and the session control loop.
    pub fn connect<T: Transport>(stream: T, config: Config) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        let (frame_tx, frame_rx) = mpsc::channel(REQUEST_QUEUE);
        let (req_tx, req_rx) = mpsc::channel(REQUEST_QUEUE);
        let cancel = CancellationToken::new();

        let reader_task = tokio::spawn(session::read_loop(
            reader,
            frame_tx,
            cancel.clone(),
        ));
        let session_task = tokio::spawn(
            Session::new(
                writer,
                frame_rx,
                req_rx,
                cancel.clone(),
                config.response_timeout,
                config.log,
                config.reports,
            )
            .run(),
        );

        Self {
            requests: req_tx,
            network: config.network,
            closed: AtomicBool::new(false),
            cancel,
            tasks: Mutex::new(Some(Tasks {
                reader: reader_task,
                session: session_task,
            })),
        }
    }

    /// Transmit a message and wait for its terminal outcome.
    ///
    /// Requests are serviced strictly in submission order, one in flight
    /// at a time. Resolves to [`UpbError::Closed`] without blocking once
    /// the connection is closed.
    pub async fn send(&self, msg: Message) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(UpbError::Closed);
        }
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(Request { msg, resp: tx })
            .await
            .map_err(|_| UpbError::Closed)?;
        rx.await.unwrap_or(Err(UpbError::Closed))
    }

    /// Build a message addressed to `dst` on this connection's network.
    pub fn build_message(&self, dst: u8, cmd: u8, args: &[u8]) -> Message {
        Message::build(self.network, dst, cmd, args)
    }

    /// Set a device to a level (the Goto command).
    pub async fn goto_level(&self, id: u8, level: u8) -> Result<()> {
        self.send(self.build_message(id, command::GOTO, &[level]))
            .await
    }

    /// Ask a device to report its state.
    pub async fn report_state(&self, id: u8) -> Result<()> {
        self.send(self.build_message(id, command::REPORT_STATE, &[]))
            .await
    }

    /// Activate a link.
    pub async fn activate_link(&self, id: u8) -> Result<()> {
        self.send(self.build_message(id, command::ACTIVATE, &[]))
            .await
    }

    /// Deactivate a link.
    pub async fn deactivate_link(&self, id: u8) -> Result<()> {
        self.send(self.build_message(id, command::DEACTIVATE, &[]))
            .await
    }

    /// Close the connection.
    ///
    /// Flags the connection closed (subsequent sends resolve to
    /// [`UpbError::Closed`] immediately), then stops the reader and
    /// session tasks and waits for both before returning. The request in
    /// flight and anything still queued resolve to `Closed` too.
    /// Idempotent.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.cancel.cancel();
        let tasks = self.tasks.lock().await.take();
        if let Some(Tasks { reader, session }) = tasks {
            let _ = reader.await;
            let _ = session.await;
        }
    }

    /// This connection's network ID.
    pub fn network(&self) -> u8 {
        self.network
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Drop for Connection {
    /// Dropping without [`close`](Self::close) still stops both background
    /// tasks; it just does not wait for them.
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
