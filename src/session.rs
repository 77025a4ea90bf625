//! The protocol actor.
//!
//! Two tasks per connection:
//!
//! ```text
//! serial ──► read_loop ──► mpsc<frame> ──► Session ──► serial (write half)
//!                                            ▲  │
//!                   callers ──► mpsc<Request>┘  └──► oneshot responses,
//!                                                    spawned report dispatch
//! ```
//!
//! The [`Session`] loop is the only writer to the transport and the only
//! owner of protocol state. It is a two-state machine: Idle (no request
//! outstanding, the request queue is eligible for dequeue) and awaiting a
//! response (`pending` is set, the queue branch is disabled). Exactly one
//! request is ever in flight; callers are serviced strictly in submission
//! order.

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::codec;
use crate::error::{Result, UpbError};
use crate::protocol::{LineFramer, Message, PimFrame};
use crate::sink::{LogSink, ReportSink};

/// Read buffer size. The link runs at 4800 baud; frames are tens of bytes.
const READ_BUF_LEN: usize = 512;

/// A caller's pending outbound operation.
pub(crate) struct Request {
    pub msg: Message,
    pub resp: oneshot::Sender<Result<()>>,
}

/// The request currently in flight, with its response deadline.
struct Pending {
    msg: Message,
    resp: oneshot::Sender<Result<()>>,
    deadline: Option<Instant>,
}

pub(crate) struct Session<W> {
    writer: W,
    frames: mpsc::Receiver<Bytes>,
    requests: mpsc::Receiver<Request>,
    cancel: CancellationToken,
    response_timeout: Option<Duration>,
    log: Arc<dyn LogSink>,
    reports: Arc<dyn ReportSink>,
    pending: Option<Pending>,
}

impl<W: AsyncWrite + Unpin> Session<W> {
    pub(crate) fn new(
        writer: W,
        frames: mpsc::Receiver<Bytes>,
        requests: mpsc::Receiver<Request>,
        cancel: CancellationToken,
        response_timeout: Option<Duration>,
        log: Arc<dyn LogSink>,
        reports: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            writer,
            frames,
            requests,
            cancel,
            response_timeout,
            log,
            reports,
            pending: None,
        }
    }

    /// Run the control loop until the link closes.
    ///
    /// Exits when the connection is closed, the reader task ends (EOF or
    /// read error), or every request handle is gone. On the way out the
    /// pending request and everything still queued resolve to
    /// [`UpbError::Closed`] so no caller is left hanging.
    pub(crate) async fn run(mut self) {
        loop {
            let deadline = self.pending.as_ref().and_then(|p| p.deadline);
            let expiry = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = self.cancel.cancelled() => break,

                frame = self.frames.recv() => match frame {
                    Some(frame) => self.on_frame(frame),
                    None => break,
                },

                req = self.requests.recv(), if self.pending.is_none() => match req {
                    Some(req) => self.transmit(req).await,
                    None => break,
                },

                _ = expiry => {
                    tracing::warn!("no PIM response before the deadline");
                    self.respond(Err(UpbError::Timeout));
                }
            }
        }

        if self.pending.is_some() {
            self.respond(Err(UpbError::Closed));
        }
        self.requests.close();
        while let Ok(req) = self.requests.try_recv() {
            let _ = req.resp.send(Err(UpbError::Closed));
        }
    }

    /// Dequeue action: encode and write one request to the PIM.
    ///
    /// A write failure is that request's response; the session stays Idle
    /// and the link stays up.
    async fn transmit(&mut self, req: Request) {
        let wire = codec::encode_transmit(req.msg.as_bytes());
        tracing::debug!("tx {}", req.msg);
        self.log.log(&format!("tx {}", req.msg));

        let outcome = async {
            self.writer.write_all(&wire).await?;
            self.writer.flush().await
        }
        .await;

        match outcome {
            Ok(()) => {
                let deadline = self.response_timeout.map(|t| Instant::now() + t);
                self.pending = Some(Pending {
                    msg: req.msg,
                    resp: req.resp,
                    deadline,
                });
            }
            Err(err) => {
                tracing::warn!("transmit failed: {}", err);
                self.log.log(&format!("transmit failed: {err}"));
                let _ = req.resp.send(Err(UpbError::Transport(err)));
            }
        }
    }

    /// Classify one inbound frame and act on it.
    fn on_frame(&mut self, frame: Bytes) {
        let text = String::from_utf8_lossy(&frame).into_owned();
        tracing::debug!("rx {:?}", text);
        self.log.log(&format!("rx {text:?}"));

        let Some(parsed) = PimFrame::parse(&frame) else {
            tracing::warn!("discarding unrecognized frame {:?}", text);
            return;
        };

        match parsed {
            // Frame taken by the PIM; Ack or Nak follows.
            PimFrame::Accept => {}
            PimFrame::Busy => self.respond(Err(UpbError::Busy)),
            PimFrame::Error => self.respond(Err(UpbError::PimError)),
            PimFrame::Ack => self.respond(Ok(())),
            PimFrame::Nak => {
                // A Nak only fails the request if it asked for an Ack Pulse.
                let outcome = match &self.pending {
                    Some(p) if p.msg.wants_ack() => Err(UpbError::MissingAck),
                    _ => Ok(()),
                };
                self.respond(outcome);
            }
            PimFrame::Report(payload) => self.dispatch_report(&payload),
        }
    }

    /// Deliver the terminal outcome for the request in flight.
    ///
    /// Best-effort: a caller that abandoned its `send` gets its outcome
    /// logged and dropped rather than blocking the loop. A status code
    /// with nothing outstanding is discarded the same way.
    fn respond(&mut self, outcome: Result<()>) {
        let Some(pending) = self.pending.take() else {
            tracing::warn!("status response with no request outstanding");
            return;
        };
        let line = match &outcome {
            Ok(()) => "response: ok".to_string(),
            Err(err) => format!("response: {err}"),
        };
        tracing::debug!("{}", line);
        self.log.log(&line);
        if pending.resp.send(outcome).is_err() {
            tracing::warn!("caller went away before its response arrived");
        }
    }

    /// Validate a `PU` report payload and hand it to the report sink.
    ///
    /// Invalid reports are logged and dropped, as are retransmitted copies
    /// (non-zero retransmit counter). Delivery runs on its own task so a
    /// slow sink never stalls the loop; no ordering across reports.
    fn dispatch_report(&self, payload: &[u8]) {
        let msg = match codec::decode_report(payload) {
            Ok(msg) => msg,
            Err(err) => {
                tracing::warn!("discarding report: {}", err);
                self.log.log(&format!("discarding report: {err}"));
                return;
            }
        };
        if msg.repeat_count() != 0 {
            // TODO(retransmits): a repeated physical-layer transmission of
            // a fresh event is indistinguishable from a stale duplicate;
            // dropping both is the conservative choice for now.
            tracing::debug!("dropping retransmitted report {}", msg);
            return;
        }
        let sink = Arc::clone(&self.reports);
        tokio::spawn(async move {
            sink.report(msg);
        });
    }
}

/// Background reader: pull bytes off the transport, emit frames to the
/// session until end-of-stream, read failure, or cancellation.
pub(crate) async fn read_loop<R: AsyncRead + Unpin>(
    mut reader: R,
    frames: mpsc::Sender<Bytes>,
    cancel: CancellationToken,
) {
    let mut framer = LineFramer::new();
    let mut buf = [0u8; READ_BUF_LEN];
    loop {
        let read = tokio::select! {
            _ = cancel.cancelled() => return,
            read = reader.read(&mut buf) => read,
        };
        match read {
            Ok(0) => {
                if let Err(err) = framer.finish() {
                    tracing::warn!("stream ended mid-frame: {}", err);
                }
                return;
            }
            Ok(n) => {
                for frame in framer.push(&buf[..n]) {
                    if frames.send(frame).await.is_err() {
                        return; // session is gone
                    }
                }
            }
            Err(err) => {
                tracing::warn!("read failed: {}", err);
                return;
            }
        }
    }
}
