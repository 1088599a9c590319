//! Per-connection snapshot-processing loops.
//!
//! One session owns one connection end to end: a read loop that frames and
//! decodes snapshot lines, and a single writer task draining an outbound
//! line queue so concurrent timed tasks never interleave their writes.

use std::time::Duration;

use fnf_engine::{HoldTracker, Judge};
use fnf_protocol::{LineReader, decode_snapshot};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::dispatch::{DeferredDispatcher, ImmediateDispatcher};
use crate::error::SessionError;
use crate::observer::SnapshotObserver;

/// Outbound line sink shared by the session and its dispatch tasks.
pub type LineSender = mpsc::UnboundedSender<String>;

const READ_CHUNK: usize = 4096;

/// What one read attempt produced.
enum ReadEvent {
    Lines(Vec<String>),
    /// Zero-length read: the peer is gone.
    Disconnected,
}

/// Read half plus framing state.
struct LineStream<R> {
    read: R,
    framing: LineReader,
    timeout: Duration,
}

impl<R: AsyncRead + Unpin> LineStream<R> {
    fn new(read: R, timeout: Duration) -> Self {
        Self {
            read,
            framing: LineReader::new(),
            timeout,
        }
    }

    /// Wait for the next batch of complete lines. A timeout with no data is
    /// not an error; the loop keeps waiting.
    async fn next(&mut self) -> Result<ReadEvent, SessionError> {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match tokio::time::timeout(self.timeout, self.read.read(&mut buf)).await {
                Err(_) => continue,
                Ok(Ok(0)) => return Ok(ReadEvent::Disconnected),
                Ok(Ok(n)) => {
                    let lines = self.framing.feed(&buf[..n]);
                    if !lines.is_empty() {
                        return Ok(ReadEvent::Lines(lines));
                    }
                }
                Ok(Err(e)) => return Err(e.into()),
            }
        }
    }
}

/// Drains the outbound queue onto the write half, one line per message.
/// Exits when the queue closes or the connection drops; senders after that
/// point get a failed send, which dispatchers treat as "delivery is moot".
async fn writer_task<W: AsyncWrite + Unpin>(mut write: W, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(mut line) = rx.recv().await {
        line.push('\n');
        if let Err(e) = write.write_all(line.as_bytes()).await {
            debug!("outbound write failed, stopping writer: {e}");
            break;
        }
    }
}

/// Authoritative-responder session: answer every snapshot synchronously
/// with the full four-lane action line.
pub async fn run_immediate<S>(
    stream: S,
    config: &BotConfig,
    mut observers: Vec<Box<dyn SnapshotObserver>>,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read, write) = tokio::io::split(stream);
    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(writer_task(write, rx));

    let mut lines = LineStream::new(read, config.read_timeout);
    let judge = Judge::default();
    let mut tracker = HoldTracker::new();
    let dispatcher = ImmediateDispatcher::new(tx);

    let result = 'session: loop {
        match lines.next().await {
            Ok(ReadEvent::Disconnected) => {
                info!("peer disconnected");
                break Ok(());
            }
            Err(e) => break Err(e),
            Ok(ReadEvent::Lines(batch)) => {
                for line in batch {
                    // Each snapshot is fully processed and its response
                    // queued before the next line is taken up.
                    let sent = match decode_snapshot(&line) {
                        Ok(snapshot) => {
                            for observer in observers.iter_mut() {
                                observer.on_snapshot(&snapshot);
                            }
                            let actions = judge.evaluate(&snapshot, &mut tracker);
                            dispatcher.dispatch(&actions)
                        }
                        Err(e) => {
                            warn!("skipping snapshot: {e}");
                            dispatcher.dispatch_idle()
                        }
                    };
                    if sent.is_err() {
                        break 'session Err(SessionError::WriterClosed);
                    }
                }
            }
        }
    };

    // Closing the queue lets the writer flush what is left and exit.
    drop(dispatcher);
    let _ = writer.await;
    result
}

/// Thin-client session: schedule latency-compensated press/release events
/// instead of answering synchronously.
pub async fn run_deferred<S>(
    stream: S,
    config: &BotConfig,
    mut observers: Vec<Box<dyn SnapshotObserver>>,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read, write) = tokio::io::split(stream);
    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(writer_task(write, rx));

    let mut lines = LineStream::new(read, config.read_timeout);
    let dispatcher = DeferredDispatcher::new(tx, config.latency_compensation_ms);

    let result = loop {
        match lines.next().await {
            Ok(ReadEvent::Disconnected) => {
                info!("peer disconnected");
                break Ok(());
            }
            Err(e) => break Err(e),
            Ok(ReadEvent::Lines(batch)) => {
                for line in batch {
                    match decode_snapshot(&line) {
                        Ok(snapshot) => {
                            for observer in observers.iter_mut() {
                                observer.on_snapshot(&snapshot);
                            }
                            if snapshot.is_active() {
                                dispatcher.observe(&snapshot);
                            } else {
                                dispatcher.clear();
                            }
                        }
                        // Event protocol: a bad cycle simply emits nothing.
                        Err(e) => warn!("skipping snapshot: {e}"),
                    }
                }
            }
        }
    };

    // In-flight timed tasks finish harmlessly against the closed queue.
    dispatcher.clear();
    drop(dispatcher);
    let _ = writer.await;
    result
}
