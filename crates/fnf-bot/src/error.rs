use thiserror::Error;

/// Connection-level failures that end a session.
///
/// Per-snapshot faults never surface here: undecodable bytes are skipped by
/// the line reader, malformed snapshots degrade to the idle response, and a
/// read timeout is retried. A graceful peer close ends the session as `Ok`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connection i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("outbound writer closed")]
    WriterClosed,
}
