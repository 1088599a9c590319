//! Newline framing over a raw byte stream.

use tracing::warn;

/// Maximum bytes carried over while waiting for a terminator.
///
/// A well-behaved peer sends a snapshot per line, far below this. If the
/// buffer ever grows past the cap the carried data is junk (or the peer is
/// not speaking the protocol), so it is dropped and the reader resyncs at
/// the next terminator.
const MAX_CARRY_BYTES: usize = 256 * 1024;

/// Splits an incoming byte stream into complete lines.
///
/// The trailing incomplete line is retained across `feed` calls. Bytes that
/// do not decode as UTF-8 are skipped rather than failing the read, and
/// empty or whitespace-only lines are dropped.
#[derive(Debug, Default)]
pub struct LineReader {
    carry: String,
}

impl LineReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every complete line they unlock.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.carry.push_str(text),
            Err(_) => {
                // Best-effort: keep the decodable parts, skip the rest.
                let text = String::from_utf8_lossy(bytes);
                self.carry
                    .extend(text.chars().filter(|&c| c != char::REPLACEMENT_CHARACTER));
            }
        }

        let mut lines = Vec::new();
        while let Some(pos) = self.carry.find('\n') {
            let rest = self.carry.split_off(pos + 1);
            let line = std::mem::replace(&mut self.carry, rest);
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }

        if self.carry.len() > MAX_CARRY_BYTES {
            warn!(
                bytes = self.carry.len(),
                "line buffer overflow, dropping carried data"
            );
            self.carry.clear();
        }

        lines
    }

    /// Bytes currently carried over, waiting for a terminator.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}
