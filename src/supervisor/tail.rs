//! Bounded capture of a child process's recent output

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Keeps the last `capacity` bytes written to it
///
/// Older bytes are evicted first, so the buffer always holds a suffix of
/// everything pushed so far.
#[derive(Debug, Clone)]
pub struct LogTail {
    buf: Vec<u8>,
    capacity: usize,
}

/// A tail shared between its capture task and the supervisor
pub type SharedTail = Arc<Mutex<LogTail>>;

impl LogTail {
    /// Creates an empty tail holding at most `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity.min(64 * 1024)),
            capacity,
        }
    }

    /// Creates an empty tail ready to be handed to a capture task
    pub fn shared(capacity: usize) -> SharedTail {
        Arc::new(Mutex::new(Self::new(capacity)))
    }

    /// Appends bytes, evicting the oldest data beyond capacity
    pub fn push(&mut self, data: &[u8]) {
        if data.len() >= self.capacity {
            self.buf.clear();
            self.buf
                .extend_from_slice(&data[data.len() - self.capacity..]);
            return;
        }

        self.buf.extend_from_slice(data);

        if self.buf.len() > self.capacity {
            let excess = self.buf.len() - self.capacity;
            self.buf.drain(..excess);
        }
    }

    /// Number of bytes currently held
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The captured bytes as text; invalid UTF-8 is replaced
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }
}

/// Reads `stream` to EOF, mirroring every line into `tail`
///
/// Lines are also forwarded to `tracing` at debug level under the
/// `site_mirror::server` target. Read errors end the capture quietly; the
/// tail keeps whatever was read before.
pub async fn capture_stream<R>(stream: R, tail: SharedTail, label: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if let Ok(mut tail) = tail.lock() {
                    tail.push(&line);
                }
                tracing::debug!(
                    target: "site_mirror::server",
                    "[{}] {}",
                    label,
                    String::from_utf8_lossy(&line).trim_end()
                );
            }
            Err(e) => {
                tracing::debug!("Stopped capturing server {}: {}", label, e);
                break;
            }
        }
    }
}

/// Takes a text snapshot of a shared tail
pub fn snapshot(tail: &SharedTail) -> String {
    tail.lock().map(|t| t.contents()).unwrap_or_default()
}
