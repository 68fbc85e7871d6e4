//! Bounded window between the blocking zip writer and the async response.
//!
//! The zip container back-patches each entry's local header once the entry is
//! complete, so the tail of the stream stays mutable while an entry is being
//! written. The window keeps exactly that mutable tail in memory and lets the
//! exporter ship everything older down a channel.

use std::io::{self, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Sender side of the archive byte stream.
pub(crate) type ByteSender = mpsc::Sender<io::Result<Vec<u8>>>;

/// Window state shared by the writer and the exporter's handle.
#[derive(Debug)]
struct Window {
    /// Bytes before this absolute offset have been shipped and are immutable.
    shipped: u64,
    /// Unshipped bytes, starting at offset `shipped`.
    buf: Vec<u8>,
    /// Write cursor as an absolute offset.
    pos: u64,
}

impl Window {
    fn end(&self) -> u64 {
        self.shipped + self.buf.len() as u64
    }

    fn write_at_cursor(&mut self, data: &[u8]) {
        let start = (self.pos - self.shipped) as usize;
        let end = start + data.len();
        if self.buf.len() < end {
            self.buf.resize(end, 0);
        }
        self.buf[start..end].copy_from_slice(data);
        self.pos += data.len() as u64;
    }
}

/// `Write + Seek` front half handed to the zip writer.
///
/// Seeks may only land inside the unshipped window. The exporter guarantees
/// that by shipping bytes only once the container can no longer back-patch
/// them.
pub(crate) struct WindowSink {
    window: Arc<Mutex<Window>>,
}

/// Exporter-side handle over the same window.
pub(crate) struct SinkHandle {
    window: Arc<Mutex<Window>>,
    tx: ByteSender,
}

/// Create a connected sink/handle pair over `tx`.
pub(crate) fn window_sink(tx: ByteSender) -> (WindowSink, SinkHandle) {
    let window = Arc::new(Mutex::new(Window {
        shipped: 0,
        buf: Vec::new(),
        pos: 0,
    }));
    (
        WindowSink {
            window: Arc::clone(&window),
        },
        SinkHandle { window, tx },
    )
}

fn lock(window: &Mutex<Window>) -> io::Result<MutexGuard<'_, Window>> {
    window
        .lock()
        .map_err(|_| io::Error::other("window lock poisoned"))
}

impl Write for WindowSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut window = lock(&self.window)?;
        window.write_at_cursor(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Shipping is the exporter's call; the writer's flushes are no-ops.
        Ok(())
    }
}

impl Seek for WindowSink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut window = lock(&self.window)?;
        let target = match pos {
            SeekFrom::Start(abs) => abs as i128,
            SeekFrom::End(delta) => window.end() as i128 + delta as i128,
            SeekFrom::Current(delta) => window.pos as i128 + delta as i128,
        };
        if target < window.shipped as i128 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before the unshipped window",
            ));
        }
        window.pos = target as u64;
        Ok(window.pos)
    }
}

impl SinkHandle {
    /// Absolute offset one past the last byte written so far.
    pub(crate) fn end_offset(&self) -> io::Result<u64> {
        Ok(lock(&self.window)?.end())
    }

    /// Ship every byte before `boundary` to the consumer.
    pub(crate) fn ship(&self, boundary: u64) -> io::Result<()> {
        let chunk = {
            let mut window = lock(&self.window)?;
            if boundary <= window.shipped {
                return Ok(());
            }
            let len = ((boundary - window.shipped) as usize).min(window.buf.len());
            let rest = window.buf.split_off(len);
            let chunk = std::mem::replace(&mut window.buf, rest);
            window.shipped += chunk.len() as u64;
            chunk
        };
        if chunk.is_empty() {
            return Ok(());
        }
        self.tx
            .blocking_send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "archive consumer dropped"))
    }

    /// Ship everything written so far, window included.
    pub(crate) fn ship_all(&self) -> io::Result<()> {
        let end = self.end_offset()?;
        self.ship(end)
    }

    /// Surface a terminal error to the consumer, best effort.
    pub(crate) fn fail(&self, error: io::Error) {
        let _ = self.tx.blocking_send(Err(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ship_boundary_and_seek_guard() {
        let (tx, mut rx) = mpsc::channel(4);
        let (mut sink, handle) = window_sink(tx);

        sink.write_all(b"0123456789").unwrap();
        sink.seek(SeekFrom::Start(2)).unwrap(); // Back-patch two bytes
        sink.write_all(b"AB").unwrap();
        sink.seek(SeekFrom::End(0)).unwrap();
        sink.write_all(b"x").unwrap();

        handle.ship(4).unwrap();
        assert_eq!(rx.try_recv().unwrap().unwrap(), b"01AB".to_vec());

        // Shipped bytes are out of reach.
        assert!(sink.seek(SeekFrom::Start(2)).is_err());

        handle.ship_all().unwrap();
        assert_eq!(rx.try_recv().unwrap().unwrap(), b"456789x".to_vec());
    }

    #[test]
    fn test_seek_past_end_zero_fills() {
        let (tx, mut rx) = mpsc::channel(4);
        let (mut sink, handle) = window_sink(tx);

        sink.seek(SeekFrom::Start(4)).unwrap();
        sink.write_all(b"z").unwrap();

        handle.ship_all().unwrap();
        assert_eq!(rx.try_recv().unwrap().unwrap(), vec![0, 0, 0, 0, b'z']);
    }

    #[test]
    fn test_ship_below_shipped_is_noop() {
        let (tx, mut rx) = mpsc::channel(4);
        let (mut sink, handle) = window_sink(tx);

        sink.write_all(b"abcdef").unwrap();
        handle.ship(3).unwrap();
        assert_eq!(rx.try_recv().unwrap().unwrap(), b"abc".to_vec());

        handle.ship(2).unwrap();
        assert!(rx.try_recv().is_err()); // Nothing new shipped
    }
}
