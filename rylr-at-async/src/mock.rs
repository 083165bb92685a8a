//! Test doubles for the UART and the delay.
//!
//! [`MockSerial`] answers each written line with the next scripted reply and
//! records what was written. [`MockDelay`] does not sleep: it adds up the
//! requested time and yields once, so futures combined with
//! `embassy_futures::join` get to run while a command waits for its reply.

use embedded_hal_async::delay::DelayNs;
use embedded_io::{ErrorKind, ErrorType, ReadReady};
use embedded_io_async::{Read, Write};
use heapless::{Deque, Vec};

use crate::op::CommandLine;
use crate::MAX_LINE_LEN;

const RX_CAPACITY: usize = 2048;
const SCRIPT_LEN: usize = 32;
const PENDING_LEN: usize = MAX_LINE_LEN + 2;

/// The error returned by a [`MockSerial`] set up with
/// [`failing_writes`](MockSerial::failing_writes).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MockError;

impl embedded_io::Error for MockError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// A scripted stand-in for the module's UART.
#[derive(Default)]
pub struct MockSerial {
    rx: Deque<u8, RX_CAPACITY>,
    replies: Deque<Option<&'static str>, SCRIPT_LEN>,
    pending: Vec<u8, PENDING_LEN>,
    written: Vec<CommandLine, SCRIPT_LEN>,
    failing_writes: bool,
}

impl MockSerial {
    /// Creates a serial port with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `reply` as the answer to the next written line.
    ///
    /// The reply may span several `\r\n` separated lines; everything after the
    /// first line stays buffered as unsolicited input.
    pub fn reply(mut self, reply: &'static str) -> Self {
        assert!(self.replies.push_back(Some(reply)).is_ok(), "reply script full");
        self
    }

    /// Leaves the next written line unanswered.
    pub fn silent(mut self) -> Self {
        assert!(self.replies.push_back(None).is_ok(), "reply script full");
        self
    }

    /// Makes `line` followed by `\r\n` available for reading right away.
    pub fn inbound(self, line: &str) -> Self {
        self.inbound_raw(line.as_bytes()).inbound_raw(b"\r\n")
    }

    /// Makes `bytes` available for reading right away.
    pub fn inbound_raw(mut self, bytes: &[u8]) -> Self {
        self.receive(bytes);
        self
    }

    /// Makes every following write fail with [`MockError`].
    pub fn failing_writes(mut self) -> Self {
        self.failing_writes = true;
        self
    }

    /// Every line written so far, without terminators.
    pub fn written(&self) -> &[CommandLine] {
        &self.written
    }

    /// Every line written so far, as text.
    pub fn commands(&self) -> Vec<&str, SCRIPT_LEN> {
        self.written
            .iter()
            .map(|line| core::str::from_utf8(line).unwrap_or("<binary>"))
            .collect()
    }

    /// Number of received bytes not read yet.
    pub fn unread(&self) -> usize {
        self.rx.len()
    }

    /// Number of scripted replies not consumed yet.
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    fn receive(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            assert!(self.rx.push_back(byte).is_ok(), "receive buffer full");
        }
    }

    fn line_written(&mut self) {
        let line = &self.pending[..self.pending.len() - 2];
        assert!(
            self.written
                .push(Vec::from_slice(line).unwrap_or_default())
                .is_ok(),
            "too many lines written"
        );
        self.pending.clear();

        if let Some(Some(reply)) = self.replies.pop_front() {
            self.receive(reply.as_bytes());
            self.receive(b"\r\n");
        }
    }
}

impl ErrorType for MockSerial {
    type Error = MockError;
}

impl Read for MockSerial {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut read = 0;
        for slot in buf.iter_mut() {
            let Some(byte) = self.rx.pop_front() else {
                break;
            };
            *slot = byte;
            read += 1;
        }
        Ok(read)
    }
}

impl ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.is_empty())
    }
}

impl Write for MockSerial {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.failing_writes {
            return Err(MockError);
        }
        for &byte in buf {
            if self.pending.push(byte).is_err() {
                self.pending.clear();
            }
            if self.pending.ends_with(b"\r\n") {
                self.line_written();
            }
        }
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        if self.failing_writes {
            return Err(MockError);
        }
        Ok(())
    }
}

/// A delay that only keeps count of the time it was asked to wait.
#[derive(Default)]
pub struct MockDelay {
    elapsed_ns: u64,
    waits: u32,
}

impl MockDelay {
    /// Creates a delay with nothing elapsed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total time waited, in milliseconds.
    pub fn elapsed_ms(&self) -> u32 {
        (self.elapsed_ns / 1_000_000) as u32
    }

    /// Number of waits.
    pub fn waits(&self) -> u32 {
        self.waits
    }

    async fn wait(&mut self, ns: u64) {
        self.elapsed_ns += ns;
        self.waits += 1;
        embassy_futures::yield_now().await;
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.wait(u64::from(ns)).await;
    }

    async fn delay_us(&mut self, us: u32) {
        self.wait(u64::from(us) * 1_000).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.wait(u64::from(ms) * 1_000_000).await;
    }
}
