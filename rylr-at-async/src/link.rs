//! Line oriented access to the UART connected to the module.
//!
//! The link knows nothing about the AT protocol. It writes `\r\n` terminated
//! lines, polls the receive buffer at a fixed interval and reads inbound bytes
//! until a line feed, or until no further byte arrives within the idle time.

use embedded_hal_async::delay::DelayNs;
use embedded_io::ReadReady;
use embedded_io_async::{Read, Write};
use heapless::Vec;

use crate::{AtError, Config, MAX_LINE_LEN};

/// One inbound line, without its line terminator.
pub type Line = Vec<u8, MAX_LINE_LEN>;

/// A UART paired with the delay used to pace the polling loops.
pub struct Link<UART, DELAY> {
    uart: UART,
    delay: DELAY,
    poll_interval_ms: u32,
    line_idle_ms: u32,
}

impl<UART, DELAY> Link<UART, DELAY>
where
    UART: Read + Write + ReadReady,
    DELAY: DelayNs,
{
    /// Creates a new link using the timing of `config`.
    pub fn new(uart: UART, delay: DELAY, config: &Config) -> Self {
        Self {
            uart,
            delay,
            poll_interval_ms: config.poll_interval_ms.max(1),
            line_idle_ms: config.line_idle_ms,
        }
    }

    /// Gives back the UART and the delay.
    pub fn release(self) -> (UART, DELAY) {
        (self.uart, self.delay)
    }

    /// Writes `line` followed by `\r\n` and flushes the UART.
    pub async fn write_line(&mut self, line: &[u8]) -> Result<(), AtError<UART::Error>> {
        self.uart.write_all(line).await.map_err(AtError::Io)?;
        self.uart.write_all(b"\r\n").await.map_err(AtError::Io)?;
        self.uart.flush().await.map_err(AtError::Io)
    }

    /// Returns `true` if at least one received byte is waiting to be read.
    pub fn has_data(&mut self) -> Result<bool, AtError<UART::Error>> {
        self.uart.read_ready().map_err(AtError::Io)
    }

    /// Polls the receive buffer until data arrives or `timeout_ms` elapsed.
    ///
    /// Returns `false` on timeout. Elapsed time is the sum of the poll steps,
    /// the last step being shortened so that exactly `timeout_ms` is waited.
    pub async fn wait_for_data(&mut self, timeout_ms: u32) -> Result<bool, AtError<UART::Error>> {
        let mut elapsed_ms = 0;
        loop {
            if self.has_data()? {
                return Ok(true);
            }
            if elapsed_ms >= timeout_ms {
                return Ok(false);
            }
            let step = self.poll_interval_ms.min(timeout_ms - elapsed_ms);
            self.delay.delay_ms(step).await;
            elapsed_ms += step;
        }
    }

    /// Waits `ms` milliseconds without touching the UART.
    pub async fn idle(&mut self, ms: u32) {
        self.delay.delay_ms(ms).await;
    }

    /// Reads one line into `line`, replacing its contents.
    ///
    /// Carriage returns are dropped and blank lines skipped. Returns the
    /// length of the line, which is zero if the buffer went idle before any
    /// printable byte arrived. A line longer than [`MAX_LINE_LEN`] is drained
    /// up to its line feed and reported as [`AtError::Overflow`].
    pub async fn read_line(&mut self, line: &mut Line) -> Result<usize, AtError<UART::Error>> {
        line.clear();
        let mut overflow = false;
        loop {
            let Some(byte) = self.next_byte().await? else {
                break;
            };
            match byte {
                b'\n' if line.is_empty() && !overflow => continue,
                b'\n' => break,
                b'\r' => continue,
                _ if overflow => continue,
                _ => {
                    if line.push(byte).is_err() {
                        log::warn!("rylr::read_line line longer than {MAX_LINE_LEN} bytes");
                        overflow = true;
                    }
                }
            }
        }

        if overflow {
            line.clear();
            return Err(AtError::Overflow);
        }
        log::trace!("rylr::read_line {:?}", line.as_slice());
        Ok(line.len())
    }

    async fn next_byte(&mut self) -> Result<Option<u8>, AtError<UART::Error>> {
        if !self.wait_for_data(self.line_idle_ms).await? {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        let read = self.uart.read(&mut byte).await.map_err(AtError::Io)?;
        Ok((read == 1).then_some(byte[0]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDelay, MockError, MockSerial};
    use embassy_futures::block_on;

    fn link(serial: MockSerial) -> Link<MockSerial, MockDelay> {
        Link::new(serial, MockDelay::new(), &Config::default())
    }

    #[test]
    fn writes_terminated_line() {
        let mut link = link(MockSerial::new());
        block_on(link.write_line(b"AT+ADDRESS=7")).unwrap();
        let (serial, _) = link.release();
        assert_eq!(serial.commands().as_slice(), ["AT+ADDRESS=7"]);
    }

    #[test]
    fn reads_lines_and_skips_blank_ones() {
        let mut link = link(MockSerial::new().inbound_raw(b"\r\n+OK\r\n+RCV=1,1,a,-1,2\r\n"));
        let mut line = Line::new();

        assert_eq!(block_on(link.read_line(&mut line)), Ok(3));
        assert_eq!(line.as_slice(), b"+OK");
        assert_eq!(block_on(link.read_line(&mut line)), Ok(15));
        assert_eq!(line.as_slice(), b"+RCV=1,1,a,-1,2");
        assert_eq!(block_on(link.read_line(&mut line)), Ok(0));
    }

    #[test]
    fn unterminated_line_completes_when_idle() {
        let mut link = link(MockSerial::new().inbound_raw(b"+OK"));
        let mut line = Line::new();
        assert_eq!(block_on(link.read_line(&mut line)), Ok(3));
        assert_eq!(line.as_slice(), b"+OK");

        let (_, delay) = link.release();
        assert_eq!(delay.elapsed_ms(), Config::default().line_idle_ms);
    }

    #[test]
    fn overflow_drains_rest_of_line() {
        let mut serial = MockSerial::new();
        for _ in 0..MAX_LINE_LEN + 10 {
            serial = serial.inbound_raw(b"x");
        }
        let mut link = link(serial.inbound_raw(b"\r\n+OK\r\n"));
        let mut line = Line::new();

        assert_eq!(block_on(link.read_line(&mut line)), Err(AtError::Overflow));
        assert_eq!(block_on(link.read_line(&mut line)), Ok(3));
        assert_eq!(line.as_slice(), b"+OK");
    }

    #[test]
    fn wait_for_data_accumulates_poll_interval() {
        let mut link = Link::new(
            MockSerial::new(),
            MockDelay::new(),
            &Config::default().set_poll_interval_ms(30),
        );
        assert_eq!(block_on(link.wait_for_data(100)), Ok(false));
        let (_, delay) = link.release();
        assert_eq!(delay.elapsed_ms(), 100);
        assert_eq!(delay.waits(), 4);
    }

    #[test]
    fn write_failure_is_reported() {
        let mut link = link(MockSerial::new().failing_writes());
        assert_eq!(
            block_on(link.write_line(b"AT")),
            Err(AtError::Io(MockError))
        );
    }
}
