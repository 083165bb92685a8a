//! The command/response engine.

mod err;

pub use err::*;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal_async::delay::DelayNs;
use embedded_io::ReadReady;
use embedded_io_async::{Read, Write};

use crate::conf::Config;
use crate::link::{Line, Link};
use crate::op::command::{check_line, SEND_PREFIX};
use crate::op::{Command, ReceivedMessage, Reply};

/// Something the engine did, reported to an [`Observer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event<'a> {
    /// A command line is about to be written.
    Command(&'a [u8]),
    /// A reply line was received.
    Reply(&'a str),
    /// No reply arrived within the timeout.
    NoResponse {
        /// The timeout that elapsed.
        timeout_ms: u32,
    },
    /// A request was refused because another one is in progress.
    Busy,
    /// An unsolicited line was read while polling.
    Inbound(&'a [u8]),
}

/// A callback receiving every [`Event`] of an [`AtModem`].
pub type Observer = fn(&Event<'_>);

/// The outcome of [`AtModem::poll_incoming`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Incoming {
    /// Nothing was waiting in the receive buffer.
    NoMessage,
    /// A bare `+OK`, the late acknowledgement of a transmission.
    Ack,
    /// A radio message.
    Message(ReceivedMessage),
}

type LinkGuard<'a, UART, DELAY> = MutexGuard<'a, NoopRawMutex, Link<UART, DELAY>>;

/// An RYLR module attached to a UART.
///
/// At most one request is in progress at any time. The UART is kept behind a
/// mutex that is only ever tried, never awaited: a second request made while
/// the first one waits for its reply fails right away with [`AtError::Busy`].
/// The mutex is released when the request finishes, fails or is dropped.
pub struct AtModem<UART, DELAY> {
    link: Mutex<NoopRawMutex, Link<UART, DELAY>>,
    config: Config,
    last_reply: RefCell<Reply>,
    observer: Option<Observer>,
}

impl<UART, DELAY> AtModem<UART, DELAY>
where
    UART: Read + Write + ReadReady,
    DELAY: DelayNs,
{
    /// Creates a new engine.
    ///
    /// # Arguments
    ///
    /// * `uart` - The UART connected to the module.
    /// * `delay` - The delay used to pace polling of the receive buffer.
    /// * `config` - Timeouts and parsing options.
    pub fn new(uart: UART, delay: DELAY, config: Config) -> Self {
        Self {
            link: Mutex::new(Link::new(uart, delay, &config)),
            config,
            last_reply: RefCell::new(Reply::default()),
            observer: None,
        }
    }

    /// Registers a callback that receives every [`Event`].
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The configuration the engine was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A copy of the most recent reply line, whatever its classification.
    pub fn last_reply(&self) -> Reply {
        self.last_reply.borrow().clone()
    }

    /// Returns `true` while a request is in progress.
    pub fn is_busy(&self) -> bool {
        self.link.try_lock().is_err()
    }

    /// Gives back the UART and the delay.
    pub fn release(self) -> (UART, DELAY) {
        self.link.into_inner().release()
    }

    /// Sends `command` and waits for its reply.
    ///
    /// `AT+SEND` waits up to [`Config::transmit_timeout_ms`], every other
    /// command up to [`Config::command_timeout_ms`].
    pub async fn send(&self, command: &Command<'_>) -> Result<Reply, AtError<UART::Error>> {
        let line = command.encode()?;
        let timeout_ms = if command.is_transmit() {
            self.config.transmit_timeout_ms
        } else {
            self.config.command_timeout_ms
        };
        self.exchange(&line, timeout_ms).await
    }

    /// Sends a caller supplied command line and waits for its reply.
    ///
    /// The line must not contain CR or LF; the terminator is appended here.
    pub async fn send_raw(&self, line: &[u8]) -> Result<Reply, AtError<UART::Error>> {
        check_line(line)?;
        let timeout_ms = if line.starts_with(SEND_PREFIX) {
            self.config.transmit_timeout_ms
        } else {
            self.config.command_timeout_ms
        };
        self.exchange(line, timeout_ms).await
    }

    /// Reads one unsolicited line, if any is waiting.
    ///
    /// Returns [`Incoming::NoMessage`] without blocking when the receive
    /// buffer is empty.
    pub async fn poll_incoming(&self) -> Result<Incoming, AtError<UART::Error>> {
        let mut link = self.lock()?;
        if !link.has_data()? {
            return Ok(Incoming::NoMessage);
        }

        let mut raw = Line::new();
        if link.read_line(&mut raw).await? == 0 {
            return Ok(Incoming::NoMessage);
        }
        let line = raw.trim_ascii();
        log::trace!("rylr::poll_incoming {line:?}");
        self.notify(&Event::Inbound(line));

        if line == b"+OK" {
            return Ok(Incoming::Ack);
        }
        let message = ReceivedMessage::parse(line, self.config.length_check).inspect_err(|err| {
            log::warn!("rylr::poll_incoming malformed frame: {err:?}");
        })?;
        log::debug!(
            "rylr::poll_incoming message from {}, {} bytes",
            message.address,
            message.payload.len()
        );
        Ok(Incoming::Message(message))
    }

    /// Waits `ms` milliseconds while holding the UART.
    pub async fn idle(&self, ms: u32) -> Result<(), AtError<UART::Error>> {
        self.lock()?.idle(ms).await;
        Ok(())
    }

    async fn exchange(&self, line: &[u8], timeout_ms: u32) -> Result<Reply, AtError<UART::Error>> {
        let mut link = self.lock()?;
        log::trace!("rylr::send {line:?}");
        self.notify(&Event::Command(line));
        link.write_line(line).await.inspect_err(|err| {
            log::warn!("rylr::send write failed: {err:?}");
        })?;

        let mut raw = Line::new();
        let received = link.wait_for_data(timeout_ms).await?
            && link.read_line(&mut raw).await? > 0;
        if !received {
            log::warn!("rylr::send no reply within {timeout_ms} ms");
            self.notify(&Event::NoResponse { timeout_ms });
            return Err(AtError::NoResponse);
        }

        let reply = Reply::from_bytes(&raw)?;
        log::trace!("rylr::send reply {:?}", reply.as_str());
        self.notify(&Event::Reply(reply.as_str()));
        *self.last_reply.borrow_mut() = reply.clone();

        if let Some(code) = reply.module_error() {
            let err = AtError::ModuleError(code);
            log::warn!("rylr::send module error: {err:?}");
            return Err(err);
        }
        Ok(reply)
    }

    fn lock(&self) -> Result<LinkGuard<'_, UART, DELAY>, AtError<UART::Error>> {
        self.link.try_lock().map_err(|_| {
            log::debug!("rylr::busy request refused");
            self.notify(&Event::Busy);
            AtError::Busy
        })
    }

    fn notify(&self, event: &Event<'_>) {
        if let Some(observer) = self.observer {
            observer(event);
        }
    }
}
