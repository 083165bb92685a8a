//! An asynchronous, `no_std` driver for the REYAX RYLR family of UART LoRa modules.
//!
//! The modules are controlled through a line-oriented AT-command protocol. This crate
//! provides the command/response engine that serializes every exchange with the module,
//! the encoders for the supported commands, and the parser for the `+RCV=` frames the
//! module emits when a radio message arrives.
//!
//! The main entry point is the [`AtModem`] struct, which takes an async UART
//! (anything implementing `embedded_io_async::{Read, Write}` and `embedded_io::ReadReady`)
//! and an `embedded_hal_async::delay::DelayNs` used to pace the polling loops.
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo<U, D>(uart: U, delay: D) -> Result<(), rylr_at_async::AtError<U::Error>>
//! # where
//! #     U: embedded_io_async::Read + embedded_io_async::Write + embedded_io::ReadReady,
//! #     D: embedded_hal_async::delay::DelayNs,
//! # {
//! use rylr_at_async::{op::Command, AtModem, Config, Incoming};
//!
//! let modem = AtModem::new(uart, delay, Config::default());
//! modem.send(&Command::Test).await?;
//! modem
//!     .send(&Command::Send { address: 5, payload: b"hi" })
//!     .await?;
//!
//! if let Incoming::Message(message) = modem.poll_incoming().await? {
//!     log::info!("from {}: {:?}", message.address, message.payload);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! See the `rylr-lora-async` crate for the power-aware, higher-level radio driver built
//! on top of this engine.

#![no_std]

pub mod conf;
pub mod link;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod op;

mod at;
pub use at::*;
pub use conf::{Config, LengthCheck};

/// Longest line, in bytes, that is exchanged with the module.
///
/// Large enough for `+RCV=65535,240,<240 byte payload>,-164,-20`.
pub const MAX_LINE_LEN: usize = 288;

/// Largest payload the module accepts in a single `AT+SEND`.
pub const MAX_PAYLOAD_LEN: usize = 240;
