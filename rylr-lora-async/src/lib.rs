//! An asynchronous, `no_std` driver for REYAX RYLR LoRa modules.
//!
//! This driver provides a `LoraRadio` struct that configures the module, transmits
//! messages and collects the ones it receives. It is built upon the `rylr-at-async`
//! crate and keeps track of the module's sleep state, waking it up before every
//! operation that needs the radio.
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo<U, D>(uart: U, delay: D) -> Result<(), rylr_at_async::AtError<U::Error>>
//! # where
//! #     U: embedded_io_async::Read + embedded_io_async::Write + embedded_io::ReadReady,
//! #     D: embedded_hal_async::delay::DelayNs,
//! # {
//! use rylr_at_async::Incoming;
//! use rylr_lora_async::{LoraConfig, LoraRadio};
//!
//! let lora = LoraRadio::new(uart, delay, LoraConfig::default());
//! lora.begin().await?;
//! lora.configure(1).await?;
//!
//! // Send a message, then sleep until there is something to do.
//! lora.transmit(2, b"Hello LoRa!").await?;
//! lora.sleep().await?;
//!
//! if let Incoming::Message(message) = lora.check_for_received_message().await? {
//!     log::info!("rssi {} snr {}", message.rssi, message.snr);
//! }
//! # Ok(())
//! # }
//! ```

#![no_std]
#![deny(missing_docs)]

/// The LoRa module driver.
pub mod lora;
/// Sleep state tracking.
pub mod power;
/// Settings read back from the module.
pub mod settings;

pub use lora::{LoraConfig, LoraRadio};
pub use power::PowerState;
pub use settings::{Settings, MAX_UID_LEN};
