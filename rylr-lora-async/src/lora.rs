//! The power-aware LoRa radio driver.

use core::cell::RefCell;

use embedded_hal_async::delay::DelayNs;
use embedded_io::ReadReady;
use embedded_io_async::{Read, Write};
use rylr_at_async::op::{
    Bandwidth, CodingRate, Command, MessageState, Mode, RadioParameters, ReceivedMessage, Reply,
    SpreadingFactor,
};
use rylr_at_async::{ArgumentError, AtError, AtModem, Config, Incoming};

use crate::power::{Power, PowerState};
use crate::settings::Settings;

/// Configuration for the LoRa radio.
///
/// Written to the module by [`LoraRadio::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoraConfig {
    /// Network id, 3 to 15 or 18.
    pub network_id: u8,
    /// Spreading factor
    pub spreading_factor: SpreadingFactor,
    /// Bandwidth
    pub bandwidth: Bandwidth,
    /// Coding rate
    pub coding_rate: CodingRate,
    /// Preamble length. Values above 12 require network id 18.
    pub preamble: u8,
    /// Centre frequency in Hz.
    pub band_hz: u32,
    /// RF output power in dBm, 0 to 22.
    pub output_power_dbm: u8,
    /// Pause before the liveness probe of [`LoraRadio::begin`] is retried.
    pub probe_retry_delay_ms: u32,
}

impl Default for LoraConfig {
    fn default() -> Self {
        Self {
            network_id: 18,
            spreading_factor: SpreadingFactor::SF9,
            bandwidth: Bandwidth::BW125,
            coding_rate: CodingRate::CR4_5,
            preamble: 12,
            band_hz: 915_000_000,
            output_power_dbm: 22,
            probe_retry_delay_ms: 1_000,
        }
    }
}

impl LoraConfig {
    /// Sets the network id.
    pub fn set_network_id(mut self, network_id: u8) -> Self {
        self.network_id = network_id;
        self
    }

    /// Sets the spreading factor.
    pub fn set_spreading_factor(mut self, spreading_factor: SpreadingFactor) -> Self {
        self.spreading_factor = spreading_factor;
        self
    }

    /// Sets the bandwidth.
    pub fn set_bandwidth(mut self, bandwidth: Bandwidth) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    /// Sets the coding rate.
    pub fn set_coding_rate(mut self, coding_rate: CodingRate) -> Self {
        self.coding_rate = coding_rate;
        self
    }

    /// Sets the preamble length.
    pub fn set_preamble(mut self, preamble: u8) -> Self {
        self.preamble = preamble;
        self
    }

    /// Sets the centre frequency.
    pub fn set_band_hz(mut self, band_hz: u32) -> Self {
        self.band_hz = band_hz;
        self
    }

    /// Sets the RF output power.
    pub fn set_output_power_dbm(mut self, output_power_dbm: u8) -> Self {
        self.output_power_dbm = output_power_dbm;
        self
    }

    /// Sets the pause before the start-up probe is retried.
    pub fn set_probe_retry_delay_ms(mut self, probe_retry_delay_ms: u32) -> Self {
        self.probe_retry_delay_ms = probe_retry_delay_ms;
        self
    }

    /// The value of `AT+PARAMETER` for this configuration.
    pub fn radio_parameters(&self) -> RadioParameters {
        RadioParameters::default()
            .set_spreading_factor(self.spreading_factor)
            .set_bandwidth(self.bandwidth)
            .set_coding_rate(self.coding_rate)
            .set_preamble(self.preamble)
    }

    /// Checks the combination of values against the limits of the module.
    ///
    /// The spreading factor must lie between 7 and 9 at 125 kHz, 10 at 250 kHz
    /// and 11 at 500 kHz.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        if !matches!(self.network_id, 3..=15 | 18) {
            return Err(ArgumentError::OutOfRange("network id"));
        }
        if self.output_power_dbm > 22 {
            return Err(ArgumentError::OutOfRange("output power"));
        }
        if self.preamble > 12 && self.network_id != 18 {
            return Err(ArgumentError::OutOfRange("preamble"));
        }
        if self.spreading_factor < SpreadingFactor::SF7
            || self.spreading_factor > self.bandwidth.max_spreading_factor()
        {
            return Err(ArgumentError::OutOfRange("spreading factor"));
        }
        Ok(())
    }
}

/// A high-level interface for an RYLR LoRa module.
///
/// Every operation that needs the radio active wakes the module first. All
/// methods take `&self`; requests made while another one is in progress fail
/// with [`AtError::Busy`].
pub struct LoraRadio<UART, DELAY> {
    modem: AtModem<UART, DELAY>,
    config: LoraConfig,
    power: Power,
    settings: RefCell<Settings>,
    message: RefCell<ReceivedMessage>,
}

impl<UART, DELAY> LoraRadio<UART, DELAY>
where
    UART: Read + Write + ReadReady,
    DELAY: DelayNs,
{
    /// Creates a new `LoraRadio` with the default engine timeouts.
    ///
    /// # Arguments
    ///
    /// * `uart` - The UART connected to the module.
    /// * `delay` - A delay provider that implements `DelayNs`.
    /// * `config` - The settings written by [`configure`](Self::configure).
    pub fn new(uart: UART, delay: DELAY, config: LoraConfig) -> Self {
        Self::with_modem(AtModem::new(uart, delay, Config::default()), config)
    }

    /// Creates a new `LoraRadio` on top of an existing engine.
    pub fn with_modem(modem: AtModem<UART, DELAY>, config: LoraConfig) -> Self {
        Self {
            modem,
            config,
            power: Power::new(),
            settings: RefCell::new(Settings::default()),
            message: RefCell::new(ReceivedMessage::new()),
        }
    }

    /// The underlying command/response engine.
    pub fn modem(&self) -> &AtModem<UART, DELAY> {
        &self.modem
    }

    /// The radio configuration.
    pub fn config(&self) -> &LoraConfig {
        &self.config
    }

    /// Whether the module is awake or asleep.
    pub fn power_state(&self) -> PowerState {
        self.power.state()
    }

    /// The settings last read or written.
    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    /// The outcome of the last [`check_for_received_message`](Self::check_for_received_message).
    pub fn received_message(&self) -> ReceivedMessage {
        self.message.borrow().clone()
    }

    /// Gives back the UART and the delay.
    pub fn release(self) -> (UART, DELAY) {
        self.modem.release()
    }

    /// Checks that the module answers.
    ///
    /// Sends `AT`; if that fails it waits
    /// [`probe_retry_delay_ms`](LoraConfig::probe_retry_delay_ms) and tries once
    /// more.
    pub async fn begin(&self) -> Result<(), AtError<UART::Error>> {
        log::trace!("lora::begin");
        match self.modem.send(&Command::Test).await {
            Ok(_) => return Ok(()),
            Err(AtError::Busy) => return Err(AtError::Busy),
            Err(err) => log::warn!("lora::begin no answer to AT ({err:?}), retrying"),
        }
        self.modem.idle(self.config.probe_retry_delay_ms).await?;
        self.modem
            .send(&Command::Test)
            .await
            .inspect_err(|err| log::warn!("lora::begin module not responding: {err:?}"))?;
        Ok(())
    }

    /// Writes the configuration and `address` to the module.
    ///
    /// Sends the network id, address, radio parameters, transceiver mode, band
    /// and output power, stopping at the first command that fails. The cached
    /// [`Settings`] are reset first and then updated as each command succeeds.
    pub async fn configure(&self, address: u16) -> Result<(), AtError<UART::Error>> {
        self.config.validate().inspect_err(|err| {
            log::warn!("lora::configure invalid configuration: {err:?}");
        })?;
        *self.settings.borrow_mut() = Settings::default();
        self.wake().await?;

        let config = self.config;
        log::trace!("lora::configure {config:?} address: {address}");

        self.modem
            .send(&Command::SetNetworkId(config.network_id))
            .await?;
        self.settings.borrow_mut().network_id = config.network_id;

        self.modem.send(&Command::SetAddress(address)).await?;
        self.settings.borrow_mut().address = address;

        let parameters = config.radio_parameters();
        self.modem.send(&Command::SetParameters(parameters)).await?;
        self.settings.borrow_mut().parameters = Some(parameters);

        self.modem.send(&Command::SetMode(Mode::Transceiver)).await?;
        self.modem.send(&Command::SetBand(config.band_hz)).await?;

        self.modem
            .send(&Command::SetOutputPower(config.output_power_dbm))
            .await?;
        self.settings.borrow_mut().output_power_dbm = config.output_power_dbm;

        log::debug!("lora::configure done");
        Ok(())
    }

    /// Changes the address of the module.
    pub async fn set_address(&self, address: u16) -> Result<(), AtError<UART::Error>> {
        self.wake().await?;
        self.modem.send(&Command::SetAddress(address)).await?;
        self.settings.borrow_mut().address = address;
        Ok(())
    }

    /// Queries the settings stored in the module.
    ///
    /// See [`Settings::read_from`] for the order of the queries and for what
    /// happens when one of them fails.
    pub async fn read_settings(&self) -> Result<Settings, AtError<UART::Error>> {
        self.wake().await?;
        let mut settings = self.settings();
        let result = settings.read_from(&self.modem).await;
        *self.settings.borrow_mut() = settings.clone();
        result.map(|_| settings)
    }

    /// Sends a raw command line, e.g. `AT+BAND?`, and returns the reply.
    ///
    /// The power state is not checked.
    pub async fn send_command(&self, command: &str) -> Result<Reply, AtError<UART::Error>> {
        self.modem.send_raw(command.as_bytes()).await
    }

    /// Transmits `payload` to `address`; address 0 broadcasts.
    ///
    /// Returns once the module acknowledged the end of the transmission.
    pub async fn transmit(&self, address: u16, payload: &[u8]) -> Result<(), AtError<UART::Error>> {
        self.wake().await?;
        log::trace!("lora::transmit to {address}: {payload:?}");
        self.modem
            .send(&Command::Send { address, payload })
            .await
            .inspect_err(|err| log::warn!("lora::transmit failed: {err:?}"))?;
        Ok(())
    }

    /// Reads one unsolicited line from the module, if any is waiting.
    ///
    /// The stored [`received_message`](Self::received_message) is cleared first,
    /// then reflects the outcome: [`MessageState::Ok`] for an acknowledgement
    /// or a message, [`MessageState::Error`] for a line that could not be
    /// parsed. Does not wake the module.
    pub async fn check_for_received_message(&self) -> Result<Incoming, AtError<UART::Error>> {
        self.message.borrow_mut().clear();
        let result = self.modem.poll_incoming().await;

        let mut message = self.message.borrow_mut();
        match &result {
            Ok(Incoming::NoMessage) | Err(AtError::Busy) => {}
            Ok(Incoming::Ack) => message.state = MessageState::Ok,
            Ok(Incoming::Message(received)) => *message = received.clone(),
            Err(_) => message.state = MessageState::Error,
        }
        result
    }

    /// Puts the module to sleep.
    pub async fn sleep(&self) -> Result<(), AtError<UART::Error>> {
        self.power.sleep(&self.modem).await
    }

    /// Wakes the module up unless it is already awake.
    #[doc(alias = "ensure_awake")]
    pub async fn wake(&self) -> Result<(), AtError<UART::Error>> {
        self.power.ensure_awake(&self.modem).await
    }
}
