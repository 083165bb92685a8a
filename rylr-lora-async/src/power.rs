//! Tracking of the module's sleep state.

use core::cell::Cell;

use embedded_hal_async::delay::DelayNs;
use embedded_io::ReadReady;
use embedded_io_async::{Read, Write};
use rylr_at_async::op::{Command, Mode};
use rylr_at_async::{AtError, AtModem};

/// Whether the module is listening or sleeping.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PowerState {
    /// Transceiver mode. The module powers up in this state.
    #[default]
    Awake,
    /// Low power sleep mode, entered with `AT+MODE=1`.
    Asleep,
}

/// The two-state power machine.
///
/// Transitions are driven straight through [`AtModem::send`] and never through
/// an operation that itself checks the power state. The state only changes
/// once every command of a transition was acknowledged.
#[derive(Debug, Default)]
pub struct Power {
    state: Cell<PowerState>,
}

impl Power {
    /// Creates the machine in the [`PowerState::Awake`] state.
    pub const fn new() -> Self {
        Self {
            state: Cell::new(PowerState::Awake),
        }
    }

    /// The current state.
    pub fn state(&self) -> PowerState {
        self.state.get()
    }

    /// Wakes the module up unless it is already awake.
    ///
    /// Sends `AT` followed by `AT+MODE=0`. Does nothing when the module is
    /// awake.
    pub async fn ensure_awake<UART, DELAY>(
        &self,
        modem: &AtModem<UART, DELAY>,
    ) -> Result<(), AtError<UART::Error>>
    where
        UART: Read + Write + ReadReady,
        DELAY: DelayNs,
    {
        if self.state.get() == PowerState::Awake {
            return Ok(());
        }
        log::trace!("lora::wake");
        self.transition(modem, Mode::Transceiver)
            .await
            .inspect_err(|err| log::warn!("lora::wake failed: {err:?}"))?;
        self.state.set(PowerState::Awake);
        log::debug!("lora::wake module is awake");
        Ok(())
    }

    /// Puts the module to sleep.
    ///
    /// Sends `AT` followed by `AT+MODE=1`, whatever the current state.
    pub async fn sleep<UART, DELAY>(
        &self,
        modem: &AtModem<UART, DELAY>,
    ) -> Result<(), AtError<UART::Error>>
    where
        UART: Read + Write + ReadReady,
        DELAY: DelayNs,
    {
        log::trace!("lora::sleep");
        self.transition(modem, Mode::Sleep)
            .await
            .inspect_err(|err| log::warn!("lora::sleep failed: {err:?}"))?;
        self.state.set(PowerState::Asleep);
        log::debug!("lora::sleep module is asleep");
        Ok(())
    }

    async fn transition<UART, DELAY>(
        &self,
        modem: &AtModem<UART, DELAY>,
        mode: Mode,
    ) -> Result<(), AtError<UART::Error>>
    where
        UART: Read + Write + ReadReady,
        DELAY: DelayNs,
    {
        modem.send(&Command::Test).await?;
        modem.send(&Command::SetMode(mode)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use rylr_at_async::mock::{MockDelay, MockSerial};
    use rylr_at_async::Config;

    use super::*;

    fn modem(serial: MockSerial) -> AtModem<MockSerial, MockDelay> {
        AtModem::new(serial, MockDelay::new(), Config::default())
    }

    #[test]
    fn awake_module_is_not_woken() {
        let power = Power::new();
        let modem = modem(MockSerial::new());
        block_on(power.ensure_awake(&modem)).unwrap();

        let (serial, _) = modem.release();
        assert!(serial.written().is_empty());
    }

    #[test]
    fn wake_sequence_is_issued_once() {
        let power = Power::new();
        let modem = modem(MockSerial::new().reply("+OK").reply("+OK").reply("+OK").reply("+OK"));

        block_on(power.sleep(&modem)).unwrap();
        assert_eq!(power.state(), PowerState::Asleep);
        block_on(power.ensure_awake(&modem)).unwrap();
        block_on(power.ensure_awake(&modem)).unwrap();
        assert_eq!(power.state(), PowerState::Awake);

        let (serial, _) = modem.release();
        assert_eq!(
            serial.commands().as_slice(),
            ["AT", "AT+MODE=1", "AT", "AT+MODE=0"]
        );
    }

    #[test]
    fn failed_wake_keeps_module_asleep() {
        let power = Power::new();
        let modem = modem(MockSerial::new().reply("+OK").reply("+OK").reply("+OK").silent());

        block_on(power.sleep(&modem)).unwrap();
        assert_eq!(
            block_on(power.ensure_awake(&modem)),
            Err(AtError::NoResponse)
        );
        assert_eq!(power.state(), PowerState::Asleep);
    }

    #[test]
    fn failed_sleep_keeps_module_awake() {
        let power = Power::new();
        let modem = modem(MockSerial::new().reply("+ERR=2"));

        assert_eq!(
            block_on(power.sleep(&modem)),
            Err(AtError::ModuleError(Some(2)))
        );
        assert_eq!(power.state(), PowerState::Awake);

        let (serial, _) = modem.release();
        assert_eq!(serial.commands().as_slice(), ["AT"]);
    }
}
