//! Timing and parsing configuration for the command/response engine.

/// What to do when the `<length>` field of a `+RCV=` frame does not match the
/// number of payload bytes actually received.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum LengthCheck {
    /// Parse the field but accept any mismatch.
    #[default]
    Ignore,
    /// Treat a mismatch as a malformed frame.
    Reject,
}

/// Configuration parameters used by [`AtModem`](crate::AtModem).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// How long to wait for the reply to an ordinary command, in milliseconds.
    pub command_timeout_ms: u32,
    /// How long to wait for the reply to `AT+SEND`, in milliseconds.
    /// The module only acknowledges once the radio transmission is finished.
    pub transmit_timeout_ms: u32,
    /// Interval between two checks of the UART receive buffer, in milliseconds.
    pub poll_interval_ms: u32,
    /// A partially received line is considered complete once no new byte
    /// arrived for this many milliseconds.
    pub line_idle_ms: u32,
    /// Handling of the `<length>` field of received frames.
    pub length_check: LengthCheck,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_timeout_ms: 1_000,
            transmit_timeout_ms: 15_000,
            poll_interval_ms: 10,
            line_idle_ms: 100,
            length_check: LengthCheck::Ignore,
        }
    }
}

impl Config {
    /// Sets the reply timeout for ordinary commands.
    pub fn set_command_timeout_ms(mut self, command_timeout_ms: u32) -> Self {
        self.command_timeout_ms = command_timeout_ms;
        self
    }

    /// Sets the reply timeout for `AT+SEND`.
    pub fn set_transmit_timeout_ms(mut self, transmit_timeout_ms: u32) -> Self {
        self.transmit_timeout_ms = transmit_timeout_ms;
        self
    }

    /// Sets the UART polling interval. Zero is rounded up to one millisecond.
    pub fn set_poll_interval_ms(mut self, poll_interval_ms: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms.max(1);
        self
    }

    /// Sets the idle time after which a partial line is taken as complete.
    pub fn set_line_idle_ms(mut self, line_idle_ms: u32) -> Self {
        self.line_idle_ms = line_idle_ms;
        self
    }

    /// Sets the handling of the `<length>` field of received frames.
    pub fn set_length_check(mut self, length_check: LengthCheck) -> Self {
        self.length_check = length_check;
        self
    }
}
