//! Encoding of the AT commands understood by the module.

use core::fmt::Write;

use heapless::{String, Vec};

use super::param::{Mode, RadioParameters};
use crate::{ArgumentError, MAX_LINE_LEN, MAX_PAYLOAD_LEN};

/// An encoded command line, without the `\r\n` terminator.
pub type CommandLine = Vec<u8, MAX_LINE_LEN>;

/// Prefix shared by every transmit command; used to pick the longer timeout.
pub(crate) const SEND_PREFIX: &[u8] = b"AT+SEND=";

/// A setting that can be read back with a `?` query.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Query {
    /// `AT+UID?`, the module's unique id.
    Uid,
    /// `AT+CRFOP?`, the RF output power in dBm.
    OutputPower,
    /// `AT+NETWORKID?`
    NetworkId,
    /// `AT+ADDRESS?`
    Address,
    /// `AT+PARAMETER?`
    Parameters,
    /// `AT+BAND?`, the centre frequency in Hz.
    Band,
    /// `AT+MODE?`
    Mode,
}

impl Query {
    /// The command name, as it appears after `AT+`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Uid => "UID",
            Self::OutputPower => "CRFOP",
            Self::NetworkId => "NETWORKID",
            Self::Address => "ADDRESS",
            Self::Parameters => "PARAMETER",
            Self::Band => "BAND",
            Self::Mode => "MODE",
        }
    }

    /// The prefix the module echoes in front of the queried value.
    pub fn reply_prefix(self) -> &'static str {
        match self {
            Self::Uid => "+UID=",
            Self::OutputPower => "+CRFOP=",
            Self::NetworkId => "+NETWORKID=",
            Self::Address => "+ADDRESS=",
            Self::Parameters => "+PARAMETER=",
            Self::Band => "+BAND=",
            Self::Mode => "+MODE=",
        }
    }
}

/// A command sent to the module.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// `AT`, the liveness probe.
    Test,
    /// `AT+NETWORKID=<id>`. The module accepts 3 to 15, and 18.
    SetNetworkId(u8),
    /// `AT+ADDRESS=<address>`
    SetAddress(u16),
    /// `AT+PARAMETER=<sf>,<bw>,<cr>,<preamble>`
    SetParameters(RadioParameters),
    /// `AT+MODE=<mode>`
    SetMode(Mode),
    /// `AT+BAND=<hz>`
    SetBand(u32),
    /// `AT+CRFOP=<dbm>`. The module accepts 0 to 22 dBm.
    SetOutputPower(u8),
    /// `AT+<NAME>?`
    Query(Query),
    /// `AT+SEND=<address>,<length>,<payload>`
    Send {
        /// Destination address, 0 broadcasts.
        address: u16,
        /// At most [`MAX_PAYLOAD_LEN`] bytes, without CR or LF.
        payload: &'a [u8],
    },
}

impl Command<'_> {
    /// Returns `true` if the module only replies after a radio transmission.
    pub fn is_transmit(&self) -> bool {
        matches!(self, Self::Send { .. })
    }

    /// Encodes the command line, without the terminator.
    pub fn encode(&self) -> Result<CommandLine, ArgumentError> {
        let mut line: String<MAX_LINE_LEN> = String::new();
        let written = match *self {
            Self::Test => write!(line, "AT"),
            Self::SetNetworkId(id) => {
                if !matches!(id, 3..=15 | 18) {
                    return Err(ArgumentError::OutOfRange("network id"));
                }
                write!(line, "AT+NETWORKID={id}")
            }
            Self::SetAddress(address) => write!(line, "AT+ADDRESS={address}"),
            Self::SetParameters(params) => write!(
                line,
                "AT+PARAMETER={},{},{},{}",
                params.spreading_factor as u8,
                params.bandwidth as u8,
                params.coding_rate as u8,
                params.preamble
            ),
            Self::SetMode(mode) => write!(line, "AT+MODE={}", mode as u8),
            Self::SetBand(hz) => write!(line, "AT+BAND={hz}"),
            Self::SetOutputPower(dbm) => {
                if dbm > 22 {
                    return Err(ArgumentError::OutOfRange("output power"));
                }
                write!(line, "AT+CRFOP={dbm}")
            }
            Self::Query(query) => write!(line, "AT+{}?", query.name()),
            Self::Send { address, payload } => {
                if payload.len() > MAX_PAYLOAD_LEN {
                    return Err(ArgumentError::PayloadTooLong);
                }
                check_line(payload)?;
                write!(line, "AT+SEND={address},{},", payload.len())
            }
        };
        written.map_err(|_| ArgumentError::LineTooLong)?;

        let mut line = line.into_bytes();
        if let Self::Send { payload, .. } = self {
            line.extend_from_slice(payload)
                .map_err(|_| ArgumentError::LineTooLong)?;
        }
        Ok(line)
    }
}

/// Checks that a caller supplied line can be sent as a single command.
pub fn check_line(line: &[u8]) -> Result<(), ArgumentError> {
    if line.iter().any(|&b| b == b'\r' || b == b'\n') {
        return Err(ArgumentError::ControlCharacter);
    }
    if line.len() > MAX_LINE_LEN {
        return Err(ArgumentError::LineTooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::param::{Bandwidth, CodingRate, SpreadingFactor};

    fn encoded(command: Command<'_>) -> CommandLine {
        command.encode().unwrap()
    }

    #[test]
    fn transmit_encodes_address_length_and_payload() {
        let command = Command::Send {
            address: 5,
            payload: b"hi",
        };
        assert_eq!(encoded(command).as_slice(), b"AT+SEND=5,2,hi");
        assert!(command.is_transmit());
    }

    #[test]
    fn transmit_keeps_delimiters_inside_payload() {
        let command = Command::Send {
            address: 57248,
            payload: b"a,b",
        };
        assert_eq!(encoded(command).as_slice(), b"AT+SEND=57248,3,a,b");
    }

    #[test]
    fn encodes_settings() {
        assert_eq!(encoded(Command::Test).as_slice(), b"AT");
        assert_eq!(
            encoded(Command::SetNetworkId(18)).as_slice(),
            b"AT+NETWORKID=18"
        );
        assert_eq!(encoded(Command::SetAddress(7)).as_slice(), b"AT+ADDRESS=7");
        assert_eq!(
            encoded(Command::SetMode(Mode::Sleep)).as_slice(),
            b"AT+MODE=1"
        );
        assert_eq!(
            encoded(Command::SetBand(915_000_000)).as_slice(),
            b"AT+BAND=915000000"
        );
        assert_eq!(
            encoded(Command::SetOutputPower(22)).as_slice(),
            b"AT+CRFOP=22"
        );

        let params = RadioParameters::default()
            .set_spreading_factor(SpreadingFactor::SF11)
            .set_bandwidth(Bandwidth::BW500)
            .set_coding_rate(CodingRate::CR4_8)
            .set_preamble(24);
        assert_eq!(
            encoded(Command::SetParameters(params)).as_slice(),
            b"AT+PARAMETER=11,9,4,24"
        );
        assert!(!Command::SetParameters(params).is_transmit());
    }

    #[test]
    fn encodes_queries() {
        assert_eq!(encoded(Command::Query(Query::Uid)).as_slice(), b"AT+UID?");
        assert_eq!(
            encoded(Command::Query(Query::OutputPower)).as_slice(),
            b"AT+CRFOP?"
        );
        assert_eq!(
            encoded(Command::Query(Query::Parameters)).as_slice(),
            b"AT+PARAMETER?"
        );
    }

    #[test]
    fn rejects_payload_that_would_break_framing() {
        let command = Command::Send {
            address: 1,
            payload: b"two\r\nlines",
        };
        assert_eq!(command.encode(), Err(ArgumentError::ControlCharacter));

        let long = [b'x'; MAX_PAYLOAD_LEN + 1];
        let command = Command::Send {
            address: 1,
            payload: &long,
        };
        assert_eq!(command.encode(), Err(ArgumentError::PayloadTooLong));

        let full = [b'x'; MAX_PAYLOAD_LEN];
        let command = Command::Send {
            address: 65535,
            payload: &full,
        };
        assert_eq!(encoded(command).len(), "AT+SEND=65535,240,".len() + 240);
    }

    #[test]
    fn rejects_out_of_range_settings() {
        assert_eq!(
            Command::SetNetworkId(16).encode(),
            Err(ArgumentError::OutOfRange("network id"))
        );
        assert_eq!(
            Command::SetOutputPower(23).encode(),
            Err(ArgumentError::OutOfRange("output power"))
        );
    }
}
