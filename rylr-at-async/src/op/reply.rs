//! Replies to commands and their classification.

use core::str::FromStr;

use heapless::String;

use crate::{Field, FrameError, MAX_LINE_LEN};

const ERROR_MARKER: &str = "+ERR";

/// One trimmed reply line received after a command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reply {
    line: String<MAX_LINE_LEN>,
}

impl Reply {
    /// Copies a raw line received from the UART.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, FrameError> {
        let text = core::str::from_utf8(raw).map_err(|_| FrameError::Encoding)?;
        let line = String::try_from(text.trim()).map_err(|_| FrameError::Encoding)?;
        Ok(Self { line })
    }

    /// The reply text.
    pub fn as_str(&self) -> &str {
        self.line.as_str()
    }

    /// Returns `true` for the bare `+OK` acknowledgement.
    pub fn is_ok(&self) -> bool {
        self.line == "+OK"
    }

    /// Returns the module error carried by this reply, if any.
    ///
    /// The outer option tells whether the reply is an error at all, the inner
    /// one holds the code of a `+ERR=<code>` reply.
    pub fn module_error(&self) -> Option<Option<u16>> {
        let line = self.line.as_str();
        let at = line.find(ERROR_MARKER)?;
        let code = line[at + ERROR_MARKER.len()..]
            .strip_prefix('=')
            .and_then(|code| code.trim().parse().ok());
        Some(code)
    }

    /// Returns the text following the echoed `prefix`, e.g. `AB12` for
    /// `+UID=AB12` and prefix `+UID=`.
    pub fn value(&self, prefix: &str) -> Result<&str, FrameError> {
        self.line
            .strip_prefix(prefix)
            .map(str::trim)
            .ok_or(FrameError::UnexpectedReply)
    }

    /// Parses the text following the echoed `prefix`.
    pub fn parse_value<T: FromStr>(&self, prefix: &str, field: Field) -> Result<T, FrameError> {
        self.value(prefix)?
            .parse()
            .map_err(|_| FrameError::InvalidField(field))
    }
}

/// A short description of a `+ERR=<code>` value.
pub fn describe_module_error(code: u16) -> &'static str {
    match code {
        1 => "missing CR LF after the command",
        2 => "command does not start with AT",
        4 => "unknown command",
        5 => "payload does not match the declared length",
        10 => "transmit timed out",
        12 => "CRC error",
        13 => "payload longer than 240 bytes",
        14 => "flash write failed",
        15 => "unknown error",
        17 => "previous transmission not finished",
        18 => "preamble value not allowed",
        19 => "receive failed, header error",
        20 => "smart receiving time setting not allowed",
        _ => "unrecognised error code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(line: &str) -> Reply {
        Reply::from_bytes(line.as_bytes()).unwrap()
    }

    #[test]
    fn trims_line_breaks() {
        let reply = reply("+OK\r\n");
        assert_eq!(reply.as_str(), "+OK");
        assert!(reply.is_ok());
        assert_eq!(reply.module_error(), None);
    }

    #[test]
    fn error_marker_anywhere_in_line_is_an_error() {
        assert_eq!(reply("+ERR=4").module_error(), Some(Some(4)));
        assert_eq!(reply("+ERR").module_error(), Some(None));
        assert_eq!(reply("junk +ERR=17").module_error(), Some(Some(17)));
        assert_eq!(reply("+ERR=x").module_error(), Some(None));
    }

    #[test]
    fn value_is_sliced_after_echoed_prefix() {
        assert_eq!(reply("+UID=AB12 ").value("+UID="), Ok("AB12"));
        assert_eq!(
            reply("+CRFOP=22").parse_value::<u8>("+CRFOP=", Field::OutputPower),
            Ok(22)
        );
        assert_eq!(
            reply("+OK").value("+UID="),
            Err(FrameError::UnexpectedReply)
        );
        assert_eq!(
            reply("+ADDRESS=abc").parse_value::<u16>("+ADDRESS=", Field::Address),
            Err(FrameError::InvalidField(Field::Address))
        );
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert_eq!(Reply::from_bytes(&[0xff, 0xfe]), Err(FrameError::Encoding));
    }

    #[test]
    fn describes_known_codes() {
        assert_eq!(describe_module_error(18), "preamble value not allowed");
        assert_eq!(describe_module_error(99), "unrecognised error code");
    }
}
