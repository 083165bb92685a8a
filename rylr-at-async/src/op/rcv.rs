//! Parsing of the `+RCV=` frames the module emits for received radio messages.
//!
//! A frame reads `+RCV=<address>,<length>,<payload>,<rssi>,<snr>`. The payload is
//! forwarded verbatim by the module and may itself contain the `,` delimiter, so the
//! frame cannot be split naively. Only the payload may contain the delimiter:
//! `<address>` and `<length>` are located from the front of the frame, `<rssi>` and
//! `<snr>` from the back, and the payload is whatever lies in between.
//!
//! When a sender violates that assumption the extra delimiter shifts a numeric
//! field; the frame is then reported as [`FrameError::InvalidField`] whenever the
//! shifted field no longer parses, instead of being silently mis-split.

use heapless::Vec;

use crate::{Field, FrameError, LengthCheck, MAX_PAYLOAD_LEN};

const RCV_MARKER: &[u8] = b"+RCV=";
const DELIMITER: u8 = b',';

/// Validity of the fields of a [`ReceivedMessage`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum MessageState {
    /// Nothing was received; all fields are empty.
    #[default]
    NoMessage,
    /// A frame (or the acknowledgement of a transmission) was received.
    Ok,
    /// An inbound line could not be parsed; all fields are empty.
    Error,
}

/// A radio message reported by the module.
///
/// The fields are only meaningful while [`state`](Self::state) is
/// [`MessageState::Ok`]; every other state leaves them cleared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Validity of the remaining fields.
    pub state: MessageState,
    /// Address of the sending module.
    pub address: u16,
    /// Payload length as declared by the module.
    pub declared_len: usize,
    /// The payload bytes.
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
    /// Received signal strength indicator, in dBm.
    pub rssi: i16,
    /// Signal-to-noise ratio, in dB.
    pub snr: i16,
}

impl ReceivedMessage {
    /// Creates an empty message in the [`MessageState::NoMessage`] state.
    pub const fn new() -> Self {
        Self {
            state: MessageState::NoMessage,
            address: 0,
            declared_len: 0,
            payload: Vec::new(),
            rssi: 0,
            snr: 0,
        }
    }

    /// Resets every field and the state to [`MessageState::NoMessage`].
    pub fn clear(&mut self) {
        self.state = MessageState::NoMessage;
        self.address = 0;
        self.declared_len = 0;
        self.payload.clear();
        self.rssi = 0;
        self.snr = 0;
    }

    /// Returns `true` if the fields hold a received frame.
    pub fn is_valid(&self) -> bool {
        self.state == MessageState::Ok
    }

    /// Parses a trimmed `+RCV=` line.
    pub fn parse(line: &[u8], length_check: LengthCheck) -> Result<Self, FrameError> {
        let mut message = Self::new();
        message.parse_into(line, length_check)?;
        Ok(message)
    }

    /// Parses a trimmed `+RCV=` line into `self`.
    ///
    /// All fields are cleared first. On error the state becomes
    /// [`MessageState::Error`] and no field is populated.
    pub fn parse_into(&mut self, line: &[u8], length_check: LengthCheck) -> Result<(), FrameError> {
        self.clear();
        let result = self.fill(line, length_check);
        if result.is_err() {
            self.clear();
            self.state = MessageState::Error;
        }
        result
    }

    fn fill(&mut self, line: &[u8], length_check: LengthCheck) -> Result<(), FrameError> {
        let start = find(line, RCV_MARKER).ok_or(FrameError::MissingMarker)? + RCV_MARKER.len();
        let frame = &line[start..];

        let mut from_front = positions(frame, DELIMITER);
        let address_end = from_front.next().ok_or(FrameError::DelimiterCount)?;
        let length_end = from_front.next().ok_or(FrameError::DelimiterCount)?;

        let mut from_back = positions(frame, DELIMITER).rev();
        let snr_start = from_back.next().ok_or(FrameError::DelimiterCount)?;
        let rssi_start = from_back.next().ok_or(FrameError::DelimiterCount)?;
        if rssi_start <= length_end {
            return Err(FrameError::DelimiterCount);
        }

        let address = number(&frame[..address_end], Field::Address)?;
        let declared_len = number(&frame[address_end + 1..length_end], Field::Length)?;
        let payload = &frame[length_end + 1..rssi_start];
        let rssi = number(&frame[rssi_start + 1..snr_start], Field::Rssi)?;
        let snr = number(&frame[snr_start + 1..], Field::Snr)?;

        if length_check == LengthCheck::Reject && declared_len != payload.len() {
            return Err(FrameError::LengthMismatch {
                declared: declared_len,
                actual: payload.len(),
            });
        }
        if declared_len != payload.len() {
            log::debug!(
                "rylr::rcv declared length {declared_len} but got {} payload bytes",
                payload.len()
            );
        }

        self.payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLong)?;
        self.address = address;
        self.declared_len = declared_len;
        self.rssi = rssi;
        self.snr = snr;
        self.state = MessageState::Ok;
        Ok(())
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn positions(frame: &[u8], delimiter: u8) -> impl DoubleEndedIterator<Item = usize> + '_ {
    frame
        .iter()
        .enumerate()
        .filter(move |&(_, &b)| b == delimiter)
        .map(|(i, _)| i)
}

fn number<T: core::str::FromStr>(field: &[u8], which: Field) -> Result<T, FrameError> {
    core::str::from_utf8(field)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or(FrameError::InvalidField(which))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<ReceivedMessage, FrameError> {
        ReceivedMessage::parse(line.as_bytes(), LengthCheck::Ignore)
    }

    #[test]
    fn parses_plain_frame() {
        let message = parse("+RCV=57248,5,HELLO,-12,11").unwrap();
        assert_eq!(message.state, MessageState::Ok);
        assert_eq!(message.address, 57248);
        assert_eq!(message.declared_len, 5);
        assert_eq!(message.payload.as_slice(), b"HELLO");
        assert_eq!(message.rssi, -12);
        assert_eq!(message.snr, 11);
    }

    #[test]
    fn payload_may_contain_delimiter() {
        let message = parse("+RCV=7,5,hel,lo,-42,9").unwrap();
        assert_eq!(message.address, 7);
        assert_eq!(message.payload.as_slice(), b"hel,lo");
        assert_eq!(message.rssi, -42);
        assert_eq!(message.snr, 9);

        let message = parse("+RCV=3,4,,,,,-99,-5").unwrap();
        assert_eq!(message.payload.as_slice(), b",,,");
        assert_eq!(message.rssi, -99);
        assert_eq!(message.snr, -5);
    }

    #[test]
    fn empty_payload_is_accepted() {
        let message = parse("+RCV=7,0,,-42,9").unwrap();
        assert!(message.payload.is_empty());
        assert_eq!(message.rssi, -42);
    }

    #[test]
    fn three_delimiters_are_malformed_and_reset_fields() {
        let mut message = parse("+RCV=7,2,hi,-42,9").unwrap();
        assert!(message.is_valid());

        let result = message.parse_into(b"+RCV=7,2,-42,9", LengthCheck::Ignore);
        assert_eq!(result, Err(FrameError::DelimiterCount));
        assert_eq!(message.state, MessageState::Error);
        assert_eq!(message.address, 0);
        assert!(message.payload.is_empty());
        assert_eq!(message.rssi, 0);
        assert_eq!(message.snr, 0);
    }

    #[test]
    fn missing_marker_is_malformed() {
        assert_eq!(parse("+READY"), Err(FrameError::MissingMarker));
        assert_eq!(parse("RCV=7,2,hi,-42,9"), Err(FrameError::MissingMarker));
    }

    #[test]
    fn delimiter_outside_payload_is_reported() {
        // An extra delimiter in the signal fields shifts them into the payload
        // and leaves a non-numeric tail.
        assert_eq!(
            parse("+RCV=7,2,hi,-42,9x"),
            Err(FrameError::InvalidField(Field::Snr))
        );
        assert_eq!(
            parse("+RCV=7,2,hi,-4a,2"),
            Err(FrameError::InvalidField(Field::Rssi))
        );
        // A delimiter inside the address makes the length field non-numeric.
        assert_eq!(
            parse("+RCV=1,x,2,hi,-42,9"),
            Err(FrameError::InvalidField(Field::Length))
        );
        assert_eq!(
            parse("+RCV=,2,hi,-42,9"),
            Err(FrameError::InvalidField(Field::Address))
        );
    }

    #[test]
    fn length_mismatch_only_rejected_on_request() {
        let line = b"+RCV=7,5,hel,lo,-42,9";
        assert!(ReceivedMessage::parse(line, LengthCheck::Ignore).is_ok());
        assert_eq!(
            ReceivedMessage::parse(line, LengthCheck::Reject),
            Err(FrameError::LengthMismatch {
                declared: 5,
                actual: 6
            })
        );
        assert!(ReceivedMessage::parse(b"+RCV=7,6,hel,lo,-42,9", LengthCheck::Reject).is_ok());
    }

    #[test]
    fn oversized_payload_is_malformed() {
        let mut line: heapless::Vec<u8, 300> = heapless::Vec::new();
        line.extend_from_slice(b"+RCV=7,241,").unwrap();
        line.extend_from_slice(&[b'x'; MAX_PAYLOAD_LEN + 1]).unwrap();
        line.extend_from_slice(b",-42,9").unwrap();
        assert_eq!(
            ReceivedMessage::parse(&line, LengthCheck::Ignore),
            Err(FrameError::PayloadTooLong)
        );
    }
}
