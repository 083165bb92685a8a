//! Error types for the RYLR driver.

use core::fmt::{self, Debug};

/// A field of a received frame or of a settings reply.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    /// Sender address of a `+RCV=` frame, or the `+ADDRESS=` reply.
    Address,
    /// Declared payload length of a `+RCV=` frame.
    Length,
    /// Received signal strength of a `+RCV=` frame.
    Rssi,
    /// Signal-to-noise ratio of a `+RCV=` frame.
    Snr,
    /// The `+UID=` reply.
    Uid,
    /// The `+CRFOP=` reply.
    OutputPower,
    /// The `+NETWORKID=` reply.
    NetworkId,
    /// The `+PARAMETER=` reply.
    Parameters,
}

/// The ways an inbound line can fail to match its expected shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameError {
    /// The line is neither `+OK` nor a `+RCV=` frame.
    MissingMarker,
    /// The `+RCV=` frame has fewer than the four delimiters it needs.
    DelimiterCount,
    /// A numeric field could not be parsed.
    InvalidField(Field),
    /// The payload is longer than [`MAX_PAYLOAD_LEN`](crate::MAX_PAYLOAD_LEN).
    PayloadTooLong,
    /// The declared length differs from the received payload.
    /// Only reported with [`LengthCheck::Reject`](crate::LengthCheck::Reject).
    LengthMismatch {
        /// Value of the `<length>` field.
        declared: usize,
        /// Number of payload bytes actually received.
        actual: usize,
    },
    /// A reply did not start with the prefix echoed by its query.
    UnexpectedReply,
    /// A reply was not valid UTF-8.
    Encoding,
}

/// The ways an outbound command can fail to encode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArgumentError {
    /// The command contains a carriage return or line feed.
    ControlCharacter,
    /// The payload is longer than [`MAX_PAYLOAD_LEN`](crate::MAX_PAYLOAD_LEN).
    PayloadTooLong,
    /// The encoded line does not fit in [`MAX_LINE_LEN`](crate::MAX_LINE_LEN).
    LineTooLong,
    /// A parameter is outside the range the module accepts.
    OutOfRange(&'static str),
}

/// The main error type for the RYLR driver.
#[derive(PartialEq)]
pub enum AtError<TUARTERR> {
    /// Another command is already waiting for its reply.
    Busy,
    /// The module replied `+ERR`, with the error code when one was given.
    ModuleError(Option<u16>),
    /// The module did not reply before the timeout elapsed.
    NoResponse,
    /// An inbound line did not have the expected shape.
    Malformed(FrameError),
    /// An outbound command could not be encoded.
    InvalidArgument(ArgumentError),
    /// An inbound line was longer than [`MAX_LINE_LEN`](crate::MAX_LINE_LEN).
    Overflow,
    /// Reading from or writing to the UART failed.
    Io(TUARTERR),
}

impl<TUARTERR> AtError<TUARTERR> {
    /// Returns `true` for [`AtError::Busy`].
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

impl<TUARTERR: Debug> Debug for AtError<TUARTERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "Busy"),
            Self::ModuleError(Some(code)) => write!(
                f,
                "ModuleError({code}: {})",
                crate::op::reply::describe_module_error(*code)
            ),
            Self::ModuleError(None) => write!(f, "ModuleError"),
            Self::NoResponse => write!(f, "NoResponse"),
            Self::Malformed(err) => write!(f, "Malformed({err:?})"),
            Self::InvalidArgument(err) => write!(f, "InvalidArgument({err:?})"),
            Self::Overflow => write!(f, "Overflow"),
            Self::Io(err) => write!(f, "Io({err:?})"),
        }
    }
}

impl<TUARTERR> From<FrameError> for AtError<TUARTERR> {
    fn from(err: FrameError) -> Self {
        AtError::Malformed(err)
    }
}

impl<TUARTERR> From<ArgumentError> for AtError<TUARTERR> {
    fn from(err: ArgumentError) -> Self {
        AtError::InvalidArgument(err)
    }
}
