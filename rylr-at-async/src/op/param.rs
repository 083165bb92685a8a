//! Radio parameters carried by `AT+PARAMETER` and `AT+MODE`.

use crate::{Field, FrameError};

/// LoRa spreading factor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SpreadingFactor {
    /// Spreading Factor 5.
    SF5 = 5,
    /// Spreading Factor 6.
    SF6 = 6,
    /// Spreading Factor 7.
    SF7 = 7,
    /// Spreading Factor 8.
    SF8 = 8,
    /// Spreading Factor 9.
    SF9 = 9,
    /// Spreading Factor 10.
    SF10 = 10,
    /// Spreading Factor 11.
    SF11 = 11,
    /// Spreading Factor 12.
    SF12 = 12,
}

impl TryFrom<u8> for SpreadingFactor {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(Self::SF5),
            6 => Ok(Self::SF6),
            7 => Ok(Self::SF7),
            8 => Ok(Self::SF8),
            9 => Ok(Self::SF9),
            10 => Ok(Self::SF10),
            11 => Ok(Self::SF11),
            12 => Ok(Self::SF12),
            _ => Err(FrameError::InvalidField(Field::Parameters)),
        }
    }
}

/// LoRa bandwidth, as the code used on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Bandwidth {
    /// 7.8 kHz
    BW7 = 0,
    /// 10.4 kHz
    BW10 = 1,
    /// 15.6 kHz
    BW15 = 2,
    /// 20.8 kHz
    BW20 = 3,
    /// 31.25 kHz
    BW31 = 4,
    /// 41.7 kHz
    BW41 = 5,
    /// 62.5 kHz
    BW62 = 6,
    /// 125 kHz
    BW125 = 7,
    /// 250 kHz
    BW250 = 8,
    /// 500 kHz
    BW500 = 9,
}

impl TryFrom<u8> for Bandwidth {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::BW7),
            1 => Ok(Self::BW10),
            2 => Ok(Self::BW15),
            3 => Ok(Self::BW20),
            4 => Ok(Self::BW31),
            5 => Ok(Self::BW41),
            6 => Ok(Self::BW62),
            7 => Ok(Self::BW125),
            8 => Ok(Self::BW250),
            9 => Ok(Self::BW500),
            _ => Err(FrameError::InvalidField(Field::Parameters)),
        }
    }
}

impl Bandwidth {
    /// The largest spreading factor the module accepts at this bandwidth.
    ///
    /// Slower bandwidths than 125 kHz are limited like 125 kHz.
    pub fn max_spreading_factor(self) -> SpreadingFactor {
        match self {
            Self::BW500 => SpreadingFactor::SF11,
            Self::BW250 => SpreadingFactor::SF10,
            _ => SpreadingFactor::SF9,
        }
    }
}

/// LoRa forward error correction coding rate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CodingRate {
    /// 4/5
    CR4_5 = 1,
    /// 4/6
    CR4_6 = 2,
    /// 4/7
    CR4_7 = 3,
    /// 4/8
    CR4_8 = 4,
}

impl TryFrom<u8> for CodingRate {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::CR4_5),
            2 => Ok(Self::CR4_6),
            3 => Ok(Self::CR4_7),
            4 => Ok(Self::CR4_8),
            _ => Err(FrameError::InvalidField(Field::Parameters)),
        }
    }
}

/// Operating mode selected with `AT+MODE`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// Transmit and receive.
    Transceiver = 0,
    /// Low power sleep. Any command wakes the module up again.
    Sleep = 1,
}

/// The four values of `AT+PARAMETER=<sf>,<bw>,<cr>,<preamble>`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RadioParameters {
    /// Spreading factor.
    pub spreading_factor: SpreadingFactor,
    /// Bandwidth.
    pub bandwidth: Bandwidth,
    /// Coding rate.
    pub coding_rate: CodingRate,
    /// Programmed preamble length.
    pub preamble: u8,
}

impl Default for RadioParameters {
    fn default() -> Self {
        Self {
            spreading_factor: SpreadingFactor::SF9,
            bandwidth: Bandwidth::BW125,
            coding_rate: CodingRate::CR4_5,
            preamble: 12,
        }
    }
}

impl RadioParameters {
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

    /// Parses the value of a `+PARAMETER=` reply, e.g. `9,7,1,12`.
    ///
    /// The reply never carries a payload, so the fields are split strictly
    /// left to right.
    pub fn parse(value: &str) -> Result<Self, FrameError> {
        const INVALID: FrameError = FrameError::InvalidField(Field::Parameters);

        let mut fields = value.trim().split(',');
        let mut next = || -> Result<u8, FrameError> {
            fields
                .next()
                .and_then(|field| field.trim().parse().ok())
                .ok_or(INVALID)
        };

        let spreading_factor = SpreadingFactor::try_from(next()?)?;
        let bandwidth = Bandwidth::try_from(next()?)?;
        let coding_rate = CodingRate::try_from(next()?)?;
        let preamble = next()?;

        if fields.next().is_some() {
            return Err(INVALID);
        }

        Ok(Self {
            spreading_factor,
            bandwidth,
            coding_rate,
            preamble,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_parameter_reply_left_to_right() {
        let params = RadioParameters::parse("11,9,4,24").unwrap();
        assert_eq!(params.spreading_factor, SpreadingFactor::SF11);
        assert_eq!(params.bandwidth, Bandwidth::BW500);
        assert_eq!(params.coding_rate, CodingRate::CR4_8);
        assert_eq!(params.preamble, 24);
    }

    #[test]
    fn rejects_wrong_field_count() {
        let invalid = Err(FrameError::InvalidField(Field::Parameters));
        assert_eq!(RadioParameters::parse("9,7,1"), invalid);
        assert_eq!(RadioParameters::parse("9,7,1,12,3"), invalid);
        assert_eq!(RadioParameters::parse(""), invalid);
    }

    #[test]
    fn rejects_unknown_codes() {
        let invalid = Err(FrameError::InvalidField(Field::Parameters));
        assert_eq!(RadioParameters::parse("13,7,1,12"), invalid);
        assert_eq!(RadioParameters::parse("9,10,1,12"), invalid);
        assert_eq!(RadioParameters::parse("9,7,0,12"), invalid);
        assert_eq!(RadioParameters::parse("9,7,1,x"), invalid);
    }

    #[test]
    fn spreading_factor_limit_follows_bandwidth() {
        assert_eq!(Bandwidth::BW125.max_spreading_factor(), SpreadingFactor::SF9);
        assert_eq!(Bandwidth::BW250.max_spreading_factor(), SpreadingFactor::SF10);
        assert_eq!(Bandwidth::BW500.max_spreading_factor(), SpreadingFactor::SF11);
    }
}
