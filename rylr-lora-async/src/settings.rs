//! Reading back the settings stored in the module.

use embedded_hal_async::delay::DelayNs;
use embedded_io::ReadReady;
use embedded_io_async::{Read, Write};
use heapless::String;
use rylr_at_async::op::{Command, Query, RadioParameters, Reply};
use rylr_at_async::{AtError, AtModem, Field, FrameError};

/// Longest unique id the module reports.
pub const MAX_UID_LEN: usize = 32;

/// The settings reported by the module's queries.
///
/// Every field keeps its previous value until a query for it succeeds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    /// Unique id of the module, from `AT+UID?`.
    pub uid: String<MAX_UID_LEN>,
    /// RF output power in dBm, from `AT+CRFOP?`.
    pub output_power_dbm: u8,
    /// Network id, from `AT+NETWORKID?`.
    pub network_id: u8,
    /// Address of the module, from `AT+ADDRESS?`.
    pub address: u16,
    /// Radio parameters, from `AT+PARAMETER?`. `None` until read.
    pub parameters: Option<RadioParameters>,
}

impl Settings {
    /// Queries the uid, output power, network id, address and radio
    /// parameters, in that order.
    ///
    /// Stops at the first query that fails; that field and the ones after it
    /// are left untouched.
    pub async fn read_from<UART, DELAY>(
        &mut self,
        modem: &AtModem<UART, DELAY>,
    ) -> Result<(), AtError<UART::Error>>
    where
        UART: Read + Write + ReadReady,
        DELAY: DelayNs,
    {
        let reply = query(modem, Query::Uid).await?;
        let uid = reply.value(Query::Uid.reply_prefix())?;
        self.uid = String::try_from(uid).map_err(|_| FrameError::InvalidField(Field::Uid))?;

        let reply = query(modem, Query::OutputPower).await?;
        self.output_power_dbm =
            reply.parse_value(Query::OutputPower.reply_prefix(), Field::OutputPower)?;

        let reply = query(modem, Query::NetworkId).await?;
        self.network_id = reply.parse_value(Query::NetworkId.reply_prefix(), Field::NetworkId)?;

        let reply = query(modem, Query::Address).await?;
        self.address = reply.parse_value(Query::Address.reply_prefix(), Field::Address)?;

        let reply = query(modem, Query::Parameters).await?;
        let parameters = RadioParameters::parse(reply.value(Query::Parameters.reply_prefix())?)?;
        self.parameters = Some(parameters);

        log::debug!("lora::read_settings {self:?}");
        Ok(())
    }
}

async fn query<UART, DELAY>(
    modem: &AtModem<UART, DELAY>,
    query: Query,
) -> Result<Reply, AtError<UART::Error>>
where
    UART: Read + Write + ReadReady,
    DELAY: DelayNs,
{
    modem.send(&Command::Query(query)).await.inspect_err(|err| {
        log::warn!("lora::read_settings AT+{}? failed: {err:?}", query.name());
    })
}
