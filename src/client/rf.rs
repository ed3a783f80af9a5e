use log::{debug, error, info};
use thiserror::Error;

use super::serial::{Connector, Transport, TransportError};
use crate::config::{Settings, RF_TX_BASE_CODE, RF_TX_PIN};
use crate::models::{ActuationError, Actuator, Outlet, OutletState};
use crate::protocol::{encode_transmit, CodeTable, Command, EncodeError, Response};

#[derive(Debug, Error)]
pub enum RfError {
    #[error("setting '{0}' not found")]
    MissingSetting(&'static str),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("transmitter rejected code {code}: '{reply}'")]
    Rejected { code: u64, reply: String },
}

/// Transmitter pin and base code, as read from the settings at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RfSettings {
    pub pin: Option<u32>,
    pub base_code: Option<u64>,
}

impl From<&Settings> for RfSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            pin: settings
                .integer(RF_TX_PIN)
                .and_then(|v| u32::try_from(v).ok()),
            base_code: settings
                .integer(RF_TX_BASE_CODE)
                .and_then(|v| u64::try_from(v).ok()),
        }
    }
}

/// Outlet code understood by the RF receivers. The bit layout is fixed by the hardware.
pub fn rf_code(base: u64, channel: u32, state: OutletState) -> u64 {
    base + (u64::from(channel) << 1) + u64::from(state.bit())
}

pub struct RfTransmitter<C: Connector> {
    connector: C,
    codes: CodeTable,
    settings: RfSettings,
}

impl<C: Connector> RfTransmitter<C> {
    pub fn new(connector: C, codes: CodeTable, settings: RfSettings) -> Self {
        Self {
            connector,
            codes,
            settings,
        }
    }

    /// Sends one outlet code and waits for the single `ok`/`fail` reply.
    pub fn transmit(&self, channel: u32, state: OutletState) -> Result<(), RfError> {
        let Some(pin) = self.settings.pin else {
            error!("rf tx pin setting not found");
            return Err(RfError::MissingSetting(RF_TX_PIN));
        };
        let Some(base) = self.settings.base_code else {
            error!("rf tx base code setting not found");
            return Err(RfError::MissingSetting(RF_TX_BASE_CODE));
        };

        let code = rf_code(base, channel, state);
        debug!("channel: {} state: {} code: {}", channel, state, code);

        let command = encode_transmit(&self.codes, pin, code)?;
        let mut transport = self.connector.connect()?;
        let result = exchange(transport.as_mut(), &command, code);
        transport.close();

        if result.is_ok() {
            info!("rf channel {} switched {}", channel, state);
        }
        result
    }
}

fn exchange(
    transport: &mut dyn Transport,
    command: &Command,
    code: u64,
) -> Result<(), RfError> {
    debug!("command: {}", command);
    transport.send(command)?;

    let reply = transport.read_line()?;
    match Response::parse(&reply) {
        Response::Ack => Ok(()),
        _ => Err(RfError::Rejected { code, reply }),
    }
}

/// Switches outlets through the RF transmitter, using each outlet's channel.
pub struct RfActuator<C: Connector> {
    transmitter: RfTransmitter<C>,
}

impl<C: Connector> RfActuator<C> {
    pub fn new(transmitter: RfTransmitter<C>) -> Self {
        Self { transmitter }
    }
}

impl<C: Connector> Actuator for RfActuator<C> {
    fn switch(&mut self, outlet: &Outlet, state: OutletState) -> Result<(), ActuationError> {
        self.transmitter
            .transmit(outlet.channel, state)
            .map_err(|e| ActuationError {
                outlet_id: outlet.id,
                state,
                source: Box::new(e),
            })
    }
}
