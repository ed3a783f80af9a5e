pub mod rf;
pub mod serial;

#[cfg(test)]
pub(crate) mod mock;

pub use rf::{RfActuator, RfError, RfSettings, RfTransmitter};
pub use serial::{Connector, SerialConnector, SerialTransport, Transport, TransportError};
