//! # Greenhouse Serial Protocol
//!
//! The microcontroller accepts number-based commands over a USB serial line
//! (9600 baud). Every command is a run of ASCII digits terminated by `\n`.
//!
//! ## Sensor query
//!
//! | Position | Content                                         |
//! |----------|-------------------------------------------------|
//! | 0        | mode digit (`get`)                              |
//! | 1        | family digit (`temperature`, `humidity`, `soil`) |
//! | 2        | subtype digit, only for families that need one  |
//! | 3..      | pin address in decimal, variable width          |
//! | last     | `\n`                                            |
//!
//! With the default code table:
//!
//! - `0012\n`  = get, temperature, dht22, pin 2
//! - `02014\n` = get, soil-moisture, analog, pin 14
//!
//! ## RF transmit
//!
//! `<tx digit><pin, 2 digits zero padded><code>\n`, where
//! `code = base + (channel << 1) + state`.
//!
//! ## Responses
//!
//! One or more lines per command:
//!
//! - `ok...` (any case) ends the exchange successfully
//! - `fail...` (any case) ends the exchange with a failure
//! - `<code>,<address>,<value>` carries a reading, e.g. `sm,14,22`
//!
//! Anything else is garbage and is skipped.

pub mod command;
pub mod response;

pub use command::{
    build_sensor_command, encode, encode_transmit, CodeTable, CodeTableError, Command, CommandCode,
    EncodeError, Mode,
};
pub use response::{format_label, to_fahrenheit, Quantity, Reading, Response};
