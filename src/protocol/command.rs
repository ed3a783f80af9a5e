use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::models::{Family, Sensor, Subtype};

/// Every symbol that has a digit on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    Get,
    Set,
    Tx,
    Temperature,
    Humidity,
    Soil,
    Dht11,
    Dht22,
    Analog,
    Digital,
}

impl CommandCode {
    pub const ALL: [CommandCode; 10] = [
        CommandCode::Get,
        CommandCode::Set,
        CommandCode::Tx,
        CommandCode::Temperature,
        CommandCode::Humidity,
        CommandCode::Soil,
        CommandCode::Dht11,
        CommandCode::Dht22,
        CommandCode::Analog,
        CommandCode::Digital,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandCode::Get => "get",
            CommandCode::Set => "set",
            CommandCode::Tx => "tx",
            CommandCode::Temperature => "temperature",
            CommandCode::Humidity => "humidity",
            CommandCode::Soil => "soil",
            CommandCode::Dht11 => "dht11",
            CommandCode::Dht22 => "dht22",
            CommandCode::Analog => "analog",
            CommandCode::Digital => "digital",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    fn default_digit(self) -> u8 {
        match self {
            CommandCode::Get => 0,
            CommandCode::Set => 1,
            CommandCode::Tx => 2,
            CommandCode::Temperature => 0,
            CommandCode::Humidity => 1,
            CommandCode::Soil => 2,
            CommandCode::Dht11 => 0,
            CommandCode::Dht22 => 1,
            CommandCode::Analog => 0,
            CommandCode::Digital => 1,
        }
    }

    // Declaration order matches `ALL`
    fn index(self) -> usize {
        self as usize
    }
}

impl From<Family> for CommandCode {
    fn from(family: Family) -> Self {
        match family {
            Family::Temperature => CommandCode::Temperature,
            Family::Humidity => CommandCode::Humidity,
            Family::Soil => CommandCode::Soil,
        }
    }
}

impl From<Subtype> for CommandCode {
    fn from(subtype: Subtype) -> Self {
        match subtype {
            Subtype::Dht11 => CommandCode::Dht11,
            Subtype::Dht22 => CommandCode::Dht22,
            Subtype::Analog => CommandCode::Analog,
            Subtype::Digital => CommandCode::Digital,
        }
    }
}

/// Request mode of a sensor command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Get,
    Set,
}

impl From<Mode> for CommandCode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Get => CommandCode::Get,
            Mode::Set => CommandCode::Set,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodeTableError {
    #[error("command code '{0}' has no digit mapping")]
    Missing(&'static str),

    #[error("command code '{name}' maps to {value}, expected a single digit")]
    NotADigit { name: String, value: i64 },

    #[error("unknown command code '{0}'")]
    Unknown(String),
}

/// Digit assigned to each [`CommandCode`]. Always complete once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "IndexMap<String, i64>")]
pub struct CodeTable {
    digits: [u8; CommandCode::ALL.len()],
}

impl Default for CodeTable {
    fn default() -> Self {
        let mut digits = [0u8; CommandCode::ALL.len()];
        for code in CommandCode::ALL {
            digits[code.index()] = code.default_digit();
        }
        Self { digits }
    }
}

impl TryFrom<IndexMap<String, i64>> for CodeTable {
    type Error = CodeTableError;

    fn try_from(map: IndexMap<String, i64>) -> Result<Self, Self::Error> {
        let mut digits: [Option<u8>; CommandCode::ALL.len()] = [None; CommandCode::ALL.len()];

        for (name, value) in &map {
            let key = name.trim().to_lowercase();
            let code =
                CommandCode::from_name(&key).ok_or_else(|| CodeTableError::Unknown(name.clone()))?;
            let digit = u8::try_from(*value)
                .ok()
                .filter(|d| *d <= 9)
                .ok_or_else(|| CodeTableError::NotADigit {
                    name: key.clone(),
                    value: *value,
                })?;
            digits[code.index()] = Some(digit);
        }

        let mut table = [0u8; CommandCode::ALL.len()];
        for code in CommandCode::ALL {
            table[code.index()] = digits[code.index()].ok_or(CodeTableError::Missing(code.name()))?;
        }

        Ok(Self { digits: table })
    }
}

impl CodeTable {
    pub fn digit(&self, code: impl Into<CommandCode>) -> u8 {
        self.digits[code.into().index()]
    }

    /// Name → digit view, in declaration order.
    pub fn to_map(&self) -> IndexMap<String, i64> {
        CommandCode::ALL
            .iter()
            .map(|c| (c.name().to_string(), i64::from(self.digit(*c))))
            .collect()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("no {family} subtype tag found (expected one of: {expected})")]
    MissingSubtype { family: Family, expected: String },

    #[error("several {family} subtype tags found: {found}")]
    AmbiguousSubtype { family: Family, found: String },

    #[error("incomplete command '{0}'")]
    Unterminated(String),
}

/// A single newline-terminated request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command(String);

impl Command {
    pub const TERMINATOR: char = '\n';

    pub fn new(text: String) -> Result<Self, EncodeError> {
        if text.ends_with(Self::TERMINATOR) {
            Ok(Self(text))
        } else {
            Err(EncodeError::Unterminated(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.trim_end_matches(Self::TERMINATOR))
    }
}

pub fn encode(
    table: &CodeTable,
    mode: Mode,
    family: Family,
    subtype: Option<Subtype>,
    address: u32,
) -> Result<Command, EncodeError> {
    let mut text = format!("{}{}", table.digit(mode), table.digit(family));
    if let Some(subtype) = subtype {
        text.push_str(&table.digit(subtype).to_string());
    }
    text.push_str(&address.to_string());
    text.push(Command::TERMINATOR);

    Command::new(text)
}

pub fn encode_transmit(table: &CodeTable, pin: u32, code: u64) -> Result<Command, EncodeError> {
    Command::new(format!(
        "{}{:02}{}{}",
        table.digit(CommandCode::Tx),
        pin,
        code,
        Command::TERMINATOR
    ))
}

fn requires_subtype(family: Family, humidity_subtype: bool) -> bool {
    match family {
        Family::Temperature | Family::Soil => true,
        Family::Humidity => humidity_subtype,
    }
}

/// Builds the `get` query for one sensor/family pair, picking the subtype from the sensor's tags.
pub fn build_sensor_command(
    table: &CodeTable,
    sensor: &Sensor,
    family: Family,
    humidity_subtype: bool,
) -> Result<Command, EncodeError> {
    debug!("building sensor command for '{}' type '{}'", sensor.name, family);

    let subtype = if requires_subtype(family, humidity_subtype) {
        let found = sensor.subtypes_for(family);
        match found.as_slice() {
            [one] => Some(*one),
            [] => {
                return Err(EncodeError::MissingSubtype {
                    family,
                    expected: join_tags(family.subtypes()),
                })
            }
            _ => {
                return Err(EncodeError::AmbiguousSubtype {
                    family,
                    found: join_tags(&found),
                })
            }
        }
    } else {
        None
    };

    encode(table, Mode::Get, family, subtype, sensor.address)
}

fn join_tags(subtypes: &[Subtype]) -> String {
    subtypes
        .iter()
        .map(|s| s.tag())
        .collect::<Vec<_>>()
        .join(", ")
}
