use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutletState {
    Off,
    On,
}

impl OutletState {
    /// Wire value: 0 for off, 1 for on.
    pub fn bit(self) -> u8 {
        match self {
            OutletState::Off => 0,
            OutletState::On => 1,
        }
    }
}

impl fmt::Display for OutletState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutletState::Off => f.write_str("off"),
            OutletState::On => f.write_str("on"),
        }
    }
}

impl FromStr for OutletState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "on" | "1" => Ok(OutletState::On),
            "off" | "0" => Ok(OutletState::Off),
            other => Err(format!("invalid outlet state '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Outlet {
    pub id: u32,
    pub name: String,
    /// RF channel the outlet listens on.
    pub channel: u32,
    /// Last confirmed state; `None` until an actuation has succeeded.
    #[serde(default)]
    pub state: Option<OutletState>,
}

#[derive(Debug, Error)]
#[error("outlet {outlet_id} could not be switched {state}: {source}")]
pub struct ActuationError {
    pub outlet_id: u32,
    pub state: OutletState,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Physically switches outlets. Returning `Ok` means the device confirmed the change.
pub trait Actuator {
    fn switch(&mut self, outlet: &Outlet, state: OutletState) -> Result<(), ActuationError>;

    fn on(&mut self, outlet: &Outlet) -> Result<(), ActuationError> {
        self.switch(outlet, OutletState::On)
    }

    fn off(&mut self, outlet: &Outlet) -> Result<(), ActuationError> {
        self.switch(outlet, OutletState::Off)
    }
}
