use std::io;
use thiserror::Error;

use crate::models::{Measurement, Outlet, OutletState};

pub mod measurements;
pub mod outlets;

pub use measurements::JsonLinesSink;
pub use outlets::FileOutletStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("store encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no outlet with id {0}")]
    UnknownOutlet(u32),
}

/// Receives a poll run's measurements. A batch is persisted entirely or not at all.
pub trait MeasurementSink {
    fn commit(&mut self, batch: &[Measurement]) -> Result<(), StoreError>;
}

/// Outlet lookup plus the persisted, confirmed state of each outlet.
pub trait OutletStore {
    fn outlet(&self, id: u32) -> Option<Outlet>;

    fn set_state(&mut self, id: u32, state: OutletState) -> Result<(), StoreError>;
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;

    #[derive(Debug, Default)]
    pub struct MemorySink {
        pub batches: Vec<Vec<Measurement>>,
    }

    impl MeasurementSink for MemorySink {
        fn commit(&mut self, batch: &[Measurement]) -> Result<(), StoreError> {
            self.batches.push(batch.to_vec());
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    pub struct MemoryOutletStore {
        pub outlets: Vec<Outlet>,
        pub commits: usize,
        pub fail_commits: bool,
    }

    impl MemoryOutletStore {
        pub fn new(outlets: Vec<Outlet>) -> Self {
            Self {
                outlets,
                ..Self::default()
            }
        }
    }

    impl OutletStore for MemoryOutletStore {
        fn outlet(&self, id: u32) -> Option<Outlet> {
            self.outlets.iter().find(|o| o.id == id).cloned()
        }

        fn set_state(&mut self, id: u32, state: OutletState) -> Result<(), StoreError> {
            if self.fail_commits {
                return Err(StoreError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    "disk full",
                )));
            }
            let outlet = self
                .outlets
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or(StoreError::UnknownOutlet(id))?;
            outlet.state = Some(state);
            self.commits += 1;
            Ok(())
        }
    }
}
