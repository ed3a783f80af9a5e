use indexmap::IndexMap;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{OutletStore, StoreError};
use crate::models::{Outlet, OutletState};

/// Outlets from the configuration, overlaid with confirmed states kept in a JSON file.
pub struct FileOutletStore {
    path: PathBuf,
    outlets: IndexMap<u32, Outlet>,
}

impl FileOutletStore {
    pub fn open<P: AsRef<Path>>(path: P, outlets: &[Outlet]) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut outlets: IndexMap<u32, Outlet> =
            outlets.iter().map(|o| (o.id, o.clone())).collect();

        let states: IndexMap<u32, OutletState> = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No outlet state file at {}", path.display());
                IndexMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        for (id, state) in states {
            match outlets.get_mut(&id) {
                Some(outlet) => outlet.state = Some(state),
                None => warn!("state file lists unknown outlet id {}", id),
            }
        }

        Ok(Self { path, outlets })
    }

    fn states(&self) -> IndexMap<u32, OutletState> {
        self.outlets
            .values()
            .filter_map(|o| o.state.map(|s| (o.id, s)))
            .collect()
    }

    // Write to a sibling file and rename over the old one
    fn persist(&self) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.states())?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl OutletStore for FileOutletStore {
    fn outlet(&self, id: u32) -> Option<Outlet> {
        self.outlets.get(&id).cloned()
    }

    fn set_state(&mut self, id: u32, state: OutletState) -> Result<(), StoreError> {
        let outlet = self
            .outlets
            .get_mut(&id)
            .ok_or(StoreError::UnknownOutlet(id))?;
        let previous = outlet.state.replace(state);

        if let Err(e) = self.persist() {
            if let Some(outlet) = self.outlets.get_mut(&id) {
                outlet.state = previous;
            }
            return Err(e);
        }

        debug!("outlet {} state stored as {}", id, state);
        Ok(())
    }
}
