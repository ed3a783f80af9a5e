use log::{debug, info};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{MeasurementSink, StoreError};
use crate::models::Measurement;

/// Appends measurements to a JSON-lines file.
///
/// The whole batch is serialised before the file is touched and then written
/// with a single append, so a run either adds all of its lines or none.
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MeasurementSink for JsonLinesSink {
    fn commit(&mut self, batch: &[Measurement]) -> Result<(), StoreError> {
        if batch.is_empty() {
            debug!("No measurements to store");
            return Ok(());
        }

        let mut buf = Vec::new();
        for measurement in batch {
            serde_json::to_writer(&mut buf, measurement)?;
            buf.push(b'\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&buf)?;
        file.sync_all()?;

        info!(
            "Stored {} measurements in {}",
            batch.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn measurement(sensor_id: u32, value: f64) -> Measurement {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap();
        Measurement::new(1, sensor_id, value, Some(format!("{:.1}%", value)), ts)
    }

    #[test]
    fn test_commit_appends_batches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("measurements.jsonl");
        let mut sink = JsonLinesSink::new(&path);

        sink.commit(&[measurement(1, 40.0), measurement(2, 41.5)])
            .unwrap();
        sink.commit(&[measurement(3, 42.0)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let stored: Vec<Measurement> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[1].sensor_id, 2);
        assert_eq!(stored[1].value, 41.5);
        assert_eq!(stored[2].label.as_deref(), Some("42.0%"));
    }

    #[test]
    fn test_empty_batch_creates_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("measurements.jsonl");
        let mut sink = JsonLinesSink::new(&path);

        sink.commit(&[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_path_fails_whole_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("measurements.jsonl");
        let mut sink = JsonLinesSink::new(&path);

        assert!(matches!(
            sink.commit(&[measurement(1, 40.0)]),
            Err(StoreError::Io(_))
        ));
        assert!(!sink.path().exists());
    }
}
