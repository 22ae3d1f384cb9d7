//! Local quote snapshot storage.
//!
//! A tiny key-value store: one JSON blob per well-known key under the data
//! directory. Saves are atomic (write to a temp file, fsync, rename) so an
//! interrupted write never corrupts the saved quote. A corrupt or
//! unparsable blob is logged and treated as absent; the app continues with
//! whatever in-memory defaults it already has. No schema version field, no
//! migration path.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Storage key for the single in-progress quote.
pub const CURRENT_QUOTE_KEY: &str = "current-quote";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage {op} failed for {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn io_error(op: &'static str, path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        op,
        path: path.to_path_buf(),
        source,
    }
}

/// File-backed key-value store for quote snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open (and create if needed) the store at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_error("create dir", &dir, e))?;
        Ok(SnapshotStore { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Save a value under `key` with atomic write semantics: serialize,
    /// write to `<key>.json.tmp`, fsync, rename.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value)?;

        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{key}.json.tmp"));

        let mut tmp_file =
            File::create(&tmp_path).map_err(|e| io_error("create temp file", &tmp_path, e))?;
        tmp_file
            .write_all(json.as_bytes())
            .map_err(|e| io_error("write temp file", &tmp_path, e))?;
        tmp_file
            .sync_all()
            .map_err(|e| io_error("sync temp file", &tmp_path, e))?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            // Clean up the temp file if the rename fails
            let _ = fs::remove_file(&tmp_path);
            io_error("rename to final", &path, e)
        })?;

        Ok(())
    }

    /// Load the value under `key`. Absent keys and corrupt blobs both read
    /// as `None`; corruption is logged, never propagated.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(|e| io_error("read", &path, e))?;

        match serde_json::from_str(&contents) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "discarding unparsable snapshot"
                );
                Ok(None)
            }
        }
    }

    /// Remove the value under `key`. Removing an absent key is a no-op.
    pub fn clear(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::QuoteInputs;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::env::temp_dir;

    fn test_store(name: &str) -> SnapshotStore {
        let dir = temp_dir().join(format!("ironquote_store_{}_{}", std::process::id(), name));
        let _ = fs::remove_dir_all(&dir);
        SnapshotStore::open(dir).unwrap()
    }

    fn sample_snapshot() -> crate::quote::QuoteSnapshot {
        let mut inputs = QuoteInputs::starter();
        inputs.customer_info.first_name = "John".into();
        inputs.customer_info.last_name = "Smith".into();
        inputs.customer_info.business_name = "Smith Medical Center".into();
        inputs.building_type = "Medical".into();
        inputs.standard_areas[0].manual_entry = true;
        inputs.standard_areas[0].total_sq_ft = dec!(500);
        inputs.standard_areas[0].run_rate = dec!(1000);
        inputs.sutm_bathrooms[0].fixture_count = 4;

        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        inputs.into_snapshot(now)
    }

    #[test]
    fn save_then_load_round_trips_exactly() {
        let store = test_store("round_trip");
        let snapshot = sample_snapshot();

        store.save(CURRENT_QUOTE_KEY, &snapshot).unwrap();
        let loaded: crate::quote::QuoteSnapshot =
            store.load(CURRENT_QUOTE_KEY).unwrap().unwrap();

        assert_eq!(loaded, snapshot);
        assert_eq!(
            loaded.calculations.final_total_with_surcharge,
            snapshot.calculations.final_total_with_surcharge
        );
    }

    #[test]
    fn missing_key_loads_as_none() {
        let store = test_store("missing");
        let loaded: Option<crate::quote::QuoteSnapshot> = store.load("nothing-here").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn corrupt_blob_loads_as_none() {
        let store = test_store("corrupt");
        fs::write(store.path_for(CURRENT_QUOTE_KEY), "{not json").unwrap();

        let loaded: Option<crate::quote::QuoteSnapshot> =
            store.load(CURRENT_QUOTE_KEY).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let store = test_store("clear");
        store.save(CURRENT_QUOTE_KEY, &sample_snapshot()).unwrap();

        store.clear(CURRENT_QUOTE_KEY).unwrap();
        store.clear(CURRENT_QUOTE_KEY).unwrap();

        let loaded: Option<crate::quote::QuoteSnapshot> =
            store.load(CURRENT_QUOTE_KEY).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_overwrites_previous_value() {
        let store = test_store("overwrite");
        let first = sample_snapshot();
        store.save(CURRENT_QUOTE_KEY, &first).unwrap();

        let mut second = first.clone();
        second.building_type = "Office".into();
        store.save(CURRENT_QUOTE_KEY, &second).unwrap();

        let loaded: crate::quote::QuoteSnapshot =
            store.load(CURRENT_QUOTE_KEY).unwrap().unwrap();
        assert_eq!(loaded.building_type, "Office");
    }
}
