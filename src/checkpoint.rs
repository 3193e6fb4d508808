//! Resume points for repeated searches.
//!
//! A checkpoint records where the previous run of a named search stopped:
//! the latest sort timestamp it emitted and the IDs of every record carrying
//! exactly that timestamp. The next run searches from that timestamp
//! (inclusive) and drops the recorded IDs, so records that tie on the
//! boundary are neither skipped nor emitted twice.
//!
//! Checkpoints are stored as one JSON file per search kind
//! (`<config dir>/incydr/checkpoints/file-events.json`, ...), mapping
//! checkpoint name to [`Checkpoint`]. Writes go to a temporary file that is
//! renamed over the original.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::dates::DateInput;
use crate::error::{IncydrError, Result};

/// Saved position of one named search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Sort timestamp of the last record emitted.
    pub timestamp: DateTime<Utc>,
    /// IDs of the records emitted at exactly `timestamp`.
    #[serde(default)]
    pub seen_ids: BTreeSet<String>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// The start bound to search from when resuming.
    pub fn start(&self) -> DateInput {
        DateInput::Absolute(self.timestamp)
    }
}

/// A record that can be tracked by a checkpoint.
pub trait Checkpointed {
    fn checkpoint_id(&self) -> Option<String>;

    fn checkpoint_timestamp(&self) -> Option<DateTime<Utc>>;
}

/// JSON-file-backed map of checkpoint name to [`Checkpoint`].
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    entries: BTreeMap<String, Checkpoint>,
}

impl CheckpointStore {
    /// Opens (or starts) the store at `path`. A missing file is an empty
    /// store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| IncydrError::Checkpoint {
                path: path.clone(),
                message: format!("corrupt checkpoint file: {e}"),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(IncydrError::Checkpoint {
                    path,
                    message: e.to_string(),
                })
            }
        };
        Ok(CheckpointStore { path, entries })
    }

    /// Opens the store for `kind` under the user config directory.
    pub fn open_default(kind: &str) -> Result<Self> {
        let base = dirs::config_dir().ok_or_else(|| {
            IncydrError::Config("no user configuration directory available".to_string())
        })?;
        Self::open(default_path(&base, kind))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&Checkpoint> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Replaces the checkpoint for `name` and writes the store.
    pub fn set(&mut self, name: &str, checkpoint: Checkpoint) -> Result<()> {
        self.entries.insert(name.to_string(), checkpoint);
        self.save()
    }

    /// Removes `name`, returning whether it existed, and writes the store.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        let existed = self.entries.remove(name).is_some();
        if existed {
            self.save()?;
        }
        Ok(existed)
    }

    fn save(&self) -> Result<()> {
        let store_err = |e: std::io::Error| IncydrError::Checkpoint {
            path: self.path.clone(),
            message: e.to_string(),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(store_err)?;
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text).map_err(store_err)?;
        std::fs::rename(&tmp, &self.path).map_err(store_err)?;
        tracing::debug!(path = %self.path.display(), "checkpoint store saved");
        Ok(())
    }
}

fn default_path(config_dir: &Path, kind: &str) -> PathBuf {
    config_dir
        .join("incydr")
        .join("checkpoints")
        .join(format!("{kind}.json"))
}

/// Filters a run's records against the previous checkpoint and computes the
/// next one.
///
/// Records must be admitted in ascending timestamp order.
#[derive(Debug, Default)]
pub struct CheckpointTracker {
    previous: Option<Checkpoint>,
    boundary: Option<DateTime<Utc>>,
    boundary_ids: BTreeSet<String>,
}

impl CheckpointTracker {
    pub fn new(previous: Option<Checkpoint>) -> Self {
        CheckpointTracker {
            previous,
            boundary: None,
            boundary_ids: BTreeSet::new(),
        }
    }

    /// Returns `false` for a record already emitted by the previous run;
    /// otherwise records it and returns `true`.
    pub fn admit<R: Checkpointed>(&mut self, record: &R) -> bool {
        let id = record.checkpoint_id();
        let timestamp = record.checkpoint_timestamp();

        if let (Some(prev), Some(id), Some(ts)) = (&self.previous, &id, timestamp) {
            if ts <= prev.timestamp && prev.seen_ids.contains(id) {
                return false;
            }
        }

        if let Some(ts) = timestamp {
            match self.boundary {
                Some(current) if ts < current => {}
                Some(current) if ts == current => {
                    self.boundary_ids.extend(id);
                }
                _ => {
                    self.boundary = Some(ts);
                    self.boundary_ids = id.into_iter().collect();
                }
            }
        }
        true
    }

    /// The checkpoint to store after the run. When the run emitted nothing
    /// new the previous checkpoint is carried forward.
    pub fn finish(self) -> Option<Checkpoint> {
        match self.boundary {
            Some(timestamp) => {
                // A run that resumed at the same boundary keeps the old IDs.
                let mut seen_ids = self.boundary_ids;
                if let Some(prev) = &self.previous {
                    if prev.timestamp == timestamp {
                        seen_ids.extend(prev.seen_ids.iter().cloned());
                    }
                }
                Some(Checkpoint {
                    timestamp,
                    seen_ids,
                    updated_at: Utc::now(),
                })
            }
            None => self.previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Rec(&'static str, i64);

    impl Checkpointed for Rec {
        fn checkpoint_id(&self) -> Option<String> {
            Some(self.0.to_string())
        }

        fn checkpoint_timestamp(&self) -> Option<DateTime<Utc>> {
            Utc.timestamp_opt(self.1, 0).single()
        }
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn tracker_records_ids_at_max_timestamp() {
        let mut tracker = CheckpointTracker::new(None);
        for rec in [Rec("a", 10), Rec("b", 20), Rec("c", 20)] {
            assert!(tracker.admit(&rec));
        }
        let cp = tracker.finish().unwrap();
        assert_eq!(cp.timestamp, ts(20));
        assert_eq!(
            cp.seen_ids,
            ["b", "c"].into_iter().map(String::from).collect()
        );
    }

    #[test]
    fn tracker_drops_boundary_duplicates_only() {
        let previous = Checkpoint {
            timestamp: ts(20),
            seen_ids: ["b".to_string()].into_iter().collect(),
            updated_at: ts(0),
        };
        let mut tracker = CheckpointTracker::new(Some(previous));
        assert!(!tracker.admit(&Rec("b", 20)), "already emitted");
        assert!(tracker.admit(&Rec("c", 20)), "tie at boundary but new");
        assert!(tracker.admit(&Rec("d", 30)));
        let cp = tracker.finish().unwrap();
        assert_eq!(cp.timestamp, ts(30));
        assert_eq!(cp.seen_ids.len(), 1);
    }

    #[test]
    fn boundary_ids_accumulate_when_no_newer_records() {
        let previous = Checkpoint {
            timestamp: ts(20),
            seen_ids: ["b".to_string()].into_iter().collect(),
            updated_at: ts(0),
        };
        let mut tracker = CheckpointTracker::new(Some(previous));
        assert!(tracker.admit(&Rec("c", 20)));
        let cp = tracker.finish().unwrap();
        assert_eq!(cp.timestamp, ts(20));
        assert!(cp.seen_ids.contains("b") && cp.seen_ids.contains("c"));
    }

    #[test]
    fn empty_run_keeps_previous_checkpoint() {
        let previous = Checkpoint {
            timestamp: ts(5),
            seen_ids: BTreeSet::new(),
            updated_at: ts(0),
        };
        let tracker = CheckpointTracker::new(Some(previous.clone()));
        assert_eq!(tracker.finish(), Some(previous));
        assert_eq!(CheckpointTracker::new(None).finish(), None);
    }

    #[test]
    fn store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = default_path(dir.path(), "file-events");
        let mut store = CheckpointStore::open(&path).unwrap();
        assert!(store.get("daily").is_none());

        let cp = Checkpoint {
            timestamp: ts(100),
            seen_ids: ["evt-1".to_string()].into_iter().collect(),
            updated_at: ts(101),
        };
        store.set("daily", cp.clone()).unwrap();

        let reopened = CheckpointStore::open(&path).unwrap();
        assert_eq!(reopened.get("daily"), Some(&cp));
        assert_eq!(reopened.names().collect::<Vec<_>>(), vec!["daily"]);
        assert!(path.ends_with("incydr/checkpoints/file-events.json"));
    }

    #[test]
    fn remove_deletes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");
        let mut store = CheckpointStore::open(&path).unwrap();
        store
            .set(
                "x",
                Checkpoint {
                    timestamp: ts(1),
                    seen_ids: BTreeSet::new(),
                    updated_at: ts(1),
                },
            )
            .unwrap();
        assert!(store.remove("x").unwrap());
        assert!(!store.remove("x").unwrap());
        assert!(CheckpointStore::open(&path).unwrap().get("x").is_none());
    }

    #[test]
    fn corrupt_store_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = CheckpointStore::open(&path).unwrap_err();
        assert!(matches!(err, IncydrError::Checkpoint { .. }));
    }
}
