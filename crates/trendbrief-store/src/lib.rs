//! Flat-file snapshot persistence.
//!
//! One JSON document per run, named `snapshot_YYYY-MM-DD.json` inside the
//! data directory. History is append-only: a snapshot is written once at the
//! end of a run and read exactly once as "prior" by the following run.
//! Nothing here ever mutates or deletes an existing snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use trendbrief_core::Snapshot;

const SNAPSHOT_PREFIX: &str = "snapshot_";
const SNAPSHOT_SUFFIX: &str = ".json";

/// Errors from the snapshot store. All variants are fatal for the run —
/// with the deliberate exception that a *malformed* prior snapshot is not an
/// error at all (see [`SnapshotStore::load_prior`]).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A snapshot for this run date already exists and `overwrite` was not
    /// set. Guards against accidental duplicate runs clobbering history.
    #[error("snapshot for {date} already exists (pass overwrite to replace)")]
    DuplicateSnapshot { date: NaiveDate },

    #[error("snapshot store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Handle to a snapshot directory.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open (creating if necessary) the snapshot directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Persist the snapshot for its run date.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateSnapshot`] if a snapshot for the same
    /// date exists and `overwrite` is false; [`StoreError::Io`] /
    /// [`StoreError::Serialize`] if the write fails.
    pub fn save(&self, snapshot: &Snapshot, overwrite: bool) -> Result<PathBuf, StoreError> {
        let path = self.path_for(snapshot.run_date);
        if path.exists() && !overwrite {
            return Err(StoreError::DuplicateSnapshot {
                date: snapshot.run_date,
            });
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json)?;
        tracing::info!(
            date = %snapshot.run_date,
            path = %path.display(),
            overwrite,
            "snapshot saved"
        );
        Ok(path)
    }

    /// Load the most recent snapshot dated strictly before `before`.
    ///
    /// Returns `Ok(None)` when the store is empty or holds no earlier
    /// snapshot. A snapshot file that exists but fails to parse is logged and
    /// also reported as `Ok(None)`: losing one week of delta comparison is
    /// recoverable, crashing the run is not.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] only if the directory itself cannot be
    /// listed or the candidate file cannot be read.
    pub fn load_prior(&self, before: NaiveDate) -> Result<Option<Snapshot>, StoreError> {
        let Some(date) = self.list()?.into_iter().find(|d| *d < before) else {
            return Ok(None);
        };

        let path = self.path_for(date);
        let content = fs::read_to_string(&path)?;
        match serde_json::from_str::<Snapshot>(&content) {
            Ok(snapshot) => {
                tracing::info!(date = %date, "loaded prior snapshot");
                Ok(Some(snapshot))
            }
            Err(e) => {
                tracing::warn!(
                    date = %date,
                    path = %path.display(),
                    error = %e,
                    "prior snapshot is malformed — treating this as a baseline run"
                );
                Ok(None)
            }
        }
    }

    /// All stored snapshot dates, newest first.
    ///
    /// Files that do not match the `snapshot_YYYY-MM-DD.json` pattern are
    /// ignored (the data directory also holds logs and rendered briefs).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be listed.
    pub fn list(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let mut dates: Vec<NaiveDate> = fs::read_dir(&self.dir)?
            .filter_map(Result::ok)
            .filter_map(|entry| parse_snapshot_date(&entry.file_name().to_string_lossy()))
            .collect();
        dates.sort_unstable();
        dates.reverse();
        Ok(dates)
    }

    /// Number of stored snapshots; the next brief number is this plus one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be listed.
    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list()?.len())
    }

    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{SNAPSHOT_PREFIX}{date}{SNAPSHOT_SUFFIX}"))
    }
}

fn parse_snapshot_date(file_name: &str) -> Option<NaiveDate> {
    let rest = file_name.strip_prefix(SNAPSHOT_PREFIX)?;
    let stem = rest.strip_suffix(SNAPSHOT_SUFFIX)?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

/// Write an auxiliary artifact (e.g. the rendered HTML brief) into the data
/// directory next to the snapshots.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the write fails.
pub fn save_artifact(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    fs::write(&path, content)?;
    tracing::info!(path = %path.display(), "artifact saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot(run_date: NaiveDate) -> Snapshot {
        Snapshot {
            run_date,
            keyword_series: BTreeMap::new(),
            forum_posts: Vec::new(),
            topic_fingerprint: BTreeSet::from(["sciatica".to_string()]),
            pageview_series: BTreeMap::from([("Sciatica".to_string(), 812.5)]),
            questions: BTreeSet::new(),
            selected_theme: Some("sciatica".to_string()),
        }
    }

    #[test]
    fn save_then_load_prior_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();

        let saved = snapshot(date(2026, 7, 27));
        store.save(&saved, false).unwrap();

        let loaded = store.load_prior(date(2026, 8, 3)).unwrap().unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn empty_store_has_no_prior() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        assert!(store.load_prior(date(2026, 8, 3)).unwrap().is_none());
    }

    #[test]
    fn load_prior_is_strictly_before() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        store.save(&snapshot(date(2026, 8, 3)), false).unwrap();

        // Same-date snapshot must not be returned as its own prior.
        assert!(store.load_prior(date(2026, 8, 3)).unwrap().is_none());
        assert!(store.load_prior(date(2026, 8, 4)).unwrap().is_some());
    }

    #[test]
    fn load_prior_picks_most_recent_earlier_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        store.save(&snapshot(date(2026, 7, 13)), false).unwrap();
        store.save(&snapshot(date(2026, 7, 27)), false).unwrap();
        store.save(&snapshot(date(2026, 7, 20)), false).unwrap();

        let prior = store.load_prior(date(2026, 8, 3)).unwrap().unwrap();
        assert_eq!(prior.run_date, date(2026, 7, 27));
    }

    #[test]
    fn duplicate_date_fails_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        let snap = snapshot(date(2026, 8, 3));
        store.save(&snap, false).unwrap();

        let result = store.save(&snap, false);
        assert!(matches!(
            result,
            Err(StoreError::DuplicateSnapshot { date: d }) if d == date(2026, 8, 3)
        ));
    }

    #[test]
    fn overwrite_replaces_existing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();

        let mut snap = snapshot(date(2026, 8, 3));
        store.save(&snap, false).unwrap();

        snap.selected_theme = Some("posture".to_string());
        store.save(&snap, true).unwrap();

        let loaded = store.load_prior(date(2026, 8, 4)).unwrap().unwrap();
        assert_eq!(loaded.selected_theme.as_deref(), Some("posture"));
    }

    #[test]
    fn malformed_snapshot_degrades_to_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        fs::write(
            dir.path().join("snapshot_2026-07-27.json"),
            "{ not valid json",
        )
        .unwrap();

        assert!(store.load_prior(date(2026, 8, 3)).unwrap().is_none());
    }

    #[test]
    fn list_ignores_unrelated_files_and_orders_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        store.save(&snapshot(date(2026, 7, 20)), false).unwrap();
        store.save(&snapshot(date(2026, 7, 27)), false).unwrap();
        fs::write(dir.path().join("latest_brief.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("run_2026-07-27.log"), "log").unwrap();

        let dates = store.list().unwrap();
        assert_eq!(dates, vec![date(2026, 7, 27), date(2026, 7, 20)]);
        assert_eq!(store.count().unwrap(), 2);
    }
}
