//! JSON file persistence for settings and history.
//!
//! | Adapter            | Implements   | File           |
//! |--------------------|--------------|----------------|
//! | `JsonConfigFile`   | ConfigPort   | `config.json`  |
//! | `JsonHistoryFile`  | HistoryPort  | `history.json` |
//!
//! Writes go to a uniquely named sibling temp file which is then renamed
//! over the target, so a crash mid-write leaves the previous file intact
//! and concurrent writers never share a temp file.  Each store also
//! serialises its own writes.
//!
//! The history loader also reads the older `[timestamp, state]` pair
//! layout, where the timestamp is ISO-8601 local time without an offset.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::ports::{ConfigPort, HistoryPort};
use crate::error::PersistenceError;
use crate::history::HistorySample;

/// Settings and counters as a JSON document.
#[derive(Debug)]
pub struct JsonConfigFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<Option<Value>, PersistenceError> {
        let Some(raw) = read_if_exists(&self.path)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| PersistenceError::Corrupted(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, document: &Value) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock();
        write_atomic(&self.path, document)
    }
}

/// Signal history as a JSON array of samples.
#[derive(Debug)]
pub struct JsonHistoryFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonHistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

/// One stored entry: the current record layout or the older pair.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSample {
    Record(HistorySample),
    Pair(String, bool),
}

impl StoredSample {
    fn into_sample(self) -> Option<HistorySample> {
        match self {
            Self::Record(sample) => Some(sample),
            Self::Pair(timestamp, state) => {
                parse_stored_timestamp(&timestamp).map(|ts| HistorySample::new(ts, state))
            }
        }
    }
}

/// RFC 3339 with an offset, or a naive ISO-8601 local time.
fn parse_stored_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

impl HistoryPort for JsonHistoryFile {
    fn load(&self) -> Result<Vec<HistorySample>, PersistenceError> {
        let Some(raw) = read_if_exists(&self.path)? else {
            return Ok(Vec::new());
        };
        let corrupted = |detail: String| PersistenceError::Corrupted(format!("{}: {detail}", self.path.display()));
        let stored: Vec<StoredSample> = serde_json::from_str(&raw).map_err(|e| corrupted(e.to_string()))?;
        stored
            .into_iter()
            .map(|entry| entry.into_sample().ok_or_else(|| corrupted("unreadable timestamp".into())))
            .collect()
    }

    fn save(&self, samples: &[HistorySample]) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock();
        write_atomic(&self.path, samples)
    }
}

fn read_if_exists(path: &Path) -> Result<Option<String>, PersistenceError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// `<path>.<pid>.<seq>.tmp`, unique per write within and across processes.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        TMP_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    PathBuf::from(name)
}

fn write_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let body = serde_json::to_vec_pretty(value).map_err(|e| PersistenceError::Serialize(e.to_string()))?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = temp_path(path);
    let written = fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(&body)?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    debug!("saved {} ({} bytes)", path.display(), body.len());
    Ok(())
}
