//! # Report Store
//!
//! Persistence for the `hvac-reports` collection, behind the [`ReportStore`]
//! trait so the engine never reaches for a global.
//!
//! - **Atomic saves**: write to `.tmp`, sync, rename over the target
//! - **File locking**: an fs2 lock plus a `.lock` file naming the holder
//! - **Version validation**: every report's schema version is checked on load
//!
//! ## File Format
//!
//! A JSON array of report records with camelCase keys. A missing file is an
//! empty collection.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hvac_core::report::Report;
//! use hvac_core::store::{JsonFileStore, ReportStore};
//!
//! let mut store = JsonFileStore::new("hvac-reports.json", "tekniker@firma.com");
//! let report = Report::new("RPR-001", "Şehir Hastanesi");
//! let id = report.id.clone();
//! store.upsert(report)?;
//!
//! let loaded = store.get(&id)?;
//! println!("{}", loaded.report_number);
//! # Ok::<(), hvac_core::errors::HvacError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{HvacError, HvacResult};
use crate::report::{Report, SCHEMA_VERSION};

/// Storage key of the report collection
pub const STORAGE_KEY: &str = "hvac-reports";

/// Default file backing the collection
pub const DEFAULT_STORE_FILE: &str = "hvac-reports.json";

/// Where reports live between runs.
pub trait ReportStore {
    fn load_all(&self) -> HvacResult<Vec<Report>>;

    fn save_all(&mut self, reports: &[Report]) -> HvacResult<()>;

    fn get(&self, id: &str) -> HvacResult<Report> {
        self.load_all()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| HvacError::ReportNotFound { id: id.to_string() })
    }

    /// Insert or replace by id. The report is normalized first.
    fn upsert(&mut self, report: Report) -> HvacResult<()> {
        let mut reports = self.load_all()?;
        upsert_into(&mut reports, report);
        self.save_all(&reports)
    }

    fn delete(&mut self, id: &str) -> HvacResult<()> {
        let mut reports = self.load_all()?;
        remove_from(&mut reports, id)?;
        self.save_all(&reports)
    }
}

fn upsert_into(reports: &mut Vec<Report>, mut report: Report) {
    report.prepare_for_save();
    match reports.iter_mut().find(|r| r.id == report.id) {
        Some(existing) => *existing = report,
        None => reports.push(report),
    }
}

fn remove_from(reports: &mut Vec<Report>, id: &str) -> HvacResult<()> {
    let before = reports.len();
    reports.retain(|r| r.id != id);
    if reports.len() == before {
        return Err(HvacError::ReportNotFound { id: id.to_string() });
    }
    Ok(())
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store held in memory, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    reports: Vec<Report>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for MemoryStore {
    fn load_all(&self) -> HvacResult<Vec<Report>> {
        Ok(self.reports.clone())
    }

    fn save_all(&mut self, reports: &[Report]) -> HvacResult<()> {
        self.reports = reports.to_vec();
        Ok(())
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    user_id: String,
}

impl JsonFileStore {
    /// `user_id` is recorded in the lock file while a save is in progress.
    pub fn new(path: impl Into<PathBuf>, user_id: impl Into<String>) -> Self {
        JsonFileStore {
            path: path.into(),
            user_id: user_id.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read, change and write the collection under a single lock.
    pub fn update<F>(&self, change: F) -> HvacResult<()>
    where
        F: FnOnce(&mut Vec<Report>) -> HvacResult<()>,
    {
        let _lock = FileLock::acquire(&self.path, self.user_id.clone())?;
        let mut reports = load_reports(&self.path)?;
        change(&mut reports)?;
        save_reports(&reports, &self.path)?;
        info!(path = %self.path.display(), reports = reports.len(), "reports saved");
        Ok(())
    }
}

impl ReportStore for JsonFileStore {
    fn load_all(&self) -> HvacResult<Vec<Report>> {
        let reports = load_reports(&self.path)?;
        info!(path = %self.path.display(), reports = reports.len(), "reports loaded");
        Ok(reports)
    }

    fn save_all(&mut self, reports: &[Report]) -> HvacResult<()> {
        let _lock = FileLock::acquire(&self.path, self.user_id.clone())?;
        save_reports(reports, &self.path)?;
        info!(path = %self.path.display(), reports = reports.len(), "reports saved");
        Ok(())
    }

    fn upsert(&mut self, report: Report) -> HvacResult<()> {
        self.update(|reports| {
            upsert_into(reports, report);
            Ok(())
        })
    }

    fn delete(&mut self, id: &str) -> HvacResult<()> {
        self.update(|reports| remove_from(reports, id))
    }
}

/// Lock file metadata stored next to the store file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// Exclusive lock on the store file, released on drop.
pub struct FileLock {
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire the lock, or fail with [`HvacError::FileLocked`] while another
    /// process holds it. A lock file whose fs2 lock is free was left behind
    /// by a holder that is gone, and is taken over.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> HvacResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| {
                HvacError::file_error("create lock", lock_path.display().to_string(), e.to_string())
            })?;

        if lock_file.try_lock_exclusive().is_err() {
            let holder = read_lock_info(&lock_path).ok();
            return Err(match holder {
                Some(existing) => HvacError::file_locked(
                    path.display().to_string(),
                    format!("{} ({})", existing.user_id, existing.machine),
                    existing.locked_at.to_rfc3339(),
                ),
                None => HvacError::file_locked(path.display().to_string(), "another process", "unknown"),
            });
        }

        let lock_json = serde_json::to_string_pretty(&info)?;
        lock_file
            .set_len(0)
            .and_then(|_| lock_file.write_all(lock_json.as_bytes()))
            .map_err(|e| {
                HvacError::file_error("write lock", lock_path.display().to_string(), e.to_string())
            })?;
        lock_file.sync_all().map_err(|e| {
            HvacError::file_error("sync lock", lock_path.display().to_string(), e.to_string())
        })?;

        debug!(path = %path.display(), "store lock acquired");
        Ok(FileLock {
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Holder of a live lock, if any.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        let file = File::open(&lock_path).ok()?;
        if file.try_lock_exclusive().is_ok() {
            return None;
        }
        read_lock_info(&lock_path).ok()
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "lock")
}

/// `reports.json` -> `reports.json.<suffix>`
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    let extension = sibling
        .extension()
        .map(|e| format!("{}.{}", e.to_string_lossy(), suffix))
        .unwrap_or_else(|| suffix.to_string());
    sibling.set_extension(extension);
    sibling
}

fn read_lock_info(lock_path: &Path) -> HvacResult<LockInfo> {
    let contents = fs::read_to_string(lock_path).map_err(|e| {
        HvacError::file_error("read lock", lock_path.display().to_string(), e.to_string())
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write the whole collection with atomic temp-file + rename semantics.
pub fn save_reports(reports: &[Report], path: &Path) -> HvacResult<()> {
    let json = serde_json::to_string_pretty(reports)?;
    let tmp_path = sibling_with_suffix(path, "tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        HvacError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        HvacError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.sync_all().map_err(|e| {
        HvacError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        HvacError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;
    Ok(())
}

/// Read the collection; a missing file is empty.
pub fn load_reports(path: &Path) -> HvacResult<Vec<Report>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(HvacError::file_error("open", path.display().to_string(), e.to_string()))
        }
    };

    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| {
        HvacError::file_error("read", path.display().to_string(), e.to_string())
    })?;
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    let reports: Vec<Report> =
        serde_json::from_str(&contents).map_err(|e| HvacError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;

    for report in &reports {
        validate_version(&report.version)?;
    }
    Ok(reports)
}

/// Parse report JSON from an import file: a single report or an array.
pub fn parse_reports(json: &str) -> HvacResult<Vec<Report>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let reports: Vec<Report> = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    for report in &reports {
        validate_version(&report.version)?;
    }
    Ok(reports)
}

/// Major must match; within 0.x a newer minor is rejected.
fn validate_version(file_version: &str) -> HvacResult<()> {
    let mismatch = || HvacError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);

    if file_parts.is_empty() || current_parts.is_empty() || file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }
    if current_parts[0] == 0
        && file_parts.len() > 1
        && current_parts.len() > 1
        && file_parts[1] > current_parts[1]
    {
        return Err(mismatch());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurements::TestKey;
    use crate::room::Room;
    use crate::units::{Meters, SquareMeters};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join(DEFAULT_STORE_FILE), "test@example.com")
    }

    #[test]
    fn test_lock_path_generation() {
        let lock_path = lock_path_for(Path::new("/data/hvac-reports.json"));
        assert_eq!(lock_path, Path::new("/data/hvac-reports.json.lock"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store_in(&dir).load_all().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let mut report = Report::new("RPR-001", "Test Klinik");
        let mut room = Room::new("101", "Oda", SquareMeters(14.0), Meters(3.0));
        room.set_test_count(TestKey::HepaLeakage, 2);
        report.add_room(room);
        let id = report.id.clone();
        store.upsert(report).unwrap();

        let loaded = store.get(&id).unwrap();
        assert_eq!(loaded.report_number, "RPR-001");
        assert_eq!(loaded.rooms[0].test_count(TestKey::HepaLeakage), 2);
        // consolidated on save
        assert!(loaded.rooms[0].record(TestKey::HepaLeakage).is_some());
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_or_lock() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.upsert(Report::new("RPR-001", "Test")).unwrap();

        assert!(store.path().exists());
        assert!(!sibling_with_suffix(store.path(), "tmp").exists());
        assert!(!lock_path_for(store.path()).exists());
    }

    #[test]
    fn test_upsert_replaces_and_delete_removes() {
        let mut store = MemoryStore::new();
        let mut report = Report::new("RPR-001", "Test");
        let id = report.id.clone();
        store.upsert(report.clone()).unwrap();

        report.customer_name = "Yeni Müşteri".to_string();
        store.upsert(report).unwrap();
        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].customer_name, "Yeni Müşteri");

        store.delete(&id).unwrap();
        assert_eq!(
            store.delete(&id).unwrap_err(),
            HvacError::ReportNotFound { id: id.clone() }
        );
        assert_eq!(store.get(&id).unwrap_err().error_code(), "REPORT_NOT_FOUND");
    }

    #[test]
    fn test_live_lock_blocks_save() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let lock = FileLock::acquire(store.path(), "other@example.com").unwrap();

        let err = store.save_all(&[]).unwrap_err();
        assert!(err.is_recoverable());
        let holder = FileLock::check(store.path()).map(|info| info.user_id);
        assert_eq!(holder.as_deref(), Some("other@example.com"));
        drop(lock);
        store.save_all(&[]).unwrap();
    }

    #[test]
    fn test_leftover_lock_file_is_taken_over() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let leftover = LockInfo {
            user_id: "crashed@example.com".to_string(),
            machine: "another-host".to_string(),
            pid: 1,
            locked_at: Utc::now(),
        };
        fs::write(lock_path_for(store.path()), serde_json::to_string(&leftover).unwrap()).unwrap();

        assert!(FileLock::check(store.path()).is_none());
        store.save_all(&[]).unwrap();
        assert!(!lock_path_for(store.path()).exists());
    }

    #[test]
    fn test_update_holds_lock_across_read_and_write() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut other = store_in(&dir);

        store
            .update(|reports| {
                let holder = FileLock::check(other.path()).map(|info| info.user_id);
                assert_eq!(holder.as_deref(), Some("test@example.com"));
                assert_eq!(other.save_all(&[]).unwrap_err().error_code(), "FILE_LOCKED");
                upsert_into(reports, Report::new("RPR-001", "Test"));
                Ok(())
            })
            .unwrap();

        assert_eq!(other.load_all().unwrap().len(), 1);
        other.upsert(Report::new("RPR-002", "Test")).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 2);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_newer_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_STORE_FILE);
        fs::write(&path, r#"[{"id":"r1","version":"0.9.0"}]"#).unwrap();
        let err = load_reports(&path).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");
    }

    #[test]
    fn test_parse_single_or_array() {
        assert_eq!(parse_reports(r#"{"id":"r1"}"#).unwrap().len(), 1);
        assert_eq!(parse_reports(r#"[{"id":"r1"},{"id":"r2"}]"#).unwrap().len(), 2);
        assert!(parse_reports("not json").is_err());
    }
}
