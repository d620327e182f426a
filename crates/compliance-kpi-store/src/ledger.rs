// crates/compliance-kpi-store/src/ledger.rs
// ============================================================================
// Module: CSV History Ledger
// Description: Append-only CSV ledger with fallback files.
// Purpose: Persist one row per run without ever losing or corrupting a row.
// Dependencies: compliance-kpi-core
// ============================================================================

//! ## Overview
//! The primary ledger is a CSV file with one header row and one row per run.
//! An append either lands in the primary file or, when the primary cannot
//! take it safely, in a fresh sibling fallback file named after the run
//! timestamp. The primary is diverted from when:
//! - it cannot be opened or written (for example, locked by a spreadsheet
//!   application or denied by permissions);
//! - its header lists different control sets than the snapshot;
//! - its last row is stamped later than the snapshot.
//!
//! Fallback files are created with exclusive-create semantics and carry their
//! own header, so no existing file is ever overwritten. Appends to the same
//! path are serialized within the process.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::sync::PoisonError;

use compliance_kpi_core::FallbackReason;
use compliance_kpi_core::HistoryLedger;
use compliance_kpi_core::HistorySnapshot;
use compliance_kpi_core::LedgerError;
use compliance_kpi_core::LedgerReceipt;
use compliance_kpi_core::RunTimestamp;
use compliance_kpi_core::fallback_path_for;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of fallback names probed for one append.
pub const MAX_FALLBACK_ATTEMPTS: u32 = 1000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Ledger
// ============================================================================

/// History ledger stored as a CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHistoryLedger {
    /// Primary ledger path.
    path: PathBuf,
}

impl FileHistoryLedger {
    /// Creates a ledger writing to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidPath`] when the path is empty, overlong,
    /// or has no file name.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        validate_ledger_path(&path)?;
        Ok(Self {
            path,
        })
    }

    /// Returns the primary ledger path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryLedger for FileHistoryLedger {
    fn append(&self, snapshot: &HistorySnapshot) -> Result<LedgerReceipt, LedgerError> {
        append_snapshot(&self.path, snapshot)
    }
}

/// Appends a snapshot to the ledger at `path`, diverting to a fallback file
/// when the primary cannot take the row.
///
/// # Errors
///
/// Returns [`LedgerError`] when the path is invalid, the row cannot be
/// formatted, or neither the primary nor any fallback accepted the row.
pub fn append_snapshot(
    path: &Path,
    snapshot: &HistorySnapshot,
) -> Result<LedgerReceipt, LedgerError> {
    validate_ledger_path(path)?;
    let header = snapshot.header_line();
    let row = snapshot.to_row().map_err(|err| LedgerError::Format(err.to_string()))?;

    // Create the folder first so the lock key resolves to the real directory.
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let _ = fs::create_dir_all(parent);
    }
    let lock = path_lock(path);
    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

    let reason = match append_primary(path, &header, &row, snapshot.timestamp) {
        Ok(()) => return Ok(LedgerReceipt::primary(path.to_path_buf())),
        Err(reason) => reason,
    };
    let written = write_fallback(path, snapshot.timestamp, &header, &row, &reason)?;
    Ok(LedgerReceipt {
        requested: path.to_path_buf(),
        written,
        fallback: Some(reason),
    })
}

// ============================================================================
// SECTION: Primary Writes
// ============================================================================

/// Appends header (when needed) and row to the primary ledger.
fn append_primary(
    path: &Path,
    header: &str,
    row: &str,
    timestamp: RunTimestamp,
) -> Result<(), FallbackReason> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| blocked(&err))?;
    }
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(|err| blocked(&err))?;
    let original_len = file.metadata().map_err(|err| blocked(&err))?.len();
    let mut existing = String::new();
    file.read_to_string(&mut existing).map_err(|err| blocked(&err))?;

    let mut payload = String::new();
    if existing.trim().is_empty() {
        payload.push_str(header);
        payload.push('\n');
    } else {
        check_existing(&existing, header, timestamp)?;
    }
    if !existing.is_empty() && !existing.ends_with('\n') {
        payload.insert(0, '\n');
    }
    payload.push_str(row);
    payload.push('\n');
    write_or_rollback(&mut file, payload.as_bytes(), |file| file.set_len(original_len))
        .map_err(|err| blocked(&err))
}

/// Writes `payload`, running `rollback` when the write fails so no partial
/// row stays behind.
fn write_or_rollback<W: Write>(
    writer: &mut W,
    payload: &[u8],
    rollback: impl FnOnce(&mut W) -> std::io::Result<()>,
) -> std::io::Result<()> {
    let result = writer.write_all(payload).and_then(|()| writer.flush());
    if result.is_err() {
        let _ = rollback(writer);
    }
    result
}

/// Checks that the snapshot fits behind the existing ledger content.
fn check_existing(
    existing: &str,
    header: &str,
    timestamp: RunTimestamp,
) -> Result<(), FallbackReason> {
    let mut lines = existing
        .lines()
        .map(|line| line.trim_start_matches('\u{feff}').trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty());
    let Some(first) = lines.next() else {
        return Ok(());
    };
    if first != header {
        return Err(FallbackReason::SchemaMismatch {
            existing: first.to_string(),
        });
    }
    if let Some(last_line) = lines.last()
        && let Some(stamp) = last_line.split(',').next()
        && let Ok(last) = RunTimestamp::parse_ledger(stamp)
        && last > timestamp
    {
        return Err(FallbackReason::OutOfOrder {
            last,
        });
    }
    Ok(())
}

/// Maps an open or write failure to a blocked fallback reason.
fn blocked(err: &std::io::Error) -> FallbackReason {
    FallbackReason::Blocked {
        error: err.to_string(),
    }
}

// ============================================================================
// SECTION: Fallback Writes
// ============================================================================

/// Writes header and row to the first free fallback path.
fn write_fallback(
    primary: &Path,
    timestamp: RunTimestamp,
    header: &str,
    row: &str,
    reason: &FallbackReason,
) -> Result<PathBuf, LedgerError> {
    let payload = format!("{header}\n{row}\n");
    for attempt in 0 .. MAX_FALLBACK_ATTEMPTS {
        let candidate = fallback_path_for(primary, timestamp, attempt)?;
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut file) => {
                file.write_all(payload.as_bytes())
                    .and_then(|()| file.flush())
                    .map_err(|err| fallback_failed(reason, &candidate, &err))?;
                return Ok(candidate);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
            Err(err) => return Err(fallback_failed(reason, &candidate, &err)),
        }
    }
    Err(LedgerError::Io(format!(
        "no free fallback name for {} after {MAX_FALLBACK_ATTEMPTS} attempts",
        primary.display()
    )))
}

/// Builds the error reported when the fallback also failed.
fn fallback_failed(reason: &FallbackReason, candidate: &Path, err: &std::io::Error) -> LedgerError {
    let primary = match reason {
        FallbackReason::Blocked {
            error,
        } => error.clone(),
        FallbackReason::SchemaMismatch {
            ..
        } => "header mismatch".to_string(),
        FallbackReason::OutOfOrder {
            ..
        } => "later run already recorded".to_string(),
    };
    LedgerError::Io(format!("primary: {primary}; fallback {}: {err}", candidate.display()))
}

// ============================================================================
// SECTION: Path Safety
// ============================================================================

/// Validates ledger paths for safety limits.
fn validate_ledger_path(path: &Path) -> Result<(), LedgerError> {
    if path.as_os_str().is_empty() {
        return Err(LedgerError::InvalidPath("ledger path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(LedgerError::InvalidPath("ledger path exceeds length limit".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(LedgerError::InvalidPath(
                "ledger path contains an overlong component".to_string(),
            ));
        }
    }
    if path.file_name().is_none() {
        return Err(LedgerError::InvalidPath(format!("{path_string} has no file name")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Per-Path Locks
// ============================================================================

/// Returns the process-wide lock guarding appends to `path`.
fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<BTreeMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();
    let registry = LOCKS.get_or_init(|| Mutex::new(BTreeMap::new()));
    let mut locks = registry.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(lock_key(path)).or_default())
}

/// Normalizes a ledger path so aliases share one lock.
///
/// The path is made absolute and `.`/`..` are resolved lexically; the deepest
/// existing ancestor of the parent is then canonicalized, so the key is the
/// same before and after the folder is created.
fn lock_key(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    let lexical = normalize_lexically(&absolute);
    let (Some(parent), Some(name)) = (lexical.parent(), lexical.file_name()) else {
        return lexical;
    };
    for ancestor in parent.ancestors() {
        if let Ok(resolved) = ancestor.canonicalize()
            && let Ok(rest) = parent.strip_prefix(ancestor)
        {
            let mut key = resolved;
            if !rest.as_os_str().is_empty() {
                key.push(rest);
            }
            key.push(name);
            return key;
        }
    }
    lexical
}

/// Drops `.` components and folds `..` into the preceding component.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use std::fs;
    use std::io;
    use std::io::Write;
    use std::path::Path;

    use super::lock_key;
    use super::write_or_rollback;

    /// Writer that accepts a fixed number of bytes, then fails.
    struct FullDisk {
        /// Bytes accepted so far.
        data: Vec<u8>,
        /// Total bytes the writer will hold.
        capacity: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.capacity.saturating_sub(self.data.len());
            if room == 0 {
                return Err(io::Error::other("no space left"));
            }
            let taken = room.min(buf.len());
            self.data.extend_from_slice(&buf[.. taken]);
            Ok(taken)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn aliases_share_a_key_before_and_after_the_folder_exists() {
        let dir = tempfile::tempdir().unwrap();
        let dotted = dir.path().join("x/../out/./summary_history.csv");
        let plain = dir.path().join("out/summary_history.csv");

        let before = lock_key(&dotted);
        assert_eq!(before, lock_key(&plain));

        fs::create_dir_all(dir.path().join("out")).unwrap();
        assert_eq!(lock_key(&dotted), before);
        assert_eq!(lock_key(&plain), before);
    }

    #[test]
    fn relative_paths_get_absolute_keys() {
        assert!(lock_key(Path::new("out/summary_history.csv")).is_absolute());
        assert!(lock_key(Path::new("summary_history.csv")).is_absolute());
    }

    #[test]
    fn failed_write_is_rolled_back() {
        let header = b"timestamp,a_total,a_readiness\n";
        let mut disk = FullDisk {
            data: header.to_vec(),
            capacity: header.len() + 5,
        };

        let result = write_or_rollback(&mut disk, b"1970-01-01_00-01-40,2,80.0\n", |disk| {
            disk.data.truncate(header.len());
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(disk.data, header.to_vec());
    }

    #[test]
    fn successful_write_skips_rollback() {
        let mut disk = FullDisk {
            data: Vec::new(),
            capacity: 64,
        };
        let result = write_or_rollback(&mut disk, b"row\n", |_| panic!("rollback ran"));
        assert!(result.is_ok());
        assert_eq!(disk.data, b"row\n".to_vec());
    }
}
