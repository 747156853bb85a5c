//! File-backed sequence store.
//!
//! Each sequence is one small text file in the store directory:
//!
//! ```text
//! <dir>/
//! ├─ order_ids.seq         # "<next value>\n<increment>\n"
//! └─ sales.invoice_ids.seq
//! ```
//!
//! After the counter served `i64::MAX` its first line reads `exhausted`.
//!
//! Every read takes an exclusive advisory lock on the file, so processes
//! sharing the directory never receive the same value.

use crate::error::{IdError, IdResult};
use crate::store::{SequenceName, SequenceStore};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSION: &str = "seq";
const EXHAUSTED: &str = "exhausted";

/// Stores sequences as locked counter files in a directory.
#[derive(Debug, Clone)]
pub struct FileSequenceStore {
    dir: PathBuf,
}

impl FileSequenceStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created or `dir` is a file.
    pub fn open(dir: impl AsRef<Path>) -> IdResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        if !dir.is_dir() {
            return Err(IdError::invalid_config(format!(
                "path is not a directory: {}",
                dir.display()
            )));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, sequence: &SequenceName) -> PathBuf {
        self.dir.join(format!("{sequence}.{EXTENSION}"))
    }
}

/// Parses `"<next>\n<increment>\n"`. The next value is `None` once the
/// counter is exhausted.
fn parse_counter(path: &Path, content: &str) -> IdResult<(Option<i64>, i64)> {
    let mut lines = content.lines().map(str::trim);
    let mut field = |what: &str| -> IdResult<Option<i64>> {
        let line = lines
            .next()
            .ok_or_else(|| IdError::corrupted(path, format!("missing {what}")))?;
        if line == EXHAUSTED {
            return Ok(None);
        }
        line.parse::<i64>()
            .map(Some)
            .map_err(|e| IdError::corrupted(path, format!("bad {what}: {e}")))
    };
    let next = field("next value")?;
    let increment = field("increment")?
        .ok_or_else(|| IdError::corrupted(path, "increment is not a number"))?;
    if increment < 1 {
        return Err(IdError::corrupted(path, format!("increment {increment} below 1")));
    }
    Ok((next, increment))
}

fn render_counter(next: Option<i64>, increment: i64) -> String {
    match next {
        Some(next) => format!("{next}\n{increment}\n"),
        None => format!("{EXHAUSTED}\n{increment}\n"),
    }
}

impl SequenceStore for FileSequenceStore {
    fn exists(&self, sequence: &SequenceName) -> IdResult<bool> {
        Ok(self.path_of(sequence).is_file())
    }

    fn create(&self, sequence: &SequenceName, start_with: i64, increment: i64) -> IdResult<()> {
        let path = self.path_of(sequence);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(sequence = %sequence, "Sequence file already exists");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        FileExt::lock_exclusive(&file)?;
        file.write_all(render_counter(Some(start_with), increment).as_bytes())?;
        file.sync_all()?;
        FileExt::unlock(&file)?;
        debug!(sequence = %sequence, path = %path.display(), "Sequence file created");
        Ok(())
    }

    fn next_value(&self, sequence: &SequenceName) -> IdResult<Option<i64>> {
        let path = self.path_of(sequence);
        let mut file = match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(IdError::sequence_not_found(sequence));
            }
            Err(e) => return Err(e.into()),
        };

        FileExt::lock_exclusive(&file)?;
        let result = advance(&mut file, &path);
        FileExt::unlock(&file)?;
        result.map(Some)
    }
}

/// Reads the counter, writes back the advanced value and returns the
/// value read. Serving the last value of `i64` marks the counter
/// exhausted. The caller holds the file lock.
fn advance(file: &mut File, path: &Path) -> IdResult<i64> {
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    let (next, increment) = parse_counter(path, &content)?;
    let value =
        next.ok_or_else(|| IdError::overflow(format!("{} is exhausted", path.display())))?;
    let next = value.checked_add(increment);

    file.seek(SeekFrom::Start(0))?;
    file.set_len(0)?;
    file.write_all(render_counter(next, increment).as_bytes())?;
    file.sync_data()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn create_then_advance() {
        let dir = tempdir().unwrap();
        let store = FileSequenceStore::open(dir.path()).unwrap();
        let name = SequenceName::new(Some("sales".into()), "order_ids");

        assert!(!store.exists(&name).unwrap());
        store.create(&name, 1, 10).unwrap();
        assert!(store.exists(&name).unwrap());

        assert_eq!(store.next_value(&name).unwrap(), Some(1));
        assert_eq!(store.next_value(&name).unwrap(), Some(11));
        assert!(dir.path().join("sales.order_ids.seq").is_file());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let name = SequenceName::new(None, "ids");
        {
            let store = FileSequenceStore::open(dir.path()).unwrap();
            store.create(&name, 5, 5).unwrap();
            assert_eq!(store.next_value(&name).unwrap(), Some(5));
        }
        let store = FileSequenceStore::open(dir.path()).unwrap();
        assert_eq!(store.next_value(&name).unwrap(), Some(10));
    }

    #[test]
    fn create_keeps_existing_counter() {
        let dir = tempdir().unwrap();
        let store = FileSequenceStore::open(dir.path()).unwrap();
        let name = SequenceName::new(None, "ids");
        store.create(&name, 1, 1).unwrap();
        store.next_value(&name).unwrap();
        store.create(&name, 1, 1).unwrap();
        assert_eq!(store.next_value(&name).unwrap(), Some(2));
    }

    #[test]
    fn missing_sequence_is_reported() {
        let dir = tempdir().unwrap();
        let store = FileSequenceStore::open(dir.path()).unwrap();
        let result = store.next_value(&SequenceName::new(None, "ghost"));
        assert!(matches!(result, Err(IdError::SequenceNotFound { .. })));
    }

    #[test]
    fn corrupted_file_is_reported() {
        let dir = tempdir().unwrap();
        let store = FileSequenceStore::open(dir.path()).unwrap();
        let name = SequenceName::new(None, "ids");
        fs::write(dir.path().join("ids.seq"), "not a number\n").unwrap();

        let error = store.next_value(&name).unwrap_err();
        assert!(matches!(error, IdError::Corrupted { .. }));
        assert!(error.is_data_integrity());
    }

    #[test]
    fn concurrent_reads_are_distinct() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileSequenceStore::open(dir.path()).unwrap());
        let name = SequenceName::new(None, "ids");
        store.create(&name, 1, 1).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let name = name.clone();
                thread::spawn(move || {
                    (0..25)
                        .map(|_| store.next_value(&name).unwrap().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut values: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        values.sort_unstable();
        assert_eq!(values, (1..=100).collect::<Vec<_>>());
    }

    #[test]
    fn serves_last_value_then_reports_exhaustion() {
        let dir = tempdir().unwrap();
        let store = FileSequenceStore::open(dir.path()).unwrap();
        let name = SequenceName::new(None, "ids");
        store.create(&name, i64::MAX - 1, 1).unwrap();

        assert_eq!(store.next_value(&name).unwrap(), Some(i64::MAX - 1));
        assert_eq!(store.next_value(&name).unwrap(), Some(i64::MAX));

        let error = store.next_value(&name).unwrap_err();
        assert!(matches!(error, IdError::Overflow { .. }));
        let reopened = FileSequenceStore::open(dir.path()).unwrap();
        assert!(reopened.next_value(&name).unwrap_err().is_data_integrity());
    }
}
