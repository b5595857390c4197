use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// A fully written and synced temporary file waiting to replace its target.
///
/// Staging never touches the target. [`StagedWrite::commit`] renames the
/// temporary over the target in one step, so a reader sees either the old
/// contents or the new ones. Dropping an uncommitted stage deletes the
/// temporary and leaves the target alone.
#[derive(Debug)]
pub struct StagedWrite {
    target: PathBuf,
    temp: PathBuf,
    committed: bool,
}

/// `<file>.tmp` next to `target`.
pub fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

impl StagedWrite {
    /// Writes `bytes` to the temporary file and forces them to disk.
    pub fn stage(target: impl Into<PathBuf>, bytes: &[u8]) -> io::Result<Self> {
        let target = target.into();
        let temp = temp_path(&target);
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // From here on the drop guard owns the temporary.
        let staged = Self {
            target,
            temp,
            committed: false,
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&staged.temp)?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()?;

        let written = file.metadata()?.len();
        if written != bytes.len() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!(
                    "short write to {}: {} of {} bytes",
                    staged.temp.display(),
                    written,
                    bytes.len()
                ),
            ));
        }

        debug!(path = %staged.target.display(), bytes = bytes.len(), "Staged write");
        Ok(staged)
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn temp(&self) -> &Path {
        &self.temp
    }

    /// Replaces the target with the staged contents.
    pub fn commit(mut self) -> io::Result<()> {
        fs::rename(&self.temp, &self.target)?;
        self.committed = true;

        // Persist the directory entry too. Not every platform lets us open a
        // directory for syncing; the rename itself has already happened.
        if let Some(parent) = self.target.parent() {
            let dir = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
                debug!(dir = %dir.display(), error = %e, "Directory sync skipped");
            }
        }

        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = fs::remove_file(&self.temp) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.temp.display(), error = %e, "Failed to discard staged write");
            }
        }
    }
}

/// Commits stages in order, stopping at the first failure.
///
/// Stages after a failed one are dropped (and their temporaries removed), so
/// their targets keep their previous contents.
pub fn commit_all(stages: Vec<StagedWrite>) -> io::Result<()> {
    for stage in stages {
        stage.commit()?;
    }
    Ok(())
}

/// Stages and commits a single file.
pub fn write_atomic(target: impl Into<PathBuf>, bytes: &[u8]) -> io::Result<()> {
    StagedWrite::stage(target, bytes)?.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("products.dat");
        fs::write(&path, b"old").unwrap();

        write_atomic(&path, b"new contents").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new contents");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_uncommitted_stage_leaves_target_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.dat");
        fs::write(&path, b"old").unwrap();

        let staged = StagedWrite::stage(&path, b"new").unwrap();
        assert!(staged.temp().exists());
        drop(staged);

        assert_eq!(fs::read(&path).unwrap(), b"old");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_crash_before_rename_keeps_old_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.dat");
        fs::write(&path, b"old").unwrap();

        // Simulates the process dying between staging and commit.
        std::mem::forget(StagedWrite::stage(&path, b"new").unwrap());

        assert_eq!(fs::read(&path).unwrap(), b"old");
        assert_eq!(fs::read(temp_path(&path)).unwrap(), b"new");
    }

    #[test]
    fn test_stage_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("transactions.dat");

        write_atomic(&path, b"abc").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"abc");
    }

    #[test]
    fn test_commit_all_stops_at_failure() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.dat");
        let blocked = dir.path().join("b.dat");
        let last = dir.path().join("c.dat");

        // A non-empty directory at the target makes the rename fail.
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), b"x").unwrap();
        fs::write(&last, b"old").unwrap();

        let stages = vec![
            StagedWrite::stage(&first, b"1").unwrap(),
            StagedWrite::stage(&blocked, b"2").unwrap(),
            StagedWrite::stage(&last, b"3").unwrap(),
        ];

        assert!(commit_all(stages).is_err());
        assert_eq!(fs::read(&first).unwrap(), b"1");
        assert!(blocked.is_dir());
        assert_eq!(fs::read(&last).unwrap(), b"old");
        assert!(!temp_path(&blocked).exists());
        assert!(!temp_path(&last).exists());
    }
}
