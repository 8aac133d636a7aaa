//! Writing rendered files to disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use atomicwrites::{AtomicFile, OverwriteBehavior};

use crate::error::{GoError, Result};
use crate::generate::OutputFile;

/// Write every file, or none when any target exists and `force` is unset.
///
/// A failure part way through restores the files already touched and
/// removes directories created for them.
pub fn write_outputs(files: &[OutputFile], force: bool) -> Result<Vec<PathBuf>> {
    if !force
        && let Some(existing) = files.iter().find(|file| file.path.exists())
    {
        return Err(GoError::OutputExists {
            path: existing.path.clone(),
        });
    }

    let mut journal = Journal::default();
    for file in files {
        if let Err(err) = journal.write(file) {
            journal.roll_back();
            return Err(err);
        }
        tracing::info!(path = %file.path.display(), interfaces = ?file.interfaces, "wrote file");
    }
    Ok(journal.written.into_iter().map(|entry| entry.path).collect())
}

struct Entry {
    path: PathBuf,
    /// Contents before this run; `None` when the file is new.
    previous: Option<Vec<u8>>,
}

/// What a run has changed so far, in order.
#[derive(Default)]
struct Journal {
    written: Vec<Entry>,
    created_dirs: Vec<PathBuf>,
}

impl Journal {
    fn write(&mut self, file: &OutputFile) -> Result<()> {
        if let Some(parent) = file.path.parent()
            && !parent.is_dir()
        {
            let missing: Vec<PathBuf> = parent
                .ancestors()
                .take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists())
                .map(Path::to_path_buf)
                .collect();
            std::fs::create_dir_all(parent).map_err(|e| GoError::io(parent, e))?;
            self.created_dirs.extend(missing);
        }

        let previous = if file.path.is_file() {
            Some(std::fs::read(&file.path).map_err(|e| GoError::io(&file.path, e))?)
        } else {
            None
        };
        write_atomic(&file.path, file.contents.as_bytes())?;
        self.written.push(Entry {
            path: file.path.clone(),
            previous,
        });
        Ok(())
    }

    fn roll_back(self) {
        for entry in self.written.into_iter().rev() {
            let restored = match &entry.previous {
                Some(contents) => write_atomic(&entry.path, contents),
                None => std::fs::remove_file(&entry.path).map_err(|e| GoError::io(&entry.path, e)),
            };
            if let Err(err) = restored {
                tracing::warn!(path = %entry.path.display(), error = %err, "failed to roll back output");
            }
        }
        // Deepest first; each directory is empty once its files are gone.
        for dir in &self.created_dirs {
            if let Err(err) = std::fs::remove_dir(dir) {
                tracing::warn!(path = %dir.display(), error = %err, "failed to remove created directory");
            }
        }
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(contents))
        .map_err(|e| match e {
            atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => GoError::io(path, e),
        })
}
