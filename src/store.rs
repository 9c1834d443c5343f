//! The slide store: a directory holding the active set of slide images.
//!
//! Uploads never write into the live directory. A batch is assembled in a
//! staging directory next to it and swapped in by [`SlideStore::commit`],
//! so readers see either the previous set or the new one, and a failed
//! upload leaves the previous set in place.

use crate::detect::is_slide_image;
use crate::error::{Error, Result};
use log::{debug, error, info};
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name of the live directory inside a retired swap directory.
const RETIRED_NAME: &str = "retired";

/// A slide image directory replaced wholesale on every upload.
#[derive(Debug)]
pub struct SlideStore {
    root: PathBuf,
    swap: Mutex<()>,
}

impl SlideStore {
    /// Open the store at `root`, creating the directory if absent.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        info!("slide store at {}", root.display());
        Ok(Self {
            root,
            swap: Mutex::new(()),
        })
    }

    /// Directory holding the live slides.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a new batch in an empty staging directory.
    pub fn begin_batch(&self) -> Result<StagedBatch> {
        let dir = tempfile::Builder::new()
            .prefix(&format!(".{}.staging-", self.dir_name()))
            .tempdir_in(self.parent_dir())?;
        debug!("staging batch in {}", dir.path().display());
        Ok(StagedBatch { dir })
    }

    /// Replace the live slides with the contents of `batch`.
    pub fn commit(&self, batch: StagedBatch) -> Result<()> {
        let _guard = self.swap.lock();

        let retired = tempfile::Builder::new()
            .prefix(&format!(".{}.retired-", self.dir_name()))
            .tempdir_in(self.parent_dir())?;
        let old = retired.path().join(RETIRED_NAME);

        let had_previous = match fs::rename(&self.root, &old) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = fs::rename(batch.dir.path(), &self.root) {
            if had_previous {
                restore_previous(retired, &self.root);
            }
            return Err(e.into());
        }

        // Dropping `retired` deletes the previous slides; dropping `batch`
        // finds its directory already moved and does nothing.
        drop(retired);
        info!("slide store replaced at {}", self.root.display());
        Ok(())
    }

    /// Slide image names in the live directory, sorted lexically.
    ///
    /// A missing directory lists as empty.
    pub fn list_slides(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_slide_image(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn dir_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "slides".to_string())
    }

    fn parent_dir(&self) -> &Path {
        match self.root.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// Move the retired slides back to `root`.
///
/// If that fails the retired directory is kept on disk instead of being
/// deleted with `retired`, and its location is returned.
fn restore_previous(retired: TempDir, root: &Path) -> Option<PathBuf> {
    let old = retired.path().join(RETIRED_NAME);
    match fs::rename(&old, root) {
        Ok(()) => None,
        Err(e) => {
            let kept = retired.keep().join(RETIRED_NAME);
            error!(
                "could not restore previous slides to {}: {}; kept at {}",
                root.display(),
                e,
                kept.display()
            );
            Some(kept)
        }
    }
}

/// Slides being assembled for one upload; discarded unless committed.
#[derive(Debug)]
pub struct StagedBatch {
    dir: TempDir,
}

impl StagedBatch {
    /// Directory the batch is written into.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write an image under `name`, replacing a same-named file of this batch.
    pub fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        fs::write(self.dir.path().join(checked_file_name(name)?), data)?;
        Ok(())
    }
}

/// Reject names that would escape the batch directory.
fn checked_file_name(name: &str) -> Result<&str> {
    let path = Path::new(name);
    match path.file_name() {
        Some(file) if file == path.as_os_str() => Ok(name),
        _ => Err(Error::InvalidInput(format!("invalid file name: {}", name))),
    }
}
