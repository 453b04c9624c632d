//! Enumerating the files a batch operation works on.

use std::fs;
use std::path::{Path, PathBuf};

use exn::{Exn, ResultExt as _};
use walkdir::WalkDir;

use crate::error::ErrorMessage;

/// A filesystem path that was verified to point to an existing directory.
#[derive(Debug, Clone)]
pub struct Directory(PathBuf);

impl Directory {
    /// Checked constructor to verify the path points to a directory.
    ///
    /// This only checks that the directory exists at the time of creation.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, Exn<ErrorMessage>> {
        let path = path.into();
        match path.is_dir() {
            true => Ok(Self(path)),
            false => {
                let path = path.display();
                let msg = format!("{path} is not a valid directory");
                Err(Exn::new(ErrorMessage::new(msg)))
            }
        }
    }

    /// All direct children of this directory, sorted by name.
    ///
    /// The listing is taken in full before returning, so files created while the caller works
    /// through it do not show up.
    pub fn children(&self) -> Result<Vec<PathBuf>, Exn<ErrorMessage>> {
        let err = || {
            let root = self.display();
            ErrorMessage::new(format!("Could not list the directory \"{root}\""))
        };

        let mut children = fs::read_dir(&self.0)
            .or_raise(err)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()
            .or_raise(err)?;
        children.sort_unstable();
        Ok(children)
    }

    /// Walk over all files below this directory, at any depth.
    ///
    /// Directory listings are read and sorted one directory at a time before any of their entries
    /// are yielded, so renaming a yielded file does not make it show up again. Symbolic links are
    /// not followed.
    ///
    /// An entry the walk cannot read is yielded as an error naming its path, the walk itself goes
    /// on with the next entry.
    pub fn files_recursive(&self) -> impl Iterator<Item = Result<PathBuf, Exn<ErrorMessage>>> {
        let root = self.0.clone();
        WalkDir::new(&self.0)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
                Ok(_) => None,
                Err(e) => {
                    let at = e.path().unwrap_or(root.as_path()).display();
                    let msg = format!("File system error processing {at}: {e}");
                    Some(Err(Exn::new(e).raise(ErrorMessage::new(msg))))
                }
            })
    }
}

impl std::ops::Deref for Directory {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::convert::AsRef<Path> for Directory {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Lowercase file extension of a path, without the dot.
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}
