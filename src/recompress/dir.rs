//! The scratch directory an archive is unpacked into while it gets recompressed.

use std::fs;
use std::path::{Path, PathBuf};

use exn::{Exn, ResultExt as _, bail};
use tracing::{debug, error};

use crate::error::ErrorMessage;

/// Exclusively owned scratch directory that is deleted when dropped.
///
/// The directory is placed next to the archive it belongs to, so the finished archive can be
/// moved out of it with a plain rename.
pub struct ScratchDir {
    /// Root of the scratch directory.
    root: PathBuf,
}

impl ScratchDir {
    /// Create the scratch directory for the archive that will end up at `destination`.
    ///
    /// Fails if the directory already exists, as it may belong to another run.
    pub fn for_destination(destination: &Path) -> Result<Self, Exn<ErrorMessage>> {
        let err = || {
            let destination = destination.display();
            ErrorMessage::new(format!(
                "Could not create a scratch directory for \"{destination}\""
            ))
        };

        let root = Self::path_for(destination).or_raise(err)?;
        if root.exists() {
            let dir = root.display();
            let msg = ErrorMessage::new(format!("Scratch directory already exists at \"{dir}\""));
            bail!(Exn::new(msg).raise(err()))
        }

        fs::create_dir(&root).or_raise(err)?;
        debug!("created scratch directory {root:?}");
        Ok(Self { root })
    }

    /// Build the path `<parent>/.<file name>.scratch` next to the destination.
    fn path_for(destination: &Path) -> Result<PathBuf, Exn<ErrorMessage>> {
        let (Some(parent), Some(name)) = (destination.parent(), destination.file_name()) else {
            let destination = destination.display();
            bail!(ErrorMessage::new(format!("Not a file path: \"{destination}\"")))
        };
        let name = name.to_string_lossy();
        Ok(parent.join(format!(".{name}.scratch")))
    }

    /// Root of the scratch directory.
    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        debug!("drop scratch directory {:?}", self.root);
        if self.root.exists()
            && let Err(e) = fs::remove_dir_all(&self.root)
        {
            error!("error on deleting directory {:?}: {e}", self.root);
        }
    }
}
