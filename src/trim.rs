//! Removing a fixed prefix from every file name of a directory tree.

use std::fmt;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use exn::{Exn, ResultExt as _, bail};
use tracing::{debug, info, warn};

use crate::console::Console;
use crate::error::{ErrorMessage, Interrupted};
use crate::interrupt::Interrupt;
use crate::summary::{Outcome, RunSummary, SummaryTitles};
use crate::walk::Directory;

/// Labels used for the summary of a trimming run.
pub const TITLES: SummaryTitles = SummaryTitles {
    success: "Successfully trimmed chars from",
    warning: "Skipped trimming chars from",
    failed: "Failed to trim chars from",
};

/// Shortest base name a file may be left with.
const MIN_BASE_CHARS: usize = 3;

/// Split a file name into base and extension at the last dot.
///
/// Leading dots belong to the base, so `".bashrc"` has no extension, and neither has a name
/// without any dot. The extension keeps its dot.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if name.split_at(dot).0.chars().any(|c| c != '.') => name.split_at(dot),
        _ => (name, ""),
    }
}

/// Why a file keeps its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The name cannot be cut by characters.
    NotUnicode,
    /// The name has no more characters than would be removed.
    NameTooShort,
    /// Only an extension or a dot file would be left.
    BaseTooShort(String),
    /// Nothing at all would be left.
    EmptyName,
    /// Another file already has the new name.
    AlreadyExists(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotUnicode => write!(f, "name is not valid UTF-8"),
            Self::NameTooShort => write!(f, "name too short"),
            Self::BaseTooShort(base) => {
                write!(f, "new filename base '{base}' is too short or only extension")
            }
            Self::EmptyName => write!(f, "new filename is too short"),
            Self::AlreadyExists(name) => write!(f, "{name} already exists"),
        }
    }
}

/// A file together with the name it would get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameCandidate {
    /// Current file name.
    pub original_name: String,
    /// File name with the prefix removed.
    pub trimmed_name: String,
    /// Directory containing the file.
    pub directory: PathBuf,
}

impl FilenameCandidate {
    /// Work out the new name of a file, checking everything that does not need the filesystem.
    ///
    /// `chars_to_trim` counts characters, not bytes.
    pub fn new(
        directory: &Path,
        original_name: &str,
        chars_to_trim: usize,
    ) -> Result<Self, SkipReason> {
        let Some((cut, _)) = original_name.char_indices().nth(chars_to_trim) else {
            return Err(SkipReason::NameTooShort);
        };
        let (_, trimmed_name) = original_name.split_at(cut);

        let (base, _) = split_extension(trimmed_name);
        if base.chars().count() < MIN_BASE_CHARS || base.starts_with('.') {
            return Err(SkipReason::BaseTooShort(base.to_owned()));
        }

        if trimmed_name.is_empty() {
            return Err(SkipReason::EmptyName);
        }

        Ok(Self {
            original_name: original_name.to_owned(),
            trimmed_name: trimmed_name.to_owned(),
            directory: directory.to_path_buf(),
        })
    }

    /// Current path of the file.
    pub fn source(&self) -> PathBuf {
        self.directory.join(&self.original_name)
    }

    /// Path the file is renamed to.
    pub fn destination(&self) -> PathBuf {
        self.directory.join(&self.trimmed_name)
    }
}

/// Remove the first `chars_to_trim` characters from the name of every file below `directory`.
///
/// Files keep their name if too little of it would be left, or if the new name is taken. The
/// first filesystem error ends the whole walk and is counted as one failure, renames done until
/// then stay in place.
pub fn trim_filenames_recursive(
    directory: &Path,
    chars_to_trim: NonZeroUsize,
    interrupt: &Interrupt,
) -> Result<RunSummary, Exn<Interrupted>> {
    let root = match Directory::new(directory) {
        Ok(root) => root,
        Err(exn) => {
            println!("Error: {exn}");
            return Ok(RunSummary::invalid_directory());
        }
    };

    let console = Console::spinner("Trimming");
    let walk_err = || {
        let root = root.display();
        ErrorMessage::new(format!("Error processing directory {root}"))
    };
    let summary = trim_files(
        root.files_recursive(),
        chars_to_trim,
        walk_err,
        interrupt,
        &console,
    )?;
    console.finish();
    Ok(summary)
}

/// Trim every file yielded by a walk until the first error, which is counted once.
fn trim_files(
    files: impl IntoIterator<Item = Result<PathBuf, Exn<ErrorMessage>>>,
    chars_to_trim: NonZeroUsize,
    walk_err: impl Fn() -> ErrorMessage,
    interrupt: &Interrupt,
    console: &Console,
) -> Result<RunSummary, Exn<Interrupted>> {
    let mut summary = RunSummary::default();

    for path in files {
        interrupt.check()?;

        let result = path
            .or_raise(&walk_err)
            .and_then(|path| trim_file(&path, chars_to_trim.get(), console).or_raise(&walk_err));
        match result {
            Ok(outcome) => summary.record(&outcome),
            Err(exn) => {
                warn!("{exn:?}");
                console.line(format!("🛑 {exn}"));
                summary.record_failure();
                break;
            }
        }
        console.advance();
    }

    Ok(summary)
}

/// Trim the name of a single file.
///
/// Errors are filesystem errors while probing for or renaming to the new name.
pub fn trim_file(
    path: &Path,
    chars_to_trim: usize,
    console: &Console,
) -> Result<Outcome, Exn<ErrorMessage>> {
    let skip = |reason: SkipReason| {
        debug!("skipping {path:?}: {reason}");
        console.line(format!("Skipping {}: {reason}", path.display()));
        Ok(Outcome::Skipped(reason.to_string()))
    };

    let Some(name) = path.file_name() else {
        let path = path.display();
        bail!(ErrorMessage::new(format!("\"{path}\" has no file name")))
    };
    let Some(name) = name.to_str() else {
        return skip(SkipReason::NotUnicode);
    };
    let directory = path.parent().unwrap_or_else(|| Path::new(""));
    console.working_on(name.to_owned());

    let candidate = match FilenameCandidate::new(directory, name, chars_to_trim) {
        Ok(candidate) => candidate,
        Err(reason) => return skip(reason),
    };

    let source = candidate.source();
    let destination = candidate.destination();
    let err = || {
        let source = source.display();
        let destination = destination.display();
        ErrorMessage::new(format!("Could not rename \"{source}\" to \"{destination}\""))
    };

    if destination.try_exists().or_raise(err)? {
        return skip(SkipReason::AlreadyExists(candidate.trimmed_name));
    }

    fs::rename(&source, &destination).or_raise(err)?;
    info!("renamed {source:?} to {destination:?}");
    console.line(format!(
        "Renamed: {} → {}",
        source.display(),
        destination.display()
    ));
    Ok(Outcome::Success)
}
