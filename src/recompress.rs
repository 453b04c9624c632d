//! Recompressing the images inside comic book archives.
//!
//! [`process_directory`] backs up every `.cbz` archive of a directory and then rewrites it in
//! place through [`archive::recompress_archive_in_place`].

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use exn::{Exn, ResultExt as _};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::console::Console;
use crate::error::{ErrorMessage, Interrupted};
use crate::interrupt::Interrupt;
use crate::recompress::image::ImageSettings;
use crate::summary::{Outcome, RunSummary, SummaryTitles};
use crate::walk::Directory;

pub mod archive;
pub mod dir;
pub mod image;

/// Labels used for the summary of a recompression run.
pub const TITLES: SummaryTitles = SummaryTitles {
    success: "Successfully optimized",
    warning: "Skipped file",
    failed: "Failed to process",
};

/// Quality used when nothing else is configured.
pub const DEFAULT_QUALITY: u8 = 80;

/// Maximum image height used when nothing else is configured.
pub const DEFAULT_MAX_HEIGHT: u32 = 1024;

/// Suffix a file name needs for the archive to get processed. The match is case sensitive.
pub const ARCHIVE_SUFFIX: &str = ".cbz";

/// Marker inserted between the name and the extension of a backup copy.
const BACKUP_MARKER: &str = "_original";

/// Recompress every archive directly inside `directory`.
///
/// Before an archive gets touched, it is copied to `<name>_original.cbz` next to it. Without a
/// backup the archive is counted as failed and left alone. Every other entry of the directory is
/// counted as skipped without being opened. A failing archive never stops the run, only an
/// interrupt does.
pub fn process_directory(
    directory: &Path,
    settings: ImageSettings,
    interrupt: &Interrupt,
) -> Result<RunSummary, Exn<Interrupted>> {
    let root = match Directory::new(directory) {
        Ok(root) => root,
        Err(exn) => {
            println!("Error: {exn}");
            return Ok(RunSummary::invalid_directory());
        }
    };

    let entries = match root.children() {
        Ok(entries) => entries,
        Err(exn) => {
            println!("🛑 {exn}");
            debug!("{exn:?}");
            return Ok(RunSummary::invalid_directory());
        }
    };

    let console = Console::counted(entries.len(), "Optimizing");
    let mut summary = RunSummary::default();

    for path in entries {
        interrupt.check()?;

        let name = file_name(&path);
        console.working_on(name.clone());

        match process_entry(&path, settings, &console) {
            Ok(outcome) => {
                if let Outcome::Skipped(reason) = &outcome {
                    debug!("skipping {path:?}: {reason}");
                }
                summary.record(&outcome);
            }
            Err(exn) => {
                warn!("{exn:?}");
                console.line(format!("🛑 Failed to process {name}: {exn}"));
                summary.record_failure();
            }
        }
        console.advance();
    }

    console.finish();
    Ok(summary)
}

/// Back up and recompress a single directory entry, if it is an archive.
fn process_entry(
    path: &Path,
    settings: ImageSettings,
    console: &Console,
) -> Result<Outcome, Exn<ErrorMessage>> {
    let name = file_name(path);
    if !name.ends_with(ARCHIVE_SUFFIX) {
        return Ok(Outcome::Skipped(format!("{name} is not a comic book archive")));
    }

    let backup = backup_path(path);
    console.line(format!("Creating backup: {}", backup.display()));
    create_backup(path, &backup)?;

    let saved = archive::recompress_archive_in_place(path, settings)?;
    info!("optimized {path:?}, saved {saved:.2} MB");
    console.line(format!("✅ Optimized {name} | Size saved: {saved:.2} MB"));
    Ok(Outcome::Success)
}

/// The file name of a path for printing.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

/// Path of the backup copy, `<stem>_original<extension>` in the same directory.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_stem().map(OsStr::to_os_string).unwrap_or_default();
    name.push(BACKUP_MARKER);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// Copy the archive to its backup location, keeping permissions.
fn create_backup(path: &Path, backup: &Path) -> Result<(), Exn<ErrorMessage>> {
    let err = || {
        let backup = backup.display();
        ErrorMessage::new(format!("Could not create the backup \"{backup}\""))
    };

    let bytes = fs::copy(path, backup).or_raise(err)?;
    debug!("copied {bytes} bytes to {backup:?}");
    Ok(())
}

/// Matches a parenthesized group, as short as possible.
static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").expect("valid pattern"));

/// Matches a run of whitespace.
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid pattern"));

/// Tidy up an archive name and number it.
///
/// Removes every parenthesized group, collapses runs of whitespace into a single space, and puts
/// the zero padded sequence number in front of the extension:
/// `"Vol (2020) [x].cbz"` with number 1 becomes `"Vol [x] 001.cbz"`.
///
/// Not used by [`process_directory`].
pub fn clean_name(name: &str, sequence_number: u32) -> String {
    let without_groups = PARENTHESIZED.replace_all(name, "");
    let collapsed = WHITESPACE.replace_all(&without_groups, " ");
    let (base, ext) = crate::trim::split_extension(&collapsed);
    let base = base.trim();
    format!("{base} {sequence_number:03}{ext}")
}
