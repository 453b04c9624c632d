//! Removing the metadata tags of audio files.
//!
//! MP3 files carry ID3 tags, M4A files carry MP4 metadata atoms. Every other file is left alone
//! without being counted, and so is an audio file that has no tags in the first place.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use exn::{Exn, OptionExt as _, ResultExt as _};
use tracing::{debug, info, warn};

use crate::console::Console;
use crate::error::{ErrorMessage, Interrupted};
use crate::interrupt::Interrupt;
use crate::summary::{Outcome, RunSummary, SummaryTitles};
use crate::walk::{Directory, lowercase_extension};

/// Labels used for the summary of a stripping run.
pub const TITLES: SummaryTitles = SummaryTitles {
    success: "Successfully removed metadata from",
    warning: "No metadata found in",
    failed: "Failed to process",
};

/// The tag containers that can be stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// ID3 tags in front of (and possibly behind) MPEG audio.
    Mp3,
    /// Metadata atoms inside an MPEG-4 container.
    M4a,
}

/// What stripping did to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stripped {
    /// Tags were found and removed.
    Removed,
    /// There was nothing to remove.
    NoTags,
}

impl AudioFormat {
    /// Pick the container by file extension, ignoring case.
    pub fn classify(path: &Path) -> Option<Self> {
        match lowercase_extension(path)?.as_str() {
            "mp3" => Some(Self::Mp3),
            "m4a" => Some(Self::M4a),
            _ => None,
        }
    }

    /// Remove all tags from the file and write it back, if it has any.
    pub fn strip(self, path: &Path) -> Result<Stripped, Exn<ErrorMessage>> {
        match self {
            Self::Mp3 => strip_id3(path),
            Self::M4a => strip_mp4(path),
        }
    }
}

/// Remove the ID3v2 tag at the start of the file and the ID3v1 tag at its end.
///
/// Either one alone is enough for the file to count as tagged. An ID3v2 tag without frames is
/// only removed together with an ID3v1 tag.
fn strip_id3(path: &Path) -> Result<Stripped, Exn<ErrorMessage>> {
    let err = || {
        let path = path.display();
        ErrorMessage::new(format!("Could not process the ID3 tag of \"{path}\""))
    };

    let v2 = match id3::Tag::read_from_path(path) {
        Ok(tag) => Some(tag),
        Err(e) if matches!(e.kind, id3::ErrorKind::NoTag) => None,
        Err(e) => return Err(Exn::new(e).raise(err())),
    };
    let v2_has_frames = v2.as_ref().is_some_and(|tag| tag.frames().next().is_some());

    let v1_removed = id3::v1::Tag::remove_from_path(path).or_raise(err)?;
    if v1_removed {
        debug!("removed an ID3v1 tag from {path:?}");
    }
    if v2.is_some() && (v2_has_frames || v1_removed) {
        remove_id3v2(path).or_raise(err)?;
    }

    match v2_has_frames || v1_removed {
        true => Ok(Stripped::Removed),
        false => {
            debug!("only an empty ID3 tag in {path:?}");
            Ok(Stripped::NoTags)
        }
    }
}

/// Size of the ID3v2 tag at the start of `bytes` as its header declares it, footer included.
fn id3v2_len(bytes: &[u8]) -> Option<usize> {
    let [b'I', b'D', b'3', _, _, flags, size @ ..] = *bytes.first_chunk::<10>()? else {
        return None;
    };
    // four bytes with seven bits each
    let body = size.iter().try_fold(0_usize, |len, &byte| {
        (byte & 0x80 == 0).then_some((len << 7) | usize::from(byte))
    })?;
    let footer = if flags & 0x10 == 0 { 0 } else { 10 };
    Some(10 + body + footer)
}

/// Cut the ID3v2 tag off the front of the file.
///
/// Only the declared tag size is removed, so audio data that happens to start with zero bytes is
/// not mistaken for padding. The rest of the file is written to a sibling and renamed over it.
fn remove_id3v2(path: &Path) -> Result<(), Exn<ErrorMessage>> {
    let err = || {
        let path = path.display();
        ErrorMessage::new(format!("Could not remove the ID3v2 tag of \"{path}\""))
    };

    let bytes = fs::read(path).or_raise(err)?;
    let audio = id3v2_len(&bytes)
        .and_then(|len| bytes.get(len..))
        .ok_or_raise(err)?;

    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".untagged");
    let staging = path.with_file_name(name);
    let permissions = fs::metadata(path).or_raise(err)?.permissions();
    fs::write(&staging, audio).or_raise(err)?;
    let replaced =
        fs::set_permissions(&staging, permissions).and_then(|()| fs::rename(&staging, path));
    if let Err(e) = replaced {
        if let Err(cleanup) = fs::remove_file(&staging) {
            warn!("could not remove {staging:?}: {cleanup}");
        }
        return Err(Exn::new(e).raise(err()));
    }
    Ok(())
}

/// Clear all metadata atoms of an MPEG-4 file.
fn strip_mp4(path: &Path) -> Result<Stripped, Exn<ErrorMessage>> {
    let err = || {
        let path = path.display();
        ErrorMessage::new(format!("Could not process the MP4 metadata of \"{path}\""))
    };

    let mut tag = mp4ameta::Tag::read_from_path(path).or_raise(err)?;
    if tag.is_empty() {
        return Ok(Stripped::NoTags);
    }
    tag.clear();
    tag.write_to_path(path).or_raise(err)?;
    Ok(Stripped::Removed)
}

/// Strip the tags of every MP3 and M4A file below `directory`, at any depth.
///
/// A file that cannot be read or written counts as failed and the walk goes on, the same is true
/// for directory entries the walk cannot read. Only an interrupt stops the run.
pub fn strip_metadata_recursive(
    directory: &Path,
    interrupt: &Interrupt,
) -> Result<RunSummary, Exn<Interrupted>> {
    let root = match Directory::new(directory) {
        Ok(root) => root,
        Err(exn) => {
            println!("Error: {exn}.");
            return Ok(RunSummary::invalid_directory());
        }
    };

    let console = Console::spinner("Stripping");
    let summary = strip_files(root.files_recursive(), interrupt, &console)?;
    console.finish();
    Ok(summary)
}

/// Strip every file yielded by a walk, counting walk errors as failures without stopping.
fn strip_files(
    files: impl IntoIterator<Item = Result<PathBuf, Exn<ErrorMessage>>>,
    interrupt: &Interrupt,
    console: &Console,
) -> Result<RunSummary, Exn<Interrupted>> {
    let mut summary = RunSummary::default();

    for entry in files {
        interrupt.check()?;

        let path = match entry {
            Ok(path) => path,
            Err(exn) => {
                warn!("{exn:?}");
                console.line(exn.to_string());
                summary.record_failure();
                continue;
            }
        };

        match strip_file(&path, console) {
            Ok(outcome) => summary.record(&outcome),
            Err(exn) => {
                warn!("{exn:?}");
                console.line(format!("Failed to process {}: {exn}", path.display()));
                summary.record_failure();
            }
        }
        console.advance();
    }

    Ok(summary)
}

/// Strip the tags of a single file, if it is one of the supported formats.
pub fn strip_file(path: &Path, console: &Console) -> Result<Outcome, Exn<ErrorMessage>> {
    let Some(format) = AudioFormat::classify(path) else {
        debug!("ignoring {path:?}, not a supported audio file");
        return Ok(Outcome::Ignored);
    };
    console.working_on(path.display().to_string());

    match format.strip(path)? {
        Stripped::Removed => {
            info!("removed {format:?} metadata from {path:?}");
            console.line(format!("Metadata removed from: {}", path.display()));
            Ok(Outcome::Success)
        }
        Stripped::NoTags => {
            debug!("no metadata in {path:?}");
            Ok(Outcome::Ignored)
        }
    }
}
