use std::error::Error;
use std::fs;
use std::path::Path;

use id3::TagLike as _;
use media_janitor::RunSummary;
use media_janitor::audio::strip_metadata_recursive;
use media_janitor::interrupt::Interrupt;
use tempfile::tempdir;

/// Stand-in for MPEG audio frames, the tag code never looks at them.
const AUDIO: [u8; 512] = [0xAA; 512];

fn tagged_mp3(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::write(path, AUDIO)?;
    let mut tag = id3::Tag::new();
    tag.set_title("Track");
    tag.set_album("Album");
    tag.set_year(1999);
    tag.write_to_path(path, id3::Version::Id3v24)?;
    Ok(())
}

#[test]
fn tags_are_removed_recursively() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let disc = temp.path().join("Album").join("Disc 1");
    fs::create_dir_all(&disc)?;
    let song = disc.join("01 Track.MP3");
    tagged_mp3(&song)?;
    assert!(id3::Tag::read_from_path(&song).is_ok());

    let summary = strip_metadata_recursive(temp.path(), &Interrupt::default()).unwrap();

    assert_eq!(
        summary,
        RunSummary {
            success_count: 1,
            skipped_count: 0,
            failed_count: 0,
        }
    );
    let reread = id3::Tag::read_from_path(&song).unwrap_err();
    assert!(matches!(reread.kind, id3::ErrorKind::NoTag));
    assert_eq!(fs::read(&song)?, AUDIO, "audio data is kept");
    Ok(())
}

#[test]
fn untagged_and_unsupported_files_are_not_counted() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    fs::write(temp.path().join("plain.mp3"), AUDIO)?;
    fs::write(temp.path().join("cover.jpg"), "jpeg")?;
    fs::write(temp.path().join("notes.txt"), "text")?;

    let summary = strip_metadata_recursive(temp.path(), &Interrupt::default()).unwrap();

    assert_eq!(summary, RunSummary::default());
    assert_eq!(fs::read(temp.path().join("plain.mp3"))?, AUDIO);
    Ok(())
}

#[test]
fn broken_file_fails_and_run_goes_on() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    fs::write(temp.path().join("a.m4a"), "this is no mpeg-4 container")?;
    tagged_mp3(&temp.path().join("b.mp3"))?;

    let summary = strip_metadata_recursive(temp.path(), &Interrupt::default()).unwrap();

    assert_eq!(
        summary,
        RunSummary {
            success_count: 1,
            skipped_count: 0,
            failed_count: 1,
        }
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("a.m4a"))?,
        "this is no mpeg-4 container"
    );
    Ok(())
}

#[test]
fn invalid_directory_is_one_failure() {
    let summary =
        strip_metadata_recursive(Path::new("/definitely/not/here"), &Interrupt::default())
            .unwrap();
    assert_eq!(summary, RunSummary::invalid_directory());
}

#[test]
fn pending_interrupt_is_propagated() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let song = temp.path().join("song.mp3");
    tagged_mp3(&song)?;
    let interrupt = Interrupt::default();
    interrupt.trigger();

    assert!(strip_metadata_recursive(temp.path(), &interrupt).is_err());
    assert!(id3::Tag::read_from_path(&song).is_ok(), "tags are untouched");
    Ok(())
}

#[cfg(unix)]
#[test]
fn unreadable_directory_fails_and_walk_goes_on() -> Result<(), Box<dyn Error>> {
    use std::os::unix::fs::PermissionsExt as _;

    let temp = tempdir()?;
    let locked = temp.path().join("a-locked");
    let later = temp.path().join("b-later");
    fs::create_dir(&locked)?;
    fs::create_dir(&later)?;
    tagged_mp3(&locked.join("hidden.mp3"))?;
    let song = later.join("song.mp3");
    tagged_mp3(&song)?;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

    // permissions do not bind a privileged user
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;
        return Ok(());
    }

    let summary = strip_metadata_recursive(temp.path(), &Interrupt::default()).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;

    assert_eq!(
        summary,
        RunSummary {
            success_count: 1,
            skipped_count: 0,
            failed_count: 1,
        }
    );
    assert_eq!(fs::read(&song)?, AUDIO);
    assert!(id3::Tag::read_from_path(locked.join("hidden.mp3")).is_ok());
    Ok(())
}
