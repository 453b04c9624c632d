//! Contains everything related to handling zip archives.

use std::fs::{self, File};
use std::io::{BufReader, Write as _};
use std::path::{Component, Path};

use exn::{Exn, ResultExt as _};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::ErrorMessage;
use crate::recompress::dir::ScratchDir;
use crate::recompress::image::{ImageSettings, PageImage, is_image};

/// Number of bytes in one of the megabytes we report.
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Name of the directory inside the scratch directory that holds the extracted entries.
const EXTRACTED_DIR: &str = "extracted";

/// Name of the new archive while it is still inside the scratch directory.
const OUTPUT_ARCHIVE: &str = "recompressed.cbz";

/// Recompress all images of the archive at `path`, replacing it when done.
///
/// Returns the number of megabytes saved.
pub fn recompress_archive_in_place(
    path: &Path,
    settings: ImageSettings,
) -> Result<f64, Exn<ErrorMessage>> {
    recompress_archive(path, path, settings)
}

/// Recompress all images of the archive at `source` into a new archive at `destination`.
///
/// The archive gets extracted into a scratch directory next to `destination`. Every PNG or JPEG
/// in it is re-encoded as PNG, scaled down if it is too tall, and written into a new archive under
/// its original relative path. Everything else is dropped. The new archive then replaces
/// `destination` with a rename, so `destination` is either untouched or complete. The scratch
/// directory is removed on every path out of this function.
///
/// Returns the number of megabytes saved, which is negative if the archive grew.
pub fn recompress_archive(
    source: &Path,
    destination: &Path,
    settings: ImageSettings,
) -> Result<f64, Exn<ErrorMessage>> {
    let err = || {
        let source = source.display();
        ErrorMessage::new(format!("Failed to recompress the archive \"{source}\""))
    };

    let original_size = size_in_mb(source).or_raise(err)?;

    let scratch = ScratchDir::for_destination(destination).or_raise(err)?;
    let extracted = scratch.path().join(EXTRACTED_DIR);
    let output = scratch.path().join(OUTPUT_ARCHIVE);

    extract(source, &extracted).or_raise(err)?;
    let images = repack_images(&extracted, &output, settings).or_raise(err)?;
    let new_size = size_in_mb(&output).or_raise(err)?;

    fs::rename(&output, destination)
        .or_raise(|| {
            let destination = destination.display();
            ErrorMessage::new(format!("Could not move the new archive to \"{destination}\""))
        })
        .or_raise(err)?;

    let saved = original_size - new_size;
    info!("recompressed {images} images of {source:?}, saved {saved:.2} MB");
    Ok(saved)
}

/// Size of a file in megabytes.
#[expect(clippy::cast_precision_loss)]
pub fn size_in_mb(path: &Path) -> Result<f64, Exn<ErrorMessage>> {
    let err = || {
        let path = path.display();
        ErrorMessage::new(format!("Could not read the size of \"{path}\""))
    };

    let bytes = fs::metadata(path).or_raise(err)?.len();
    Ok(bytes as f64 / BYTES_PER_MB)
}

/// Unpack every entry of the archive into `target`.
fn extract(archive: &Path, target: &Path) -> Result<(), Exn<ErrorMessage>> {
    let err = || {
        let archive = archive.display();
        ErrorMessage::new(format!("Failed to extract the archive \"{archive}\""))
    };

    debug!("extracting {archive:?} to {target:?}");
    let file = File::open(archive).or_raise(err)?;
    let mut zip = ZipArchive::new(BufReader::new(file)).or_raise(err)?;
    fs::create_dir_all(target).or_raise(err)?;
    zip.extract(target).or_raise(err)?;
    Ok(())
}

/// Write all images found below `root` into a new archive at `output`.
///
/// Returns the number of images written.
fn repack_images(
    root: &Path,
    output: &Path,
    settings: ImageSettings,
) -> Result<usize, Exn<ErrorMessage>> {
    let err = || {
        let output = output.display();
        ErrorMessage::new(format!("Failed to write the archive \"{output}\""))
    };

    let file = File::create(output).or_raise(err)?;
    let mut zipper = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut count = 0;
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.or_raise(err)?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if !is_image(path) {
            debug!("dropping {path:?}");
            continue;
        }

        let name = entry_name(root, path).or_raise(err)?;
        debug!("recompressing {name}");
        let bytes = PageImage::open(path)
            .and_then(|image| image.recompress(settings))
            .or_raise(err)?;

        zipper.start_file(name.as_str(), options).or_raise(err)?;
        zipper.write_all(&bytes).or_raise(err)?;
        count += 1;
    }

    zipper.finish().or_raise(err)?;
    Ok(count)
}

/// The name of the archive entry for a file extracted below `root`.
///
/// Zip entries always use `/` as separator, whatever the platform.
fn entry_name(root: &Path, path: &Path) -> Result<String, Exn<ErrorMessage>> {
    let err = || {
        let path = path.display();
        ErrorMessage::new(format!("Could not build an archive entry name for \"{path}\""))
    };

    let relative = path.strip_prefix(root).or_raise(err)?;
    let parts = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            Component::Prefix(_)
            | Component::RootDir
            | Component::CurDir
            | Component::ParentDir => None,
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| Exn::new(err()))?;
    Ok(parts.join("/"))
}

/// Everything stored in an archive, as `(entry name, bytes)` pairs in archive order.
///
/// Directory entries are left out.
pub fn read_entries(archive: &Path) -> Result<Vec<(String, Vec<u8>)>, Exn<ErrorMessage>> {
    let err = || {
        let archive = archive.display();
        ErrorMessage::new(format!("Could not read the entries of \"{archive}\""))
    };

    let file = File::open(archive).or_raise(err)?;
    let mut zip = ZipArchive::new(BufReader::new(file)).or_raise(err)?;
    let mut entries = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).or_raise(err)?;
        if entry.is_dir() {
            continue;
        }
        let mut bytes = Vec::new();
        std::io::copy(&mut entry, &mut bytes).or_raise(err)?;
        entries.push((entry.name().to_owned(), bytes));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::path::PathBuf;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    const SETTINGS: ImageSettings = ImageSettings {
        quality: 80,
        max_height: 64,
    };

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        RgbImage::from_pixel(width, height, Rgb([10, 120, 240]))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    /// Paths of all files below `root`, relative to it.
    fn relative_files(root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .map(Result::unwrap)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.path().strip_prefix(root).unwrap().to_path_buf())
            .collect()
    }

    fn write_archive(path: &Path, entries: &[(&str, Vec<u8>)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, bytes) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn entry_names_use_forward_slashes() {
        let root = Path::new("scratch");
        let path = root.join("chapter 1").join("01.png");
        assert_eq!(entry_name(root, &path).unwrap(), "chapter 1/01.png");
    }

    #[test]
    fn keeps_structure_and_drops_other_files() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("book.cbz");
        write_archive(
            &source,
            &[
                ("ComicInfo.xml", b"<ComicInfo/>".to_vec()),
                ("ch1/01.png", png_bytes(32, 32)),
                ("ch1/02.PNG", png_bytes(32, 128)),
            ],
        );

        let destination = tmp.path().join("out.cbz");
        recompress_archive(&source, &destination, SETTINGS).unwrap();

        let entries = read_entries(&destination).unwrap();
        let names = entries.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["ch1/01.png", "ch1/02.PNG"]);

        let tall = image::load_from_memory(&entries[1].1).unwrap();
        assert_eq!((tall.width(), tall.height()), (16, 64));
        assert!(source.exists(), "source is left alone when writing elsewhere");
        assert!(!tmp.path().join(".out.cbz.scratch").exists());
    }

    #[test]
    fn corrupt_archive_is_left_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("broken.cbz");
        fs::write(&source, b"this is not a zip file").unwrap();

        let result = recompress_archive_in_place(&source, SETTINGS);

        assert!(result.is_err());
        assert_eq!(fs::read(&source).unwrap(), b"this is not a zip file");
        assert_eq!(relative_files(tmp.path()), [PathBuf::from("broken.cbz")]);
    }

    #[test]
    fn undecodable_image_aborts_without_replacing() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("book.cbz");
        write_archive(
            &source,
            &[
                ("01.png", png_bytes(8, 8)),
                ("02.jpg", b"definitely not a jpeg".to_vec()),
            ],
        );
        let before = fs::read(&source).unwrap();

        let result = recompress_archive_in_place(&source, SETTINGS);

        assert!(result.is_err());
        assert_eq!(fs::read(&source).unwrap(), before);
        assert_eq!(relative_files(tmp.path()), [PathBuf::from("book.cbz")]);
    }
}
