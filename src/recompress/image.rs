//! Contains everything related to dealing with individual images.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use exn::{Exn, ResultExt as _};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::debug;

use crate::error::ErrorMessage;

/// File extensions of the images that survive recompression.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Check if a path looks like one of the supported images, ignoring case.
pub fn is_image(path: &Path) -> bool {
    crate::walk::lowercase_extension(path)
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// How images get re-encoded.
#[derive(Debug, Clone, Copy)]
pub struct ImageSettings {
    /// Quality from 0 to 100, see [`ImageSettings::compression`].
    pub quality: u8,
    /// Images taller than this get scaled down to exactly this height.
    pub max_height: u32,
}

impl ImageSettings {
    /// PNG is lossless, so the quality only decides how hard the encoder tries.
    pub const fn compression(self) -> CompressionType {
        match self.quality {
            0..=33 => CompressionType::Fast,
            34..=66 => CompressionType::Default,
            _ => CompressionType::Best,
        }
    }

    /// The dimensions an image of the given size is scaled to, if it needs scaling at all.
    ///
    /// The width keeps the aspect ratio and is rounded to the closest pixel.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn target_size(self, width: u32, height: u32) -> Option<(u32, u32)> {
        if height <= self.max_height {
            return None;
        }
        let scaled = f64::from(width) * f64::from(self.max_height) / f64::from(height);
        let new_width = (scaled.round() as u32).max(1);
        Some((new_width, self.max_height))
    }
}

/// An image that was decoded from the scratch directory.
pub struct PageImage {
    /// The decoded raster.
    image: DynamicImage,
    /// Whether the file stored palette indices instead of colors.
    palette: bool,
}

impl PageImage {
    /// Decode the image at the given path.
    ///
    /// The format is sniffed from the content, as a previous pass may have left PNG data behind a
    /// `.jpg` name.
    pub fn open(path: &Path) -> Result<Self, Exn<ErrorMessage>> {
        let err = || {
            let path = path.display();
            ErrorMessage::new(format!("Could not decode the image \"{path}\""))
        };

        let reader = ImageReader::open(path)
            .or_raise(err)?
            .with_guessed_format()
            .or_raise(err)?;
        let palette = match reader.format() {
            Some(ImageFormat::Png) => is_indexed_png(path).or_raise(err)?,
            _ => false,
        };
        let image = reader.decode().or_raise(err)?;
        Ok(Self { image, palette })
    }

    /// Check if the image was stored with a color palette.
    pub const fn is_palette(&self) -> bool {
        self.palette
    }

    /// Normalize and downscale the image, then encode it as PNG.
    pub fn recompress(self, settings: ImageSettings) -> Result<Vec<u8>, Exn<ErrorMessage>> {
        let err = || ErrorMessage::new("Could not encode the image as PNG");

        let palette = self.is_palette();
        let mut image = self.image;
        if palette {
            debug!("convert palette image to rgb");
            image = DynamicImage::ImageRgb8(image.to_rgb8());
        }

        if let Some((width, height)) = settings.target_size(image.width(), image.height()) {
            debug!(
                "resize {}x{} to {width}x{height}",
                image.width(),
                image.height()
            );
            image = image.resize_exact(width, height, FilterType::Lanczos3);
        }

        let mut out = Cursor::new(Vec::new());
        let encoder =
            PngEncoder::new_with_quality(&mut out, settings.compression(), PngFilter::Adaptive);
        image.write_with_encoder(encoder).or_raise(err)?;
        Ok(out.into_inner())
    }
}

/// Read the PNG header for the color type, the decoded image already has the palette expanded.
fn is_indexed_png(path: &Path) -> Result<bool, png::DecodingError> {
    let file = BufReader::new(File::open(path)?);
    let reader = png::Decoder::new(file).read_info()?;
    Ok(reader.info().color_type == png::ColorType::Indexed)
}

#[cfg(test)]
mod tests {
    use std::io::BufWriter;

    use image::{ColorType, Rgb, RgbImage};

    use super::*;

    const SETTINGS: ImageSettings = ImageSettings {
        quality: 80,
        max_height: 1024,
    };

    #[test]
    fn only_tall_images_are_scaled() {
        assert_eq!(SETTINGS.target_size(800, 1024), None);
        assert_eq!(SETTINGS.target_size(2000, 500), None);
        assert_eq!(SETTINGS.target_size(1000, 2048), Some((500, 1024)));
    }

    #[test]
    fn scaled_width_is_rounded() {
        // 300 * 1024 / 2000 = 153.6
        assert_eq!(SETTINGS.target_size(300, 2000), Some((154, 1024)));
        // 301 * 1024 / 2048 = 150.5
        assert_eq!(SETTINGS.target_size(301, 2048), Some((151, 1024)));
        assert_eq!(SETTINGS.target_size(1, 100_000), Some((1, 1024)));
    }

    #[test]
    fn quality_selects_compression_effort() {
        let with = |quality| ImageSettings {
            quality,
            ..SETTINGS
        };
        assert!(matches!(with(0).compression(), CompressionType::Fast));
        assert!(matches!(with(50).compression(), CompressionType::Default));
        assert!(matches!(with(80).compression(), CompressionType::Best));
    }

    #[test]
    fn image_extensions_ignore_case() {
        assert!(is_image(Path::new("a/01.PNG")));
        assert!(is_image(Path::new("02.Jpeg")));
        assert!(!is_image(Path::new("ComicInfo.xml")));
        assert!(!is_image(Path::new("png")));
    }

    #[test]
    fn tall_jpeg_becomes_scaled_png() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("page.jpg");
        RgbImage::from_pixel(40, 200, Rgb([200, 30, 30]))
            .save_with_format(&path, ImageFormat::Jpeg)
            .unwrap();

        let settings = ImageSettings {
            quality: 80,
            max_height: 100,
        };
        let page = PageImage::open(&path).unwrap();
        assert!(!page.is_palette());
        let bytes = page.recompress(settings).unwrap();

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 100));
    }

    /// A 4x4 checkerboard stored as two palette entries, optionally with the first one transparent.
    fn write_indexed_png(path: &Path, transparent: bool) {
        let file = BufWriter::new(File::create(path).unwrap());
        let mut encoder = png::Encoder::new(file, 4, 4);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(vec![255, 0, 0, 0, 0, 255]);
        if transparent {
            encoder.set_trns(vec![0]);
        }
        let mut writer = encoder.write_header().unwrap();
        let pixels = (0..16_u8).map(|i| (i + i / 4) % 2).collect::<Vec<_>>();
        writer.write_image_data(&pixels).unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn palette_png_becomes_rgb() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("indexed.png");
        write_indexed_png(&path, false);

        let page = PageImage::open(&path).unwrap();
        assert!(page.is_palette());
        let bytes = page.recompress(SETTINGS).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb8);
        assert_eq!(decoded.to_rgb8().get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(decoded.to_rgb8().get_pixel(1, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn transparent_palette_png_becomes_rgb() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("indexed.png");
        write_indexed_png(&path, true);

        let page = PageImage::open(&path).unwrap();
        assert!(page.is_palette());
        let bytes = page.recompress(SETTINGS).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb8, "alpha is dropped");
        assert_eq!((decoded.width(), decoded.height()), (4, 4));
    }

    #[test]
    fn truecolor_png_keeps_its_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("page.png");
        image::GrayImage::from_pixel(8, 8, image::Luma([128]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let page = PageImage::open(&path).unwrap();
        assert!(!page.is_palette());
        let decoded = image::load_from_memory(&page.recompress(SETTINGS).unwrap()).unwrap();
        assert_eq!(decoded.color(), ColorType::L8);
    }
}
