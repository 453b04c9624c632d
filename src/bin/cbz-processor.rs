//! Recompress the images of every comic book archive in a directory, keeping a backup of each.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use media_janitor::app;
use media_janitor::config::{self, CommonArgs};
use media_janitor::interrupt::Interrupt;
use media_janitor::recompress::image::ImageSettings;
use media_janitor::recompress::{self, DEFAULT_MAX_HEIGHT, DEFAULT_QUALITY};

/// Shrink the .cbz archives of a directory by re-encoding their images as PNG
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory containing the archives, asked for if missing
    #[arg(env = "CBZ_PROCESSOR_DIR")]
    directory: Option<PathBuf>,

    /// How hard the PNG encoder tries, from 0 to 100
    #[arg(short, long, default_value_t = DEFAULT_QUALITY,
        value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: u8,

    /// Images taller than this are scaled down to it
    #[arg(long, default_value_t = DEFAULT_MAX_HEIGHT,
        value_parser = clap::value_parser!(u32).range(1..))]
    max_height: u32,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    config::load_dotenv();
    let args = Args::parse();
    let settings = ImageSettings {
        quality: args.quality,
        max_height: args.max_height,
    };

    app::main(&args.common, &recompress::TITLES, || {
        let directory = config::directory_or_prompt(args.directory)?;
        let interrupt = Interrupt::install()?;
        app::announce(&directory);
        Ok(recompress::process_directory(&directory, settings, &interrupt)?)
    })
}
