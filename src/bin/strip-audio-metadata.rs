//! Remove the metadata tags of all MP3 and M4A files below a directory.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use media_janitor::config::{self, CommonArgs};
use media_janitor::interrupt::Interrupt;
use media_janitor::{app, audio};

/// Strip ID3 tags and MP4 metadata from an audio library, recursively
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory containing the audio files, asked for if missing
    #[arg(env = "MP3_METADATA_STRIPPER_DIR")]
    directory: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    config::load_dotenv();
    let args = Args::parse();

    app::main(&args.common, &audio::TITLES, || {
        let directory = config::directory_or_prompt(args.directory)?;
        let interrupt = Interrupt::install()?;
        app::announce(&directory);
        println!();
        println!("Starting to process audio files 🎵");
        println!();
        Ok(audio::strip_metadata_recursive(&directory, &interrupt)?)
    })
}
