//! Cut a fixed number of leading characters off every file name below a directory.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use media_janitor::config::{self, CommonArgs};
use media_janitor::interrupt::Interrupt;
use media_janitor::{app, trim};

/// Question asked when no character count was given.
const CHARS_PROMPT: &str =
    "Enter the number of characters to remove from the beginning of each filename";

/// Remove a prefix of fixed length from file names, recursively
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory containing the files, asked for if missing
    #[arg(env = "TRIM_FILENAMES_DIR")]
    directory: Option<PathBuf>,

    /// Number of characters to remove, asked for if missing
    #[arg(short, long)]
    chars: Option<NonZeroUsize>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    config::load_dotenv();
    let args = Args::parse();

    app::main(&args.common, &trim::TITLES, || {
        let directory = config::directory_or_prompt(args.directory)?;
        app::announce(&directory);
        let chars = config::count_or_prompt(args.chars, CHARS_PROMPT)?;
        let interrupt = Interrupt::install()?;
        Ok(trim::trim_filenames_recursive(&directory, chars, &interrupt)?)
    })
}
