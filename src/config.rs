//! Gathering of user input at the boundary of each binary.
//!
//! Library functions never read the environment themselves. Each binary resolves its target
//! directory here, from the command line, the environment (through `clap`), or an interactive
//! prompt, and hands explicit values to the batch operations.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use dialoguer::Input;
use exn::{Exn, ResultExt as _};
use tracing::{debug, warn};

use crate::error::ErrorMessage;

/// Options shared by every binary.
#[derive(clap::Args, Debug)]
pub struct CommonArgs {
    /// Print more log output, repeat for even more detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write log output to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Load variables from a `.env` file in the working directory, if there is one.
///
/// Must run before the arguments are parsed, so `clap` can pick the variables up.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("loaded environment from {path:?}"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("could not load .env file: {e}"),
    }
}

/// Use the given directory, or ask for one if there is none.
pub fn directory_or_prompt(directory: Option<PathBuf>) -> Result<PathBuf, Exn<ErrorMessage>> {
    if let Some(directory) = directory {
        return Ok(directory);
    }

    let err = || ErrorMessage::new("Could not read the directory path");
    let answer: String = Input::new()
        .with_prompt("Enter the directory path")
        .interact_text()
        .or_raise(err)?;
    Ok(PathBuf::from(answer.trim()))
}

/// Use the given count, or keep asking until a positive integer is entered.
pub fn count_or_prompt(
    count: Option<NonZeroUsize>,
    prompt: &str,
) -> Result<NonZeroUsize, Exn<ErrorMessage>> {
    if let Some(count) = count {
        return Ok(count);
    }

    let err = || ErrorMessage::new("Could not read a positive number");
    let answer: usize = Input::new()
        .with_prompt(prompt)
        .validate_with(|value: &usize| match *value {
            0 => Err("🔢 Please enter a positive number."),
            _ => Ok(()),
        })
        .interact_text()
        .or_raise(err)?;
    NonZeroUsize::new(answer).ok_or_else(|| Exn::new(err()))
}
