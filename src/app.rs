//! The frame shared by all binaries: logging, exit codes and the final summary.

use std::path::Path;
use std::process::ExitCode;

use exn::Exn;
use tracing::debug;

use crate::config::CommonArgs;
use crate::error::{ErrorMessage, Interrupted};
use crate::logging;
use crate::summary::{RunSummary, SummaryTitles};

/// Exit code after the user interrupted a run, as a shell reports a `SIGINT`.
const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Why a binary stopped before it could print a summary.
#[derive(Debug)]
pub enum Abort {
    /// The input needed to start the run could not be gathered.
    Config(Exn<ErrorMessage>),
    /// The user interrupted the run.
    Interrupted(Exn<Interrupted>),
}

impl From<Exn<ErrorMessage>> for Abort {
    fn from(exn: Exn<ErrorMessage>) -> Self {
        Self::Config(exn)
    }
}

impl From<Exn<Interrupted>> for Abort {
    fn from(exn: Exn<Interrupted>) -> Self {
        Self::Interrupted(exn)
    }
}

impl Abort {
    /// Tell the user and pick the exit code.
    fn exit(self) -> ExitCode {
        match self {
            Self::Config(exn) => {
                debug!("{exn:?}");
                eprintln!("Error: {exn}");
                ExitCode::FAILURE
            }
            Self::Interrupted(exn) => {
                println!();
                println!("{exn}.");
                ExitCode::from(INTERRUPTED_EXIT_CODE)
            }
        }
    }
}

/// Set up logging, run the batch operation and print its summary.
///
/// `run` gathers its own input, so prompts happen after logging is ready.
pub fn main<F>(common: &CommonArgs, titles: &SummaryTitles, run: F) -> ExitCode
where
    F: FnOnce() -> Result<RunSummary, Abort>,
{
    // flushes the log file when dropped
    let _guard = match logging::init(common.verbose, common.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(exn) => return Abort::from(exn).exit(),
    };

    match run() {
        Ok(summary) => {
            debug!("finished with {summary:?}");
            print!("{}", summary.report(titles));
            ExitCode::SUCCESS
        }
        Err(abort) => abort.exit(),
    }
}

/// Announce the directory a run works on.
pub fn announce(directory: &Path) {
    println!("📁 Processing directory: {}", directory.display());
}
