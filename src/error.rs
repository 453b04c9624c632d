//! Error types shared by all utilities.

use derive_more::Display;
use tracing::debug;

/// A human readable description of what went wrong.
///
/// These are chained into an [`exn::Exn`] tree, so each layer only describes its own step.
#[derive(Debug, Display)]
pub struct ErrorMessage(String);

impl std::error::Error for ErrorMessage {}

impl ErrorMessage {
    /// Create a new message, which is also logged when debugging.
    pub fn new(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        debug!("{msg}");
        Self(msg)
    }
}

/// The user asked to stop the current run.
///
/// This is kept apart from [`ErrorMessage`] so an interrupt is never counted as the failure of a
/// single file.
#[derive(Debug, Display)]
#[display("Process interrupted by user")]
pub struct Interrupted;

impl std::error::Error for Interrupted {}
