//! Human facing output while a batch is running.

use std::borrow::Cow;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

/// Progress indicator with a place to print per-file messages.
///
/// Messages are printed to stdout while the bar is suspended, so they show up even when stdout is
/// not a terminal and the bar itself stays hidden.
pub struct Console {
    /// The progress indicator, drawn to stderr.
    bar: ProgressBar,
}

impl Console {
    /// A bar that counts up to a known number of entries.
    pub fn counted(len: usize, title: &'static str) -> Self {
        let bar = ProgressBar::new(len as u64);
        Self::styled(bar, "{prefix} [{bar:30}] {pos}/{len} {wide_msg}", title)
    }

    /// A spinner for walks where the number of files is not known up front.
    pub fn spinner(title: &'static str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.enable_steady_tick(Duration::from_millis(120));
        Self::styled(bar, "{spinner} {prefix} {pos} files {wide_msg}", title)
    }

    /// Apply the template shared by all bars.
    fn styled(bar: ProgressBar, template: &str, title: &'static str) -> Self {
        match ProgressStyle::with_template(template) {
            Ok(style) => bar.set_style(style.progress_chars("=> ")),
            Err(e) => warn!("invalid progress template: {e}"),
        }
        bar.set_prefix(title);
        Self { bar }
    }

    /// Print a line for the user.
    pub fn line(&self, msg: impl AsRef<str>) {
        self.bar.suspend(|| println!("{}", msg.as_ref()));
    }

    /// Show which file is being worked on.
    pub fn working_on(&self, name: impl Into<Cow<'static, str>>) {
        self.bar.set_message(name);
    }

    /// Advance the bar by one file.
    pub fn advance(&self) {
        self.bar.inc(1);
    }

    /// Remove the bar from the terminal.
    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}
