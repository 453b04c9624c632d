//! Batch maintenance for personal media libraries.
//!
//! Three independent operations, each walking a directory and reporting a [`RunSummary`]:
//!
//! - [`recompress::process_directory`] re-encodes the images inside comic book archives,
//! - [`audio::strip_metadata_recursive`] removes the tags of MP3 and M4A files,
//! - [`trim::trim_filenames_recursive`] cuts a fixed prefix off file names.
//!
//! Each has a binary of the same purpose in `src/bin`.

pub mod app;
pub mod audio;
pub mod config;
pub mod console;
pub mod error;
pub mod interrupt;
pub mod logging;
pub mod recompress;
pub mod summary;
pub mod trim;
pub mod walk;

pub use summary::RunSummary;
