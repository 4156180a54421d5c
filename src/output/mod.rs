//! Output module for Site-Mirror
//!
//! This module owns everything that ends up on disk or on the terminal:
//! - The mirror directory layout and write-once asset files
//! - Session statistics and the end-of-run summary

mod layout;
mod stats;

pub use layout::{write_once, AssetKind, LocalFile, OutputLayout};
pub use stats::{format_file_size, print_summary, progress_bar, MirrorStats};
