//! Thorax band estimation for segmented insect specimens.
//!
//! A segmentation model labels every pixel of a specimen photograph with a
//! region ID. This crate names those regions through a taxonomy, groups them
//! into head, thorax, abdomen and appendages, renders a color-coded overlay
//! and locates the vertical band occupied by the thorax.

pub mod anatomy;
pub mod build_info;
pub mod config;
pub mod file_io;
pub mod grid;
pub mod logging;
pub mod overlay;
pub mod pipeline;
pub mod settings;
pub mod taxonomy;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use anatomy::{Category, ThoraxBand};
pub use config::{AnalysisConfig, AttachmentPolicy};
pub use grid::{GridError, LabelGrid};
pub use pipeline::{classify_and_render, Analysis, Analyzer, BandReport};
pub use taxonomy::{LabelHierarchy, NameSource};
