/// Reading label grids and writing analysis results
///
/// Label grids come either as JSON (`{"height", "width", "labels"}` or nested
/// rows) or as single-channel 8/16-bit images. Overlays are written as PNG,
/// reports as pretty-printed JSON.
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::grid::{GridError, LabelGrid};
use crate::pipeline::BandReport;

/// Extensions accepted by `load_label_grid`
pub const GRID_EXTENSIONS: [&str; 6] = ["json", "png", "tif", "tiff", "pgm", "pnm"];

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Image(image::ImageError),
    Json(serde_json::Error),
    Grid(GridError),
    UnsupportedFormat(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Image(e) => write!(f, "Image error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::Grid(e) => write!(f, "{}", e),
            Error::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Image(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Grid(e) => Some(e),
            Error::UnsupportedFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<GridError> for Error {
    fn from(e: GridError) -> Self {
        Error::Grid(e)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GridFile {
    Flat {
        height: usize,
        width: usize,
        labels: Vec<u32>,
    },
    Rows(Vec<Vec<u32>>),
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.to_lowercase())
}

pub fn is_supported_grid(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| GRID_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_file(path: &Path) -> bool {
    fs::metadata(path).map(|metadata| metadata.is_file()).unwrap_or(false)
}

pub fn is_directory(path: &Path) -> bool {
    fs::metadata(path).map(|metadata| metadata.is_dir()).unwrap_or(false)
}

/// Load a label grid, picking the decoder from the file extension
pub fn load_label_grid(path: &Path) -> Result<LabelGrid, Error> {
    debug!("Loading label grid from {}", path.display());
    match extension_of(path).as_deref() {
        Some("json") => parse_label_grid_json(&fs::read_to_string(path)?),
        Some(ext) if GRID_EXTENSIONS.contains(&ext) => decode_label_image(image::open(path)?),
        _ => Err(Error::UnsupportedFormat(format!(
            "{} (expected one of: {})",
            path.display(),
            GRID_EXTENSIONS.join(", ")
        ))),
    }
}

pub fn parse_label_grid_json(content: &str) -> Result<LabelGrid, Error> {
    match serde_json::from_str::<GridFile>(content)? {
        GridFile::Flat { height, width, labels } => Ok(LabelGrid::new(height, width, labels)?),
        GridFile::Rows(rows) => Ok(LabelGrid::from_rows(rows)?),
    }
}

/// Convert a single-channel image into a label grid. Color images carry no
/// region IDs and are rejected.
pub fn decode_label_image(image: DynamicImage) -> Result<LabelGrid, Error> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let labels: Vec<u32> = match image {
        DynamicImage::ImageLuma8(buffer) => buffer.into_raw().into_iter().map(u32::from).collect(),
        DynamicImage::ImageLuma16(buffer) => buffer.into_raw().into_iter().map(u32::from).collect(),
        other => {
            return Err(Error::UnsupportedFormat(format!(
                "label images must be single-channel 8 or 16 bit, got {:?}",
                other.color()
            )))
        }
    };
    Ok(LabelGrid::new(height, width, labels)?)
}

pub fn save_overlay(path: &Path, overlay: &RgbaImage) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    overlay.save_with_format(path, ImageFormat::Png)?;
    debug!("Overlay written to {}", path.display());
    Ok(())
}

pub fn write_report(path: &Path, report: &BandReport) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    debug!("Report written to {}", path.display());
    Ok(())
}

/// Label grid files in `directory`, in natural order
pub fn list_label_grids(directory: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut paths: Vec<PathBuf> = fs::read_dir(directory)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| is_file(path) && is_supported_grid(path))
        .collect();

    // Sort paths like Nautilus file viewer. `paths.sort()` puts "grid10" before "grid2"
    alphanumeric_sort::sort_path_slice(&mut paths);
    Ok(paths)
}
