/// Label grid produced by the segmentation model
///
/// A dense `height x width` map of region IDs in row-major order. The grid is
/// validated once on construction, so every consumer downstream can assume a
/// rectangular, non-empty shape.
use std::collections::BTreeSet;
use std::fmt;

/// Label values the model uses for "no label"
pub const BACKGROUND_LABELS: [u32; 3] = [0, 65_535, 0xFFFF_FFFF];

/// Returns true for the reserved "unlabeled" sentinels
#[inline]
pub fn is_background(label: u32) -> bool {
    BACKGROUND_LABELS.contains(&label)
}

/// Reasons a label grid is rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Zero rows or zero columns
    Empty,
    /// A row whose length differs from the first row
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// `height * width` does not fit in memory addressing, or a side does
    /// not fit the `u32` dimensions of an image buffer
    TooLarge { height: usize, width: usize },
    /// Flat buffer length does not match `height * width`
    SizeMismatch {
        height: usize,
        width: usize,
        len: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::Empty => write!(f, "invalid grid: zero area"),
            GridError::Ragged { row, expected, found } => write!(
                f,
                "invalid grid: row {} has {} columns, expected {}",
                row, found, expected
            ),
            GridError::TooLarge { height, width } => {
                write!(f, "invalid grid: {}x{} is too large", height, width)
            }
            GridError::SizeMismatch { height, width, len } => write!(
                f,
                "invalid grid: {}x{} needs {} labels, got {}",
                height,
                width,
                height.saturating_mul(*width),
                len
            ),
        }
    }
}

impl std::error::Error for GridError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGrid {
    height: usize,
    width: usize,
    labels: Vec<u32>,
}

impl LabelGrid {
    /// Build a grid from a row-major buffer
    pub fn new(height: usize, width: usize, labels: Vec<u32>) -> Result<Self, GridError> {
        if height == 0 || width == 0 {
            return Err(GridError::Empty);
        }
        let area = height
            .checked_mul(width)
            .filter(|_| u32::try_from(height).is_ok() && u32::try_from(width).is_ok())
            .ok_or(GridError::TooLarge { height, width })?;
        if labels.len() != area {
            return Err(GridError::SizeMismatch {
                height,
                width,
                len: labels.len(),
            });
        }
        Ok(Self { height, width, labels })
    }

    /// Build a grid from nested rows, rejecting ragged input
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(GridError::Empty);
        }

        let mut labels = Vec::with_capacity(height.saturating_mul(width));
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != width {
                return Err(GridError::Ragged {
                    row,
                    expected: width,
                    found: values.len(),
                });
            }
            labels.extend(values);
        }

        Self::new(height, width, labels)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.labels[row * self.width + col]
    }

    /// Iterate over rows as slices
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.labels.chunks_exact(self.width)
    }

    /// Distinct non-background labels, in ascending order
    pub fn distinct_labels(&self) -> Vec<u32> {
        let set: BTreeSet<u32> = self
            .labels
            .iter()
            .copied()
            .filter(|&label| !is_background(label))
            .collect();
        set.into_iter().collect()
    }
}
