//! Synthetic specimens for unit tests
use std::collections::HashMap;
use std::ops::Range;

use crate::grid::LabelGrid;

pub const HEAD: u32 = 1;
pub const THORAX: u32 = 2;
pub const ABDOMEN: u32 = 3;
pub const LEG_LEFT: u32 = 11;
pub const LEG_RIGHT: u32 = 12;
pub const WING: u32 = 20;
/// Present in grids but absent from the taxonomy
pub const UNKNOWN: u32 = 99;

pub fn taxonomy() -> HashMap<u32, String> {
    [
        (HEAD, "Head"),
        (THORAX, "Thorax_L"),
        (ABDOMEN, "abdomen"),
        (LEG_LEFT, "leg_1_L"),
        (LEG_RIGHT, "Leg_1_R"),
        (WING, "wing"),
    ]
    .into_iter()
    .map(|(id, name)| (id, name.to_string()))
    .collect()
}

pub struct GridBuilder {
    height: usize,
    width: usize,
    labels: Vec<u32>,
}

impl GridBuilder {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            labels: vec![0; height * width],
        }
    }

    /// Paint whole rows
    pub fn rows(self, label: u32, rows: Range<usize>) -> Self {
        let width = self.width;
        self.rect(label, rows, 0..width)
    }

    /// Paint a rectangle, overwriting whatever is there
    pub fn rect(mut self, label: u32, rows: Range<usize>, cols: Range<usize>) -> Self {
        for row in rows {
            for col in cols.clone() {
                self.labels[row * self.width + col] = label;
            }
        }
        self
    }

    pub fn build(self) -> LabelGrid {
        LabelGrid::new(self.height, self.width, self.labels).expect("synthetic grid is valid")
    }
}
