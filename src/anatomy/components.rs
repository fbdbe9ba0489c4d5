/// Connected-component extraction over the appendage mask
///
/// Components use 4-connectivity (no diagonals). Each one keeps its pixels
/// and bounding box so the landmark detector can dilate it locally instead
/// of over the whole grid: a full-mask dilation per leg costs O(H*W*radius)
/// while the windowed search only touches the leg's bounding box plus the
/// radius.
use std::collections::{HashMap, VecDeque};
use image::Luma;
use imageproc::region_labelling::{connected_components, Connectivity};
use log::debug;

use super::mask::Mask;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegComponent {
    /// Extraction index among all components, noise included
    pub id: usize,
    pub row_start: usize,
    /// Exclusive
    pub row_end: usize,
    pub col_start: usize,
    /// Exclusive
    pub col_end: usize,
    pub pixels: Vec<(usize, usize)>,
}

impl LegComponent {
    pub fn extent(&self) -> usize {
        self.row_end - self.row_start
    }

    pub fn deepest_row(&self) -> usize {
        self.row_end - 1
    }

    /// Deepest row where this component, dilated by `radius` rounds of
    /// 4-neighbour expansion, overlaps `trunk`.
    pub fn attachment_depth(&self, trunk: &Mask, radius: usize) -> Option<usize> {
        let (height, width) = (trunk.height(), trunk.width());
        let r0 = self.row_start.saturating_sub(radius);
        let r1 = (self.row_end + radius).min(height);
        let c0 = self.col_start.saturating_sub(radius);
        let c1 = (self.col_end + radius).min(width);
        let (lh, lw) = (r1 - r0, c1 - c0);

        // Breadth-first distance from the component, capped at `radius`.
        // Equivalent to iterated dilation: every cell within Manhattan
        // distance `radius` lies inside this window.
        let mut dist = vec![usize::MAX; lh * lw];
        let mut queue = VecDeque::with_capacity(self.pixels.len());
        for &(row, col) in &self.pixels {
            let idx = (row - r0) * lw + (col - c0);
            dist[idx] = 0;
            queue.push_back((row - r0, col - c0));
        }

        while let Some((lr, lc)) = queue.pop_front() {
            let d = dist[lr * lw + lc];
            if d == radius {
                continue;
            }
            for (nr, nc) in neighbours4(lr, lc, lh, lw) {
                let nidx = nr * lw + nc;
                if dist[nidx] == usize::MAX {
                    dist[nidx] = d + 1;
                    queue.push_back((nr, nc));
                }
            }
        }

        let deepest = (0..lh).rev().find(|&lr| {
            (0..lw).any(|lc| dist[lr * lw + lc] != usize::MAX && trunk.get(r0 + lr, c0 + lc))
        });
        deepest.map(|lr| r0 + lr)
    }
}

fn neighbours4(row: usize, col: usize, height: usize, width: usize) -> impl Iterator<Item = (usize, usize)> {
    let up = (row > 0).then(|| (row - 1, col));
    let down = (row + 1 < height).then(|| (row + 1, col));
    let left = (col > 0).then(|| (row, col - 1));
    let right = (col + 1 < width).then(|| (row, col + 1));
    [up, down, left, right].into_iter().flatten()
}

/// Label every 4-connected component of `mask`, in row-major discovery order
pub fn extract_components(mask: &Mask) -> Vec<LegComponent> {
    if !mask.any() {
        return Vec::new();
    }
    let labels = connected_components(&mask.to_gray_image(), Connectivity::Four, Luma([0u8]));

    // Region labels are folded in raster order, so every component's first
    // pixel is its topmost-leftmost one
    let mut by_label: HashMap<u32, usize> = HashMap::new();
    let mut components: Vec<LegComponent> = Vec::new();
    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel.0[0];
        if label == 0 {
            continue;
        }
        let (row, col) = (y as usize, x as usize);
        let slot = *by_label.entry(label).or_insert_with(|| {
            components.push(LegComponent {
                id: components.len(),
                row_start: row,
                row_end: row + 1,
                col_start: col,
                col_end: col + 1,
                pixels: Vec::new(),
            });
            components.len() - 1
        });

        let component = &mut components[slot];
        component.pixels.push((row, col));
        component.row_end = component.row_end.max(row + 1);
        component.col_start = component.col_start.min(col);
        component.col_end = component.col_end.max(col + 1);
    }

    components
}

/// Components tall enough to be legs. Shorter ones are segmentation noise.
pub fn extract_leg_components(mask: &Mask, noise_threshold: usize) -> Vec<LegComponent> {
    let all = extract_components(mask);
    let total = all.len();
    let legs: Vec<LegComponent> = all
        .into_iter()
        .filter(|c| c.extent() >= noise_threshold)
        .collect();

    debug!(
        "Appendage components: {} found, {} kept (noise threshold {} rows)",
        total,
        legs.len(),
        noise_threshold
    );
    legs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> Mask {
        let mut mask = Mask::new(rows.len(), rows[0].len());
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                mask.set(r, c, ch == '#');
            }
        }
        mask
    }

    #[test]
    fn test_four_connectivity() {
        let mask = mask_from(&[
            "#..#",
            ".#.#",
            "...#",
            "##..",
        ]);
        let components = extract_components(&mask);
        // Diagonal neighbours are separate components
        assert_eq!(components.len(), 4);
        assert_eq!(components[0].pixels, vec![(0, 0)]);
        assert_eq!(components[1].row_start, 0);
        assert_eq!(components[1].row_end, 3);
        assert_eq!(components[1].col_start, 3);
        assert_eq!(components[2].pixels, vec![(1, 1)]);
        assert_eq!(components[3].extent(), 1);
        assert_eq!(components[3].pixels.len(), 2);

        let total: usize = components.iter().map(|c| c.pixels.len()).sum();
        assert_eq!(total, mask.count());
    }

    #[test]
    fn test_noise_filter() {
        let mut mask = Mask::new(30, 6);
        // 9 rows tall: noise
        for row in 0..9 {
            mask.set(row, 0, true);
        }
        // exactly 10 rows tall: kept
        for row in 5..15 {
            mask.set(row, 4, true);
        }
        let legs = extract_leg_components(&mask, 10);
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].id, 1);
        assert_eq!(legs[0].extent(), 10);
        assert_eq!(legs[0].deepest_row(), 14);
    }

    #[test]
    fn test_attachment_depth_bridges_gap() {
        // Trunk occupies rows 0..10, then a 4-row gap before the leg
        let mut trunk = Mask::new(40, 5);
        for row in 0..10 {
            for col in 0..5 {
                trunk.set(row, col, true);
            }
        }
        let mut legs = Mask::new(40, 5);
        for row in 14..30 {
            legs.set(row, 2, true);
        }
        let leg = &extract_components(&legs)[0];

        assert_eq!(leg.attachment_depth(&trunk, 4), None);
        assert_eq!(leg.attachment_depth(&trunk, 5), Some(9));
        assert_eq!(leg.attachment_depth(&trunk, 10), Some(9));
    }

    #[test]
    fn test_attachment_depth_matches_full_dilation() {
        let mut trunk = Mask::new(20, 20);
        for row in 3..8 {
            for col in 12..20 {
                trunk.set(row, col, true);
            }
        }
        let mut legs = Mask::new(20, 20);
        for row in 10..18 {
            legs.set(row, 6, true);
        }
        let leg = &extract_components(&legs)[0];

        for radius in 0..12 {
            let expected = legs.dilate4(radius).intersection(&trunk).max_row();
            assert_eq!(leg.attachment_depth(&trunk, radius), expected, "radius {radius}");
        }
    }
}
