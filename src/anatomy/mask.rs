use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;

/// Boolean pixel mask the size of a label grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    height: usize,
    width: usize,
    bits: Vec<bool>,
}

impl Mask {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            bits: vec![false; height * width],
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.bits[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        self.bits[row * self.width + col] = value;
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn any(&self) -> bool {
        self.bits.iter().any(|&b| b)
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Topmost row with a set pixel
    pub fn min_row(&self) -> Option<usize> {
        self.bits
            .chunks_exact(self.width)
            .position(|row| row.iter().any(|&b| b))
    }

    /// Bottommost row with a set pixel
    pub fn max_row(&self) -> Option<usize> {
        self.bits
            .chunks_exact(self.width)
            .rposition(|row| row.iter().any(|&b| b))
    }

    /// Row index of every set pixel, in row-major order
    pub fn set_rows(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(idx, _)| idx / self.width)
            .collect()
    }

    pub fn union(&self, other: &Mask) -> Mask {
        self.combine(other, |a, b| a || b)
    }

    pub fn intersection(&self, other: &Mask) -> Mask {
        self.combine(other, |a, b| a && b)
    }

    fn combine(&self, other: &Mask, op: impl Fn(bool, bool) -> bool) -> Mask {
        debug_assert_eq!((self.height, self.width), (other.height, other.width));
        Mask {
            height: self.height,
            width: self.width,
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(&a, &b)| op(a, b))
                .collect(),
        }
    }

    /// Grow the mask by `iterations` rounds of up/down/left/right expansion.
    /// Pixels outside the grid are never set and never propagate.
    pub fn dilate4(&self, iterations: usize) -> Mask {
        if iterations == 0 || !self.any() {
            return self.clone();
        }
        // The grid is convex, so k rounds of 4-neighbour growth equal one
        // L1 dilation of radius k. Radii above u8::MAX are applied in steps.
        let mut image = self.to_gray_image();
        let mut remaining = iterations;
        while remaining > 0 {
            let step = remaining.min(u8::MAX as usize);
            image = dilate(&image, Norm::L1, step as u8);
            remaining -= step;
        }
        Mask::from_gray_image(&image)
    }

    /// 0/255 grayscale image of the mask
    pub fn to_gray_image(&self) -> GrayImage {
        let mut image = GrayImage::new(self.width as u32, self.height as u32);
        for (pixel, &bit) in image.pixels_mut().zip(&self.bits) {
            *pixel = Luma([if bit { u8::MAX } else { 0 }]);
        }
        image
    }

    /// Mask of the non-zero pixels of `image`
    pub fn from_gray_image(image: &GrayImage) -> Mask {
        Mask {
            height: image.height() as usize,
            width: image.width() as usize,
            bits: image.pixels().map(|p| p.0[0] != 0).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_pixel(height: usize, width: usize, row: usize, col: usize) -> Mask {
        let mut mask = Mask::new(height, width);
        mask.set(row, col, true);
        mask
    }

    #[test]
    fn test_row_extents() {
        let mut mask = Mask::new(6, 4);
        assert_eq!(mask.min_row(), None);
        assert_eq!(mask.max_row(), None);

        mask.set(2, 1, true);
        mask.set(4, 3, true);
        assert_eq!(mask.min_row(), Some(2));
        assert_eq!(mask.max_row(), Some(4));
        assert_eq!(mask.set_rows(), vec![2, 4]);
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn test_dilate_is_manhattan_ball() {
        let mask = single_pixel(9, 9, 4, 4);
        let dilated = mask.dilate4(2);
        for row in 0..9usize {
            for col in 0..9usize {
                let dist = row.abs_diff(4) + col.abs_diff(4);
                assert_eq!(dilated.get(row, col), dist <= 2, "pixel ({row}, {col})");
            }
        }
    }

    #[test]
    fn test_dilate_clips_at_border() {
        let mask = single_pixel(3, 3, 0, 0);
        let dilated = mask.dilate4(1);
        assert_eq!(dilated.count(), 3);
        assert!(dilated.get(1, 0) && dilated.get(0, 1));
        assert!(!dilated.get(1, 1));
    }

    #[test]
    fn test_dilate_large_radius_in_steps() {
        let mask = single_pixel(1, 600, 0, 0);
        let dilated = mask.dilate4(300);
        assert_eq!(dilated.count(), 301);
        assert!(dilated.get(0, 300));
        assert!(!dilated.get(0, 301));
    }

    #[test]
    fn test_gray_image_conversion() {
        let mut mask = Mask::new(2, 3);
        mask.set(1, 2, true);
        let image = mask.to_gray_image();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [255]);
        assert_eq!(Mask::from_gray_image(&image), mask);
    }

    #[test]
    fn test_union_and_intersection() {
        let a = single_pixel(2, 2, 0, 0);
        let b = a.dilate4(1);
        assert_eq!(a.union(&b).count(), 3);
        assert_eq!(a.intersection(&b), a);
    }
}
