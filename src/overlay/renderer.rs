/// RGBA overlay rendering
///
/// Paints each pixel with the palette color of its label's category. Pixels
/// of background or `other` labels stay fully transparent unless the debug
/// gray is requested.
use std::collections::HashMap;
use image::RgbaImage;
use rayon::prelude::*;

use super::palette::{category_color, OTHER_COLOR};
use crate::anatomy::{Category, CategoryMasks};
use crate::config::RenderOptions;
use crate::grid::LabelGrid;

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Per-label RGBA color, resolved once before the pixel pass
fn label_colors(masks: &CategoryMasks, options: &RenderOptions) -> HashMap<u32, [u8; 4]> {
    masks
        .assignments()
        .iter()
        .filter_map(|(&label, &category)| {
            let rgb = match category {
                Category::Other if options.render_other => Some(OTHER_COLOR),
                _ => category_color(category),
            }?;
            Some((label, [rgb[0], rgb[1], rgb[2], 255]))
        })
        .collect()
}

pub fn render_overlay(grid: &LabelGrid, masks: &CategoryMasks, options: &RenderOptions) -> RgbaImage {
    let (width, height) = (grid.width(), grid.height());
    let colors = label_colors(masks, options);

    let mut image = RgbaImage::new(width as u32, height as u32);
    image
        .par_chunks_mut(width * 4)
        .zip(grid.labels().par_chunks(width))
        .for_each(|(out_row, labels)| {
            for (pixel, label) in out_row.chunks_exact_mut(4).zip(labels) {
                let rgba = colors.get(label).unwrap_or(&TRANSPARENT);
                pixel.copy_from_slice(rgba);
            }
        });

    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::classify_regions;
    use crate::grid::is_background;
    use crate::taxonomy::{NameResolver, NameTable};
    use crate::test_utils::{taxonomy, GridBuilder, ABDOMEN, HEAD, LEG_LEFT, THORAX, UNKNOWN, WING};

    fn render(grid: &LabelGrid, options: RenderOptions) -> RgbaImage {
        let names = taxonomy();
        let table = NameTable::build(&names, 0);
        let mut resolver = NameResolver::new(&table, &names);
        let masks = classify_regions(grid, &mut resolver);
        render_overlay(grid, &masks, &options)
    }

    fn specimen() -> LabelGrid {
        GridBuilder::new(10, 6)
            .rows(HEAD, 0..2)
            .rows(THORAX, 2..4)
            .rows(ABDOMEN, 4..6)
            .rect(LEG_LEFT, 2..8, 0..1)
            .rect(WING, 6..7, 3..6)
            .rect(UNKNOWN, 7..8, 3..4)
            .rect(65_535, 9..10, 0..6)
            .build()
    }

    #[test]
    fn test_colors_and_alpha() {
        let grid = specimen();
        let image = render(&grid, RenderOptions::default());
        assert_eq!(image.dimensions(), (6, 10));

        assert_eq!(image.get_pixel(1, 0).0, [31, 119, 180, 255]);
        assert_eq!(image.get_pixel(3, 3).0, [44, 160, 44, 255]);
        assert_eq!(image.get_pixel(3, 5).0, [214, 39, 40, 255]);
        assert_eq!(image.get_pixel(0, 7).0, [148, 103, 189, 255]);
        // wing and unknown labels are `other`
        assert_eq!(image.get_pixel(4, 6).0[3], 0);
        assert_eq!(image.get_pixel(3, 7).0[3], 0);

        for (x, y, pixel) in image.enumerate_pixels() {
            let label = grid.get(y as usize, x as usize);
            if is_background(label) {
                assert_eq!(pixel.0[3], 0, "background pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_render_other_debug_gray() {
        let grid = specimen();
        let image = render(&grid, RenderOptions { render_other: true });
        assert_eq!(image.get_pixel(4, 6).0, [200, 200, 200, 255]);
        assert_eq!(image.get_pixel(3, 7).0, [200, 200, 200, 255]);
        assert_eq!(image.get_pixel(0, 9).0, [0, 0, 0, 0]);
    }
}
