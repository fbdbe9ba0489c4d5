/// Region classifier
///
/// Splits a label grid into one boolean mask per anatomical category. Names
/// are resolved once per distinct label; the per-pixel pass is a table
/// lookup.
use std::collections::{BTreeMap, HashMap};
use log::debug;

use super::category::Category;
use super::mask::Mask;
use crate::grid::{is_background, LabelGrid};
use crate::taxonomy::NameResolver;

#[derive(Debug, Clone)]
pub struct CategoryMasks {
    masks: [Mask; 5],
    assignments: BTreeMap<u32, Category>,
}

impl CategoryMasks {
    pub fn get(&self, category: Category) -> &Mask {
        &self.masks[category.index()]
    }

    pub fn head(&self) -> &Mask {
        self.get(Category::Head)
    }

    pub fn thorax(&self) -> &Mask {
        self.get(Category::Thorax)
    }

    pub fn abdomen(&self) -> &Mask {
        self.get(Category::Abdomen)
    }

    pub fn appendages(&self) -> &Mask {
        self.get(Category::Appendages)
    }

    /// Thorax and abdomen, the surface legs attach to
    pub fn trunk(&self) -> Mask {
        self.thorax().union(self.abdomen())
    }

    /// Head, thorax and abdomen
    pub fn body(&self) -> Mask {
        self.head().union(&self.trunk())
    }

    /// Category assigned to each distinct non-background label
    pub fn assignments(&self) -> &BTreeMap<u32, Category> {
        &self.assignments
    }

    /// Pixel count per category, in `Category::ALL` order
    pub fn pixel_counts(&self) -> BTreeMap<Category, usize> {
        Category::ALL
            .iter()
            .map(|&category| (category, self.get(category).count()))
            .collect()
    }
}

/// Assign every distinct label to a category and build the masks
pub fn classify_regions(grid: &LabelGrid, resolver: &mut NameResolver<'_>) -> CategoryMasks {
    let mut assignments = BTreeMap::new();
    for label in grid.distinct_labels() {
        let category = resolver
            .resolve(label)
            .map(Category::from_name)
            .unwrap_or(Category::Other);
        assignments.insert(label, category);
    }
    debug!(
        "Classified {} distinct labels with {} name lookups",
        assignments.len(),
        resolver.lookups()
    );

    // Flat lookup for the pixel pass
    let lookup: HashMap<u32, usize> = assignments
        .iter()
        .map(|(&label, category)| (label, category.index()))
        .collect();

    let (height, width) = (grid.height(), grid.width());
    let mut masks: [Mask; 5] = std::array::from_fn(|_| Mask::new(height, width));

    for (row, values) in grid.rows().enumerate() {
        for (col, &label) in values.iter().enumerate() {
            if is_background(label) {
                continue;
            }
            if let Some(&idx) = lookup.get(&label) {
                masks[idx].set(row, col, true);
            }
        }
    }

    CategoryMasks { masks, assignments }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::NameTable;
    use crate::test_utils::{taxonomy, GridBuilder, ABDOMEN, HEAD, LEG_LEFT, THORAX, UNKNOWN, WING};

    fn classify(grid: &LabelGrid) -> CategoryMasks {
        let names = taxonomy();
        let table = NameTable::build(&names, 0);
        let mut resolver = NameResolver::new(&table, &names);
        classify_regions(grid, &mut resolver)
    }

    #[test]
    fn test_masks_partition_labelled_pixels() {
        let grid = GridBuilder::new(8, 4)
            .rows(HEAD, 0..2)
            .rows(THORAX, 2..4)
            .rows(ABDOMEN, 4..6)
            .rect(LEG_LEFT, 3..7, 0..1)
            .rect(WING, 6..7, 2..4)
            .rect(UNKNOWN, 7..8, 3..4)
            .rect(65_535, 7..8, 0..1)
            .build();
        let masks = classify(&grid);

        for row in 0..grid.height() {
            for col in 0..grid.width() {
                let hits = Category::ALL
                    .iter()
                    .filter(|&&c| masks.get(c).get(row, col))
                    .count();
                let expected = usize::from(!is_background(grid.get(row, col)));
                assert_eq!(hits, expected, "pixel ({row}, {col})");
            }
        }

        assert_eq!(masks.assignments().get(&WING).copied(), Some(Category::Other));
        assert_eq!(masks.assignments().get(&UNKNOWN).copied(), Some(Category::Other));
        assert_eq!(masks.assignments().get(&LEG_LEFT).copied(), Some(Category::Appendages));
        assert_eq!(masks.assignments().get(&0).copied(), None);
        assert_eq!(masks.appendages().count(), 4);
    }

    #[test]
    fn test_one_lookup_per_distinct_label() {
        let grid = GridBuilder::new(200, 200)
            .rows(HEAD, 0..100)
            .rows(THORAX, 100..200)
            .build();
        let names = taxonomy();
        let table = NameTable::build(&names, 0);
        let mut resolver = NameResolver::new(&table, &names);
        let masks = classify_regions(&grid, &mut resolver);

        assert_eq!(resolver.lookups(), 2);
        assert_eq!(masks.head().count(), 20_000);
        assert_eq!(masks.trunk().count(), 20_000);
        assert_eq!(masks.body().count(), 40_000);
    }
}
