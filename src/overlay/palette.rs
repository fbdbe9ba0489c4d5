use crate::anatomy::Category;

/// Fixed category colors of the overlay
pub const PALETTE: [(Category, [u8; 3]); 4] = [
    (Category::Head, [31, 119, 180]),
    (Category::Thorax, [44, 160, 44]),
    (Category::Abdomen, [214, 39, 40]),
    (Category::Appendages, [148, 103, 189]),
];

/// Debug color for labels that fit no category
pub const OTHER_COLOR: [u8; 3] = [200, 200, 200];

/// Palette color of a category; `None` for `Other`
pub fn category_color(category: Category) -> Option<[u8; 3]> {
    PALETTE
        .iter()
        .find(|(c, _)| *c == category)
        .map(|&(_, rgb)| rgb)
}
