/// Overlay rendering for classified label grids
///
/// Produces the color-coded transparent RGBA image shown on top of the
/// specimen photograph.
pub mod palette;
pub mod renderer;

pub use palette::{category_color, OTHER_COLOR, PALETTE};
pub use renderer::render_overlay;
