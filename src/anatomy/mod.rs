/// Anatomical landmark inference
///
/// This module classifies region labels into body-region categories, splits
/// the appendage mask into leg components and locates the thorax band.
pub mod category;
pub mod classifier;
pub mod components;
pub mod landmarks;
pub mod mask;

pub use category::Category;
pub use classifier::{classify_regions, CategoryMasks};
pub use components::{extract_components, extract_leg_components, LegComponent};
pub use landmarks::{detect_thorax_band, BottomSource, Detection, ThoraxBand, TopSource};
pub use mask::Mask;
