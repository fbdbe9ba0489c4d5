/// Taxonomy handling
///
/// Loads the label hierarchy that names the segmentation model's region IDs
/// and resolves IDs to names for classification.
pub mod hierarchy;
pub mod resolver;

pub use hierarchy::{LabelHierarchy, LabelNode};
pub use resolver::{scan_id_range, FnNameSource, NameResolver, NameSource, NameTable, ScanReport, TableOrigin};
