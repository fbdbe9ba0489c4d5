/// End-to-end analysis of one label grid
///
/// Classification feeds both the landmark detector and the overlay renderer,
/// so the two outputs always describe the same masks. Nothing here is
/// mutated across calls: an `Analyzer` can be shared between threads and
/// each `analyze` call builds its own name cache.
use std::collections::BTreeMap;
use image::RgbaImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::anatomy::{
    classify_regions, detect_thorax_band, extract_leg_components, BottomSource, Category,
    CategoryMasks, Detection, ThoraxBand, TopSource,
};
use crate::config::{AnalysisConfig, AttachmentPolicy};
use crate::grid::LabelGrid;
use crate::overlay::render_overlay;
use crate::taxonomy::{NameResolver, NameSource, NameTable};
use crate::utils::timing::StageTimer;

pub struct Analysis {
    pub overlay: RgbaImage,
    pub detection: Detection,
    pub masks: CategoryMasks,
    /// Leg components that survived the noise filter
    pub leg_components: usize,
}

impl Analysis {
    pub fn band(&self) -> ThoraxBand {
        self.detection.band
    }

    pub fn report(&self, policy: AttachmentPolicy) -> BandReport {
        BandReport {
            thorax_top: self.detection.band.top,
            thorax_bottom: self.detection.band.bottom,
            height: self.overlay.height() as usize,
            width: self.overlay.width() as usize,
            top_source: self.detection.top_source,
            bottom_source: self.detection.bottom_source,
            policy,
            leg_components: self.leg_components,
            legs_used: self.detection.legs_used,
            contact_depths: self.detection.contact_depths.clone(),
            category_pixels: self.masks.pixel_counts(),
        }
    }
}

/// Serializable summary of an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandReport {
    pub thorax_top: usize,
    pub thorax_bottom: usize,
    pub height: usize,
    pub width: usize,
    pub top_source: TopSource,
    pub bottom_source: BottomSource,
    pub policy: AttachmentPolicy,
    pub leg_components: usize,
    pub legs_used: usize,
    pub contact_depths: Vec<usize>,
    pub category_pixels: BTreeMap<Category, usize>,
}

/// Analysis entry point holding a taxonomy snapshot
pub struct Analyzer<'a> {
    source: &'a dyn NameSource,
    table: NameTable,
    config: AnalysisConfig,
}

impl<'a> Analyzer<'a> {
    pub fn new(source: &'a dyn NameSource, config: AnalysisConfig) -> Self {
        let table = NameTable::build(source, config.probe_limit);
        Self {
            source,
            table,
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn table(&self) -> &NameTable {
        &self.table
    }

    pub fn analyze(&self, grid: &LabelGrid) -> Analysis {
        let _timer = StageTimer::new("analysis");
        debug!("Analyzing {}x{} label grid", grid.height(), grid.width());

        let masks = {
            let _timer = StageTimer::new("classification");
            let mut resolver = NameResolver::new(&self.table, self.source);
            classify_regions(grid, &mut resolver)
        };

        let landmarks = &self.config.landmarks;
        let (detection, leg_components) = {
            let _timer = StageTimer::new("landmark detection");
            let legs = extract_leg_components(masks.appendages(), landmarks.noise_threshold);
            (detect_thorax_band(&masks, &legs, grid.height(), landmarks), legs.len())
        };

        let overlay = {
            let _timer = StageTimer::new("overlay rendering");
            render_overlay(grid, &masks, &self.config.render)
        };

        info!(
            "Thorax band detected: {} - {}",
            detection.band.top, detection.band.bottom
        );

        Analysis {
            overlay,
            detection,
            masks,
            leg_components,
        }
    }
}

/// Overlay and thorax band of `grid` with default settings
pub fn classify_and_render(grid: &LabelGrid, names: &dyn NameSource) -> (RgbaImage, ThoraxBand) {
    let analysis = Analyzer::new(names, AnalysisConfig::default()).analyze(grid);
    let band = analysis.band();
    (analysis.overlay, band)
}
