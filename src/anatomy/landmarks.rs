/// Thorax band detection
///
/// The upper edge of the thorax is the head/thorax interface. The lower edge
/// is where the legs attach to the trunk: the deepest-reaching legs are
/// dilated to bridge small segmentation gaps, and the deepest row where they
/// touch the trunk is taken as the attachment depth.
///
/// Every path ends in the same clamp, so the band always lies inside the
/// grid with `top <= bottom`.
use log::debug;
use serde::{Deserialize, Serialize};

use super::classifier::CategoryMasks;
use super::components::LegComponent;
use crate::config::{AttachmentPolicy, LandmarkConfig};

/// Vertical pixel range of the thorax, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThoraxBand {
    pub top: usize,
    pub bottom: usize,
}

impl ThoraxBand {
    pub fn height(&self) -> usize {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopSource {
    Default,
    HeadThoraxMidpoint,
    HeadOnly,
    ThoraxOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottomSource {
    Default,
    LegContact,
    ThoraxFallback,
    SanityReset,
}

/// Band plus how each edge was obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub band: ThoraxBand,
    pub top_source: TopSource,
    pub bottom_source: BottomSource,
    /// Leg components that contributed a contact depth
    pub legs_used: usize,
    pub contact_depths: Vec<usize>,
    /// The minimum band height had to be enforced
    pub widened: bool,
}

pub fn detect_thorax_band(
    masks: &CategoryMasks,
    legs: &[LegComponent],
    height: usize,
    config: &LandmarkConfig,
) -> Detection {
    let (top, top_source) = estimate_top(masks, height, config);
    let estimate = estimate_bottom(masks, legs, height, config);
    let (band, widened) = finalize(top, estimate.bottom, height, config);

    debug!(
        "Thorax band: top={} ({:?}), bottom={} ({:?}), legs used={}, widened={}",
        band.top, top_source, band.bottom, estimate.source, estimate.depths.len(), widened
    );

    Detection {
        band,
        top_source,
        bottom_source: estimate.source,
        legs_used: estimate.legs_used,
        contact_depths: estimate.depths,
        widened,
    }
}

fn fraction_of(height: usize, fraction: f64) -> usize {
    (height as f64 * fraction).floor() as usize
}

fn estimate_top(masks: &CategoryMasks, height: usize, config: &LandmarkConfig) -> (usize, TopSource) {
    match (masks.head().max_row(), masks.thorax().min_row()) {
        (Some(head_bottom), Some(thorax_top)) => {
            ((head_bottom + thorax_top) / 2, TopSource::HeadThoraxMidpoint)
        }
        (Some(head_bottom), None) => (head_bottom, TopSource::HeadOnly),
        (None, Some(thorax_top)) => (thorax_top, TopSource::ThoraxOnly),
        (None, None) => (fraction_of(height, config.top_fraction), TopSource::Default),
    }
}

struct BottomEstimate {
    bottom: usize,
    source: BottomSource,
    legs_used: usize,
    depths: Vec<usize>,
}

fn estimate_bottom(
    masks: &CategoryMasks,
    legs: &[LegComponent],
    height: usize,
    config: &LandmarkConfig,
) -> BottomEstimate {
    let thorax = masks.thorax();
    let thorax_rows = thorax.min_row().zip(thorax.max_row());

    let mut estimate = BottomEstimate {
        bottom: fraction_of(height, config.bottom_fraction),
        source: BottomSource::Default,
        legs_used: 0,
        depths: Vec::new(),
    };

    // The whole-mask policy looks at every appendage pixel, noise included
    let has_contact_source = match config.policy {
        AttachmentPolicy::ContactPercentile { .. } => masks.appendages().any(),
        _ => !legs.is_empty(),
    };

    if has_contact_source {
        let depths = match config.policy {
            AttachmentPolicy::DeepestLegs { count } => {
                let selected = deepest_legs(legs, count);
                leg_contact_depths(&selected, masks, config.dilation_radius)
            }
            AttachmentPolicy::AllLegs => {
                let selected: Vec<&LegComponent> = legs.iter().collect();
                leg_contact_depths(&selected, masks, config.dilation_radius)
            }
            AttachmentPolicy::ContactPercentile { percentile, radius } => {
                contact_percentile(masks, percentile, radius).into_iter().collect()
            }
        };

        if !depths.is_empty() {
            let mean = depths.iter().sum::<usize>() as f64 / depths.len() as f64;
            estimate.bottom = mean.round() as usize;
            estimate.source = BottomSource::LegContact;
            estimate.legs_used = match config.policy {
                AttachmentPolicy::ContactPercentile { .. } => legs.len(),
                _ => depths.len(),
            };
            estimate.depths = depths;
        } else if let Some((_, thorax_bottom)) = thorax_rows {
            debug!("Legs never touch the trunk, falling back to the thorax lower edge");
            estimate.bottom = thorax_bottom;
            estimate.source = BottomSource::ThoraxFallback;
        }
    }

    // A lower edge above the middle of the thorax itself is an inference failure
    if let Some((thorax_top, thorax_bottom)) = thorax_rows {
        let midpoint = (thorax_top + thorax_bottom) as f64 / 2.0;
        if (estimate.bottom as f64) < midpoint {
            debug!(
                "Bottom {} lies above thorax midpoint {:.1}, resetting to {}",
                estimate.bottom, midpoint, thorax_bottom
            );
            estimate.bottom = thorax_bottom;
            estimate.source = BottomSource::SanityReset;
        }
    }

    estimate
}

/// Up to `count` components ranked by deepest row, deepest first. Ties keep
/// extraction order.
pub fn deepest_legs(legs: &[LegComponent], count: usize) -> Vec<&LegComponent> {
    let mut ranked: Vec<&LegComponent> = legs.iter().collect();
    ranked.sort_by(|a, b| b.row_end.cmp(&a.row_end));
    ranked.truncate(count);
    ranked
}

fn leg_contact_depths(legs: &[&LegComponent], masks: &CategoryMasks, radius: usize) -> Vec<usize> {
    let trunk = masks.trunk();
    legs.iter()
        .filter_map(|leg| {
            let depth = leg.attachment_depth(&trunk, radius);
            debug!(
                "Leg {} (rows {}..{}) attachment depth: {:?}",
                leg.id, leg.row_start, leg.row_end, depth
            );
            depth
        })
        .collect()
}

/// Whole-mask variant: dilate every appendage pixel and take a percentile of
/// the rows where the result overlaps the body.
fn contact_percentile(masks: &CategoryMasks, percentile: f64, radius: usize) -> Option<usize> {
    let contacts = masks
        .appendages()
        .dilate4(radius)
        .intersection(&masks.body());
    percentile_row(&contacts.set_rows(), percentile)
}

/// Linear-interpolated percentile of row indices, rounded down
pub fn percentile_row(rows: &[usize], percentile: f64) -> Option<usize> {
    if rows.is_empty() {
        return None;
    }
    let mut sorted = rows.to_vec();
    sorted.sort_unstable();

    let rank = (percentile.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let value = sorted[lo] as f64 + (sorted[hi] as f64 - sorted[lo] as f64) * (rank - lo as f64);
    Some(value.floor() as usize)
}

/// Widens only bands of `min_band_gap` rows or fewer. A band of 11..19 rows
/// is a legitimate detection and is kept as is.
fn finalize(top: usize, bottom: usize, height: usize, config: &LandmarkConfig) -> (ThoraxBand, bool) {
    let mut bottom = bottom;
    let mut widened = false;
    if bottom <= top + config.min_band_gap {
        bottom = bottom.max(top + config.min_band_height);
        widened = true;
    }

    let last_row = height.saturating_sub(1);
    let band = ThoraxBand {
        top: top.min(last_row),
        bottom: bottom.min(last_row),
    };
    (band, widened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::{classify_regions, extract_leg_components};
    use crate::grid::LabelGrid;
    use crate::taxonomy::{NameResolver, NameTable};
    use crate::test_utils::{taxonomy, GridBuilder, ABDOMEN, HEAD, LEG_LEFT, LEG_RIGHT, THORAX};

    fn detect(grid: &LabelGrid, config: &LandmarkConfig) -> Detection {
        let names = taxonomy();
        let table = NameTable::build(&names, 0);
        let mut resolver = NameResolver::new(&table, &names);
        let masks = classify_regions(grid, &mut resolver);
        let legs = extract_leg_components(masks.appendages(), config.noise_threshold);
        detect_thorax_band(&masks, &legs, grid.height(), config)
    }

    /// Head 0-19, thorax 20-49, abdomen 50-89 and three legs of different reach
    fn three_leg_specimen() -> LabelGrid {
        GridBuilder::new(120, 30)
            .rows(HEAD, 0..20)
            .rows(THORAX, 20..50)
            .rows(ABDOMEN, 50..90)
            .rect(LEG_LEFT, 25..60, 2..3)
            .rect(LEG_RIGHT, 40..100, 27..28)
            .rect(LEG_LEFT, 30..45, 15..16)
            .build()
    }

    #[test]
    fn test_top_edge_rules() {
        let config = LandmarkConfig::default();

        let both = GridBuilder::new(100, 4).rows(HEAD, 0..20).rows(THORAX, 30..50).build();
        let d = detect(&both, &config);
        assert_eq!((d.band.top, d.top_source), (24, TopSource::HeadThoraxMidpoint));

        let head_only = GridBuilder::new(100, 4).rows(HEAD, 0..20).build();
        let d = detect(&head_only, &config);
        assert_eq!((d.band.top, d.top_source), (19, TopSource::HeadOnly));

        let thorax_only = GridBuilder::new(100, 4).rows(THORAX, 30..50).build();
        let d = detect(&thorax_only, &config);
        assert_eq!((d.band.top, d.top_source), (30, TopSource::ThoraxOnly));

        let neither = GridBuilder::new(100, 4).rows(ABDOMEN, 30..50).build();
        let d = detect(&neither, &config);
        assert_eq!((d.band.top, d.top_source), (35, TopSource::Default));
    }

    #[test]
    fn test_deepest_two_legs_are_averaged() {
        let d = detect(&three_leg_specimen(), &LandmarkConfig::default());
        assert_eq!(d.band.top, 19);
        assert_eq!(d.bottom_source, BottomSource::LegContact);
        assert_eq!(d.contact_depths, vec![89, 69]);
        assert_eq!(d.legs_used, 2);
        assert_eq!(d.band.bottom, 79);
    }

    #[test]
    fn test_all_legs_policy() {
        let config = LandmarkConfig {
            policy: AttachmentPolicy::AllLegs,
            ..LandmarkConfig::default()
        };
        let d = detect(&three_leg_specimen(), &config);
        assert_eq!(d.contact_depths, vec![69, 54, 89]);
        // (69 + 54 + 89) / 3 = 70.67
        assert_eq!(d.band.bottom, 71);
    }

    #[test]
    fn test_contact_percentile_policy() {
        let config = LandmarkConfig {
            policy: AttachmentPolicy::ContactPercentile { percentile: 98.0, radius: 15 },
            ..LandmarkConfig::default()
        };
        let d = detect(&three_leg_specimen(), &config);
        assert_eq!(d.bottom_source, BottomSource::LegContact);
        assert_eq!(d.legs_used, 3);
        // Contacts end at the last abdomen row
        assert!(d.band.bottom > 49 && d.band.bottom <= 89, "bottom {}", d.band.bottom);
    }

    #[test]
    fn test_contact_percentile_uses_short_blobs() {
        // Every appendage blob is shorter than the noise threshold
        let grid = GridBuilder::new(120, 30)
            .rows(HEAD, 0..20)
            .rows(THORAX, 20..50)
            .rows(ABDOMEN, 50..90)
            .rect(LEG_LEFT, 80..86, 2..3)
            .rect(LEG_RIGHT, 82..88, 27..28)
            .build();

        let d = detect(&grid, &LandmarkConfig::default());
        assert_eq!(d.bottom_source, BottomSource::Default);
        assert_eq!(d.band.bottom, 78);

        let config = LandmarkConfig {
            policy: AttachmentPolicy::ContactPercentile { percentile: 98.0, radius: 15 },
            ..LandmarkConfig::default()
        };
        let d = detect(&grid, &config);
        assert_eq!(d.bottom_source, BottomSource::LegContact);
        assert_eq!(d.legs_used, 0);
        assert!(d.band.bottom > 79 && d.band.bottom <= 89, "bottom {}", d.band.bottom);
    }

    #[test]
    fn test_band_between_gap_and_minimum_is_kept() {
        let (band, widened) = finalize(19, 36, 100, &LandmarkConfig::default());
        assert!(!widened);
        assert_eq!(band, ThoraxBand { top: 19, bottom: 36 });
    }

    #[test]
    fn test_percentile_row_interpolates() {
        let rows: Vec<usize> = (0..100).collect();
        assert_eq!(percentile_row(&rows, 98.0), Some(97));
        assert_eq!(percentile_row(&rows, 100.0), Some(99));
        assert_eq!(percentile_row(&rows, 0.0), Some(0));
        assert_eq!(percentile_row(&[5, 1, 9], 50.0), Some(5));
        assert_eq!(percentile_row(&[], 98.0), None);
    }

    #[test]
    fn test_deepest_legs_ranking() {
        let grid = three_leg_specimen();
        let names = taxonomy();
        let table = NameTable::build(&names, 0);
        let mut resolver = NameResolver::new(&table, &names);
        let masks = classify_regions(&grid, &mut resolver);
        let legs = extract_leg_components(masks.appendages(), 10);

        let ranked: Vec<usize> = deepest_legs(&legs, 2).iter().map(|l| l.row_end).collect();
        assert_eq!(ranked, vec![100, 60]);
        assert_eq!(deepest_legs(&legs, 5).len(), 3);
        assert!(deepest_legs(&legs, 0).is_empty());
    }

    #[test]
    fn test_sanity_reset_when_bottom_above_thorax_middle() {
        // Leg hangs from the head and only grazes the top of the thorax
        let grid = GridBuilder::new(100, 10)
            .rows(HEAD, 0..20)
            .rows(THORAX, 20..50)
            .rect(LEG_LEFT, 0..15, 5..6)
            .build();
        let d = detect(&grid, &LandmarkConfig::default());
        assert_eq!(d.contact_depths, vec![24]);
        assert_eq!(d.bottom_source, BottomSource::SanityReset);
        assert_eq!(d.band, ThoraxBand { top: 19, bottom: 49 });
    }

    #[test]
    fn test_no_legs_with_low_thorax() {
        let grid = GridBuilder::new(100, 4).rows(THORAX, 70..90).build();
        let d = detect(&grid, &LandmarkConfig::default());
        assert_eq!(d.bottom_source, BottomSource::SanityReset);
        assert_eq!(d.band, ThoraxBand { top: 70, bottom: 89 });
    }

    #[test]
    fn test_detached_legs_without_thorax_keep_default() {
        let grid = GridBuilder::new(100, 4)
            .rows(ABDOMEN, 0..20)
            .rect(LEG_LEFT, 60..90, 1..2)
            .build();
        let d = detect(&grid, &LandmarkConfig::default());
        assert_eq!(d.bottom_source, BottomSource::Default);
        assert!(d.contact_depths.is_empty());
        assert_eq!(d.band, ThoraxBand { top: 35, bottom: 65 });
    }

    #[test]
    fn test_thin_band_is_widened_and_clamped() {
        let grid = GridBuilder::new(60, 4).rows(HEAD, 0..50).build();
        let d = detect(&grid, &LandmarkConfig::default());
        assert!(d.widened);
        assert_eq!(d.band, ThoraxBand { top: 49, bottom: 59 });

        let (band, widened) = finalize(10, 15, 100, &LandmarkConfig::default());
        assert!(widened);
        assert_eq!(band, ThoraxBand { top: 10, bottom: 40 });
        assert!(band.height() >= 20);
    }
}
