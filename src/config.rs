use serde::{Deserialize, Serialize};

// Default values for configuration
// These serve as fallback values and can be used for "reset to defaults" functionality
pub const DEFAULT_NOISE_THRESHOLD: usize = 10;        // Components shorter than this (rows) are noise
pub const DEFAULT_DILATION_RADIUS: usize = 10;        // 4-neighbour dilation iterations per leg
pub const DEFAULT_LEG_COUNT: usize = 2;               // Deepest-reaching legs used for the bottom edge
pub const DEFAULT_TOP_FRACTION: f64 = 0.35;           // Top edge when neither head nor thorax is found
pub const DEFAULT_BOTTOM_FRACTION: f64 = 0.65;        // Bottom edge when no legs are found
pub const DEFAULT_MIN_BAND_GAP: usize = 10;           // Bands this thin or thinner are widened
pub const DEFAULT_MIN_BAND_HEIGHT: usize = 30;        // Height a widened band is forced to
pub const DEFAULT_PROBE_LIMIT: u32 = 6000;            // Upper bound of the label id range scan
pub const DEFAULT_CONTACT_PERCENTILE: f64 = 98.0;     // Percentile of contact rows (percentile policy)
pub const DEFAULT_CONTACT_RADIUS: usize = 15;         // Whole-mask dilation for the percentile policy

/// How the lower thorax edge is derived from leg contacts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttachmentPolicy {
    /// Average the attachment depth of the `count` deepest-reaching legs
    DeepestLegs { count: usize },
    /// Average the attachment depth of every surviving leg component
    AllLegs,
    /// Dilate the whole appendage mask and take a percentile of its
    /// contact rows with the body
    ContactPercentile { percentile: f64, radius: usize },
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        AttachmentPolicy::DeepestLegs {
            count: DEFAULT_LEG_COUNT,
        }
    }
}

impl AttachmentPolicy {
    /// Parse the short names used on the command line and in settings
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "deepest" | "deepest_legs" => Some(Self::default()),
            "all" | "all_legs" => Some(AttachmentPolicy::AllLegs),
            "percentile" | "contact_percentile" => Some(AttachmentPolicy::ContactPercentile {
                percentile: DEFAULT_CONTACT_PERCENTILE,
                radius: DEFAULT_CONTACT_RADIUS,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkConfig {
    pub noise_threshold: usize,
    pub dilation_radius: usize,
    pub policy: AttachmentPolicy,
    pub top_fraction: f64,
    pub bottom_fraction: f64,
    pub min_band_gap: usize,
    pub min_band_height: usize,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            noise_threshold: DEFAULT_NOISE_THRESHOLD,
            dilation_radius: DEFAULT_DILATION_RADIUS,
            policy: AttachmentPolicy::default(),
            top_fraction: DEFAULT_TOP_FRACTION,
            bottom_fraction: DEFAULT_BOTTOM_FRACTION,
            min_band_gap: DEFAULT_MIN_BAND_GAP,
            min_band_height: DEFAULT_MIN_BAND_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    /// Paint labels classified as `other` in opaque gray instead of leaving
    /// them transparent. Debug aid only.
    pub render_other: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    pub landmarks: LandmarkConfig,
    pub render: RenderOptions,
    pub probe_limit: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            landmarks: LandmarkConfig::default(),
            render: RenderOptions::default(),
            probe_limit: DEFAULT_PROBE_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_names() {
        assert_eq!(
            AttachmentPolicy::from_name("Deepest"),
            Some(AttachmentPolicy::DeepestLegs { count: 2 })
        );
        assert_eq!(AttachmentPolicy::from_name("all"), Some(AttachmentPolicy::AllLegs));
        assert!(matches!(
            AttachmentPolicy::from_name("percentile"),
            Some(AttachmentPolicy::ContactPercentile { radius: 15, .. })
        ));
        assert_eq!(AttachmentPolicy::from_name("median"), None);
    }
}
