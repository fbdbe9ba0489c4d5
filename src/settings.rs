use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, info, warn, error};

use crate::config::{
    AnalysisConfig, AttachmentPolicy, LandmarkConfig, RenderOptions, DEFAULT_CONTACT_PERCENTILE,
    DEFAULT_CONTACT_RADIUS, DEFAULT_DILATION_RADIUS, DEFAULT_LEG_COUNT, DEFAULT_NOISE_THRESHOLD,
    DEFAULT_PROBE_LIMIT,
};

/// User-tunable analysis settings, persisted as commented YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Leg components spanning fewer rows than this are discarded
    #[serde(default = "default_noise_threshold")]
    pub noise_threshold: usize,

    /// Dilation iterations applied to each leg when looking for its attachment
    #[serde(default = "default_dilation_radius")]
    pub dilation_radius: usize,

    /// Attachment policy: "deepest", "all" or "percentile"
    #[serde(default = "default_attachment_policy")]
    pub attachment_policy: String,

    /// Number of deepest-reaching legs averaged by the "deepest" policy
    #[serde(default = "default_leg_count")]
    pub leg_count: usize,

    /// Percentile of contact rows used by the "percentile" policy
    #[serde(default = "default_contact_percentile")]
    pub contact_percentile: f64,

    /// Whole-mask dilation used by the "percentile" policy
    #[serde(default = "default_contact_radius")]
    pub contact_radius: usize,

    /// Paint `other` regions gray in the overlay
    #[serde(default)]
    pub render_other: bool,

    /// Upper bound of the label id scan when the taxonomy has no structured table
    #[serde(default = "default_probe_limit")]
    pub probe_limit: u32,
}

fn default_noise_threshold() -> usize {
    DEFAULT_NOISE_THRESHOLD
}

fn default_dilation_radius() -> usize {
    DEFAULT_DILATION_RADIUS
}

fn default_attachment_policy() -> String {
    "deepest".to_string()
}

fn default_leg_count() -> usize {
    DEFAULT_LEG_COUNT
}

fn default_contact_percentile() -> f64 {
    DEFAULT_CONTACT_PERCENTILE
}

fn default_contact_radius() -> usize {
    DEFAULT_CONTACT_RADIUS
}

fn default_probe_limit() -> u32 {
    DEFAULT_PROBE_LIMIT
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            noise_threshold: DEFAULT_NOISE_THRESHOLD,
            dilation_radius: DEFAULT_DILATION_RADIUS,
            attachment_policy: default_attachment_policy(),
            leg_count: DEFAULT_LEG_COUNT,
            contact_percentile: DEFAULT_CONTACT_PERCENTILE,
            contact_radius: DEFAULT_CONTACT_RADIUS,
            render_other: false,
            probe_limit: DEFAULT_PROBE_LIMIT,
        }
    }
}

impl UserSettings {
    /// Get the path to the settings file
    /// On macOS: ~/Library/Application Support/InsectThorax/settings.yaml
    /// On Linux: ~/.config/InsectThorax/settings.yaml
    /// On Windows: C:\Users\<user>\AppData\Roaming\InsectThorax\settings.yaml
    pub fn settings_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."));

        config_dir.join("InsectThorax").join("settings.yaml")
    }

    /// Load settings from the YAML file
    /// If custom_path is provided, uses that path; otherwise uses the default settings path
    pub fn load(custom_path: Option<&Path>) -> Self {
        let path = match custom_path {
            Some(p) => {
                info!("Using custom settings path: {}", p.display());
                p.to_path_buf()
            }
            None => Self::settings_path(),
        };

        if !path.exists() {
            info!("Settings file not found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_yaml(&contents).unwrap_or_else(|e| {
                error!("Failed to parse settings file at {:?}: {}", path, e);
                warn!("Using default settings");
                Self::default()
            }),
            Err(e) => {
                error!("Failed to read settings file at {:?}: {}", path, e);
                warn!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        let settings = serde_yaml::from_str::<UserSettings>(contents)?;
        debug!("Settings: policy={}, noise_threshold={}, dilation_radius={}, leg_count={}",
            settings.attachment_policy, settings.noise_threshold, settings.dilation_radius, settings.leg_count);
        Ok(settings)
    }

    /// Save settings to the YAML file while preserving comments
    pub fn save(&self, custom_path: Option<&Path>) -> Result<PathBuf, String> {
        let path = custom_path.map(Path::to_path_buf).unwrap_or_else(Self::settings_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create settings directory: {}", e))?;
            }
        }

        // If file exists, try to preserve comments by doing in-place value updates
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(contents) => {
                    let updated = self.update_yaml_values(&contents);
                    fs::write(&path, updated)
                        .map_err(|e| format!("Failed to write settings file: {}", e))?;
                    info!("Saved settings to {:?} (comments preserved)", path);
                    return Ok(path);
                }
                Err(e) => {
                    warn!("Failed to read existing settings file for comment preservation: {}", e);
                }
            }
        }

        fs::write(&path, self.to_yaml_with_comments())
            .map_err(|e| format!("Failed to write settings file: {}", e))?;

        info!("Saved settings to {:?}", path);
        Ok(path)
    }

    /// Update YAML values while preserving existing comments and structure
    fn update_yaml_values(&self, yaml_content: &str) -> String {
        let mut result = yaml_content.to_string();

        result = Self::replace_yaml_value(&result, "noise_threshold", &self.noise_threshold.to_string());
        result = Self::replace_yaml_value(&result, "dilation_radius", &self.dilation_radius.to_string());
        result = Self::replace_yaml_value(&result, "attachment_policy", &format!("\"{}\"", self.attachment_policy));
        result = Self::replace_yaml_value(&result, "leg_count", &self.leg_count.to_string());
        result = Self::replace_yaml_value(&result, "contact_percentile", &format!("{:?}", self.contact_percentile));
        result = Self::replace_yaml_value(&result, "contact_radius", &self.contact_radius.to_string());
        result = Self::replace_yaml_value(&result, "render_other", &self.render_other.to_string());
        result = Self::replace_yaml_value(&result, "probe_limit", &self.probe_limit.to_string());

        result
    }

    /// Replace a YAML key's value while preserving the rest of the line
    fn replace_yaml_value(yaml: &str, key: &str, new_value: &str) -> String {
        let pattern = format!(r"(?m)^(\s*{}\s*:\s*).*$", regex::escape(key));
        let replacement = format!("${{1}}{}", new_value);

        match regex::Regex::new(&pattern) {
            Ok(re) => re.replace_all(yaml, replacement.as_str()).to_string(),
            Err(e) => {
                warn!("Failed to create regex for key '{}': {}", key, e);
                yaml.to_string()
            }
        }
    }

    /// Generate YAML content with comments for new files
    pub fn to_yaml_with_comments(&self) -> String {
        format!(
            r#"# InsectThorax Settings
# This file is loaded automatically by the insect-thorax command.
# Settings specified here override the built-in defaults; command line
# flags override both.

# Leg components spanning fewer rows than this are treated as noise
noise_threshold: {}

# 4-neighbour dilation iterations applied to each leg before intersecting
# it with the thorax and abdomen
dilation_radius: {}

# How the lower thorax edge is derived from leg contacts
# - "deepest": mean attachment row of the `leg_count` deepest-reaching legs
# - "all": mean attachment row of every leg component
# - "percentile": percentile of all contact rows of the dilated appendage mask
attachment_policy: "{}"

# Legs averaged by the "deepest" policy
leg_count: {}

# Percentile and dilation radius used by the "percentile" policy
contact_percentile: {:?}
contact_radius: {}

# Paint regions that are not head, thorax, abdomen or appendages light gray
render_other: {}

# Highest label id probed when the taxonomy offers no structured name table
probe_limit: {}
"#,
            self.noise_threshold,
            self.dilation_radius,
            self.attachment_policy,
            self.leg_count,
            self.contact_percentile,
            self.contact_radius,
            self.render_other,
            self.probe_limit
        )
    }

    /// Convert attachment_policy string to AttachmentPolicy enum
    pub fn get_attachment_policy(&self) -> AttachmentPolicy {
        let policy = AttachmentPolicy::from_name(&self.attachment_policy).unwrap_or_else(|| {
            warn!("Unknown attachment policy '{}', defaulting to deepest", self.attachment_policy);
            AttachmentPolicy::default()
        });

        // Named policies carry defaults; the numeric settings fill them in
        match policy {
            AttachmentPolicy::DeepestLegs { .. } => AttachmentPolicy::DeepestLegs { count: self.leg_count },
            AttachmentPolicy::AllLegs => AttachmentPolicy::AllLegs,
            AttachmentPolicy::ContactPercentile { .. } => AttachmentPolicy::ContactPercentile {
                percentile: self.contact_percentile,
                radius: self.contact_radius,
            },
        }
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            landmarks: LandmarkConfig {
                noise_threshold: self.noise_threshold,
                dilation_radius: self.dilation_radius,
                policy: self.get_attachment_policy(),
                ..LandmarkConfig::default()
            },
            render: RenderOptions {
                render_other: self.render_other,
            },
            probe_limit: self.probe_limit,
        }
    }
}
