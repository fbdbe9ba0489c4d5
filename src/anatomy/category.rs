use std::fmt;
use serde::{Deserialize, Serialize};

/// Coarse anatomical grouping of region labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Head,
    Thorax,
    Abdomen,
    Appendages,
    Other,
}

/// Substrings marking an appendage name
const APPENDAGE_KEYS: [&str; 5] = ["leg", "append", "a1", "a2", "a3"];

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Head,
        Category::Thorax,
        Category::Abdomen,
        Category::Appendages,
        Category::Other,
    ];

    /// Classify a lowercased taxonomy name. First match wins, in the order
    /// head, thorax, abdomen, appendages.
    pub fn from_name(name: &str) -> Category {
        if name.contains("head") {
            Category::Head
        } else if name.contains("thorax") {
            Category::Thorax
        } else if name.contains("abdomen") {
            Category::Abdomen
        } else if APPENDAGE_KEYS.iter().any(|key| name.contains(key)) {
            Category::Appendages
        } else {
            Category::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Head => "head",
            Category::Thorax => "thorax",
            Category::Abdomen => "abdomen",
            Category::Appendages => "appendages",
            Category::Other => "other",
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
