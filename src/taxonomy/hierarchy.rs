/// Label hierarchy JSON parser
///
/// Reads the taxonomy that maps region IDs of the segmentation model to
/// anatomical names. Two layouts are accepted:
///
/// - node list: `{"labels": [{"label": 1, "name": "head", "parent": null}, ...]}`
/// - flat map:  `{"1": "head", "2": "thorax_L", ...}`
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::grid::is_background;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LabelNode {
    pub label: u32,
    pub name: String,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(default)]
    pub color: Option<[u8; 3]>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HierarchyFile {
    Nodes { labels: Vec<LabelNode> },
    Flat(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Default)]
pub struct LabelHierarchy {
    nodes: Vec<LabelNode>,
    by_label: HashMap<u32, usize>,
}

impl LabelHierarchy {
    pub fn from_nodes(nodes: Vec<LabelNode>) -> Self {
        let by_label = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.label, idx))
            .collect();
        Self { nodes, by_label }
    }

    /// Parse a hierarchy from a file
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read label hierarchy {}: {}", path.display(), e))?;

        Self::from_str(&content)
    }

    /// Parse a hierarchy from a JSON string
    pub fn from_str(content: &str) -> Result<Self, String> {
        let file: HierarchyFile = serde_json::from_str(content)
            .map_err(|e| format!("Failed to parse label hierarchy JSON: {}", e))?;

        let nodes = match file {
            HierarchyFile::Nodes { labels } => labels,
            HierarchyFile::Flat(map) => {
                let mut nodes = Vec::with_capacity(map.len());
                for (key, name) in map {
                    let label = key
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| format!("Label hierarchy key '{}' is not a label id", key))?;
                    nodes.push(LabelNode {
                        label,
                        name,
                        parent: None,
                        color: None,
                    });
                }
                nodes
            }
        };

        Ok(Self::from_nodes(nodes))
    }

    /// Drop nodes that can never match a pixel and report suspicious entries.
    /// Returns the number of removed nodes and the warnings.
    pub fn validate_and_clean(&mut self) -> (usize, Vec<String>) {
        let mut warnings = Vec::new();
        let original_count = self.nodes.len();
        let mut seen = HashSet::new();

        self.nodes.retain(|node| {
            if is_background(node.label) {
                warnings.push(format!(
                    "Skipping node '{}': label {} is reserved for background",
                    node.name, node.label
                ));
                return false;
            }
            if node.name.trim().is_empty() {
                warnings.push(format!("Skipping node {}: empty name", node.label));
                return false;
            }
            if !seen.insert(node.label) {
                warnings.push(format!(
                    "Skipping node '{}': duplicate label {}",
                    node.name, node.label
                ));
                return false;
            }
            true
        });

        for node in &self.nodes {
            if let Some(parent) = node.parent {
                if !seen.contains(&parent) {
                    warnings.push(format!(
                        "Node '{}' references missing parent {}",
                        node.name, parent
                    ));
                }
            }
        }

        *self = Self::from_nodes(std::mem::take(&mut self.nodes));
        (original_count - self.nodes.len(), warnings)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, label: u32) -> Option<&LabelNode> {
        self.by_label.get(&label).map(|&idx| &self.nodes[idx])
    }

    pub fn nodes(&self) -> &[LabelNode] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_list() {
        let json = r#"{
            "labels": [
                {"label": 1, "name": "Head"},
                {"label": 2, "name": "thorax_L", "parent": 1, "color": [44, 160, 44]},
                {"label": 10, "name": "leg_3"}
            ]
        }"#;

        let hierarchy = LabelHierarchy::from_str(json).unwrap();
        assert_eq!(hierarchy.len(), 3);
        assert_eq!(hierarchy.get(2).unwrap().name, "thorax_L");
        assert_eq!(hierarchy.get(2).unwrap().color, Some([44, 160, 44]));
        assert!(hierarchy.get(3).is_none());
    }

    #[test]
    fn test_parse_flat_map() {
        let json = r#"{"1": "head", "20": "abdomen"}"#;
        let hierarchy = LabelHierarchy::from_str(json).unwrap();
        assert_eq!(hierarchy.len(), 2);
        assert_eq!(hierarchy.get(20).unwrap().name, "abdomen");
    }

    #[test]
    fn test_flat_map_rejects_bad_key() {
        let err = LabelHierarchy::from_str(r#"{"one": "head"}"#).unwrap_err();
        assert!(err.contains("not a label id"));
    }

    #[test]
    fn test_validate_and_clean() {
        let mut hierarchy = LabelHierarchy::from_nodes(vec![
            LabelNode { label: 0, name: "background".into(), parent: None, color: None },
            LabelNode { label: 1, name: "head".into(), parent: None, color: None },
            LabelNode { label: 1, name: "head again".into(), parent: None, color: None },
            LabelNode { label: 2, name: " ".into(), parent: None, color: None },
            LabelNode { label: 3, name: "leg".into(), parent: Some(99), color: None },
        ]);

        let (skipped, warnings) = hierarchy.validate_and_clean();
        assert_eq!(skipped, 3);
        assert_eq!(hierarchy.len(), 2);
        assert_eq!(warnings.len(), 4);
        assert_eq!(hierarchy.get(1).unwrap().name, "head");
        assert!(hierarchy.get(3).is_some());
    }
}
