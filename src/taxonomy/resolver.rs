/// Label ID to anatomical name resolution
///
/// A `NameTable` is built once per taxonomy snapshot and is read-only
/// afterwards, so it can be shared between threads. Each analysis then wraps
/// it in a `NameResolver`, which memoizes lowercased names per label so a
/// grid triggers at most one lookup per distinct label.
use std::collections::HashMap;
use std::ops::Range;
use log::{debug, info};

use super::hierarchy::LabelHierarchy;

/// Anything that can turn a label ID into a name
pub trait NameSource: Sync {
    /// Complete id -> name table when the source has one; empty otherwise.
    fn structured_names(&self) -> HashMap<u32, String> {
        HashMap::new()
    }

    /// Single lookup. Absence is not an error.
    fn name_of(&self, label: u32) -> Option<String>;
}

impl NameSource for LabelHierarchy {
    fn structured_names(&self) -> HashMap<u32, String> {
        self.nodes()
            .iter()
            .map(|node| (node.label, node.name.clone()))
            .collect()
    }

    fn name_of(&self, label: u32) -> Option<String> {
        self.get(label).map(|node| node.name.clone())
    }
}

impl NameSource for HashMap<u32, String> {
    fn structured_names(&self) -> HashMap<u32, String> {
        self.clone()
    }

    fn name_of(&self, label: u32) -> Option<String> {
        self.get(&label).cloned()
    }
}

/// Adapter for lookup-only sources such as closures
pub struct FnNameSource<F>(pub F);

impl<F> NameSource for FnNameSource<F>
where
    F: Fn(u32) -> Option<String> + Sync,
{
    fn name_of(&self, label: u32) -> Option<String> {
        (self.0)(label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub names: HashMap<u32, String>,
    pub probed: usize,
    pub resolved: usize,
}

/// Probe every id in `range`, keeping whichever resolve
pub fn scan_id_range(source: &dyn NameSource, range: Range<u32>) -> ScanReport {
    let mut report = ScanReport::default();
    for label in range {
        report.probed += 1;
        if let Some(name) = source.name_of(label) {
            report.names.insert(label, name);
            report.resolved += 1;
        }
    }
    report
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOrigin {
    Structured { entries: usize },
    RangeScan { probed: usize, resolved: usize },
}

#[derive(Debug, Clone)]
pub struct NameTable {
    names: HashMap<u32, String>,
    origin: TableOrigin,
}

impl NameTable {
    /// Use the structured table when the source has one, otherwise probe
    /// ids `1..probe_limit`.
    pub fn build(source: &dyn NameSource, probe_limit: u32) -> Self {
        let structured = source.structured_names();
        if !structured.is_empty() {
            let entries = structured.len();
            info!("Name table loaded from structured taxonomy: {} entries", entries);
            return Self {
                names: structured,
                origin: TableOrigin::Structured { entries },
            };
        }

        let report = scan_id_range(source, 1..probe_limit);
        info!(
            "Name table built by range scan: {} of {} ids resolved",
            report.resolved, report.probed
        );
        Self {
            names: report.names,
            origin: TableOrigin::RangeScan {
                probed: report.probed,
                resolved: report.resolved,
            },
        }
    }

    pub fn get(&self, label: u32) -> Option<&str> {
        self.names.get(&label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn origin(&self) -> TableOrigin {
        self.origin
    }
}

/// Per-analysis memoizing resolver
pub struct NameResolver<'a> {
    table: &'a NameTable,
    source: &'a dyn NameSource,
    cache: HashMap<u32, Option<String>>,
    lookups: usize,
}

impl<'a> NameResolver<'a> {
    pub fn new(table: &'a NameTable, source: &'a dyn NameSource) -> Self {
        Self {
            table,
            source,
            cache: HashMap::new(),
            lookups: 0,
        }
    }

    /// Lowercased name of `label`. Labels missing from the table are asked
    /// of the source directly before giving up.
    pub fn resolve(&mut self, label: u32) -> Option<&str> {
        let table = self.table;
        let source = self.source;
        let lookups = &mut self.lookups;

        self.cache
            .entry(label)
            .or_insert_with(|| {
                *lookups += 1;
                let name = match table.get(label) {
                    Some(name) => Some(name.to_string()),
                    None => source.name_of(label),
                };
                if name.is_none() {
                    debug!("Label {} has no name in the taxonomy", label);
                }
                name.map(|n| n.to_lowercase())
            })
            .as_deref()
    }

    /// Number of uncached lookups performed so far
    pub fn lookups(&self) -> usize {
        self.lookups
    }
}
