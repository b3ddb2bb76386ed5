//! Flat resource lists, the settings tree and the job panel text.

use std::fmt;

use serde_json::Value;
use shared::domain::ActiveJob;

pub const NO_ACTIVE_JOBS: &str = "No active jobs.";

/// `"<name> <percent> %"` with two decimals.
pub fn format_job(job: &ActiveJob) -> String {
    format!("{} {:.2} %", job.name, job.percent)
}

pub fn job_panel_lines(jobs: &[ActiveJob]) -> Vec<String> {
    if jobs.is_empty() {
        return vec![NO_ACTIVE_JOBS.to_string()];
    }
    jobs.iter().map(format_job).collect()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceItem {
    pub key: Option<String>,
    pub value: String,
}

impl ResourceItem {
    /// Key for mapping entries, value for plain list entries.
    pub fn name(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.value)
    }
}

impl fmt::Display for ResourceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{key}: {}", self.value),
            None => f.write_str(&self.value),
        }
    }
}

/// Last fetched contents of a list endpoint, rendered as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceList {
    pub items: Vec<ResourceItem>,
}

impl ResourceList {
    pub fn from_value(value: &Value) -> Self {
        let items = match value {
            Value::Array(entries) => entries
                .iter()
                .map(|entry| ResourceItem {
                    key: None,
                    value: value_text(entry),
                })
                .collect(),
            Value::Object(map) => map
                .iter()
                .map(|(key, entry)| ResourceItem {
                    key: Some(key.clone()),
                    value: value_text(entry),
                })
                .collect(),
            Value::Null => Vec::new(),
            scalar => vec![ResourceItem {
                key: None,
                value: value_text(scalar),
            }],
        };
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|item| item.name().to_string()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsNode {
    Leaf { key: String, value: String },
    Branch { key: String, children: Vec<SettingsNode> },
}

/// Arbitrarily nested settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsTree {
    pub nodes: Vec<SettingsNode>,
}

impl SettingsTree {
    pub fn from_value(value: &Value) -> Self {
        Self {
            nodes: children_of(value).unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first `(depth, line)` pairs; branches render as `key:`, leaves as `key: value`.
    pub fn flatten(&self) -> Vec<(usize, String)> {
        let mut lines = Vec::new();
        flatten_into(&self.nodes, 0, &mut lines);
        lines
    }
}

fn children_of(value: &Value) -> Option<Vec<SettingsNode>> {
    let entries: Vec<(String, &Value)> = match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, v)| (index.to_string(), v))
            .collect(),
        _ => return None,
    };
    Some(
        entries
            .into_iter()
            .map(|(key, child)| match children_of(child) {
                Some(children) => SettingsNode::Branch { key, children },
                None => SettingsNode::Leaf {
                    key,
                    value: value_text(child),
                },
            })
            .collect(),
    )
}

fn flatten_into(nodes: &[SettingsNode], depth: usize, lines: &mut Vec<(usize, String)>) {
    for node in nodes {
        match node {
            SettingsNode::Leaf { key, value } => lines.push((depth, format!("{key}: {value}"))),
            SettingsNode::Branch { key, children } => {
                lines.push((depth, format!("{key}:")));
                flatten_into(children, depth + 1, lines);
            }
        }
    }
}
