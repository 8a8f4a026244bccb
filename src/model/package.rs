//! The retained project skeleton: project header and nested package shells.
//!
//! Loading flattens package contents into the graph tables, but the package
//! tree itself is kept so re-serialization can emit the same nesting with
//! the (hoisted) elements appended to the outermost model's contents.

use serde_json::Value;

use crate::model::JsonMap;

/// Header of the serialized project (everything except `model`/`diagrams`).
#[derive(Clone, Debug, Default)]
pub struct ProjectMeta {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub element_type: String,
}

impl ProjectMeta {
    pub fn from_map(map: &JsonMap) -> Self {
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            id: text("id"),
            name: text("name"),
            description: text("description"),
            element_type: text("type").unwrap_or_else(|| "Project".into()),
        }
    }
}

/// A package node of the model tree. Only nested packages are retained;
/// element content is hoisted into the graph.
#[derive(Clone, Debug)]
pub struct PackageTree {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub element_type: String,
    pub property_assignments: Value,
    pub packages: Vec<PackageTree>,
}

impl PackageTree {
    /// Build the package skeleton of a serialized model or package node.
    pub fn from_map(map: &JsonMap) -> Self {
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        let packages = match map.get("contents") {
            Some(Value::Array(contents)) => contents
                .iter()
                .filter_map(Value::as_object)
                .filter(|child| child.get("type").and_then(Value::as_str) == Some("Package"))
                .map(Self::from_map)
                .collect(),
            _ => Vec::new(),
        };
        Self {
            id: text("id"),
            name: text("name"),
            description: text("description"),
            element_type: text("type").unwrap_or_else(|| "Package".into()),
            property_assignments: map.get("propertyAssignments").cloned().unwrap_or(Value::Null),
            packages,
        }
    }
}
