//! Diagrams: named canvases owning an ordered list of view ids.

use serde_json::Value;

use crate::base::ElementId;
use crate::model::JsonMap;

/// One diagram of the project. The views themselves live in the graph's
/// flat view table; the diagram holds their ids in serialization order.
#[derive(Clone, Debug)]
pub struct Diagram {
    pub id: ElementId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub element_type: String,
    /// The `owner` reference of the serialized diagram, passed through.
    pub owner: Value,
    pub views: Vec<ElementId>,
}

impl Diagram {
    pub fn from_map(map: &JsonMap) -> Self {
        let text = |key: &str| -> Option<String> {
            map.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            id: ElementId::new(
                map.get("id").and_then(Value::as_str).unwrap_or_default(),
            ),
            name: text("name"),
            description: text("description"),
            element_type: text("type").unwrap_or_else(|| "Diagram".into()),
            owner: map.get("owner").cloned().unwrap_or(Value::Null),
            views: Vec::new(),
        }
    }

    pub fn add_view(&mut self, id: ElementId) {
        self.views.push(id);
    }

    pub fn remove_view(&mut self, id: &ElementId) {
        self.views.retain(|v| v != id);
    }
}
