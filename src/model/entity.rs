//! Entity nodes: classes of the model, with their residual attributes and
//! bidirectional incident-edge indices.

use serde_json::{Value, json};

use crate::base::ElementId;
use crate::model::relation::EdgeKind;
use crate::model::stereotype::ClassStereotype;
use crate::model::JsonMap;

// ============================================================================
// EDGE INDEX
// ============================================================================

/// Incident-edge ids for one direction, partitioned by edge kind.
///
/// Vectors keep insertion order; the abstraction passes rely on it for
/// deterministic traversal and for the "take the first remaining" loops.
#[derive(Clone, Debug, Default)]
pub struct EdgeLists {
    pub part_of: Vec<ElementId>,
    pub relations: Vec<ElementId>,
    pub generalizations: Vec<ElementId>,
}

impl EdgeLists {
    pub fn get(&self, kind: EdgeKind) -> &[ElementId] {
        match kind {
            EdgeKind::PartOf => &self.part_of,
            EdgeKind::Relation => &self.relations,
            EdgeKind::Generalization => &self.generalizations,
        }
    }

    pub fn add(&mut self, kind: EdgeKind, id: ElementId) {
        self.list_mut(kind).push(id);
    }

    pub fn remove(&mut self, kind: EdgeKind, id: &ElementId) {
        self.list_mut(kind).retain(|e| e != id);
    }

    /// All ids in the fixed kind order: PartOf, Relation, Generalization.
    pub fn all(&self) -> Vec<ElementId> {
        let mut result =
            Vec::with_capacity(self.part_of.len() + self.relations.len() + self.generalizations.len());
        result.extend(self.part_of.iter().cloned());
        result.extend(self.relations.iter().cloned());
        result.extend(self.generalizations.iter().cloned());
        result
    }

    pub fn len(&self) -> usize {
        self.part_of.len() + self.relations.len() + self.generalizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn list_mut(&mut self, kind: EdgeKind) -> &mut Vec<ElementId> {
        match kind {
            EdgeKind::PartOf => &mut self.part_of,
            EdgeKind::Relation => &mut self.relations,
            EdgeKind::Generalization => &mut self.generalizations,
        }
    }
}

// ============================================================================
// ENTITY
// ============================================================================

/// A class of the model.
///
/// Known header fields are typed; everything else the serialized class
/// carried (isAbstract, properties, literals, restrictedTo, ...) stays in
/// the order-preserving `rest` map and round-trips untouched unless a
/// transformation rewrites it.
#[derive(Clone, Debug)]
pub struct Entity {
    pub id: ElementId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub element_type: String,
    pub stereotype: Option<ClassStereotype>,
    /// Residual attributes of the serialized class.
    pub rest: JsonMap,
    /// Views of this entity, one per diagram it appears on.
    pub views: Vec<ElementId>,
    pub in_edges: EdgeLists,
    pub out_edges: EdgeLists,
}

impl Entity {
    /// Build an entity from a serialized class object. The typed header
    /// fields are removed from the map; the remainder becomes `rest`.
    pub fn from_map(mut map: JsonMap) -> Self {
        let id = take_string(&mut map, "id").unwrap_or_default();
        let name = take_string(&mut map, "name");
        let description = take_string(&mut map, "description");
        let element_type = take_string(&mut map, "type").unwrap_or_default();
        let stereotype = take_string(&mut map, "stereotype")
            .filter(|s| !s.is_empty())
            .map(|s| ClassStereotype::parse(&s));
        Self {
            id: ElementId::new(id),
            name,
            description,
            element_type,
            stereotype,
            rest: map,
            views: Vec::new(),
            in_edges: EdgeLists::default(),
            out_edges: EdgeLists::default(),
        }
    }

    /// A placeholder for an entity that was referenced before its class was
    /// seen. Updated in place when the real class arrives.
    pub fn prototype(id: ElementId) -> Self {
        Self {
            id,
            name: None,
            description: None,
            element_type: String::new(),
            stereotype: None,
            rest: JsonMap::new(),
            views: Vec::new(),
            in_edges: EdgeLists::default(),
            out_edges: EdgeLists::default(),
        }
    }

    /// Promote a prototype to the real class, keeping the edge indices and
    /// views accumulated so far.
    pub fn update_from(&mut self, mut map: JsonMap) {
        let _ = take_string(&mut map, "id");
        self.name = take_string(&mut map, "name");
        self.description = take_string(&mut map, "description");
        self.element_type = take_string(&mut map, "type").unwrap_or_default();
        self.stereotype = take_string(&mut map, "stereotype")
            .filter(|s| !s.is_empty())
            .map(|s| ClassStereotype::parse(&s));
        self.rest = map;
    }

    /// The display name, empty for anonymous entities.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Bucket key used by the stereotype index.
    pub fn stereotype_key(&self) -> String {
        self.stereotype
            .as_ref()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default()
    }

    /// Number of incident edges of any kind, in both directions.
    pub fn degree(&self) -> usize {
        self.in_edges.len() + self.out_edges.len()
    }

    /// True when, besides the edge currently being abstracted, the entity
    /// still has an upward parthood or generalization. Abstractions delete
    /// only the processed edge in that case, not the entity.
    pub fn has_other_up_edges(&self) -> bool {
        self.out_edges.part_of.len() + self.out_edges.generalizations.len() > 1
    }

    /// First `restrictedTo` entry, if any.
    pub fn restricted_to_first(&self) -> Option<&str> {
        self.rest.get("restrictedTo")?.as_array()?.first()?.as_str()
    }

    /// Classes with `order == "2"` name generalization-set categorizers.
    pub fn is_categorizer_candidate(&self) -> bool {
        self.rest.get("order").and_then(Value::as_str) == Some("2")
    }

    /// Append a serialized property to the class, creating the list when the
    /// class had none.
    pub fn push_property(&mut self, property: Value) {
        match self.rest.get_mut("properties") {
            Some(Value::Array(list)) => list.push(property),
            _ => {
                self.rest.insert("properties".into(), json!([property]));
            }
        }
    }

    /// The class's literal objects (enumerations), cloned.
    pub fn literals(&self) -> Vec<Value> {
        self.rest
            .get("literals")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    // ── Synthesized entities ────────────────────────────────────────

    /// A fresh enumeration carrying the given literal objects.
    pub fn new_enumeration(id: ElementId, name: String, literals: Vec<Value>) -> Self {
        let mut rest = JsonMap::new();
        rest.insert("propertyAssignments".into(), Value::Null);
        rest.insert("isAbstract".into(), json!(false));
        rest.insert("isDerived".into(), json!(false));
        rest.insert("properties".into(), Value::Null);
        rest.insert("isExtensional".into(), Value::Null);
        rest.insert("isPowertype".into(), Value::Null);
        rest.insert("order".into(), Value::Null);
        rest.insert("literals".into(), Value::Array(literals));
        rest.insert("restrictedTo".into(), json!(["abstract"]));
        Self {
            id,
            name: Some(name),
            description: None,
            element_type: "Class".into(),
            stereotype: Some(ClassStereotype::Enumeration),
            rest,
            views: Vec::new(),
            in_edges: EdgeLists::default(),
            out_edges: EdgeLists::default(),
        }
    }

    /// A fresh plain class, used by catalog expansion.
    pub fn new_class(id: ElementId, name: String, stereotype: ClassStereotype) -> Self {
        let mut rest = JsonMap::new();
        rest.insert("propertyAssignments".into(), Value::Null);
        rest.insert("isAbstract".into(), json!(false));
        rest.insert("isDerived".into(), json!(false));
        rest.insert("properties".into(), Value::Null);
        rest.insert("isExtensional".into(), Value::Null);
        rest.insert("isPowertype".into(), Value::Null);
        rest.insert("order".into(), Value::Null);
        rest.insert("literals".into(), Value::Null);
        rest.insert("restrictedTo".into(), json!(["functional-complex"]));
        Self {
            id,
            name: Some(name),
            description: None,
            element_type: "Class".into(),
            stereotype: Some(stereotype),
            rest,
            views: Vec::new(),
            in_edges: EdgeLists::default(),
            out_edges: EdgeLists::default(),
        }
    }

    /// A serialized literal object for an enumeration.
    pub fn literal_value(id: ElementId, name: &str) -> Value {
        json!({
            "id": id.as_str(),
            "name": name,
            "description": null,
            "type": "Literal",
            "propertyAssignments": null,
        })
    }
}

fn take_string(map: &mut JsonMap, key: &str) -> Option<String> {
    match map.shift_remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_from(value: Value) -> Entity {
        match value {
            Value::Object(map) => Entity::from_map(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn header_fields_are_split_from_rest() {
        let entity = entity_from(json!({
            "id": "e1",
            "name": "Person",
            "description": null,
            "type": "Class",
            "stereotype": "kind",
            "isAbstract": false,
            "restrictedTo": ["functional-complex"],
        }));
        assert_eq!(entity.id.as_str(), "e1");
        assert_eq!(entity.name(), "Person");
        assert_eq!(entity.stereotype, Some(ClassStereotype::Kind));
        assert!(entity.rest.contains_key("isAbstract"));
        assert!(!entity.rest.contains_key("stereotype"));
        assert_eq!(entity.restricted_to_first(), Some("functional-complex"));
    }

    #[test]
    fn prototype_update_keeps_edges() {
        let mut entity = Entity::prototype(ElementId::new("e2"));
        entity.in_edges.add(EdgeKind::Relation, ElementId::new("r1"));
        entity.update_from(
            json!({"id": "e2", "name": "Car", "type": "Class", "stereotype": "kind"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert_eq!(entity.name(), "Car");
        assert_eq!(entity.in_edges.relations.len(), 1);
    }

    #[test]
    fn push_property_creates_list() {
        let mut entity = Entity::new_class(
            ElementId::new("e3"),
            "Heart".into(),
            ClassStereotype::Kind,
        );
        entity.push_property(json!({"name": "Person"}));
        entity.push_property(json!({"name": "Spare"}));
        let list = entity.rest.get("properties").unwrap().as_array().unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn other_up_edges_counts_both_kinds() {
        let mut entity = Entity::prototype(ElementId::new("e4"));
        entity.out_edges.add(EdgeKind::PartOf, ElementId::new("p1"));
        assert!(!entity.has_other_up_edges());
        entity
            .out_edges
            .add(EdgeKind::Generalization, ElementId::new("g1"));
        assert!(entity.has_other_up_edges());
    }
}
