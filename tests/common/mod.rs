//! Shared fixture builders for the integration tests: serialized project
//! snippets in the canonical format, plus structural invariant checks.

#![allow(dead_code)]

use serde_json::{json, Value};

use ontograph::model::EdgeKind;
use ontograph::ModelGraph;

/// A project wrapping the given model contents and diagrams.
pub fn project(contents: Vec<Value>, diagrams: Vec<Value>) -> Value {
    json!({
        "id": "project1",
        "name": "Test Project",
        "description": null,
        "type": "Project",
        "model": {
            "id": "model1",
            "name": "Model",
            "description": null,
            "type": "Package",
            "propertyAssignments": null,
            "contents": contents,
        },
        "diagrams": diagrams,
    })
}

/// A class element.
pub fn class(id: &str, name: &str, stereotype: Option<&str>) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "type": "Class",
        "propertyAssignments": null,
        "stereotype": stereotype,
        "isAbstract": false,
        "isDerived": false,
        "properties": null,
        "isExtensional": null,
        "isPowertype": null,
        "order": null,
        "literals": null,
        "restrictedTo": [],
    })
}

fn property(id: &str, target: &str, cardinality: Option<&str>, aggregation: &str, read_only: bool) -> Value {
    json!({
        "id": id,
        "name": null,
        "description": null,
        "type": "Property",
        "propertyAssignments": null,
        "stereotype": null,
        "isDerived": false,
        "isReadOnly": read_only,
        "isOrdered": false,
        "cardinality": cardinality,
        "propertyType": {"id": target, "type": "Class"},
        "subsettedProperties": null,
        "redefinedProperties": null,
        "aggregationKind": aggregation,
    })
}

/// An ordinary relation with no cardinalities.
pub fn relation(id: &str, name: Option<&str>, stereotype: Option<&str>, from: &str, to: &str) -> Value {
    relation_full(id, name, stereotype, from, to, None, None, "NONE", false)
}

/// A relation with every knob: cardinalities, target-side aggregation,
/// read-only endpoints.
#[allow(clippy::too_many_arguments)]
pub fn relation_full(
    id: &str,
    name: Option<&str>,
    stereotype: Option<&str>,
    from: &str,
    to: &str,
    cardinality_from: Option<&str>,
    cardinality_to: Option<&str>,
    aggregation_to: &str,
    read_only: bool,
) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "type": "Relation",
        "propertyAssignments": null,
        "stereotype": stereotype,
        "isAbstract": false,
        "isDerived": false,
        "properties": [
            property(&format!("{id}_p0"), from, cardinality_from, "NONE", read_only),
            property(&format!("{id}_p1"), to, cardinality_to, aggregation_to, read_only),
        ],
    })
}

/// A generalization from `specific` to `general`.
pub fn generalization(id: &str, specific: &str, general: &str) -> Value {
    json!({
        "id": id,
        "name": null,
        "description": null,
        "type": "Generalization",
        "propertyAssignments": null,
        "general": {"id": general, "type": "Class"},
        "specific": {"id": specific, "type": "Class"},
    })
}

/// A generalization set over the given generalization ids.
pub fn generalization_set(
    id: &str,
    name: &str,
    members: &[&str],
    complete: bool,
    disjoint: bool,
) -> Value {
    let members: Vec<Value> = members
        .iter()
        .map(|m| json!({"id": m, "type": "Generalization"}))
        .collect();
    json!({
        "id": id,
        "name": name,
        "description": null,
        "type": "GeneralizationSet",
        "propertyAssignments": null,
        "isDisjoint": disjoint,
        "isComplete": complete,
        "categorizer": null,
        "generalizations": members,
    })
}

/// A diagram owning the given views.
pub fn diagram(id: &str, views: Vec<Value>) -> Value {
    json!({
        "id": id,
        "name": "Diagram",
        "description": null,
        "type": "Diagram",
        "owner": {"id": "model1", "type": "Package"},
        "contents": views,
    })
}

/// A rectangle view of a class.
pub fn class_view(id: &str, element: &str, x: i64, y: i64) -> Value {
    json!({
        "id": id,
        "type": "ClassView",
        "modelElement": {"id": element, "type": "Class"},
        "shape": {
            "id": format!("{id}_shape"),
            "type": "Rectangle",
            "x": x, "y": y, "width": 100, "height": 50,
        },
    })
}

/// A polyline view of a relation between two class views.
pub fn relation_view(id: &str, element: &str, source_view: &str, target_view: &str) -> Value {
    json!({
        "id": id,
        "type": "RelationView",
        "modelElement": {"id": element, "type": "Relation"},
        "shape": {
            "id": format!("{id}_path"),
            "type": "Path",
            "points": [{"x": 0, "y": 0}, {"x": 10, "y": 10}],
        },
        "source": {"id": source_view, "type": "ClassView"},
        "target": {"id": target_view, "type": "ClassView"},
    })
}

/// Assert the structural invariants every successful operation preserves:
/// edge endpoints and entity indices agree, sets keep at least two members,
/// views sit in existing diagrams.
pub fn assert_consistent(graph: &ModelGraph) {
    for edge in graph.iter_edges() {
        if edge.from().as_str().is_empty() {
            continue;
        }
        let kind = edge.kind();
        let from = graph.entity(edge.from()).unwrap_or_else(|| {
            panic!("edge {} has unknown source {}", edge.id(), edge.from())
        });
        assert!(
            from.out_edges.get(kind).contains(edge.id()),
            "edge {} missing from source index",
            edge.id()
        );
        let to = graph
            .entity(edge.to())
            .unwrap_or_else(|| panic!("edge {} has unknown target {}", edge.id(), edge.to()));
        assert!(
            to.in_edges.get(kind).contains(edge.id()),
            "edge {} missing from target index",
            edge.id()
        );
    }

    for entity in graph.iter_entities() {
        for kind in EdgeKind::ALL {
            for edge_id in entity.in_edges.get(kind) {
                let edge = graph
                    .edge(edge_id)
                    .unwrap_or_else(|| panic!("dangling incoming edge {edge_id}"));
                assert_eq!(edge.to(), &entity.id);
                assert_eq!(edge.kind(), kind);
            }
            for edge_id in entity.out_edges.get(kind) {
                let edge = graph
                    .edge(edge_id)
                    .unwrap_or_else(|| panic!("dangling outgoing edge {edge_id}"));
                assert_eq!(edge.from(), &entity.id);
                assert_eq!(edge.kind(), kind);
            }
        }
        for view_id in &entity.views {
            let view = graph
                .view(view_id)
                .unwrap_or_else(|| panic!("dangling view {view_id}"));
            let diagram = graph
                .diagram(&view.diagram)
                .unwrap_or_else(|| panic!("view {view_id} sits in unknown diagram"));
            assert!(diagram.views.contains(view_id));
        }
    }

    for set in graph.iter_sets() {
        assert!(
            set.generalizations.len() >= 2,
            "set {} degenerated to {} members",
            set.id,
            set.generalizations.len()
        );
        for member in &set.generalizations {
            let edge = graph
                .edge(member)
                .unwrap_or_else(|| panic!("set {} references unknown edge", set.id));
            let generalization = edge.as_generalization().expect("set member must be a generalization");
            assert_eq!(generalization.set.as_ref(), Some(&set.id));
        }
    }
}

/// Count entities with the given stereotype tag.
pub fn count_with_stereotype(graph: &ModelGraph, tag: &str) -> usize {
    graph
        .iter_entities()
        .filter(|e| e.stereotype.as_ref().map(|s| s.as_str()) == Some(tag))
        .count()
}
