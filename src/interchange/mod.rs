//! Canonical project serialization.
//!
//! Re-serialization reconstructs the original nested shape: the package
//! skeleton is emitted as loaded, and every entity, relation, and
//! generalization set is appended to the outermost model's contents.
//! Unchanged fields round-trip bit-compatibly; only generated ids and the
//! reordering of hoisted contents differ from the input.

pub mod display;

use serde_json::{json, Map, Value};

use crate::graph::ModelGraph;
use crate::model::{
    Edge, Entity, Generalization, GeneralizationSet, PackageTree, Relation, Shape, View,
};

/// Serialize the graph back to the canonical project form.
pub fn to_project_value(graph: &ModelGraph) -> Value {
    let mut project = Map::new();
    project.insert("id".into(), opt_str(&graph.project.id));
    project.insert("name".into(), opt_str(&graph.project.name));
    project.insert("description".into(), opt_str(&graph.project.description));
    project.insert("type".into(), json!(graph.project.element_type));

    let mut model = package_value(&graph.model);
    if let Some(Value::Array(contents)) = model.get_mut("contents") {
        for entity in graph.iter_entities() {
            contents.push(entity_value(entity));
        }
        for edge in graph.iter_edges() {
            match edge {
                Edge::Relation(relation) => contents.push(relation_value(relation)),
                Edge::Generalization(generalization) => {
                    if let Some(value) = generalization_value(graph, generalization) {
                        contents.push(value);
                    }
                }
            }
        }
        for set in graph.sets.values() {
            contents.push(set_value(set));
        }
    }
    project.insert("model".into(), model);

    let diagrams: Vec<Value> = graph
        .diagrams
        .values()
        .map(|diagram| {
            let views: Vec<Value> = diagram
                .views
                .iter()
                .filter_map(|id| graph.view(id))
                .map(view_value)
                .collect();
            json!({
                "id": diagram.id.as_str(),
                "name": opt_str(&diagram.name),
                "description": opt_str(&diagram.description),
                "type": diagram.element_type,
                "owner": diagram.owner,
                "contents": views,
            })
        })
        .collect();
    project.insert("diagrams".into(), Value::Array(diagrams));

    Value::Object(project)
}

fn package_value(package: &PackageTree) -> Value {
    let children: Vec<Value> = package.packages.iter().map(package_value).collect();
    json!({
        "id": opt_str(&package.id),
        "name": opt_str(&package.name),
        "description": opt_str(&package.description),
        "type": package.element_type,
        "propertyAssignments": package.property_assignments,
        "contents": children,
    })
}

fn entity_value(entity: &Entity) -> Value {
    let mut map = Map::new();
    map.insert("id".into(), json!(entity.id.as_str()));
    map.insert("name".into(), opt_str(&entity.name));
    map.insert("description".into(), opt_str(&entity.description));
    map.insert("type".into(), json!(entity.element_type));
    map.insert(
        "stereotype".into(),
        match &entity.stereotype {
            Some(stereotype) => json!(stereotype.as_str()),
            None => Value::Null,
        },
    );
    for (key, value) in &entity.rest {
        map.insert(key.clone(), value.clone());
    }
    Value::Object(map)
}

fn relation_value(relation: &Relation) -> Value {
    let mut map = Map::new();
    map.insert("id".into(), json!(relation.id.as_str()));
    map.insert("name".into(), opt_str(&relation.name));
    map.insert("description".into(), opt_str(&relation.description));
    map.insert("type".into(), json!("Relation"));
    map.insert(
        "stereotype".into(),
        match &relation.stereotype {
            Some(stereotype) => json!(stereotype.as_str()),
            None => Value::Null,
        },
    );
    for (key, value) in &relation.rest {
        map.insert(key.clone(), value.clone());
    }

    let mut properties = Vec::with_capacity(2);
    for (end, endpoint) in relation.ends.iter().zip([&relation.from, &relation.to]) {
        let mut end = end.clone();
        match &mut end.property_type {
            Some(Value::Object(target)) => {
                target.insert("id".into(), json!(endpoint.as_str()));
            }
            other => *other = Some(json!({"id": endpoint.as_str(), "type": "Class"})),
        }
        properties.push(serde_json::to_value(&end).unwrap_or(Value::Null));
    }
    map.insert("properties".into(), Value::Array(properties));
    Value::Object(map)
}

fn generalization_value(graph: &ModelGraph, generalization: &Generalization) -> Option<Value> {
    // Prototypes that never resolved stay out of the output.
    if generalization.from.as_str().is_empty() || generalization.to.as_str().is_empty() {
        return None;
    }
    let end_type = |id: &crate::base::ElementId| -> String {
        graph
            .entity(id)
            .map(|e| e.element_type.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Class".into())
    };
    Some(json!({
        "id": generalization.id.as_str(),
        "name": opt_str(&generalization.name),
        "description": opt_str(&generalization.description),
        "type": "Generalization",
        "propertyAssignments": generalization.property_assignments,
        "general": {"id": generalization.to.as_str(), "type": end_type(&generalization.to)},
        "specific": {"id": generalization.from.as_str(), "type": end_type(&generalization.from)},
    }))
}

fn set_value(set: &GeneralizationSet) -> Value {
    let mut map = Map::new();
    map.insert("id".into(), json!(set.id.as_str()));
    map.insert("name".into(), opt_str(&set.name));
    map.insert("description".into(), opt_str(&set.description));
    map.insert("type".into(), json!(set.element_type));
    for (key, value) in &set.rest {
        map.insert(key.clone(), value.clone());
    }
    map.insert("isDisjoint".into(), json!(set.is_disjoint));
    map.insert("isComplete".into(), json!(set.is_complete));
    let members: Vec<Value> = set
        .generalizations
        .iter()
        .map(|id| json!({"id": id.as_str(), "type": "Generalization"}))
        .collect();
    map.insert("generalizations".into(), Value::Array(members));
    Value::Object(map)
}

fn view_value(view: &View) -> Value {
    let mut map = Map::new();
    map.insert("id".into(), json!(view.id.as_str()));
    map.insert("type".into(), json!(view.view_type));
    map.insert(
        "modelElement".into(),
        json!({"id": view.element.id.as_str(), "type": view.element.ref_type}),
    );
    map.insert("shape".into(), shape_value(&view.shape));
    if let Some(source) = &view.source {
        map.insert(
            "source".into(),
            json!({"id": source.id.as_str(), "type": source.ref_type}),
        );
    }
    if let Some(target) = &view.target {
        map.insert(
            "target".into(),
            json!({"id": target.id.as_str(), "type": target.ref_type}),
        );
    }
    Value::Object(map)
}

fn shape_value(shape: &Shape) -> Value {
    match shape {
        Shape::Rectangle {
            id,
            x,
            y,
            width,
            height,
        } => json!({
            "id": id, "type": "Rectangle", "x": x, "y": y, "width": width, "height": height,
        }),
        Shape::Path { id, points } => {
            let points: Vec<Value> = points.iter().map(|p| json!({"x": p.x, "y": p.y})).collect();
            json!({"id": id, "type": "Path", "points": points})
        }
        Shape::Text {
            id,
            x,
            y,
            width,
            height,
            value,
        } => json!({
            "id": id, "type": "Text", "x": x, "y": y, "width": width, "height": height,
            "value": value,
        }),
    }
}

fn opt_str(value: &Option<String>) -> Value {
    match value {
        Some(s) => json!(s),
        None => Value::Null,
    }
}
