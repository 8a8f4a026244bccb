//! Graph construction and canonical round-trip tests.

#![allow(clippy::unwrap_used)]

mod common;

use common::*;
use serde_json::{json, Value};

use ontograph::interchange;
use ontograph::model::EdgeKind;
use ontograph::{ElementId, ModelGraph};

#[test]
fn builds_entities_and_edge_indices() {
    let value = project(
        vec![
            class("person", "Person", Some("kind")),
            class("school", "School", Some("kind")),
            relation("r1", Some("studies at"), Some("material"), "person", "school"),
        ],
        vec![],
    );
    let graph = ModelGraph::from_project(&value).unwrap();
    assert_eq!(graph.entity_count(), 2);
    assert_eq!(graph.edge_count(), 1);

    let person = graph.entity(&ElementId::new("person")).unwrap();
    assert_eq!(person.out_edges.relations, vec![ElementId::new("r1")]);
    let school = graph.entity(&ElementId::new("school")).unwrap();
    assert_eq!(school.in_edges.relations, vec![ElementId::new("r1")]);
    assert_consistent(&graph);
}

#[test]
fn relation_before_class_creates_and_updates_prototype() {
    let value = project(
        vec![
            relation("r1", None, Some("material"), "person", "school"),
            class("person", "Person", Some("kind")),
            class("school", "School", Some("kind")),
        ],
        vec![],
    );
    let graph = ModelGraph::from_project(&value).unwrap();
    let person = graph.entity(&ElementId::new("person")).unwrap();
    assert_eq!(person.name(), "Person");
    assert_eq!(person.out_edges.relations.len(), 1);
    assert_consistent(&graph);
}

#[test]
fn nested_packages_are_flattened_but_remembered() {
    let value = json!({
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
            "contents": [
                {
                    "id": "pkg1",
                    "name": "Core",
                    "description": null,
                    "type": "Package",
                    "propertyAssignments": null,
                    "contents": [class("person", "Person", Some("kind"))],
                },
                class("car", "Car", Some("kind")),
            ],
        },
        "diagrams": null,
    });
    let graph = ModelGraph::from_project(&value).unwrap();
    assert_eq!(graph.entity_count(), 2);
    assert!(graph.entity(&ElementId::new("person")).is_some());

    let out = interchange::to_project_value(&graph);
    let contents = out["model"]["contents"].as_array().unwrap();
    // The package shell survives, its content is hoisted next to it.
    assert_eq!(contents[0]["id"], json!("pkg1"));
    assert!(contents[0]["contents"].as_array().unwrap().is_empty());
    let hoisted: Vec<&str> = contents[1..]
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert!(hoisted.contains(&"person"));
    assert!(hoisted.contains(&"car"));
}

#[test]
fn part_of_with_source_aggregation_is_inverted_on_load() {
    // Aggregation on the source endpoint means the serialized edge points
    // whole → part; loading must flip it so the whole is the target.
    let mut part_of = relation_full(
        "p1",
        None,
        Some("componentOf"),
        "engine",
        "car",
        Some("1"),
        Some("1..*"),
        "NONE",
        false,
    );
    part_of["properties"][0]["aggregationKind"] = json!("COMPOSITE");
    let value = project(
        vec![
            class("car", "Car", Some("kind")),
            class("engine", "Engine", Some("kind")),
            part_of,
        ],
        vec![],
    );
    let graph = ModelGraph::from_project(&value).unwrap();
    let edge = graph.edge(&ElementId::new("p1")).unwrap();
    assert_eq!(edge.kind(), EdgeKind::PartOf);
    assert_eq!(edge.from().as_str(), "car");
    assert_eq!(edge.to().as_str(), "engine");
    let relation = edge.as_relation().unwrap();
    assert_eq!(relation.cardinality_from(), Some("1..*"));
    assert_consistent(&graph);
}

#[test]
fn generalizations_between_relations_are_ignored() {
    let value = project(
        vec![
            class("person", "Person", Some("kind")),
            class("student", "Student", Some("role")),
            json!({
                "id": "g1",
                "name": null,
                "description": null,
                "type": "Generalization",
                "propertyAssignments": null,
                "general": {"id": "r9", "type": "Relation"},
                "specific": {"id": "r8", "type": "Relation"},
            }),
            generalization("g2", "student", "person"),
        ],
        vec![],
    );
    let graph = ModelGraph::from_project(&value).unwrap();
    assert!(graph.edge(&ElementId::new("g1")).is_none());
    assert!(graph.edge(&ElementId::new("g2")).is_some());
    assert_eq!(graph.entity_count(), 2);
}

#[test]
fn inverted_relation_view_is_repaired() {
    let views = vec![
        class_view("v_person", "person", 0, 0),
        class_view("v_school", "school", 200, 0),
        // source/target views crossed with respect to the relation
        relation_view("v_r1", "r1", "v_school", "v_person"),
    ];
    let value = project(
        vec![
            class("person", "Person", Some("kind")),
            class("school", "School", Some("kind")),
            relation("r1", None, Some("material"), "person", "school"),
        ],
        vec![diagram("d1", views)],
    );
    let graph = ModelGraph::from_project(&value).unwrap();
    let view = graph.view(&ElementId::new("v_r1")).unwrap();
    assert_eq!(view.source.as_ref().unwrap().id.as_str(), "v_person");
    assert_eq!(view.target.as_ref().unwrap().id.as_str(), "v_school");
    assert_consistent(&graph);
}

#[test]
fn views_of_unknown_elements_are_discarded() {
    let views = vec![
        class_view("v_person", "person", 0, 0),
        class_view("v_ghost", "ghost_class", 10, 10),
    ];
    let value = project(
        vec![class("person", "Person", Some("kind"))],
        vec![diagram("d1", views)],
    );
    let graph = ModelGraph::from_project(&value).unwrap();
    assert!(graph.view(&ElementId::new("v_person")).is_some());
    assert!(graph.view(&ElementId::new("v_ghost")).is_none());
    let d1 = graph.diagram(&ElementId::new("d1")).unwrap();
    assert_eq!(d1.views.len(), 1);
}

#[test]
fn canonical_round_trip_is_exact_for_untouched_models() {
    let value = project(
        vec![
            class("person", "Person", Some("kind")),
            class("male", "Male", Some("subkind")),
            class("female", "Female", Some("subkind")),
            relation_full(
                "r1",
                Some("knows"),
                Some("material"),
                "person",
                "person",
                Some("0..*"),
                Some("0..*"),
                "NONE",
                false,
            ),
            generalization("g1", "male", "person"),
            generalization("g2", "female", "person"),
            generalization_set("gs1", "gender", &["g1", "g2"], true, true),
        ],
        vec![diagram(
            "d1",
            vec![
                class_view("v_person", "person", 40, 40),
                class_view("v_male", "male", 40, 160),
                class_view("v_female", "female", 200, 160),
            ],
        )],
    );
    let graph = ModelGraph::from_project(&value).unwrap();
    let out = interchange::to_project_value(&graph);
    assert_eq!(out, value);
}

#[test]
fn categorizer_names_the_set() {
    let mut categorizer = class("cat1", "AgePhase", Some("type"));
    categorizer["order"] = json!("2");
    let mut set = generalization_set("gs1", "unnamed", &["g1", "g2"], false, true);
    set["categorizer"] = json!({"id": "cat1", "type": "Class"});
    let value = project(
        vec![
            categorizer,
            class("person", "Person", Some("kind")),
            class("child", "Child", Some("phase")),
            class("adult", "Adult", Some("phase")),
            generalization("g1", "child", "person"),
            generalization("g2", "adult", "person"),
            set,
        ],
        vec![],
    );
    let graph = ModelGraph::from_project(&value).unwrap();
    let set = graph.iter_sets().next().unwrap();
    assert_eq!(set.name(), "AgePhase");
    assert!(set.is_disjoint && !set.is_complete);
}

#[test]
fn missing_model_is_rejected() {
    let err = ModelGraph::from_project(&json!({"diagrams": []})).unwrap_err();
    assert!(matches!(err, ontograph::GraphError::BadInput(_)));
}

#[test]
fn display_and_canonical_share_origin() {
    let value = project(
        vec![class("person", "Person", Some("kind"))],
        vec![diagram("d1", vec![class_view("v_person", "person", 40, 40)])],
    );
    let graph = ModelGraph::from_project(&value).unwrap();
    let display = interchange::display::to_display_value(&graph, 0, 0);
    assert_eq!(display["origin"], interchange::to_project_value(&graph));
    let nodes = display["graph"]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0]["fullName"], json!("kind:Person"));
    assert_eq!(nodes[0]["x"], json!(40));
}

#[test]
fn index_keys_follow_clean_name_and_stereotype() {
    let value = project(
        vec![class("hcp", "Health Care Provider", Some("kind"))],
        vec![],
    );
    let graph = ModelGraph::from_project(&value).unwrap();
    assert_eq!(
        graph.node_index(&ElementId::new("hcp")),
        Some("healthcareprovider:kind".to_string())
    );
    assert_eq!(graph.index(), vec!["healthcareprovider:kind".to_string()]);
}

#[test]
fn hierarchy_descriptor_walks_down_with_sets() {
    let value = project(
        vec![
            class("person", "Person", Some("kind")),
            class("male", "Male", Some("subkind")),
            class("female", "Female", Some("subkind")),
            generalization("g1", "male", "person"),
            generalization("g2", "female", "person"),
            generalization_set("gs1", "gender", &["g1", "g2"], true, true),
        ],
        vec![],
    );
    let graph = ModelGraph::from_project(&value).unwrap();
    let hierarchy = graph.hierarchy_of("person:kind");
    assert_eq!(
        hierarchy.nodes.get("person:kind").unwrap(),
        &vec!["male:subkind".to_string(), "female:subkind".to_string()]
    );
    let set = hierarchy.sets.get("gs1").unwrap();
    assert_eq!(set.to, "person:kind");
    assert_eq!(set.from.len(), 2);
    assert!(set.complete && set.disjoint);

    let unknown: Value = serde_json::to_value(graph.hierarchy_of("nothing:kind")).unwrap();
    assert_eq!(unknown["nodes"], json!({}));
}
