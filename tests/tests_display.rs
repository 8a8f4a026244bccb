//! The display projection: colors, symbols, rescaling, link coalescing,
//! and constraint verbalization.

#![allow(clippy::unwrap_used)]

mod common;

use common::*;
use serde_json::{json, Value};

use ontograph::interchange::display::to_display_value;
use ontograph::{ModelGraph, Profile};

fn display(value: &Value, max_height: i64, max_width: i64) -> Value {
    let graph = ModelGraph::from_project(value).unwrap();
    to_display_value(&graph, max_height, max_width)
}

fn node<'a>(out: &'a Value, id: &str) -> &'a Value {
    out["graph"]["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == json!(id))
        .unwrap()
}

#[test]
fn colors_and_symbols_follow_the_stereotype_table() {
    let profile = Profile::default();
    let value = project(
        vec![
            class("person", "Person", Some("kind")),
            class("marriage", "Marriage", Some("relator")),
            class("mood", "Mood", Some("mode")),
            class("gender", "Gender", Some("enumeration")),
            class("party", "Party", Some("event")),
            class("student", "Student", Some("role")),
            class("thing", "Thing", None),
        ],
        vec![],
    );
    let out = display(&value, 0, 0);

    assert_eq!(node(&out, "person")["color"], json!(profile.object_colour));
    assert_eq!(node(&out, "marriage")["color"], json!(profile.relator_colour));
    assert_eq!(node(&out, "marriage")["symbolType"], json!(profile.relator_symbol));
    assert_eq!(node(&out, "mood")["color"], json!(profile.mode_colour));
    assert_eq!(node(&out, "gender")["color"], json!(profile.enumeration_colour));
    assert_eq!(node(&out, "party")["color"], json!(profile.event_colour));
    assert_eq!(node(&out, "party")["symbolType"], json!(profile.event_symbol));
    // Roles shade the base color; with no restrictedTo the base is basic.
    assert_eq!(node(&out, "student")["color"], json!("#EFEFEF"));
    assert_eq!(node(&out, "thing")["color"], json!(profile.basic_colour));
    assert_eq!(node(&out, "thing")["fullName"], json!("Thing"));
    assert_eq!(node(&out, "person")["fullName"], json!("kind:Person"));
}

#[test]
fn restricted_to_picks_the_shade_base() {
    let mut role = class("owner", "Owner", Some("role"));
    role["restrictedTo"] = json!(["functional-complex"]);
    let out = display(&project(vec![role], vec![]), 0, 0);
    // Object color #FFD0D0 shifted by -16 per channel.
    assert_eq!(node(&out, "owner")["color"], json!("#EFC0C0"));
}

#[test]
fn coordinates_rescale_into_the_requested_canvas() {
    let value = project(
        vec![
            class("near", "Near", Some("kind")),
            class("far", "Far", Some("kind")),
        ],
        vec![diagram(
            "d1",
            vec![
                class_view("v_near", "near", 100, 100),
                class_view("v_far", "far", 1000, 1000),
            ],
        )],
    );
    let out = display(&value, 100, 100);
    assert_eq!(node(&out, "far")["y"], json!(90));
    assert_eq!(node(&out, "near")["y"], json!(9));
    assert_eq!(node(&out, "far")["x"], json!(90));

    // Without bounds nothing is rescaled.
    let out = display(&value, 0, 0);
    assert_eq!(node(&out, "far")["y"], json!(1000));
}

#[test]
fn parallel_links_coalesce_and_reversed_links_get_a_stub() {
    let value = project(
        vec![
            class("a", "A", Some("kind")),
            class("b", "B", Some("kind")),
            relation("r1", Some("likes"), Some("material"), "a", "b"),
            relation("r2", Some("admires"), Some("material"), "a", "b"),
            relation("r3", Some("ignores"), Some("material"), "b", "a"),
        ],
        vec![],
    );
    let out = display(&value, 0, 0);
    let links = out["graph"]["links"].as_array().unwrap();
    assert_eq!(links.len(), 2);

    let merged = &links[0];
    assert_eq!(merged["source"], json!("a"));
    assert_eq!(merged["name"], json!("likes | admires | ignores"));
    assert_eq!(
        merged["fullName"],
        json!("material:likes | material:admires | material:ignores")
    );

    let stub = &links[1];
    assert_eq!(stub["source"], json!("b"));
    assert_eq!(stub["target"], json!("a"));
    assert_eq!(stub["name"], json!(""));
}

#[test]
fn parthood_and_generalization_links_are_dashed() {
    let value = project(
        vec![
            class("car", "Car", Some("kind")),
            class("engine", "Engine", Some("kind")),
            class("sportscar", "Sportscar", Some("subkind")),
            class("driver", "Driver", Some("role")),
            relation_full(
                "p1",
                None,
                Some("componentOf"),
                "engine",
                "car",
                None,
                None,
                "COMPOSITE",
                false,
            ),
            generalization("g1", "sportscar", "car"),
            relation("r1", None, Some("material"), "driver", "car"),
        ],
        vec![],
    );
    let out = display(&value, 0, 0);
    let links = out["graph"]["links"].as_array().unwrap();
    let by_id = |id: &str| {
        links
            .iter()
            .find(|l| l["id"] == json!(id))
            .unwrap_or_else(|| panic!("link {id} missing"))
    };
    assert_eq!(by_id("p1")["strokeDasharray"], json!(5));
    assert_eq!(by_id("g1")["strokeDasharray"], json!(5));
    assert!(by_id("r1").get("strokeDasharray").is_none());
    // An unnamed stereotyped relation displays its stereotype.
    assert_eq!(by_id("r1")["name"], json!("material"));
    assert_eq!(by_id("p1")["fullName"], json!("componentOf"));
}

#[test]
fn generalization_sets_verbalize_as_constraints() {
    let value = project(
        vec![
            class("person", "Person", Some("kind")),
            class("male", "Male", Some("subkind")),
            class("female", "Female", Some("subkind")),
            generalization("g1", "male", "person"),
            generalization("g2", "female", "person"),
            generalization_set("gs1", "gender", &["g1", "g2"], true, false),
        ],
        vec![],
    );
    let out = display(&value, 0, 0);
    let constraints = out["constraints"].as_array().unwrap();
    assert_eq!(
        constraints[0],
        json!("GeneralizationSet (complete, not disjoint): {Male -> Person, Female -> Person}")
    );
}

#[test]
fn entities_without_views_sit_at_the_origin() {
    let value = project(vec![class("person", "Person", Some("kind"))], vec![]);
    let out = display(&value, 0, 0);
    assert_eq!(node(&out, "person")["x"], json!(0));
    assert_eq!(node(&out, "person")["y"], json!(0));
}
