//! The display projection: a flat nodes-and-links graph for rendering,
//! with deterministic colors and symbols, canvas rescaling, and coalescing
//! of parallel links.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};

use crate::base::shade;
use crate::config::Profile;
use crate::graph::ModelGraph;
use crate::model::{ClassStereotype, Edge, EdgeKind, Entity};

#[derive(Clone, Debug, Serialize)]
struct DisplayNode {
    id: String,
    name: String,
    #[serde(rename = "fullName")]
    full_name: String,
    color: String,
    #[serde(rename = "symbolType")]
    symbol_type: String,
    x: i64,
    y: i64,
}

#[derive(Clone, Debug, Serialize)]
struct DisplayLink {
    id: String,
    name: String,
    #[serde(rename = "fullName")]
    full_name: String,
    source: String,
    target: String,
    #[serde(rename = "strokeDasharray", skip_serializing_if = "Option::is_none")]
    stroke_dasharray: Option<i64>,
}

/// Project the graph to the display form. Positive `max_height` /
/// `max_width` bounds rescale coordinates that exceed them.
pub fn to_display_value(graph: &ModelGraph, max_height: i64, max_width: i64) -> Value {
    let profile = graph.profile();

    let mut nodes: Vec<DisplayNode> = Vec::with_capacity(graph.entity_count());
    let mut height = max_height;
    let mut width = max_width;
    for entity in graph.iter_entities() {
        let (x, y) = entity
            .views
            .first()
            .and_then(|id| graph.view(id))
            .map(|view| (view.x(profile.default_x), view.y(profile.default_y)))
            .unwrap_or((0, 0));
        height = height.max(y);
        width = width.max(x);
        nodes.push(DisplayNode {
            id: entity.id.as_str().to_string(),
            name: entity.name().to_string(),
            full_name: entity_full_name(entity),
            color: entity_colour(entity, profile),
            symbol_type: entity_symbol(entity, profile).to_string(),
            x,
            y,
        });
    }
    if height > max_height && max_height > 0 {
        for node in &mut nodes {
            node.y = node.y * (max_height - 10) / height;
        }
    }
    if width > max_width && max_width > 0 {
        for node in &mut nodes {
            node.x = node.x * (max_width - 10) / width;
        }
    }

    let mut links: Vec<DisplayLink> = Vec::with_capacity(graph.edge_count());
    for edge in graph.iter_edges() {
        if edge.from().as_str().is_empty() || edge.to().as_str().is_empty() {
            continue;
        }
        links.push(match edge {
            Edge::Generalization(generalization) => DisplayLink {
                id: generalization.id.as_str().to_string(),
                name: String::new(),
                full_name: String::new(),
                source: generalization.from.as_str().to_string(),
                target: generalization.to.as_str().to_string(),
                stroke_dasharray: Some(profile.stroke_dasharray),
            },
            Edge::Relation(relation) => {
                let stereotype = relation.stereotype.as_ref().map(|s| s.as_str());
                let name = relation.name.as_deref().filter(|n| !n.is_empty());
                let full_name = match (stereotype, name) {
                    (Some(stereotype), Some(name)) => format!("{stereotype}:{name}"),
                    (Some(stereotype), None) => stereotype.to_string(),
                    (None, Some(name)) => name.to_string(),
                    (None, None) => String::new(),
                };
                DisplayLink {
                    id: relation.id.as_str().to_string(),
                    name: name.map(str::to_string).unwrap_or_else(|| full_name.clone()),
                    full_name,
                    source: relation.from.as_str().to_string(),
                    target: relation.to.as_str().to_string(),
                    stroke_dasharray: (relation.kind == EdgeKind::PartOf)
                        .then_some(profile.stroke_dasharray),
                }
            }
        });
    }
    let links = coalesce_links(links);

    let constraints: Vec<String> = graph
        .sets
        .values()
        .map(|set| {
            let members: Vec<String> = set
                .generalizations
                .iter()
                .filter_map(|id| graph.edge(id))
                .map(|edge| {
                    let name = |id: &crate::base::ElementId| {
                        graph
                            .entity(id)
                            .map(|e| e.name().to_string())
                            .unwrap_or_default()
                    };
                    format!("{} -> {}", name(edge.from()), name(edge.to()))
                })
                .collect();
            format!(
                "GeneralizationSet ({}, {}): {{{}}}",
                if set.is_complete { "complete" } else { "not complete" },
                if set.is_disjoint { "disjoint" } else { "not disjoint" },
                members.join(", "),
            )
        })
        .collect();

    json!({
        "graph": {
            "nodes": nodes,
            "links": links,
        },
        "origin": super::to_project_value(graph),
        "constraints": constraints,
    })
}

/// Merge parallel links: links sharing an endpoint pair concatenate their
/// names with `" | "`. The first reversed link of a pair is kept as an
/// unnamed stub in the opposite direction so the renderer can curve the
/// two apart.
fn coalesce_links(links: Vec<DisplayLink>) -> Vec<DisplayLink> {
    let mut connections: IndexMap<String, DisplayLink> = IndexMap::new();
    let mut reversed_stubs: IndexMap<String, DisplayLink> = IndexMap::new();

    for link in links {
        let forward = format!("{}{}", link.source, link.target);
        let backward = format!("{}{}", link.target, link.source);
        if let Some(merged) = connections.get_mut(&forward) {
            merged.name.push_str(" | ");
            merged.name.push_str(&link.name);
            merged.full_name.push_str(" | ");
            merged.full_name.push_str(&link.full_name);
        } else if let Some(merged) = connections.get_mut(&backward) {
            merged.name.push_str(" | ");
            merged.name.push_str(&link.name);
            merged.full_name.push_str(" | ");
            merged.full_name.push_str(&link.full_name);
            if !reversed_stubs.contains_key(&backward) {
                let mut stub = link;
                stub.name = String::new();
                stub.full_name = String::new();
                reversed_stubs.insert(backward, stub);
            }
        } else {
            connections.insert(forward, link);
        }
    }

    connections
        .into_values()
        .chain(reversed_stubs.into_values())
        .collect()
}

fn entity_full_name(entity: &Entity) -> String {
    match &entity.stereotype {
        Some(stereotype) => format!("{}:{}", stereotype.as_str(), entity.name()),
        None => entity.name().to_string(),
    }
}

/// The deterministic color table: `restrictedTo` picks a base, the
/// stereotype overrides it, and role/phase/subkind shade whatever base
/// they inherited.
fn entity_colour(entity: &Entity, profile: &Profile) -> String {
    let mut colour = profile.basic_colour.clone();
    match entity.restricted_to_first() {
        Some("relator") => colour = profile.relator_colour.clone(),
        Some("event") => colour = profile.event_colour.clone(),
        Some("functional-complex") => colour = profile.object_colour.clone(),
        Some("intrinsic-mode") => colour = profile.mode_colour.clone(),
        _ => {}
    }
    use ClassStereotype as S;
    match &entity.stereotype {
        Some(S::Relator) => profile.relator_colour.clone(),
        Some(S::Quality | S::Mode) => profile.mode_colour.clone(),
        Some(S::Enumeration | S::Datatype | S::Abstract) => profile.enumeration_colour.clone(),
        Some(S::Event | S::Situation) => profile.event_colour.clone(),
        Some(S::Kind | S::Category | S::Quantity | S::Collective) => profile.object_colour.clone(),
        Some(S::Role | S::Phase | S::Subkind) => shade(&colour, profile.colour_variation),
        _ => profile.basic_colour.clone(),
    }
}

fn entity_symbol<'a>(entity: &Entity, profile: &'a Profile) -> &'a str {
    use ClassStereotype as S;
    match &entity.stereotype {
        Some(S::Relator) => &profile.relator_symbol,
        Some(S::Quality | S::Mode) => &profile.mode_symbol,
        Some(S::Enumeration | S::Datatype | S::Abstract) => &profile.enumeration_symbol,
        Some(S::Event | S::Situation) => &profile.event_symbol,
        _ => &profile.basic_symbol,
    }
}
