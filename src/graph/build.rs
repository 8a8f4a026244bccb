//! Building the arena from a serialized project.
//!
//! The model's content tree is walked with nested packages flattened; class
//! elements become entities (or update earlier prototypes), relations and
//! generalizations are wired into both endpoint indices, generalization
//! sets resolve their members (creating prototypes when a member has not
//! been seen yet). Diagram views are attached afterwards, with two repairs:
//! relation views whose endpoints are crossed are inverted, and parthoods
//! whose aggregation marker sits on the source are re-oriented so the whole
//! is always the target.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::base::ElementId;
use crate::config::Profile;
use crate::error::GraphError;
use crate::model::view::RELATION_VIEW;
use crate::model::{
    Diagram, Edge, EdgeKind, EdgeLists, Entity, Generalization, GeneralizationSet, JsonMap,
    PackageTree, ProjectMeta, Relation, View,
};

use super::ModelGraph;

impl ModelGraph {
    /// Materialize a serialized project with the default profile.
    pub fn from_project(project: &Value) -> Result<Self, GraphError> {
        Self::from_project_with(project, Profile::default())
    }

    /// Materialize a serialized project.
    pub fn from_project_with(project: &Value, profile: Profile) -> Result<Self, GraphError> {
        debug!("initialising graph of the model");
        let Some(project_map) = project.as_object() else {
            return Err(GraphError::bad_input("the project is not a JSON object"));
        };
        let Some(model) = project_map.get("model").and_then(Value::as_object) else {
            return Err(GraphError::bad_input(
                "the model is not loaded, load the model first",
            ));
        };

        let mut graph = Self {
            profile,
            project: ProjectMeta::from_map(project_map),
            model: PackageTree::from_map(model),
            entities: IndexMap::new(),
            edges: IndexMap::new(),
            edge_order: EdgeLists::default(),
            sets: IndexMap::new(),
            diagrams: IndexMap::new(),
            views: IndexMap::new(),
            by_stereotype: FxHashMap::default(),
            categorizer_names: FxHashMap::default(),
            fold_stack: Vec::new(),
            aspect_guard: Vec::new(),
            pending_removal: Vec::new(),
        };

        for element in flatten_contents(model.get("contents")) {
            match element.get("type").and_then(Value::as_str) {
                Some("Class") => graph.add_class(element.clone()),
                Some("GeneralizationSet") => {
                    graph.add_generalization_set(element.clone());
                }
                _ => graph.add_edge_element(element),
            }
        }

        if let Some(diagrams) = project_map.get("diagrams").and_then(Value::as_array) {
            for diagram_value in diagrams {
                graph.add_diagram(diagram_value);
            }
        }
        graph.repair_inverted_views();

        Ok(graph)
    }

    /// Add (or update a prototype of) a class element.
    pub(crate) fn add_class(&mut self, map: JsonMap) {
        let Some(id) = map.get("id").and_then(Value::as_str).map(ElementId::new) else {
            return;
        };
        if map.get("order").and_then(Value::as_str) == Some("2") {
            if let Some(name) = map.get("name").and_then(Value::as_str) {
                self.categorizer_names.insert(id.clone(), name.to_string());
            }
        }

        if let Some(existing) = self.entities.get_mut(&id) {
            existing.update_from(map);
            let key = existing.stereotype_key();
            let bucket = self.by_stereotype.entry(key).or_default();
            if !bucket.contains(&id) {
                bucket.push(id);
            }
        } else {
            self.register_entity(Entity::from_map(map));
        }
    }

    /// Add a relation or generalization element. Elements whose endpoints
    /// are not classes (generalizations between relations, export
    /// artifacts) are ignored.
    pub(crate) fn add_edge_element(&mut self, map: &JsonMap) {
        let element_type = map.get("type").and_then(Value::as_str).unwrap_or_default();
        if element_type == "Generalization" {
            let Some((from, to)) = Generalization::endpoint_ids(map) else {
                return;
            };
            self.ensure_entity(&from);
            self.ensure_entity(&to);
            let id = map
                .get("id")
                .and_then(Value::as_str)
                .map(ElementId::new)
                .unwrap_or_else(|| self.generate_id());
            if let Some(Edge::Generalization(prototype)) = self.edges.get_mut(&id) {
                // Promoted from a set reference; wire the indices now.
                prototype.update_from(map, from.clone(), to.clone());
                self.edge_order
                    .add(EdgeKind::Generalization, id.clone());
                if let Some(entity) = self.entities.get_mut(&from) {
                    entity
                        .out_edges
                        .add(EdgeKind::Generalization, id.clone());
                }
                if let Some(entity) = self.entities.get_mut(&to) {
                    entity
                        .in_edges
                        .add(EdgeKind::Generalization, id.clone());
                }
            } else {
                let generalization = Generalization::from_map(map, from, to);
                self.register_edge(Edge::Generalization(generalization));
            }
        } else {
            let Some((from, to)) = Relation::endpoint_ids(map) else {
                return;
            };
            self.ensure_entity(&from);
            self.ensure_entity(&to);
            let mut relation = Relation::from_map(map.clone(), from, to);
            if relation.kind == EdgeKind::PartOf && relation.is_aggregation_from() {
                warn!(relation = %relation.id, "inverting part-of relation");
                relation.invert();
            }
            self.register_edge(Edge::Relation(relation));
        }
    }

    /// Add a generalization set, creating prototypes for members that have
    /// not been seen yet.
    pub(crate) fn add_generalization_set(&mut self, map: JsonMap) -> ElementId {
        let members = GeneralizationSet::member_ids(&map);
        for member in &members {
            self.ensure_generalization(member);
        }
        let set = GeneralizationSet::from_map(map, members.clone(), &self.categorizer_names);
        let set_id = set.id.clone();
        self.sets.insert(set_id.clone(), set);
        for member in &members {
            if let Some(Edge::Generalization(generalization)) = self.edges.get_mut(member) {
                generalization.set = Some(set_id.clone());
            }
        }
        set_id
    }

    /// The generalization for `id`, creating an unwired prototype when the
    /// edge has not been seen yet.
    fn ensure_generalization(&mut self, id: &ElementId) {
        if !self.edges.contains_key(id) {
            let placeholder = ElementId::new("");
            self.edges.insert(
                id.clone(),
                Edge::Generalization(Generalization::prototype(id.clone(), placeholder)),
            );
        }
    }

    /// Add a diagram and attach its views to their elements. Views whose
    /// element is unknown are discarded.
    fn add_diagram(&mut self, diagram_value: &Value) {
        let Some(diagram_map) = diagram_value.as_object() else {
            return;
        };
        let diagram = Diagram::from_map(diagram_map);
        let diagram_id = diagram.id.clone();
        self.diagrams.insert(diagram_id.clone(), diagram);

        if let Some(contents) = diagram_map.get("contents").and_then(Value::as_array) {
            for view_value in contents {
                let Some(view) =
                    view_value.as_object().and_then(|m| View::from_map(m, diagram_id.clone()))
                else {
                    continue;
                };
                if self.attach_view(&view) {
                    self.register_view(view);
                }
            }
        }
    }

    /// Record a view on its element. Package views stay on the diagram
    /// without an owner; views of unknown elements are rejected.
    fn attach_view(&mut self, view: &View) -> bool {
        let element_id = view.element.id.clone();
        match view.element.ref_type.as_str() {
            "Class" => match self.entities.get_mut(&element_id) {
                Some(entity) => {
                    entity.views.push(view.id.clone());
                    true
                }
                None => {
                    warn!(element = %element_id, "discarding view of unknown class");
                    false
                }
            },
            "GeneralizationSet" => match self.sets.get_mut(&element_id) {
                Some(set) => {
                    set.views.push(view.id.clone());
                    true
                }
                None => false,
            },
            "Package" => true,
            _ => match self.edges.get_mut(&element_id) {
                Some(edge) => {
                    edge.views_mut().push(view.id.clone());
                    true
                }
                None => false,
            },
        }
    }

    /// Detect relation views whose endpoint references are crossed with
    /// respect to the relation's direction and invert them; anything else
    /// inconsistent is logged and left alone.
    fn repair_inverted_views(&mut self) {
        let view_ids: Vec<ElementId> = self
            .diagrams
            .values()
            .flat_map(|diagram| diagram.views.iter().cloned())
            .collect();
        for view_id in view_ids {
            let Some(view) = self.views.get(&view_id) else {
                continue;
            };
            if view.view_type != RELATION_VIEW {
                continue;
            }
            let (Some(source_ref), Some(target_ref)) = (&view.source, &view.target) else {
                continue;
            };
            let Some(edge) = self.edges.get(&view.element.id) else {
                continue;
            };
            let has_view = |entity_id: &ElementId, candidate: &ElementId| {
                self.entities
                    .get(entity_id)
                    .is_some_and(|entity| entity.views.contains(candidate))
            };
            let straight = has_view(edge.from(), &source_ref.id) && has_view(edge.to(), &target_ref.id);
            if straight {
                continue;
            }
            let crossed = has_view(edge.from(), &target_ref.id) && has_view(edge.to(), &source_ref.id);
            let edge_id = edge.id().clone();
            if crossed {
                warn!(relation = %edge_id, "inverted view detected, repairing");
                if let Some(view) = self.views.get_mut(&view_id) {
                    view.invert();
                }
            } else {
                error!(relation = %edge_id, "inconsistent relation view, check inversion");
            }
        }
    }
}

/// All element objects of a content tree, with package contents hoisted and
/// the package nodes themselves dropped.
fn flatten_contents(contents: Option<&Value>) -> Vec<&JsonMap> {
    let mut result = Vec::new();
    collect_contents(contents, &mut result);
    result
}

fn collect_contents<'a>(contents: Option<&'a Value>, result: &mut Vec<&'a JsonMap>) {
    let Some(Value::Array(contents)) = contents else {
        return;
    };
    for content in contents {
        let Some(element) = content.as_object() else {
            continue;
        };
        if element.get("type").and_then(Value::as_str) == Some("Package") {
            collect_contents(element.get("contents"), result);
        } else {
            result.push(element);
        }
    }
}
