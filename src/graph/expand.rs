//! Catalog expansion: grafting an externally provided hierarchy descriptor
//! onto an existing concept, and extracting such a descriptor from a graph.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::base::{capitalize, clean_name, ElementId};
use crate::error::GraphError;
use crate::model::{ClassStereotype, Edge, Entity, Generalization, GeneralizationSet, View};

use super::ModelGraph;

// ============================================================================
// HIERARCHY DESCRIPTOR
// ============================================================================

/// A passive hierarchy descriptor exchanged with the catalog layer.
///
/// Keys are index keys (`clean(name) + delimiter + stereotype`); `nodes`
/// maps each concept to its specializations, `sets` records the
/// generalization sets spanning them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Hierarchy {
    #[serde(default)]
    pub nodes: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub sets: IndexMap<String, HierarchySet>,
}

/// One generalization set of a [`Hierarchy`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HierarchySet {
    pub to: String,
    #[serde(default)]
    pub from: Vec<String>,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub disjoint: bool,
}

impl ModelGraph {
    // ── Descriptor extraction ───────────────────────────────────────

    /// Build the hierarchy descriptor rooted at the concept with the given
    /// index key, walking incoming generalizations downward.
    pub fn hierarchy_of(&self, key: &str) -> Hierarchy {
        let mut result = Hierarchy::default();
        let Some((name, stereotype)) = split_key(key, &self.profile.index_delimiter) else {
            return result;
        };

        let mut nodes: Vec<ElementId> = Vec::new();
        if let Some(bucket) = self.by_stereotype.get(stereotype) {
            if let Some(seed) = bucket.iter().find(|id| {
                self.entities
                    .get(*id)
                    .is_some_and(|e| clean_name(e.name()) == name)
            }) {
                nodes.push(seed.clone());
            }
        }

        let mut index = 0;
        while index < nodes.len() {
            let current = nodes[index].clone();
            let Some(current_key) = self.node_index(&current) else {
                index += 1;
                continue;
            };
            result.nodes.entry(current_key.clone()).or_default();
            let incoming = self
                .entities
                .get(&current)
                .map(|e| e.in_edges.generalizations.clone())
                .unwrap_or_default();
            for in_id in incoming {
                let Some(Edge::Generalization(generalization)) = self.edges.get(&in_id) else {
                    continue;
                };
                let specific = generalization.from.clone();
                let Some(specific_key) = self.node_index(&specific) else {
                    continue;
                };
                nodes.push(specific.clone());
                result
                    .nodes
                    .entry(current_key.clone())
                    .or_default()
                    .push(specific_key.clone());
                if let Some(set_id) = &generalization.set {
                    if let Some(set) = self.sets.get(set_id) {
                        result
                            .sets
                            .entry(set_id.as_str().to_string())
                            .or_insert_with(|| HierarchySet {
                                to: current_key.clone(),
                                from: Vec::new(),
                                complete: set.is_complete,
                                disjoint: set.is_disjoint,
                            })
                            .from
                            .push(specific_key);
                    }
                }
            }
            index += 1;
        }
        result
    }

    // ── Expansion ───────────────────────────────────────────────────

    /// Graft a hierarchy descriptor onto the graph around `node`. Concepts
    /// already present (matched by index key) are reused; new ones are
    /// created on the same diagrams as `node`, cascading downward.
    pub fn expand(&mut self, node: &ElementId, hierarchy: &Hierarchy) -> Result<(), GraphError> {
        if !self.entities.contains_key(node) {
            return Err(GraphError::node_not_found(node.as_str()));
        }
        debug!(concept = %node, "expanding from catalog hierarchy");
        let diagrams = self.entity_diagrams(node);

        let mut created: IndexMap<String, ElementId> = IndexMap::new();
        let mut position: Option<(i64, i64)> = None;
        for key in hierarchy.nodes.keys() {
            let Some(entity_id) = self.similar_node(key, &diagrams, position) else {
                continue;
            };
            if let Some(first_diagram) = diagrams.first() {
                if let Some(view) = self.entity_view_on(&entity_id, first_diagram) {
                    position = Some((
                        view.x(self.profile.default_x),
                        view.y(self.profile.default_y) + self.profile.default_height * 6 / 5,
                    ));
                }
            }
            created.insert(key.clone(), entity_id);
        }

        let mut generalizations: IndexMap<String, ElementId> = IndexMap::new();
        for (general_key, specific_keys) in &hierarchy.nodes {
            for specific_key in specific_keys {
                let (Some(general), Some(specific)) =
                    (created.get(general_key), created.get(specific_key))
                else {
                    continue;
                };
                let (general, specific) = (general.clone(), specific.clone());
                let edge_id = self.similar_generalization(&general, &specific, &diagrams);
                generalizations.insert(format!("{general_key}{specific_key}"), edge_id);
            }
        }

        for set in hierarchy.sets.values() {
            self.similar_set(&generalizations, set, &diagrams);
        }
        Ok(())
    }

    /// An existing concept matching the index key, or a fresh one placed on
    /// the given diagrams.
    fn similar_node(
        &mut self,
        key: &str,
        diagrams: &[ElementId],
        position: Option<(i64, i64)>,
    ) -> Option<ElementId> {
        let (name, stereotype) = split_key(key, &self.profile.index_delimiter)?;
        if let Some(bucket) = self.by_stereotype.get(stereotype) {
            if let Some(existing) = bucket.iter().find(|id| {
                self.entities
                    .get(*id)
                    .is_some_and(|e| clean_name(e.name()) == name)
            }) {
                return Some(existing.clone());
            }
        }

        let entity_id = self.generate_id();
        let entity = Entity::new_class(
            entity_id.clone(),
            capitalize(name),
            ClassStereotype::parse(stereotype),
        );
        self.register_entity(entity);
        let (x, y) = position.unwrap_or((self.profile.default_x, self.profile.default_y));
        for diagram in diagrams {
            self.create_entity_view(
                &entity_id,
                diagram,
                x,
                y,
                self.profile.default_width,
                self.profile.default_height,
            );
        }
        Some(entity_id)
    }

    /// An existing generalization from `specific` to `general`, or a fresh
    /// one viewed on every given diagram.
    fn similar_generalization(
        &mut self,
        general: &ElementId,
        specific: &ElementId,
        diagrams: &[ElementId],
    ) -> ElementId {
        if let Some(general_entity) = self.entities.get(general) {
            for in_id in &general_entity.in_edges.generalizations {
                if self.edges.get(in_id).is_some_and(|e| e.from() == specific) {
                    return in_id.clone();
                }
            }
        }
        let edge_id = self.generate_id();
        let generalization =
            Generalization::synthesized(edge_id.clone(), specific.clone(), general.clone());
        self.register_edge(Edge::Generalization(generalization));
        for diagram in diagrams {
            self.create_edge_view(&edge_id, false, specific, general, diagram);
        }
        edge_id
    }

    /// A fresh generalization set over the indexed generalizations, unless
    /// the first of them already belongs to one.
    fn similar_set(
        &mut self,
        generalizations: &IndexMap<String, ElementId>,
        descriptor: &HierarchySet,
        _diagrams: &[ElementId],
    ) {
        let members: Vec<ElementId> = descriptor
            .from
            .iter()
            .filter_map(|from| generalizations.get(&format!("{}{}", descriptor.to, from)))
            .cloned()
            .collect();
        let Some(first) = members.first().cloned() else {
            return;
        };
        let already_grouped = self
            .edges
            .get(&first)
            .and_then(Edge::as_generalization)
            .is_some_and(|g| g.set.is_some());
        if already_grouped {
            return;
        }

        let set_id = self.generate_id();
        let set = GeneralizationSet::synthesized(
            set_id.clone(),
            members.clone(),
            descriptor.complete,
            descriptor.disjoint,
        );
        self.sets.insert(set_id.clone(), set);
        for member in &members {
            if let Some(Edge::Generalization(generalization)) = self.edges.get_mut(member) {
                generalization.set = Some(set_id.clone());
            }
        }

        // Label the set next to the first generalization's views.
        let first_views = self
            .edges
            .get(&first)
            .map(|e| e.views().to_vec())
            .unwrap_or_default();
        let anchor = first_views.first().and_then(|v| self.views.get(v)).map(|v| {
            (
                v.x(self.profile.default_x),
                v.y(self.profile.default_y),
            )
        });
        if let Some((x, y)) = anchor {
            for view_id in &first_views {
                let Some(diagram) = self.views.get(view_id).map(|v| v.diagram.clone()) else {
                    continue;
                };
                let view = View::for_set(self.generate_id(), &set_id, diagram, x, y);
                let view_id = self.register_view(view);
                if let Some(set) = self.sets.get_mut(&set_id) {
                    set.views.push(view_id);
                }
            }
        }
    }
}

/// Split an index key into cleaned name and stereotype tag.
fn split_key<'a>(key: &'a str, delimiter: &str) -> Option<(&'a str, &'a str)> {
    key.split_once(delimiter)
}
