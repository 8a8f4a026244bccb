//! View restriction operators: focus (a BFS ball around one concept) and
//! relator-centric clustering, plus the catalog index keys.

use rustc_hash::FxHashSet;
use tracing::warn;

use crate::base::{clean_name, ElementId};
use crate::error::GraphError;
use crate::model::{ClassStereotype, RelationStereotype};

use super::ModelGraph;

impl ModelGraph {
    // ── Focus ───────────────────────────────────────────────────────

    /// Keep only the concepts within `hop` links of `node` (following both
    /// directions of every edge kind) and delete the rest. Fails when the
    /// node does not exist.
    pub fn focus(&mut self, node: &ElementId, hop: u32) -> Result<(), GraphError> {
        if !self.entities.contains_key(node) {
            return Err(GraphError::node_not_found(node.as_str()));
        }
        let kept = self.focus_nodes(node, hop);
        let others: Vec<ElementId> = self
            .entities
            .keys()
            .filter(|id| !kept.contains(*id))
            .cloned()
            .collect();
        for id in others {
            self.delete_entity(&id);
        }
        Ok(())
    }

    /// The BFS ball of radius `hop` around `node`. The walk is strictly by
    /// breadth layers and may revisit nodes; the returned set is the union.
    fn focus_nodes(&self, node: &ElementId, mut hop: u32) -> FxHashSet<ElementId> {
        let mut walk = vec![node.clone()];
        let mut index = 0;
        while hop > 0 {
            let layer_end = walk.len();
            while index < layer_end {
                if let Some(entity) = self.entities.get(&walk[index]) {
                    for edge_id in entity.out_edges.all() {
                        if let Some(edge) = self.edges.get(&edge_id) {
                            walk.push(edge.to().clone());
                        }
                    }
                    for edge_id in entity.in_edges.all() {
                        if let Some(edge) = self.edges.get(&edge_id) {
                            walk.push(edge.from().clone());
                        }
                    }
                }
                index += 1;
            }
            hop -= 1;
        }
        walk.into_iter().collect()
    }

    // ── Cluster ─────────────────────────────────────────────────────

    /// Keep the relator-centric cluster seeded at `node` and delete
    /// everything else. A non-relator seed is only warned about; the graph
    /// stays unchanged. Fails when the node does not exist.
    pub fn cluster(&mut self, node: &ElementId) -> Result<(), GraphError> {
        let Some(entity) = self.entities.get(node) else {
            return Err(GraphError::node_not_found(node.as_str()));
        };
        if entity.stereotype != Some(ClassStereotype::Relator) {
            warn!(concept = %node, "cluster seed is not a relator");
            return Ok(());
        }
        let mut visited = FxHashSet::default();
        let kept = self.cluster_nodes(node, &mut visited);
        let kept: FxHashSet<ElementId> = kept.into_iter().collect();
        let others: Vec<ElementId> = self
            .entities
            .keys()
            .filter(|id| !kept.contains(*id))
            .cloned()
            .collect();
        for id in others {
            self.delete_entity(&id);
        }
        Ok(())
    }

    /// The cluster of a relator: its bottom hierarchy, everything it
    /// mediates, and for each mediated concept the hierarchy slice its
    /// category calls for. Mediated relators recurse.
    fn cluster_nodes(
        &self,
        relator: &ElementId,
        visited: &mut FxHashSet<ElementId>,
    ) -> Vec<ElementId> {
        visited.insert(relator.clone());
        let mut nodes = self.bottom_hierarchy(relator, None);

        let mut mediated = Vec::new();
        for node in &nodes {
            let Some(entity) = self.entities.get(node) else {
                continue;
            };
            for edge_id in &entity.out_edges.relations {
                let Some(relation) = self.relation(edge_id) else {
                    continue;
                };
                if relation.stereotype == Some(RelationStereotype::Mediation) {
                    mediated.push(relation.to.clone());
                }
            }
        }

        for node in mediated {
            let stereotype = self.entities.get(&node).and_then(|e| e.stereotype.clone());
            match stereotype {
                Some(ClassStereotype::Relator) => {
                    if !visited.contains(&node) {
                        for reached in self.cluster_nodes(&node, visited) {
                            if !nodes.contains(&reached) {
                                nodes.push(reached);
                            }
                        }
                    }
                }
                Some(stereotype) if stereotype.is_non_sortal() => {
                    for bottom in self.bottom_hierarchy(&node, None) {
                        for reached in self.top_hierarchy(&bottom) {
                            if !nodes.contains(&reached) {
                                nodes.push(reached);
                            }
                        }
                    }
                }
                Some(stereotype) if stereotype.is_sortal() => {
                    for reached in self.top_hierarchy(&node) {
                        if !nodes.contains(&reached) {
                            nodes.push(reached);
                        }
                    }
                }
                _ => {}
            }
        }
        nodes
    }

    /// Every concept reachable upward from `node` until a kind-level
    /// stereotype is met. Traversing a generalization that belongs to a
    /// complete-and-disjoint set pulls the sibling specifics in as well.
    pub(crate) fn top_hierarchy(&self, node: &ElementId) -> Vec<ElementId> {
        let mut nodes = vec![node.clone()];
        let mut index = 0;
        while index < nodes.len() {
            let current = nodes[index].clone();
            let stops = self
                .entities
                .get(&current)
                .and_then(|e| e.stereotype.as_ref())
                .is_none_or(|s| s.is_kind_level());
            if !stops {
                let outgoing = self
                    .entities
                    .get(&current)
                    .map(|e| e.out_edges.generalizations.clone())
                    .unwrap_or_default();
                for out_id in outgoing {
                    let Some(edge) = self.edges.get(&out_id) else {
                        continue;
                    };
                    let general = edge.to().clone();
                    for reached in self.bottom_hierarchy(&general, Some(&out_id)) {
                        if !nodes.contains(&reached) {
                            nodes.push(reached);
                        }
                    }
                }
            }
            index += 1;
        }
        nodes
    }

    /// Downward hierarchy from `node`. Without `through_edge`, descends
    /// recursively through incoming generalizations of non-sortal and
    /// relator concepts. With it, yields the edge's specific — or all
    /// sibling specifics when the edge's set is complete and disjoint.
    pub(crate) fn bottom_hierarchy(
        &self,
        node: &ElementId,
        through_edge: Option<&ElementId>,
    ) -> Vec<ElementId> {
        let mut nodes = vec![node.clone()];
        if let Some(edge_id) = through_edge {
            let set_id = self
                .edges
                .get(edge_id)
                .and_then(|e| e.as_generalization())
                .and_then(|g| g.set.clone());
            match set_id.and_then(|id| self.sets.get(&id)) {
                Some(set) if set.is_complete_and_disjoint() => {
                    for member in &set.generalizations {
                        if let Some(edge) = self.edges.get(member) {
                            nodes.push(edge.from().clone());
                        }
                    }
                }
                _ => {
                    if let Some(edge) = self.edges.get(edge_id) {
                        nodes.push(edge.from().clone());
                    }
                }
            }
            return nodes;
        }

        let mut index = 0;
        while index < nodes.len() {
            let current = nodes[index].clone();
            let descends = self
                .entities
                .get(&current)
                .and_then(|e| e.stereotype.as_ref())
                .is_some_and(|s| s.is_non_sortal() || *s == ClassStereotype::Relator);
            if descends {
                let incoming = self
                    .entities
                    .get(&current)
                    .map(|e| e.in_edges.generalizations.clone())
                    .unwrap_or_default();
                for in_id in incoming {
                    if let Some(edge) = self.edges.get(&in_id) {
                        let specific = edge.from().clone();
                        if !nodes.contains(&specific) {
                            nodes.push(specific);
                        }
                    }
                }
            }
            index += 1;
        }
        nodes
    }

    // ── Catalog index keys ──────────────────────────────────────────

    /// The catalog index key of one node:
    /// `clean(name) + delimiter + stereotype`.
    pub fn node_index(&self, node: &ElementId) -> Option<String> {
        let entity = self.entities.get(node)?;
        Some(format!(
            "{}{}{}",
            clean_name(entity.name()),
            self.profile.index_delimiter,
            entity.stereotype_key(),
        ))
    }

    /// Index keys of every node in the graph.
    pub fn index(&self) -> Vec<String> {
        self.entities
            .keys()
            .filter_map(|id| self.node_index(id))
            .collect()
    }
}
