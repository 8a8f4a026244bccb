//! Aspect abstraction: collapsing relators, qualities, and modes into the
//! endurants they depend on, propagating their relations to stocks and
//! sources and rewriting event manifestations as participations.

use tracing::{debug, info};

use crate::base::ElementId;
use crate::model::{ClassStereotype, Edge, EdgeKind, RelationStereotype};

use super::ModelGraph;

impl ModelGraph {
    /// Abstract every relator, quality, and mode in the graph, in that
    /// stereotype order.
    pub fn abstract_aspects(&mut self, long_names: bool, mult_relations: bool, keep_relators: bool) {
        debug!("abstracting all aspects");
        for stereotype in ["relator", "quality", "mode"] {
            let aspect_ids = self
                .by_stereotype
                .get(stereotype)
                .cloned()
                .unwrap_or_default();
            for aspect_id in aspect_ids {
                self.abstract_aspect(&aspect_id, long_names, mult_relations, keep_relators);
            }
        }
    }

    /// Abstract one aspect entity. Recurses through chains of aspects
    /// depending on this one. With `keep_relators`, aspects whose degree
    /// reaches the configured threshold are left alone.
    pub fn abstract_aspect(
        &mut self,
        aspect_id: &ElementId,
        long_names: bool,
        mult_relations: bool,
        keep_relators: bool,
    ) {
        let Some(aspect) = self.entities.get(aspect_id) else {
            return;
        };
        let aspect_name = aspect.name().to_string();
        info!(concept = %aspect_name, "abstracting aspect");
        if keep_relators && aspect.degree() >= self.profile.min_relators_degree {
            return;
        }
        if self.aspect_guard.contains(aspect_id) {
            return;
        }
        self.aspect_guard.push(aspect_id.clone());

        self.fold_entity(aspect_id, long_names, mult_relations, false);

        // Chains of externally dependent aspects are collapsed innermost
        // first.
        let incoming = self
            .entities
            .get(aspect_id)
            .map(|e| e.in_edges.relations.clone())
            .unwrap_or_default();
        for in_id in incoming {
            let Some(source_id) = self.edges.get(&in_id).map(|edge| edge.from().clone()) else {
                continue;
            };
            let source_is_aspect = self
                .entities
                .get(&source_id)
                .and_then(|e| e.stereotype.as_ref())
                .is_some_and(|s| s.is_aspect());
            if source_is_aspect {
                self.abstract_aspect(&source_id, long_names, mult_relations, keep_relators);
            }
        }

        if self.entities.contains_key(aspect_id) {
            self.disperse_aspect(aspect_id, &aspect_name, long_names, mult_relations);
            self.delete_entity(aspect_id);
        }
        self.aspect_guard.pop();
    }

    /// Partition the aspect's neighborhood and propagate its relations:
    /// incoming relations climb to the stocks the aspect specializes,
    /// outgoing relations are re-rooted at its sources, sources are wired
    /// to each other, and event manifestations become participations.
    fn disperse_aspect(
        &mut self,
        aspect_id: &ElementId,
        aspect_name: &str,
        long_names: bool,
        mult_relations: bool,
    ) {
        let aspect = &self.entities[aspect_id];

        let stocks: Vec<ElementId> = aspect
            .out_edges
            .generalizations
            .iter()
            .filter_map(|g| self.edges.get(g).map(|edge| edge.to().clone()))
            .collect();

        let in_relations: Vec<ElementId> = aspect
            .in_edges
            .relations
            .iter()
            .filter(|id| {
                self.edges
                    .get(*id)
                    .and_then(|edge| self.entities.get(edge.from()))
                    .and_then(|e| e.stereotype.as_ref())
                    .is_some_and(|s| s.is_endurant_or_datatype())
            })
            .cloned()
            .collect();

        let mut sources: Vec<ElementId> = Vec::new();
        let mut out_relations: Vec<ElementId> = Vec::new();
        for out_id in &aspect.out_edges.relations {
            let Some(relation) = self.relation(out_id) else {
                continue;
            };
            let tying = matches!(
                relation.stereotype,
                Some(RelationStereotype::Mediation) | Some(RelationStereotype::Characterization)
            );
            if tying {
                sources.push(relation.to.clone());
            } else {
                let target_endurant = self
                    .entities
                    .get(&relation.to)
                    .and_then(|e| e.stereotype.as_ref())
                    .is_some_and(|s| s.is_endurant_or_datatype());
                if target_endurant {
                    out_relations.push(out_id.clone());
                }
            }
        }

        let events: Vec<(ElementId, ElementId)> = aspect
            .in_edges
            .relations
            .iter()
            .filter_map(|id| {
                let relation = self.relation(id)?;
                if relation.stereotype != Some(RelationStereotype::Manifestation) {
                    return None;
                }
                let from = self.entities.get(&relation.from)?;
                (from.stereotype == Some(ClassStereotype::Event))
                    .then(|| (relation.from.clone(), id.clone()))
            })
            .collect();

        // Incoming relations climb into every stock the aspect specializes.
        for in_id in &in_relations {
            for stock in &stocks {
                if self
                    .find_parallel_for(mult_relations, in_id, None, Some(stock))
                    .is_none()
                {
                    if let Some(new_id) = self.create_relation_from_existing(
                        in_id,
                        None,
                        Some(stock),
                        None,
                        None,
                        Some(aspect_name.to_string()),
                    ) {
                        if let Some(relation) =
                            self.edges.get_mut(&new_id).and_then(Edge::as_relation_mut)
                        {
                            relation.relax_cardinality_to();
                        }
                    }
                }
            }
        }

        // Outgoing relations are re-rooted at every source.
        for out_id in &out_relations {
            let (relation_name, role_from) = match self.relation(out_id) {
                Some(relation) => (
                    relation.name.clone().filter(|n| !n.is_empty()),
                    relation.role_from().map(str::to_string),
                ),
                None => continue,
            };
            for source in &sources {
                let name = if !long_names {
                    relation_name
                        .clone()
                        .unwrap_or_else(|| aspect_name.to_string())
                } else {
                    let source_name = self
                        .entities
                        .get(source)
                        .map(|e| e.name().to_string())
                        .unwrap_or_default();
                    let owned = role_from.clone().unwrap_or_else(|| aspect_name.to_string());
                    match &relation_name {
                        Some(relation_name) => {
                            format!("{source_name}'s {owned} {relation_name}")
                        }
                        None => format!("{source_name}'s {owned}"),
                    }
                };
                if self
                    .find_parallel_for(mult_relations, out_id, Some(source), None)
                    .is_none()
                {
                    if let Some(new_id) = self.create_relation_from_existing(
                        out_id,
                        Some(source),
                        None,
                        Some(name),
                        Some(String::new()),
                        None,
                    ) {
                        if let Some(relation) =
                            self.edges.get_mut(&new_id).and_then(Edge::as_relation_mut)
                        {
                            relation.relax_cardinality_to();
                            relation.ends[0].cardinality = None;
                        }
                    }
                }
            }
        }

        // Sources that shared the aspect get a relation named after it,
        // drawn on every diagram they share, unless one already connects
        // them.
        for (index, first) in sources.iter().enumerate() {
            for second in sources.iter().skip(index + 1) {
                if self
                    .find_parallel_relation(
                        mult_relations,
                        first,
                        second,
                        EdgeKind::Relation,
                        Some(aspect_name),
                    )
                    .is_some()
                {
                    continue;
                }
                let shared: Vec<ElementId> = self
                    .entity_diagrams(first)
                    .into_iter()
                    .filter(|d| self.entity_diagrams(second).contains(d))
                    .collect();
                let relation_id = self.create_relation(
                    first,
                    second,
                    None,
                    Some(aspect_name.to_string()),
                    None,
                    None,
                );
                for diagram in &shared {
                    self.create_edge_view(&relation_id, true, first, second, diagram);
                }
            }
        }

        // Event manifestations of the aspect become participations of its
        // sources in the event.
        for (event_id, manifestation_id) in &events {
            if let Some(relation) = self
                .edges
                .get_mut(manifestation_id)
                .and_then(Edge::as_relation_mut)
            {
                relation.stereotype = Some(RelationStereotype::Participation);
            }
            for source in &sources {
                if self
                    .find_parallel_for(mult_relations, manifestation_id, Some(source), Some(event_id))
                    .is_none()
                {
                    if let Some(new_id) = self.create_relation_from_existing(
                        manifestation_id,
                        Some(source),
                        Some(event_id),
                        None,
                        Some(String::new()),
                        Some(String::new()),
                    ) {
                        if let Some(relation) =
                            self.edges.get_mut(&new_id).and_then(Edge::as_relation_mut)
                        {
                            relation.ends[1].cardinality = Some("1".into());
                            relation.ends[0].cardinality = None;
                        }
                    }
                }
            }
        }
    }
}
