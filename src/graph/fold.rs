//! Folding: recursively collapsing an entity's downward structure
//! (parthoods, then hierarchy) into the entity itself, and the parthood
//! abstraction it is built on.

use tracing::{debug, error, info};

use crate::base::ElementId;
use crate::error::GraphError;
use crate::model::{Edge, RelationStereotype};

use super::ModelGraph;

impl ModelGraph {
    /// Fold the given node. Fails when the node does not exist.
    pub fn fold(
        &mut self,
        node: &ElementId,
        long_names: bool,
        mult_relations: bool,
    ) -> Result<(), GraphError> {
        if !self.entities.contains_key(node) {
            return Err(GraphError::node_not_found(node.as_str()));
        }
        self.fold_entity(node, long_names, mult_relations, false);
        Ok(())
    }

    /// Collapse all parthoods and (unless `part_of_only`) hierarchies below
    /// the entity into it. Recursive; a name-keyed stack makes re-entry
    /// through shared names a no-op.
    pub(crate) fn fold_entity(
        &mut self,
        entity_id: &ElementId,
        long_names: bool,
        mult_relations: bool,
        part_of_only: bool,
    ) {
        let Some(entity) = self.entities.get(entity_id) else {
            return;
        };
        let name = entity.name().to_string();
        info!(concept = %name, "folding");
        if !self.stack_enter(&name) {
            return;
        }

        // Incoming parthoods, re-read on every step: abstracting one can
        // add or remove others. memberOf parthoods stay.
        let mut index = 0;
        loop {
            let Some(edge_id) = self
                .entities
                .get(entity_id)
                .and_then(|e| e.in_edges.part_of.get(index).cloned())
            else {
                break;
            };
            let member_of = self
                .relation(&edge_id)
                .is_some_and(|r| r.stereotype == Some(RelationStereotype::MemberOf));
            if member_of {
                index += 1;
            } else {
                self.abstract_parthood(&edge_id, long_names, mult_relations);
            }
        }

        if !part_of_only {
            // Push non-sortal generals down first.
            let outgoing = self
                .entities
                .get(entity_id)
                .map(|e| e.out_edges.generalizations.clone())
                .unwrap_or_default();
            for out_id in outgoing {
                let Some(Edge::Generalization(generalization)) = self.edges.get(&out_id) else {
                    continue;
                };
                let general_non_sortal = self
                    .entities
                    .get(&generalization.to)
                    .and_then(|e| e.stereotype.as_ref())
                    .is_some_and(|s| s.is_non_sortal());
                if general_non_sortal {
                    self.abstract_hierarchy(&out_id, long_names, mult_relations);
                }
            }
            // Then pull every lower level up.
            loop {
                let Some(first) = self
                    .entities
                    .get(entity_id)
                    .and_then(|e| e.in_edges.generalizations.first().cloned())
                else {
                    break;
                };
                self.abstract_hierarchy(&first, long_names, mult_relations);
                let stalled = self
                    .entities
                    .get(entity_id)
                    .and_then(|e| e.in_edges.generalizations.first())
                    == Some(&first);
                if stalled {
                    break;
                }
            }
        }

        self.clear_pending_removals();
        self.stack_exit();
    }

    /// Abstract every non-memberOf parthood in the graph.
    pub fn abstract_parthoods(&mut self, long_names: bool, mult_relations: bool) {
        debug!("abstracting all parthood relations");
        let mut index = 0;
        loop {
            let Some(edge_id) = self.edge_order.part_of.get(index).cloned() else {
                break;
            };
            let member_of = self
                .relation(&edge_id)
                .is_some_and(|r| r.stereotype == Some(RelationStereotype::MemberOf));
            if member_of {
                index += 1;
            } else {
                self.abstract_parthood(&edge_id, long_names, mult_relations);
            }
        }
    }

    /// Abstract one parthood: fold the part, migrate its relations onto the
    /// whole (componentOf additionally promotes the part to an attribute of
    /// the whole), then delete the part — or just the parthood when the
    /// part still has other upward edges.
    pub(crate) fn abstract_parthood(
        &mut self,
        edge_id: &ElementId,
        long_names: bool,
        mult_relations: bool,
    ) {
        let Some(relation) = self.relation(edge_id) else {
            return;
        };
        let whole_id = relation.to.clone();
        let part_id = relation.from.clone();
        let stereotype = relation.stereotype.clone();
        let essential = relation.is_essential();

        let part_name = self
            .entities
            .get(&part_id)
            .map(|e| e.name().to_string())
            .unwrap_or_default();
        if whole_id == part_id {
            error!(concept = %part_name, "recursion detected, dropping self-parthood");
            self.delete_relation(edge_id);
            return;
        }
        let whole_name = self
            .entities
            .get(&whole_id)
            .map(|e| e.name().to_string())
            .unwrap_or_default();
        info!(part = %part_name, whole = %whole_name, "abstracting part-of");

        self.fold_entity(&part_id, long_names, mult_relations, false);
        // Folding the part can consume the whole when the structure is
        // cyclic; drop the parthood and give up on this one.
        if !self.entities.contains_key(&whole_id) {
            error!(
                part = %part_name,
                whole = %whole_name,
                "recursion detected, whole was folded away"
            );
            self.delete_relation(edge_id);
            return;
        }

        let mut role_override = Some(part_name.clone());
        let mut name_prefix = String::new();
        if stereotype == Some(RelationStereotype::ComponentOf) {
            role_override = None;
            self.add_entity_attribute(&whole_id, &part_name);
            if long_names {
                name_prefix = format!("{whole_name}'s {part_name} ");
            }
        }

        let migrated_name = |graph: &Self, candidate_id: &ElementId| -> Option<String> {
            let candidate = graph.relation(candidate_id)?;
            let from_not_object = graph
                .entities
                .get(&candidate.from)
                .and_then(|e| e.stereotype.as_ref())
                .is_some_and(|s| s.is_not_object());
            if !long_names || from_not_object {
                candidate.name.clone()
            } else {
                Some(format!(
                    "{name_prefix}{}",
                    candidate.name.as_deref().unwrap_or_default()
                ))
            }
        };

        let incoming = self
            .entities
            .get(&part_id)
            .map(|e| e.in_edges.relations.clone())
            .unwrap_or_default();
        for in_id in incoming {
            let Some(candidate) = self.relation(&in_id) else {
                continue;
            };
            if candidate.stereotype == Some(RelationStereotype::Termination) && !essential {
                continue;
            }
            let name = migrated_name(self, &in_id);
            self.move_relation(
                false,
                mult_relations,
                &in_id,
                &whole_id,
                name,
                role_override.clone(),
            );
            if let Some(original) = self.edges.get_mut(&in_id).and_then(Edge::as_relation_mut) {
                original.ends[1].cardinality = Some("1".into());
            }
        }

        let outgoing = self
            .entities
            .get(&part_id)
            .map(|e| e.out_edges.relations.clone())
            .unwrap_or_default();
        for out_id in outgoing {
            if self.relation(&out_id).is_none() {
                continue;
            }
            let name = migrated_name(self, &out_id);
            self.move_relation(
                true,
                mult_relations,
                &out_id,
                &whole_id,
                name,
                role_override.clone(),
            );
            if let Some(original) = self.edges.get_mut(&out_id).and_then(Edge::as_relation_mut) {
                original.ends[0].cardinality = Some("1".into());
            }
        }

        let member_parthoods = self
            .entities
            .get(&part_id)
            .map(|e| e.in_edges.part_of.clone())
            .unwrap_or_default();
        for member_id in member_parthoods {
            let member_of = self
                .relation(&member_id)
                .is_some_and(|r| r.stereotype == Some(RelationStereotype::MemberOf));
            if member_of {
                self.move_relation(false, mult_relations, &member_id, &whole_id, None, None);
            }
        }

        let keep_part = self
            .entities
            .get(&part_id)
            .is_some_and(|e| e.has_other_up_edges());
        if keep_part {
            self.delete_relation(edge_id);
        } else {
            self.delete_entity(&part_id);
        }
    }
}
