//! Hierarchy abstraction: collapsing generalizations and generalization
//! sets, with enumeration synthesis for complete-and-disjoint sets.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::base::ElementId;
use crate::model::{ClassStereotype, Edge, Entity};

use super::ModelGraph;

impl ModelGraph {
    /// Abstract every generalization in the graph.
    pub fn abstract_hierarchies(&mut self, long_names: bool, mult_relations: bool) {
        debug!("abstracting all hierarchies");
        loop {
            let Some(edge_id) = self.edge_order.generalizations.first().cloned() else {
                break;
            };
            self.abstract_hierarchy(&edge_id, long_names, mult_relations);
            if self.edge_order.generalizations.first() == Some(&edge_id) {
                warn!(generalization = %edge_id, "hierarchy abstraction stalled");
                break;
            }
        }
        self.clear_pending_removals();
    }

    /// Abstract one generalization. A non-sortal general is pushed down
    /// into its specifics; a set member triggers processing of the whole
    /// set; a plain generalization is collapsed upward.
    pub(crate) fn abstract_hierarchy(
        &mut self,
        edge_id: &ElementId,
        long_names: bool,
        mult_relations: bool,
    ) {
        let Some(Edge::Generalization(generalization)) = self.edges.get(edge_id) else {
            return;
        };
        let general_id = generalization.to.clone();
        let set_id = generalization.set.clone();
        let general_non_sortal = self
            .entities
            .get(&general_id)
            .and_then(|e| e.stereotype.as_ref())
            .is_some_and(|s| s.is_non_sortal());

        if general_non_sortal {
            self.push_general_down(&general_id, long_names, mult_relations);
        } else if let Some(set_id) = set_id {
            self.process_generalization_set(&set_id, long_names, mult_relations);
        } else {
            self.abstract_generalization(edge_id, long_names, mult_relations);
        }
    }

    /// Copy a non-sortal general's relations onto every specific, then
    /// delete the general.
    fn push_general_down(&mut self, general_id: &ElementId, long_names: bool, mult_relations: bool) {
        let general_name = self
            .entities
            .get(general_id)
            .map(|e| e.name().to_string())
            .unwrap_or_default();
        info!(general = %general_name, "pushing relations down");
        self.fold_entity(general_id, long_names, mult_relations, true);

        let Some(general) = self.entities.get(general_id) else {
            return;
        };
        let specifics: Vec<ElementId> = general
            .in_edges
            .generalizations
            .iter()
            .filter_map(|g| self.edges.get(g).map(|edge| edge.from().clone()))
            .collect();

        let incoming = general.in_edges.relations.clone();
        let outgoing = general.out_edges.relations.clone();
        for in_id in incoming {
            for specific in &specifics {
                self.move_relation(
                    false,
                    mult_relations,
                    &in_id,
                    specific,
                    None,
                    Some(general_name.clone()),
                );
            }
        }
        for out_id in outgoing {
            for specific in &specifics {
                self.move_relation(
                    true,
                    mult_relations,
                    &out_id,
                    specific,
                    None,
                    Some(general_name.clone()),
                );
            }
        }
        self.delete_entity(general_id);
    }

    /// Collapse one generalization upward: fold the specific, migrate its
    /// non-generalization edges onto the general (the specific's name
    /// becomes the role where the endpoint had none), then delete the
    /// specific — or only the generalization when the specific still has
    /// other upward edges, queueing the specific for deferred deletion
    /// unless the general is non-sortal.
    pub(crate) fn abstract_generalization(
        &mut self,
        edge_id: &ElementId,
        long_names: bool,
        mult_relations: bool,
    ) {
        let Some(Edge::Generalization(generalization)) = self.edges.get(edge_id) else {
            return;
        };
        let general_id = generalization.to.clone();
        let specific_id = generalization.from.clone();
        let specific_name = self
            .entities
            .get(&specific_id)
            .map(|e| e.name().to_string())
            .unwrap_or_default();
        let general_name = self
            .entities
            .get(&general_id)
            .map(|e| e.name().to_string())
            .unwrap_or_default();
        info!(specific = %specific_name, general = %general_name, "abstracting generalization");

        self.fold_entity(&specific_id, long_names, mult_relations, false);
        if !self.entities.contains_key(&specific_id) || !self.entities.contains_key(&general_id) {
            return;
        }

        let specific = &self.entities[&specific_id];
        let incoming: Vec<ElementId> = specific
            .in_edges
            .relations
            .iter()
            .chain(specific.in_edges.part_of.iter())
            .cloned()
            .collect();
        let outgoing: Vec<ElementId> = specific
            .out_edges
            .relations
            .iter()
            .chain(specific.out_edges.part_of.iter())
            .cloned()
            .collect();

        for in_id in incoming {
            let role = match self.relation(&in_id) {
                Some(relation) if relation.role_to().is_none() => Some(specific_name.clone()),
                Some(_) => None,
                None => continue,
            };
            self.move_relation(false, mult_relations, &in_id, &general_id, None, role);
        }
        for out_id in outgoing {
            let role = match self.relation(&out_id) {
                Some(relation) if relation.role_from().is_none() => Some(specific_name.clone()),
                Some(_) => None,
                None => continue,
            };
            self.move_relation(true, mult_relations, &out_id, &general_id, None, role);
        }

        let keep_specific = self
            .entities
            .get(&specific_id)
            .is_some_and(|e| e.has_other_up_edges());
        if keep_specific {
            self.delete_relation(edge_id);
            let general_non_sortal = self
                .entities
                .get(&general_id)
                .and_then(|e| e.stereotype.as_ref())
                .is_some_and(|s| s.is_non_sortal());
            if !general_non_sortal {
                self.pending_removal.push(specific_id);
            }
        } else {
            self.delete_entity(&specific_id);
        }
    }

    /// Process a whole generalization set: abstract every member, and for a
    /// complete-and-disjoint set synthesize an enumeration of the (former)
    /// specifics' names, merging any enumeration already hanging off the
    /// general.
    pub(crate) fn process_generalization_set(
        &mut self,
        set_id: &ElementId,
        long_names: bool,
        mult_relations: bool,
    ) {
        let Some(set) = self.sets.get(set_id) else {
            return;
        };
        let members = set.generalizations.clone();
        let complete_disjoint = set.is_complete_and_disjoint();
        let set_name = set.name.clone();
        let Some(general_id) = members
            .first()
            .and_then(|g| self.edges.get(g))
            .map(|edge| edge.to().clone())
        else {
            return;
        };
        let diagram_id = set
            .views
            .first()
            .and_then(|v| self.views.get(v))
            .map(|v| v.diagram.clone())
            .or_else(|| {
                self.entities
                    .get(&general_id)
                    .and_then(|general| general.views.first())
                    .and_then(|v| self.views.get(v))
                    .map(|v| v.diagram.clone())
            });
        let general_name = self
            .entities
            .get(&general_id)
            .map(|e| e.name().to_string())
            .unwrap_or_default();
        info!(general = %general_name, "processing generalization set");

        // Literal names are captured before any member is collapsed.
        let literal_names: Vec<String> = members
            .iter()
            .filter_map(|g| self.edges.get(g))
            .filter_map(|edge| self.entities.get(edge.from()))
            .map(|specific| specific.name().to_string())
            .collect();

        for member in &members {
            self.abstract_generalization(member, long_names, mult_relations);
        }

        if !complete_disjoint {
            return;
        }
        let mut literals: Vec<Value> = literal_names
            .iter()
            .map(|name| Entity::literal_value(self.generate_id(), name))
            .collect();

        // Fold in a pre-existing enumeration already linked to the general.
        let general_out = self
            .entities
            .get(&general_id)
            .map(|general| general.out_edges.all())
            .unwrap_or_default();
        for out_id in general_out {
            let Some(target_id) = self.edges.get(&out_id).map(|edge| edge.to().clone()) else {
                continue;
            };
            let Some(target) = self.entities.get(&target_id) else {
                continue;
            };
            if target.stereotype != Some(ClassStereotype::Enumeration) {
                continue;
            }
            literals.extend(target.literals());
            let keep_entity = target.degree() > 1;
            if keep_entity {
                self.delete_relation(&out_id);
            } else {
                self.delete_entity(&target_id);
            }
        }

        if self.entities.contains_key(&general_id) {
            self.create_enumeration_and_relation(&general_id, literals, set_name, diagram_id.as_ref());
        } else {
            warn!(general = %general_name, "general vanished while processing its set");
        }
    }
}
