//! Relation migration: the structural clone used whenever an abstraction
//! moves an edge to a new endpoint, and the parallel-relation detection
//! that decides between cloning and merging.

use rustc_hash::FxHashSet;

use crate::base::ElementId;
use crate::model::view::CLASS_VIEW;
use crate::model::{Edge, EdgeKind, ViewRef};

use super::ModelGraph;

impl ModelGraph {
    /// Deep-copy an edge under a fresh id, optionally re-targeting either
    /// endpoint, and register the copy. Contained ids (endpoint properties,
    /// views, shapes) are rewritten and the copied views are re-registered
    /// in their diagrams; views on diagrams where a new endpoint has no
    /// view are dropped.
    ///
    /// Name and roles are only touched when given. Returns `None` when the
    /// source edge does not exist.
    pub(crate) fn create_relation_from_existing(
        &mut self,
        edge_id: &ElementId,
        new_from: Option<&ElementId>,
        new_to: Option<&ElementId>,
        new_name: Option<String>,
        role_from: Option<String>,
        role_to: Option<String>,
    ) -> Option<ElementId> {
        let mut clone = self.edges.get(edge_id)?.clone();
        let new_id = self.generate_id();
        clone.reassign_id(new_id.clone());

        // Re-key the copied views and register them alongside the originals.
        let source_view_ids = std::mem::take(clone.views_mut());
        let mut cloned_view_ids = Vec::with_capacity(source_view_ids.len());
        for (index, view_id) in source_view_ids.iter().enumerate() {
            let Some(view) = self.views.get(view_id) else {
                continue;
            };
            let mut view = view.clone();
            view.id = ElementId::new(format!("{new_id}_view_{index}"));
            view.element.id = new_id.clone();
            view.shape.set_id(format!("{}_path", view.id));
            cloned_view_ids.push(self.register_view(view));
        }
        *clone.views_mut() = cloned_view_ids;

        if let Some(from) = new_from {
            clone.set_from(from.clone());
            self.retarget_views(&mut clone, true, from);
        }
        if let Some(to) = new_to {
            clone.set_to(to.clone());
            self.retarget_views(&mut clone, false, to);
        }

        if new_name.is_some() {
            clone.set_name(new_name);
        }
        if let Some(relation) = clone.as_relation_mut() {
            if let Some(role) = role_from {
                relation.ends[0].name = Some(role);
            }
            if let Some(role) = role_to {
                relation.ends[1].name = Some(role);
            }
        }

        self.register_edge(clone);
        Some(new_id)
    }

    /// Point an endpoint of the (not yet registered) cloned edge's views at
    /// the new entity's view on each diagram; views on diagrams the entity
    /// does not appear on are removed entirely.
    fn retarget_views(&mut self, clone: &mut Edge, is_source: bool, entity_id: &ElementId) {
        let detour_width = self.profile.default_width;
        let detour_height = self.profile.default_height;
        let mut dropped = Vec::new();

        for view_id in clone.views().to_vec() {
            let Some(diagram) = self.views.get(&view_id).map(|v| v.diagram.clone()) else {
                continue;
            };
            let anchor = self
                .entity_view_on(entity_id, &diagram)
                .map(|view| (view.id.clone(), view.center()));
            match anchor {
                Some((entity_view_id, center)) => {
                    if let Some(view) = self.views.get_mut(&view_id) {
                        let endpoint = if is_source {
                            view.update_source_point(center, detour_width, detour_height);
                            &mut view.source
                        } else {
                            view.update_target_point(center, detour_width, detour_height);
                            &mut view.target
                        };
                        match endpoint {
                            Some(reference) => reference.id = entity_view_id,
                            None => *endpoint = Some(ViewRef::new(entity_view_id, CLASS_VIEW)),
                        }
                    }
                }
                None => dropped.push(view_id),
            }
        }

        if !dropped.is_empty() {
            self.remove_views(&dropped);
            clone.views_mut().retain(|id| !dropped.contains(id));
        }
    }

    /// An existing edge equivalent to moving `edge_id` onto the given
    /// endpoints, if any. Endpoints default to the edge's own.
    pub(crate) fn find_parallel_for(
        &self,
        mult_relations: bool,
        edge_id: &ElementId,
        new_from: Option<&ElementId>,
        new_to: Option<&ElementId>,
    ) -> Option<ElementId> {
        let edge = self.edges.get(edge_id)?;
        let from = new_from.unwrap_or(edge.from());
        let to = new_to.unwrap_or(edge.to());
        self.find_parallel_relation(mult_relations, from, to, edge.kind(), edge.name())
    }

    /// An existing edge of `kind` between the two entities, in either
    /// direction. With `mult_relations` the candidate must additionally be
    /// unnamed or share a (lowercased, whitespace-split) name token with
    /// `name` — and an absent `name` matches nothing, so a new relation is
    /// always created.
    pub(crate) fn find_parallel_relation(
        &self,
        mult_relations: bool,
        from: &ElementId,
        to: &ElementId,
        kind: EdgeKind,
        name: Option<&str>,
    ) -> Option<ElementId> {
        let mut candidates: Vec<&ElementId> = Vec::new();
        let mut seen: FxHashSet<&ElementId> = FxHashSet::default();
        let from_entity = self.entities.get(from);
        let to_entity = self.entities.get(to);
        let lists = [
            from_entity.map(|e| e.out_edges.get(kind)),
            to_entity.map(|e| e.in_edges.get(kind)),
            from_entity.map(|e| e.in_edges.get(kind)),
            to_entity.map(|e| e.out_edges.get(kind)),
        ];
        for list in lists.into_iter().flatten() {
            for candidate in list {
                if seen.insert(candidate) {
                    candidates.push(candidate);
                }
            }
        }

        for candidate_id in candidates {
            let Some(candidate) = self.edges.get(candidate_id) else {
                continue;
            };
            let straight = candidate.from() == from && candidate.to() == to;
            let reversed = candidate.from() == to && candidate.to() == from;
            if !straight && !reversed {
                continue;
            }
            if !mult_relations {
                return Some(candidate_id.clone());
            }
            let Some(name) = name.filter(|n| !n.is_empty()) else {
                continue;
            };
            match candidate.name().filter(|n| !n.is_empty()) {
                None => return Some(candidate_id.clone()),
                Some(candidate_name) => {
                    if share_token(candidate_name, name) {
                        return Some(candidate_id.clone());
                    }
                }
            }
        }
        None
    }

    /// Move an edge onto a new endpoint: clone it there when no parallel
    /// edge exists, otherwise fold it into the parallel one (merge names
    /// unless `mult_relations`, clear the moved-side role, widen both
    /// cardinalities to the broadest of the pair).
    pub(crate) fn move_relation(
        &mut self,
        is_from: bool,
        mult_relations: bool,
        edge_id: &ElementId,
        entity_id: &ElementId,
        new_name: Option<String>,
        new_role: Option<String>,
    ) {
        let (new_from, new_to) = if is_from {
            (Some(entity_id), None)
        } else {
            (None, Some(entity_id))
        };
        match self.find_parallel_for(mult_relations, edge_id, new_from, new_to) {
            None => {
                let (role_from, role_to) = if is_from {
                    (new_role, None)
                } else {
                    (None, new_role)
                };
                if let Some(new_id) = self.create_relation_from_existing(
                    edge_id, new_from, new_to, new_name, role_from, role_to,
                ) {
                    if let Some(relation) =
                        self.edges.get_mut(&new_id).and_then(Edge::as_relation_mut)
                    {
                        if is_from {
                            relation.relax_cardinality_to();
                        } else {
                            relation.relax_cardinality_from();
                        }
                    }
                }
            }
            Some(existing_id) => {
                let Some(moved) = self.edges.get(edge_id) else {
                    return;
                };
                let moved_name = moved.name().filter(|n| !n.is_empty()).map(str::to_string);
                let (moved_card_from, moved_card_to) = match moved.as_relation() {
                    Some(relation) => (
                        relation.cardinality_from().map(str::to_string),
                        relation.cardinality_to().map(str::to_string),
                    ),
                    None => (None, None),
                };

                let Some(existing) = self.edges.get_mut(&existing_id) else {
                    return;
                };
                if let (false, Some(moved_name)) = (mult_relations, moved_name) {
                    let existing_name =
                        existing.name().filter(|n| !n.is_empty()).map(str::to_string);
                    match existing_name {
                        Some(current) if current != moved_name => {
                            if !current.contains(&moved_name) {
                                existing.set_name(Some(format!("{current} ({moved_name})")));
                            }
                        }
                        None => existing.set_name(Some(moved_name)),
                        _ => {}
                    }
                }
                if let Some(relation) = existing.as_relation_mut() {
                    if is_from {
                        relation.clear_role_from();
                    } else {
                        relation.clear_role_to();
                    }
                    relation.merge_cardinality_from(moved_card_from.as_deref());
                    relation.merge_cardinality_to(moved_card_to.as_deref());
                }
            }
        }
    }
}

/// True when the two names share a lowercased whitespace-split token.
fn share_token(fst: &str, snd: &str) -> bool {
    let snd_tokens: FxHashSet<String> = snd.split_whitespace().map(str::to_lowercase).collect();
    fst.split_whitespace()
        .any(|token| snd_tokens.contains(&token.to_lowercase()))
}
