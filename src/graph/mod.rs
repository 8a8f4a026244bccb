//! The mutable graph arena.
//!
//! Entities, edges, generalization sets, diagrams, and views live in flat
//! tables keyed by [`ElementId`]; every cross-reference is an id. Endpoint
//! lookups are table reads, deletion is a table erase plus index fix-ups,
//! and no element ever owns another element's memory.
//!
//! Transformations are split across the submodules; everything here is the
//! bookkeeping they share: registration, the deletion cascade, and the
//! creation of synthesized relations, enumerations, and views.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::info;

use crate::base::ElementId;
use crate::config::Profile;
use crate::model::{
    Diagram, Edge, EdgeLists, Entity, GeneralizationSet, PackageTree, ProjectMeta, Relation, View,
};

mod aspects;
mod build;
mod expand;
mod fold;
mod hierarchy;
mod migrate;
mod traversal;

pub use expand::{Hierarchy, HierarchySet};

/// The in-memory ontology graph of one project.
#[derive(Debug)]
pub struct ModelGraph {
    pub(crate) profile: Profile,
    pub(crate) project: ProjectMeta,
    pub(crate) model: PackageTree,
    pub(crate) entities: IndexMap<ElementId, Entity>,
    pub(crate) edges: IndexMap<ElementId, Edge>,
    /// Edge ids per final type, in registration order. The abstraction
    /// passes drain these lists front to back.
    pub(crate) edge_order: EdgeLists,
    pub(crate) sets: IndexMap<ElementId, GeneralizationSet>,
    pub(crate) diagrams: IndexMap<ElementId, Diagram>,
    pub(crate) views: IndexMap<ElementId, View>,
    /// Stereotype tag → entity ids carrying it.
    pub(crate) by_stereotype: FxHashMap<String, Vec<ElementId>>,
    /// Names of order-2 classes, for resolving set categorizers.
    pub(crate) categorizer_names: FxHashMap<ElementId, String>,
    /// Names currently being folded; guards against recursion through
    /// shared names.
    pub(crate) fold_stack: Vec<String>,
    /// Aspects currently being abstracted; guards against mediation cycles.
    pub(crate) aspect_guard: Vec<ElementId>,
    /// Specifics that lost their kind during hierarchy abstraction and are
    /// deleted once the current pass settles.
    pub(crate) pending_removal: Vec<ElementId>,
}

impl ModelGraph {
    // ── Read access ─────────────────────────────────────────────────

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn entity(&self, id: &ElementId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: &ElementId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn edge(&self, id: &ElementId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn edge_mut(&mut self, id: &ElementId) -> Option<&mut Edge> {
        self.edges.get_mut(id)
    }

    /// The edge as a relation, when it is one.
    pub fn relation(&self, id: &ElementId) -> Option<&Relation> {
        self.edges.get(id).and_then(Edge::as_relation)
    }

    pub fn set(&self, id: &ElementId) -> Option<&GeneralizationSet> {
        self.sets.get(id)
    }

    pub fn diagram(&self, id: &ElementId) -> Option<&Diagram> {
        self.diagrams.get(id)
    }

    pub fn view(&self, id: &ElementId) -> Option<&View> {
        self.views.get(id)
    }

    pub fn iter_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn iter_sets(&self) -> impl Iterator<Item = &GeneralizationSet> {
        self.sets.values()
    }

    pub fn iter_diagrams(&self) -> impl Iterator<Item = &Diagram> {
        self.diagrams.values()
    }

    pub fn iter_views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// A fresh id of the configured length.
    pub(crate) fn generate_id(&self) -> ElementId {
        ElementId::random(self.profile.id_length)
    }

    /// The view of `entity` on `diagram`, if it appears there.
    pub fn entity_view_on(&self, entity: &ElementId, diagram: &ElementId) -> Option<&View> {
        let entity = self.entities.get(entity)?;
        entity
            .views
            .iter()
            .filter_map(|id| self.views.get(id))
            .find(|view| &view.diagram == diagram)
    }

    /// All diagrams an entity appears on, in view order.
    pub fn entity_diagrams(&self, entity: &ElementId) -> Vec<ElementId> {
        let Some(entity) = self.entities.get(entity) else {
            return Vec::new();
        };
        let mut diagrams = Vec::new();
        for view_id in &entity.views {
            if let Some(view) = self.views.get(view_id) {
                if !diagrams.contains(&view.diagram) {
                    diagrams.push(view.diagram.clone());
                }
            }
        }
        diagrams
    }

    // ── Registration ────────────────────────────────────────────────

    /// Insert an entity, indexing its stereotype.
    pub(crate) fn register_entity(&mut self, entity: Entity) {
        let key = entity.stereotype_key();
        let id = entity.id.clone();
        self.by_stereotype.entry(key).or_default().push(id.clone());
        self.entities.insert(id, entity);
    }

    /// The entity for `id`, creating a prototype when the id has not been
    /// seen yet. Prototypes are not indexed by stereotype until updated.
    pub(crate) fn ensure_entity(&mut self, id: &ElementId) -> ElementId {
        if !self.entities.contains_key(id) {
            self.entities.insert(id.clone(), Entity::prototype(id.clone()));
        }
        id.clone()
    }

    /// Insert an edge and wire both endpoint indices.
    pub(crate) fn register_edge(&mut self, edge: Edge) {
        let id = edge.id().clone();
        let kind = edge.kind();
        let from = edge.from().clone();
        let to = edge.to().clone();
        self.edge_order.add(kind, id.clone());
        if let Some(entity) = self.entities.get_mut(&from) {
            entity.out_edges.add(kind, id.clone());
        }
        if let Some(entity) = self.entities.get_mut(&to) {
            entity.in_edges.add(kind, id.clone());
        }
        self.edges.insert(id, edge);
    }

    /// Insert a view into the flat table and its diagram's list. The owner
    /// element's view list is maintained by the callers, which know the
    /// owner's table.
    pub(crate) fn register_view(&mut self, view: View) -> ElementId {
        let id = view.id.clone();
        if let Some(diagram) = self.diagrams.get_mut(&view.diagram) {
            diagram.add_view(id.clone());
        }
        self.views.insert(id.clone(), view);
        id
    }

    // ── Deletion cascade ────────────────────────────────────────────

    /// Remove views from the table and their diagrams' lists.
    pub(crate) fn remove_views(&mut self, view_ids: &[ElementId]) {
        for view_id in view_ids {
            if let Some(view) = self.views.shift_remove(view_id) {
                if let Some(diagram) = self.diagrams.get_mut(&view.diagram) {
                    diagram.remove_view(view_id);
                }
            }
        }
    }

    /// Delete a generalization set: its views go, and its members forget it.
    pub fn delete_generalization_set(&mut self, id: &ElementId) {
        let Some(set) = self.sets.shift_remove(id) else {
            return;
        };
        self.remove_views(&set.views);
        for generalization_id in &set.generalizations {
            if let Some(Edge::Generalization(g)) = self.edges.get_mut(generalization_id) {
                g.set = None;
            }
        }
    }

    /// Delete an edge: endpoint indices, views, and (for a generalization)
    /// set membership are all fixed up. A set left with fewer than two
    /// members is deleted as well.
    pub fn delete_relation(&mut self, id: &ElementId) {
        let Some(edge) = self.edges.shift_remove(id) else {
            return;
        };
        let kind = edge.kind();
        self.edge_order.remove(kind, id);
        self.remove_views(edge.views());

        if let Some(entity) = self.entities.get_mut(edge.from()) {
            entity.out_edges.remove(kind, id);
        }
        if let Some(entity) = self.entities.get_mut(edge.to()) {
            entity.in_edges.remove(kind, id);
        }

        if let Edge::Generalization(generalization) = edge {
            if let Some(set_id) = generalization.set {
                let degenerate = if let Some(set) = self.sets.get_mut(&set_id) {
                    set.remove_generalization(id);
                    set.generalizations.len() < 2
                } else {
                    false
                };
                if degenerate {
                    self.delete_generalization_set(&set_id);
                }
            }
        }
    }

    /// Delete an entity with every incident edge and every view of both.
    /// Unknown ids are ignored.
    pub fn delete_entity(&mut self, id: &ElementId) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        let incident: Vec<ElementId> = entity
            .in_edges
            .all()
            .into_iter()
            .chain(entity.out_edges.all())
            .collect();
        for edge_id in &incident {
            self.delete_relation(edge_id);
        }
        if let Some(entity) = self.entities.shift_remove(id) {
            if let Some(bucket) = self.by_stereotype.get_mut(&entity.stereotype_key()) {
                bucket.retain(|e| e != id);
            }
            self.remove_views(&entity.views);
        }
    }

    /// Delete the entities queued during hierarchy abstraction.
    pub(crate) fn clear_pending_removals(&mut self) {
        let pending = std::mem::take(&mut self.pending_removal);
        for id in pending {
            self.delete_entity(&id);
        }
    }

    // ── Attribute promotion ─────────────────────────────────────────

    /// Add an attribute to an entity, growing each of its views by one
    /// attribute row.
    pub(crate) fn add_entity_attribute(&mut self, entity_id: &ElementId, attribute: &str) {
        let property_id = self.generate_id();
        let attribute_height = self.profile.attribute_height;
        let Some(entity) = self.entities.get_mut(entity_id) else {
            return;
        };
        entity.push_property(attribute_property(property_id, attribute));
        let views = entity.views.clone();
        for view_id in views {
            if let Some(view) = self.views.get_mut(&view_id) {
                view.grow_height(attribute_height);
            }
        }
    }

    // ── Synthesized elements ────────────────────────────────────────

    /// Create an unstereotyped relation between two entities, with a view
    /// on the given diagram when both endpoints appear there.
    pub(crate) fn create_relation(
        &mut self,
        source: &ElementId,
        target: &ElementId,
        diagram: Option<&ElementId>,
        name: Option<String>,
        cardinality_from: Option<String>,
        cardinality_to: Option<String>,
    ) -> ElementId {
        let relation_id = self.generate_id();
        let relation = Relation::synthesized(
            relation_id.clone(),
            source.clone(),
            target.clone(),
            name,
            cardinality_from,
            cardinality_to,
        );
        self.register_edge(Edge::Relation(relation));
        if let Some(diagram) = diagram {
            self.create_edge_view(&relation_id, true, source, target, diagram);
        }
        relation_id
    }

    /// Create a polyline view for an edge between two entities' views on a
    /// diagram. Skipped silently when either endpoint has no view there.
    pub(crate) fn create_edge_view(
        &mut self,
        edge_id: &ElementId,
        is_relation: bool,
        source: &ElementId,
        target: &ElementId,
        diagram: &ElementId,
    ) {
        let Some(source_view) = self.entity_view_on(source, diagram) else {
            return;
        };
        let Some(target_view) = self.entity_view_on(target, diagram) else {
            return;
        };
        let points = vec![source_view.center(), target_view.center()];
        let source_view_id = source_view.id.clone();
        let target_view_id = target_view.id.clone();
        let view = View::for_edge(
            self.generate_id(),
            is_relation,
            edge_id,
            &source_view_id,
            &target_view_id,
            diagram.clone(),
            points,
        );
        let view_id = self.register_view(view);
        if let Some(edge) = self.edges.get_mut(edge_id) {
            edge.views_mut().push(view_id);
        }
    }

    /// Create a rectangle view for an entity on a diagram.
    pub(crate) fn create_entity_view(
        &mut self,
        entity_id: &ElementId,
        diagram: &ElementId,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    ) {
        let view = View::for_entity(
            self.generate_id(),
            entity_id,
            diagram.clone(),
            x,
            y,
            width,
            height,
        );
        let view_id = self.register_view(view);
        if let Some(entity) = self.entities.get_mut(entity_id) {
            entity.views.push(view_id);
        }
    }

    /// Synthesize an enumeration holding the given literal objects and link
    /// it from `source` with a to-cardinality of 1. The enumeration is
    /// placed diagonally off the source's view when a diagram is known.
    pub(crate) fn create_enumeration_and_relation(
        &mut self,
        source: &ElementId,
        literals: Vec<Value>,
        name: Option<String>,
        diagram: Option<&ElementId>,
    ) {
        let enumeration_id = self.generate_id();
        let name = name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Enumeration_{}", ElementId::random(2)));
        info!(enumeration = %name, "creating enumeration for abstracted set");
        let literal_count = literals.len() as i64;
        let enumeration = Entity::new_enumeration(enumeration_id.clone(), name, literals);
        self.register_entity(enumeration);

        if let Some(diagram) = diagram {
            if let Some(source_view) = self.entity_view_on(source, diagram) {
                let x = source_view.x(self.profile.default_x) + self.profile.default_width + 50;
                let y = source_view.y(self.profile.default_y) + self.profile.default_height + 50;
                let height = self.profile.default_height
                    + literal_count * self.profile.attribute_height;
                let width = self.profile.default_width;
                self.create_entity_view(&enumeration_id, &diagram.clone(), x, y, width, height);
            }
        }

        self.create_relation(
            source,
            &enumeration_id,
            diagram,
            None,
            None,
            Some("1".into()),
        );
    }

    // ── Fold recursion guard ────────────────────────────────────────

    /// Push a name onto the fold stack; false when already being folded.
    pub(crate) fn stack_enter(&mut self, name: &str) -> bool {
        if self.fold_stack.iter().any(|n| n == name) {
            return false;
        }
        self.fold_stack.push(name.to_string());
        true
    }

    pub(crate) fn stack_exit(&mut self) {
        self.fold_stack.pop();
    }
}

impl std::fmt::Display for ModelGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} concepts, {} edges ({} part-of, {} generalizations, {} relations), {} sets, {} diagrams",
            self.entities.len(),
            self.edges.len(),
            self.edge_order.part_of.len(),
            self.edge_order.generalizations.len(),
            self.edge_order.relations.len(),
            self.sets.len(),
            self.diagrams.len(),
        )
    }
}

/// The serialized property object for a promoted attribute.
fn attribute_property(id: ElementId, name: &str) -> Value {
    serde_json::json!({
        "id": id.as_str(),
        "name": name,
        "description": null,
        "type": "Property",
        "propertyAssignments": null,
        "stereotype": null,
        "isDerived": false,
        "isReadOnly": true,
        "isOrdered": false,
        "cardinality": null,
        "propertyType": null,
        "subsettedProperties": null,
        "redefinedProperties": null,
        "aggregationKind": "NONE",
    })
}
