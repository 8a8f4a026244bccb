//! The element model: stereotype vocabulary, entities, edges,
//! generalization sets, views, diagrams, and the retained package skeleton.

pub mod diagram;
pub mod entity;
pub mod genset;
pub mod package;
pub mod relation;
pub mod stereotype;
pub mod view;

pub use diagram::Diagram;
pub use entity::{EdgeLists, Entity};
pub use genset::GeneralizationSet;
pub use package::{PackageTree, ProjectMeta};
pub use relation::{Edge, EdgeKind, Generalization, Relation, RelationEnd};
pub use stereotype::{AggregationKind, ClassStereotype, RelationStereotype};
pub use view::{Shape, View, ViewRef};

/// Order-preserving JSON object, used for every residual attribute map.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
