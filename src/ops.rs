//! The operation surface of the core.
//!
//! Each operation takes a parameter record carrying the serialized project
//! (`origin`), format tags, and per-operation fields, materializes a fresh
//! graph, applies one transformation, and returns either the canonical
//! project or the display projection. Optional knobs default to the
//! injected [`Profile`].

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::base::ElementId;
use crate::config::Profile;
use crate::error::GraphError;
use crate::graph::{Hierarchy, ModelGraph};
use crate::interchange;

/// The abstraction families `abstract` accepts, in no particular order.
pub const ABSTRACTION_TYPES: [&str; 3] = ["parthood", "hierarchy", "aspects"];

// ============================================================================
// PARAMETER RECORDS
// ============================================================================

/// Fields shared by every operation.
#[derive(Clone, Debug, Deserialize)]
pub struct GraphParams {
    /// The serialized project to operate on.
    pub origin: Value,
    /// Serialization format of `origin`: `json` or `ttl`.
    pub in_format: String,
    /// Output form: `expo` (display graph) or `json` (canonical).
    pub out_format: String,
    /// Canvas height bound for display output; 0 disables rescaling.
    #[serde(default)]
    pub height: i64,
    /// Canvas width bound for display output; 0 disables rescaling.
    #[serde(default)]
    pub width: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FocusParams {
    #[serde(flatten)]
    pub graph: GraphParams,
    pub node: String,
    pub hop: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ClusterParams {
    #[serde(flatten)]
    pub graph: GraphParams,
    pub node: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(flatten)]
    pub graph: GraphParams,
    pub element_id: String,
    /// `node` or `link`.
    #[serde(default = "default_element_type")]
    pub element_type: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ExpandParams {
    #[serde(flatten)]
    pub graph: GraphParams,
    pub node: String,
    pub hierarchy: Hierarchy,
    /// Node budget across successive catalog hierarchies; bounded by the
    /// boundary layer, accepted here for interface parity.
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FoldParams {
    #[serde(flatten)]
    pub graph: GraphParams,
    pub node: String,
    #[serde(default)]
    pub long_names: Option<bool>,
    #[serde(default)]
    pub mult_relations: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AbstractParams {
    #[serde(flatten)]
    pub graph: GraphParams,
    /// Abstraction families to apply, in the given order.
    pub abs_type: Vec<String>,
    #[serde(default)]
    pub long_names: Option<bool>,
    #[serde(default)]
    pub mult_relations: Option<bool>,
    #[serde(default)]
    pub keep_relators: Option<bool>,
}

fn default_element_type() -> String {
    "node".into()
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Materialize the project and serialize it back untouched.
pub fn load(params: &GraphParams, profile: &Profile) -> Result<Value, GraphError> {
    debug!("loading model");
    let graph = materialize(params, profile)?;
    Ok(render(&graph, params))
}

/// Keep only the BFS ball of radius `hop` around `node`.
pub fn focus(params: &FocusParams, profile: &Profile) -> Result<Value, GraphError> {
    let mut graph = materialize(&params.graph, profile)?;
    graph.focus(&ElementId::new(params.node.as_str()), params.hop)?;
    Ok(render(&graph, &params.graph))
}

/// Keep the relator-centric cluster seeded at `node`.
pub fn cluster(params: &ClusterParams, profile: &Profile) -> Result<Value, GraphError> {
    let mut graph = materialize(&params.graph, profile)?;
    graph.cluster(&ElementId::new(params.node.as_str()))?;
    Ok(render(&graph, &params.graph))
}

/// Delete a concept or a relation. Deleting an unknown concept is a no-op;
/// deleting an unknown relation fails.
pub fn delete(params: &DeleteParams, profile: &Profile) -> Result<Value, GraphError> {
    let mut graph = materialize(&params.graph, profile)?;
    let element_id = ElementId::new(params.element_id.as_str());
    match params.element_type.as_str() {
        "node" => graph.delete_entity(&element_id),
        "link" => {
            if graph.edge(&element_id).is_none() {
                return Err(GraphError::link_not_found(element_id.as_str()));
            }
            graph.delete_relation(&element_id);
        }
        other => {
            return Err(GraphError::bad_input(format!(
                "'element_type' should be 'node' or 'link', got '{other}'"
            )));
        }
    }
    Ok(render(&graph, &params.graph))
}

/// Graft a catalog hierarchy onto `node`.
pub fn expand(params: &ExpandParams, profile: &Profile) -> Result<Value, GraphError> {
    let mut graph = materialize(&params.graph, profile)?;
    graph.expand(&ElementId::new(params.node.as_str()), &params.hierarchy)?;
    Ok(render(&graph, &params.graph))
}

/// Fold `node`, collapsing its downward structure into it.
pub fn fold(params: &FoldParams, profile: &Profile) -> Result<Value, GraphError> {
    let mut graph = materialize(&params.graph, profile)?;
    graph.fold(
        &ElementId::new(params.node.as_str()),
        params.long_names.unwrap_or(profile.long_names),
        params.mult_relations.unwrap_or(profile.mult_relations),
    )?;
    Ok(render(&graph, &params.graph))
}

/// Apply the requested abstraction families in caller order. Orderings are
/// significant: aspects before hierarchy and the reverse can yield
/// different graphs.
pub fn abstract_model(params: &AbstractParams, profile: &Profile) -> Result<Value, GraphError> {
    for abs_type in &params.abs_type {
        if !ABSTRACTION_TYPES.contains(&abs_type.as_str()) {
            return Err(GraphError::bad_input(format!(
                "the abstraction '{abs_type}' is not known"
            )));
        }
    }
    let long_names = params.long_names.unwrap_or(profile.long_names);
    let mult_relations = params.mult_relations.unwrap_or(profile.mult_relations);
    let keep_relators = params.keep_relators.unwrap_or(profile.keep_relators);

    let mut graph = materialize(&params.graph, profile)?;
    for abs_type in &params.abs_type {
        match abs_type.as_str() {
            "parthood" => graph.abstract_parthoods(long_names, mult_relations),
            "aspects" => graph.abstract_aspects(long_names, mult_relations, keep_relators),
            "hierarchy" => graph.abstract_hierarchies(long_names, mult_relations),
            _ => unreachable!("validated above"),
        }
    }
    Ok(render(&graph, &params.graph))
}

// ============================================================================
// SHARED CHECKS
// ============================================================================

fn materialize(params: &GraphParams, profile: &Profile) -> Result<ModelGraph, GraphError> {
    let empty = match &params.origin {
        Value::Object(map) => map.is_empty(),
        Value::Null => true,
        _ => false,
    };
    if empty {
        return Err(GraphError::bad_input(
            "the model is not loaded, load the model first",
        ));
    }
    match params.out_format.as_str() {
        "expo" | "json" => {}
        other => {
            return Err(GraphError::bad_input(format!(
                "'out_format' should be 'expo' or 'json', got '{other}'"
            )));
        }
    }
    match params.in_format.as_str() {
        "json" => ModelGraph::from_project_with(&params.origin, profile.clone()),
        "ttl" => Err(GraphError::NotImplemented("the ttl format")),
        other => Err(GraphError::bad_input(format!(
            "'in_format' should be 'json' or 'ttl', got '{other}'"
        ))),
    }
}

fn render(graph: &ModelGraph, params: &GraphParams) -> Value {
    if params.out_format == "expo" {
        interchange::display::to_display_value(graph, params.height, params.width)
    } else {
        interchange::to_project_value(graph)
    }
}
