//! Generalization sets: named partitions of specializations with
//! completeness and disjointness flags.

use serde_json::Value;

use crate::base::ElementId;
use crate::model::JsonMap;

/// A set of generalizations under one general.
///
/// The `categorizer` reference is resolved to a plain name at load time (it
/// names the set when present) and nulled in the residual map. A set that
/// drops below two members is deleted by the graph; removing any member
/// clears completeness.
#[derive(Clone, Debug)]
pub struct GeneralizationSet {
    pub id: ElementId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub element_type: String,
    pub is_complete: bool,
    pub is_disjoint: bool,
    pub generalizations: Vec<ElementId>,
    /// Residual attributes of the serialized set.
    pub rest: JsonMap,
    pub views: Vec<ElementId>,
}

impl GeneralizationSet {
    /// Member generalization ids of a serialized set. Some exports carry
    /// `generalizations: null`; that reads as an empty set.
    pub fn member_ids(map: &JsonMap) -> Vec<ElementId> {
        let Some(Value::Array(members)) = map.get("generalizations") else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|member| member.get("id")?.as_str())
            .map(ElementId::new)
            .collect()
    }

    /// Build a set from a serialized object, resolving the categorizer name
    /// through the given id → name table.
    pub fn from_map(
        mut map: JsonMap,
        generalizations: Vec<ElementId>,
        categorizer_names: &rustc_hash::FxHashMap<ElementId, String>,
    ) -> Self {
        let id = ElementId::new(take_string(&mut map, "id").unwrap_or_default());
        let mut name = take_string(&mut map, "name");
        let description = take_string(&mut map, "description");
        let element_type = take_string(&mut map, "type").unwrap_or_else(|| "GeneralizationSet".into());
        map.shift_remove("stereotype");
        map.shift_remove("generalizations");
        let is_complete = map
            .shift_remove("isComplete")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let is_disjoint = map
            .shift_remove("isDisjoint")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if let Some(categorizer) = map.get_mut("categorizer") {
            if let Some(categorizer_id) = categorizer.get("id").and_then(Value::as_str) {
                if let Some(resolved) = categorizer_names.get(&ElementId::new(categorizer_id)) {
                    name = Some(resolved.clone());
                }
            }
            *categorizer = Value::Null;
        }

        Self {
            id,
            name,
            description,
            element_type,
            is_complete,
            is_disjoint,
            generalizations,
            rest: map,
            views: Vec::new(),
        }
    }

    /// A fresh set for catalog expansion.
    pub fn synthesized(
        id: ElementId,
        generalizations: Vec<ElementId>,
        complete: bool,
        disjoint: bool,
    ) -> Self {
        let mut rest = JsonMap::new();
        rest.insert("propertyAssignments".into(), Value::Null);
        rest.insert("categorizer".into(), Value::Null);
        Self {
            id,
            name: Some("GS".into()),
            description: None,
            element_type: "GeneralizationSet".into(),
            is_complete: complete,
            is_disjoint: disjoint,
            generalizations,
            rest,
            views: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn is_complete_and_disjoint(&self) -> bool {
        self.is_complete && self.is_disjoint
    }

    /// Drop a member; any removal voids the completeness claim.
    pub fn remove_generalization(&mut self, id: &ElementId) {
        self.is_complete = false;
        self.generalizations.retain(|g| g != id);
    }
}

fn take_string(map: &mut JsonMap, key: &str) -> Option<String> {
    match map.shift_remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}
