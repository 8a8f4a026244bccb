//! Edges of the graph: ordinary relations, parthoods, and generalizations,
//! plus the cardinality arithmetic the abstraction passes use.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::base::ElementId;
use crate::model::stereotype::{AggregationKind, RelationStereotype};
use crate::model::JsonMap;

// ============================================================================
// EDGE KIND
// ============================================================================

/// The final type of an edge. A serialized `Relation` specializes to
/// `PartOf` when either endpoint aggregates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    PartOf,
    Relation,
    Generalization,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 3] = [EdgeKind::PartOf, EdgeKind::Relation, EdgeKind::Generalization];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PartOf => "PartOf",
            Self::Relation => "Relation",
            Self::Generalization => "Generalization",
        }
    }
}

// ============================================================================
// RELATION ENDPOINTS
// ============================================================================

/// One endpoint property of a relation: role name, cardinality string,
/// aggregation marker, read-only flag. The `propertyType` payload and any
/// unrecognized keys are preserved for re-serialization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationEnd {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cardinality: Option<String>,
    #[serde(default, rename = "aggregationKind")]
    pub aggregation_kind: Option<AggregationKind>,
    #[serde(default, rename = "isReadOnly")]
    pub is_read_only: Option<bool>,
    #[serde(default, rename = "propertyType")]
    pub property_type: Option<Value>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl RelationEnd {
    /// A bare endpoint for synthesized relations.
    pub fn new(id: String, target: &ElementId, cardinality: Option<String>) -> Self {
        let mut extra = JsonMap::new();
        extra.insert("description".into(), Value::Null);
        extra.insert("propertyAssignments".into(), Value::Null);
        extra.insert("stereotype".into(), Value::Null);
        extra.insert("isDerived".into(), serde_json::json!(false));
        extra.insert("isOrdered".into(), serde_json::json!(false));
        extra.insert("subsettedProperties".into(), Value::Null);
        extra.insert("redefinedProperties".into(), Value::Null);
        Self {
            id,
            name: Some(String::new()),
            cardinality,
            aggregation_kind: Some(AggregationKind::None),
            is_read_only: Some(true),
            property_type: Some(serde_json::json!({"id": target.as_str(), "type": "Class"})),
            extra,
        }
    }

    pub fn is_aggregated(&self) -> bool {
        self.aggregation_kind.is_some_and(|k| k.is_aggregated())
    }

    /// The role name, treating null and empty as absent.
    pub fn role(&self) -> Option<&str> {
        self.name.as_deref().filter(|r| !r.is_empty())
    }

    /// The cardinality, treating null and empty as absent.
    pub fn cardinality_str(&self) -> Option<&str> {
        self.cardinality.as_deref().filter(|c| !c.is_empty())
    }
}

// ============================================================================
// CARDINALITY ARITHMETIC
// ============================================================================

/// Relax the lower bound of a cardinality to zero. `*` on either side of
/// the result collapses to no constraint at all. Unparseable strings come
/// back unchanged.
pub fn relax_cardinality(original: &str) -> Option<String> {
    if original == "*" {
        return None;
    }
    if let Some((_, upper)) = original.split_once("..") {
        if upper == "*" {
            return None;
        }
        return Some(format!("0..{upper}"));
    }
    match original.parse::<i64>() {
        Ok(upper) if upper > 0 => Some(format!("0..{upper}")),
        Ok(_) => None,
        Err(_) => Some(original.to_string()),
    }
}

/// Merge two cardinalities into the broadest constraint covering both:
/// minimum of the lower bounds, maximum of the upper bounds, `*` wins.
/// `0..*` collapses to no constraint; unparseable input falls back to the
/// first argument.
pub fn broadest_cardinality(fst: &str, snd: &str) -> Option<String> {
    if fst == "*" || snd == "*" {
        return None;
    }
    let fallback = || Some(fst.to_string());

    let split = |card: &str| -> (String, String) {
        match card.split_once("..") {
            Some((lo, hi)) => (lo.to_string(), hi.to_string()),
            None => (card.to_string(), card.to_string()),
        }
    };
    let (fst_lo, fst_hi) = split(fst);
    let (snd_lo, snd_hi) = split(snd);

    let (Ok(fst_lo), Ok(snd_lo)) = (fst_lo.parse::<i64>(), snd_lo.parse::<i64>()) else {
        return fallback();
    };
    let lower = fst_lo.min(snd_lo);

    let upper = if fst_hi == "*" || snd_hi == "*" {
        if lower == 0 {
            return None;
        }
        "*".to_string()
    } else {
        let (Ok(fst_hi), Ok(snd_hi)) = (fst_hi.parse::<i64>(), snd_hi.parse::<i64>()) else {
            return fallback();
        };
        fst_hi.max(snd_hi).to_string()
    };

    if lower.to_string() == upper {
        Some(upper)
    } else {
        Some(format!("{lower}..{upper}"))
    }
}

// ============================================================================
// GENERALIZATION
// ============================================================================

/// A generalization edge. `from` is the specific, `to` the general.
#[derive(Clone, Debug)]
pub struct Generalization {
    pub id: ElementId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub property_assignments: Value,
    pub from: ElementId,
    pub to: ElementId,
    /// The generalization set this edge belongs to, if any.
    pub set: Option<ElementId>,
    pub views: Vec<ElementId>,
}

impl Generalization {
    /// Endpoint ids of a serialized generalization, or `None` when either
    /// end is not a class (generalizations between relations are ignored).
    pub fn endpoint_ids(map: &JsonMap) -> Option<(ElementId, ElementId)> {
        let end = |key: &str| -> Option<(&str, &str)> {
            let obj = map.get(key)?.as_object()?;
            Some((obj.get("id")?.as_str()?, obj.get("type")?.as_str()?))
        };
        let (specific_id, specific_type) = end("specific")?;
        let (general_id, general_type) = end("general")?;
        if specific_type != "Class" || general_type != "Class" {
            return None;
        }
        Some((ElementId::new(specific_id), ElementId::new(general_id)))
    }

    pub fn from_map(map: &JsonMap, from: ElementId, to: ElementId) -> Self {
        Self {
            id: ElementId::new(string_field(map, "id").unwrap_or_default()),
            name: string_field(map, "name"),
            description: string_field(map, "description"),
            property_assignments: map
                .get("propertyAssignments")
                .cloned()
                .unwrap_or(Value::Null),
            from,
            to,
            set: None,
            views: Vec::new(),
        }
    }

    /// A placeholder generalization referenced by a set before the edge
    /// itself was seen.
    pub fn prototype(id: ElementId, placeholder: ElementId) -> Self {
        Self {
            id,
            name: None,
            description: None,
            property_assignments: Value::Null,
            from: placeholder.clone(),
            to: placeholder,
            set: None,
            views: Vec::new(),
        }
    }

    /// Promote a prototype to the real generalization.
    pub fn update_from(&mut self, map: &JsonMap, from: ElementId, to: ElementId) {
        self.name = string_field(map, "name");
        self.description = string_field(map, "description");
        self.property_assignments = map
            .get("propertyAssignments")
            .cloned()
            .unwrap_or(Value::Null);
        self.from = from;
        self.to = to;
    }

    /// A fresh generalization for catalog expansion.
    pub fn synthesized(id: ElementId, specific: ElementId, general: ElementId) -> Self {
        Self {
            id,
            name: None,
            description: None,
            property_assignments: Value::Null,
            from: specific,
            to: general,
            set: None,
            views: Vec::new(),
        }
    }
}

// ============================================================================
// RELATION
// ============================================================================

/// An ordinary relation or parthood. `kind` is `PartOf` exactly when one
/// endpoint aggregates; loading re-orients such edges so the whole is
/// always `to`.
#[derive(Clone, Debug)]
pub struct Relation {
    pub id: ElementId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub stereotype: Option<RelationStereotype>,
    pub kind: EdgeKind,
    pub from: ElementId,
    pub to: ElementId,
    /// Endpoint properties: `ends[0]` describes `from`, `ends[1]` `to`.
    pub ends: [RelationEnd; 2],
    /// Residual attributes of the serialized relation.
    pub rest: JsonMap,
    pub views: Vec<ElementId>,
}

impl Relation {
    /// Endpoint ids of a serialized relation, or `None` when either
    /// property lacks a class-typed `propertyType` (export artifacts).
    pub fn endpoint_ids(map: &JsonMap) -> Option<(ElementId, ElementId)> {
        let properties = map.get("properties")?.as_array()?;
        let end = |idx: usize| -> Option<&str> {
            let property = properties.get(idx)?.as_object()?;
            let target = property.get("propertyType")?.as_object()?;
            if target.get("type")?.as_str()? != "Class" {
                return None;
            }
            target.get("id")?.as_str()
        };
        Some((ElementId::new(end(0)?), ElementId::new(end(1)?)))
    }

    /// Build a relation from a serialized object. The typed header fields
    /// and the `properties` array are removed from the map; the remainder
    /// becomes `rest`.
    pub fn from_map(mut map: JsonMap, from: ElementId, to: ElementId) -> Self {
        let id = ElementId::new(take_string(&mut map, "id").unwrap_or_default());
        let name = take_string(&mut map, "name");
        let description = take_string(&mut map, "description");
        let _ = take_string(&mut map, "type");
        let stereotype = take_string(&mut map, "stereotype")
            .filter(|s| !s.is_empty())
            .map(|s| RelationStereotype::parse(&s));
        let ends: [RelationEnd; 2] = match map.shift_remove("properties") {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|_| {
                [
                    RelationEnd::new(format!("{id}_p0"), &from, None),
                    RelationEnd::new(format!("{id}_p1"), &to, None),
                ]
            }),
            None => [
                RelationEnd::new(format!("{id}_p0"), &from, None),
                RelationEnd::new(format!("{id}_p1"), &to, None),
            ],
        };
        let kind = if ends[0].is_aggregated() || ends[1].is_aggregated() {
            EdgeKind::PartOf
        } else {
            EdgeKind::Relation
        };
        Self {
            id,
            name,
            description,
            stereotype,
            kind,
            from,
            to,
            ends,
            rest: map,
            views: Vec::new(),
        }
    }

    /// A fresh unstereotyped relation for synthesized edges.
    pub fn synthesized(
        id: ElementId,
        from: ElementId,
        to: ElementId,
        name: Option<String>,
        cardinality_from: Option<String>,
        cardinality_to: Option<String>,
    ) -> Self {
        let mut rest = JsonMap::new();
        rest.insert("propertyAssignments".into(), Value::Null);
        rest.insert("isAbstract".into(), serde_json::json!(false));
        rest.insert("isDerived".into(), serde_json::json!(false));
        let ends = [
            RelationEnd::new(format!("{id}_p0"), &from, cardinality_from),
            RelationEnd::new(format!("{id}_p1"), &to, cardinality_to),
        ];
        Self {
            id,
            name,
            description: None,
            stereotype: None,
            kind: EdgeKind::Relation,
            from,
            to,
            ends,
            rest,
            views: Vec::new(),
        }
    }

    pub fn role_from(&self) -> Option<&str> {
        self.ends[0].role()
    }

    pub fn role_to(&self) -> Option<&str> {
        self.ends[1].role()
    }

    pub fn clear_role_from(&mut self) {
        self.ends[0].name = Some(String::new());
    }

    pub fn clear_role_to(&mut self) {
        self.ends[1].name = Some(String::new());
    }

    pub fn cardinality_from(&self) -> Option<&str> {
        self.ends[0].cardinality_str()
    }

    pub fn cardinality_to(&self) -> Option<&str> {
        self.ends[1].cardinality_str()
    }

    pub fn relax_cardinality_from(&mut self) {
        if let Some(card) = self.ends[0].cardinality_str() {
            self.ends[0].cardinality = relax_cardinality(card);
        }
    }

    pub fn relax_cardinality_to(&mut self) {
        if let Some(card) = self.ends[1].cardinality_str() {
            self.ends[1].cardinality = relax_cardinality(card);
        }
    }

    /// Widen the `from` cardinality to cover the other relation's; either
    /// side missing drops the constraint.
    pub fn merge_cardinality_from(&mut self, other: Option<&str>) {
        self.ends[0].cardinality = match (self.ends[0].cardinality_str(), other) {
            (Some(own), Some(other)) => broadest_cardinality(own, other),
            _ => None,
        };
    }

    /// Widen the `to` cardinality to cover the other relation's.
    pub fn merge_cardinality_to(&mut self, other: Option<&str>) {
        self.ends[1].cardinality = match (self.ends[1].cardinality_str(), other) {
            (Some(own), Some(other)) => broadest_cardinality(own, other),
            _ => None,
        };
    }

    /// A parthood is essential when both endpoints are read-only.
    pub fn is_essential(&self) -> bool {
        self.ends[0].is_read_only.unwrap_or(false) && self.ends[1].is_read_only.unwrap_or(false)
    }

    /// True when the aggregation marker sits on the source endpoint, i.e.
    /// the serialized parthood points whole → part and must be inverted.
    pub fn is_aggregation_from(&self) -> bool {
        self.ends[0].is_aggregated()
    }

    /// Exchange source and target, endpoint properties included.
    pub fn invert(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
        self.ends.swap(0, 1);
    }
}

// ============================================================================
// EDGE
// ============================================================================

/// An edge of the graph: either a generalization or an (ordinary or
/// parthood) relation, with the shared header accessible uniformly.
#[derive(Clone, Debug)]
pub enum Edge {
    Generalization(Generalization),
    Relation(Relation),
}

impl Edge {
    pub fn id(&self) -> &ElementId {
        match self {
            Self::Generalization(g) => &g.id,
            Self::Relation(r) => &r.id,
        }
    }

    pub fn kind(&self) -> EdgeKind {
        match self {
            Self::Generalization(_) => EdgeKind::Generalization,
            Self::Relation(r) => r.kind,
        }
    }

    pub fn from(&self) -> &ElementId {
        match self {
            Self::Generalization(g) => &g.from,
            Self::Relation(r) => &r.from,
        }
    }

    pub fn to(&self) -> &ElementId {
        match self {
            Self::Generalization(g) => &g.to,
            Self::Relation(r) => &r.to,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Generalization(g) => g.name.as_deref(),
            Self::Relation(r) => r.name.as_deref(),
        }
    }

    pub fn set_name(&mut self, name: Option<String>) {
        match self {
            Self::Generalization(g) => g.name = name,
            Self::Relation(r) => r.name = name,
        }
    }

    pub fn views(&self) -> &[ElementId] {
        match self {
            Self::Generalization(g) => &g.views,
            Self::Relation(r) => &r.views,
        }
    }

    pub fn views_mut(&mut self) -> &mut Vec<ElementId> {
        match self {
            Self::Generalization(g) => &mut g.views,
            Self::Relation(r) => &mut r.views,
        }
    }

    pub fn set_from(&mut self, from: ElementId) {
        match self {
            Self::Generalization(g) => g.from = from,
            Self::Relation(r) => r.from = from,
        }
    }

    pub fn set_to(&mut self, to: ElementId) {
        match self {
            Self::Generalization(g) => g.to = to,
            Self::Relation(r) => r.to = to,
        }
    }

    pub fn as_relation(&self) -> Option<&Relation> {
        match self {
            Self::Relation(r) => Some(r),
            Self::Generalization(_) => None,
        }
    }

    pub fn as_relation_mut(&mut self) -> Option<&mut Relation> {
        match self {
            Self::Relation(r) => Some(r),
            Self::Generalization(_) => None,
        }
    }

    pub fn as_generalization(&self) -> Option<&Generalization> {
        match self {
            Self::Generalization(g) => Some(g),
            Self::Relation(_) => None,
        }
    }

    /// The relation stereotype, if this is a relation and it has one.
    pub fn relation_stereotype(&self) -> Option<&RelationStereotype> {
        self.as_relation().and_then(|r| r.stereotype.as_ref())
    }

    /// Re-key the edge and its endpoint property ids after a structural
    /// clone. View ids are rewritten by the graph, which owns the views.
    pub fn reassign_id(&mut self, new_id: ElementId) {
        match self {
            Self::Generalization(g) => g.id = new_id,
            Self::Relation(r) => {
                r.ends[0].id = format!("{new_id}_p0");
                r.ends[1].id = format!("{new_id}_p1");
                r.id = new_id;
            }
        }
    }
}

fn string_field(map: &JsonMap, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn take_string(map: &mut JsonMap, key: &str) -> Option<String> {
    match map.shift_remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("*", None)]
    #[case("1..*", None)]
    #[case("2..5", Some("0..5"))]
    #[case("1", Some("0..1"))]
    #[case("0", None)]
    #[case("many", Some("many"))]
    fn relaxing_lower_bounds(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(relax_cardinality(input).as_deref(), expected);
    }

    #[rstest]
    #[case("1..2", "0..5", Some("0..5"))]
    #[case("1", "3", Some("1..3"))]
    #[case("2", "2", Some("2"))]
    #[case("*", "1..2", None)]
    #[case("0..1", "1..*", None)]
    #[case("1..2", "2..*", Some("1..*"))]
    #[case("odd", "1..2", Some("odd"))]
    fn merging_cardinalities(#[case] fst: &str, #[case] snd: &str, #[case] expected: Option<&str>) {
        assert_eq!(broadest_cardinality(fst, snd).as_deref(), expected);
    }

    fn sample_relation(aggregation: &str) -> Relation {
        let map = serde_json::json!({
            "id": "r1",
            "name": "owns",
            "description": null,
            "type": "Relation",
            "stereotype": "material",
            "properties": [
                {"id": "p0", "name": "owner", "cardinality": "1",
                 "aggregationKind": "NONE", "isReadOnly": false,
                 "propertyType": {"id": "a", "type": "Class"}},
                {"id": "p1", "name": null, "cardinality": "0..*",
                 "aggregationKind": aggregation, "isReadOnly": false,
                 "propertyType": {"id": "b", "type": "Class"}},
            ],
        });
        Relation::from_map(
            map.as_object().cloned().unwrap(),
            ElementId::new("a"),
            ElementId::new("b"),
        )
    }

    #[test]
    fn final_type_derives_from_aggregation() {
        assert_eq!(sample_relation("NONE").kind, EdgeKind::Relation);
        assert_eq!(sample_relation("COMPOSITE").kind, EdgeKind::PartOf);
        assert_eq!(sample_relation("SHARED").kind, EdgeKind::PartOf);
    }

    #[test]
    fn invert_swaps_endpoints_and_properties() {
        let mut relation = sample_relation("NONE");
        relation.invert();
        assert_eq!(relation.from.as_str(), "b");
        assert_eq!(relation.to.as_str(), "a");
        assert_eq!(relation.role_to(), Some("owner"));
        assert_eq!(relation.role_from(), None);
    }

    #[test]
    fn merge_drops_constraint_when_either_side_is_missing() {
        let mut relation = sample_relation("NONE");
        relation.merge_cardinality_from(None);
        assert_eq!(relation.cardinality_from(), None);
        let mut relation = sample_relation("NONE");
        relation.merge_cardinality_to(Some("1..3"));
        assert_eq!(relation.cardinality_to(), None); // 0..* collapses
    }

    #[test]
    fn endpoint_ids_reject_non_class_targets() {
        let map = serde_json::json!({
            "properties": [
                {"propertyType": {"id": "a", "type": "Relation"}},
                {"propertyType": {"id": "b", "type": "Class"}},
            ],
        });
        assert!(Relation::endpoint_ids(map.as_object().unwrap()).is_none());
    }
}
