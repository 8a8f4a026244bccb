//! Views: per-diagram placements of model elements.
//!
//! Entities are rectangles, edges are polylines, generalization-set labels
//! are text shapes. Views live in one flat table on the graph; diagrams and
//! elements reference them by id.

use serde_json::Value;

use crate::base::{ElementId, Point};
use crate::model::JsonMap;

pub const CLASS_VIEW: &str = "ClassView";
pub const RELATION_VIEW: &str = "RelationView";
pub const GENERALIZATION_VIEW: &str = "GeneralizationView";
pub const GEN_SET_VIEW: &str = "GeneralizationSetView";

// ============================================================================
// SHAPES
// ============================================================================

/// The drawable geometry of a view.
#[derive(Clone, Debug)]
pub enum Shape {
    Rectangle {
        id: String,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    },
    Path {
        id: String,
        points: Vec<Point>,
    },
    Text {
        id: String,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        value: Option<String>,
    },
}

impl Shape {
    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let id = map.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
        let number = |key: &str| -> i64 {
            map.get(key)
                .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
                .unwrap_or(0)
        };
        match map.get("type").and_then(Value::as_str) {
            Some("Path") => {
                let points = map
                    .get("points")
                    .and_then(Value::as_array)
                    .map(|points| {
                        points
                            .iter()
                            .filter_map(|p| {
                                Some(Point::new(
                                    p.get("x")?.as_i64().or_else(|| p.get("x")?.as_f64().map(|f| f as i64))?,
                                    p.get("y")?.as_i64().or_else(|| p.get("y")?.as_f64().map(|f| f as i64))?,
                                ))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Some(Self::Path { id, points })
            }
            Some("Text") => Some(Self::Text {
                id,
                x: number("x"),
                y: number("y"),
                width: number("width"),
                height: number("height"),
                value: map.get("value").and_then(Value::as_str).map(str::to_string),
            }),
            _ => Some(Self::Rectangle {
                id,
                x: number("x"),
                y: number("y"),
                width: number("width"),
                height: number("height"),
            }),
        }
    }

    pub fn set_id(&mut self, new_id: String) {
        match self {
            Self::Rectangle { id, .. } | Self::Path { id, .. } | Self::Text { id, .. } => {
                *id = new_id
            }
        }
    }
}

// ============================================================================
// VIEW
// ============================================================================

/// A reference to another element or view (`{id, type}` on the wire).
#[derive(Clone, Debug, PartialEq)]
pub struct ViewRef {
    pub id: ElementId,
    pub ref_type: String,
}

impl ViewRef {
    pub fn new(id: ElementId, ref_type: impl Into<String>) -> Self {
        Self {
            id,
            ref_type: ref_type.into(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            id: ElementId::new(map.get("id")?.as_str()?),
            ref_type: map
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

/// A placement of one model element on one diagram.
#[derive(Clone, Debug)]
pub struct View {
    pub id: ElementId,
    pub view_type: String,
    pub diagram: ElementId,
    /// The model element this view renders.
    pub element: ViewRef,
    pub shape: Shape,
    /// Source endpoint view (edge views only).
    pub source: Option<ViewRef>,
    /// Target endpoint view (edge views only).
    pub target: Option<ViewRef>,
}

impl View {
    /// Build a view from its serialized object, or `None` when the payload
    /// lacks a model-element reference.
    pub fn from_map(map: &JsonMap, diagram: ElementId) -> Option<Self> {
        let element = ViewRef::from_value(map.get("modelElement")?)?;
        let view_type = map
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(Self {
            id: ElementId::new(map.get("id")?.as_str()?),
            shape: Shape::from_value(map.get("shape")?)?,
            source: map.get("source").and_then(ViewRef::from_value),
            target: map.get("target").and_then(ViewRef::from_value),
            element,
            view_type,
            diagram,
        })
    }

    pub fn is_edge_view(&self) -> bool {
        self.view_type == RELATION_VIEW || self.view_type == GENERALIZATION_VIEW
    }

    /// Canvas x of the view: rectangle origin, or first path point.
    pub fn x(&self, default: i64) -> i64 {
        match &self.shape {
            Shape::Rectangle { x, .. } => *x,
            Shape::Path { points, .. } => points.first().map(|p| p.x).unwrap_or(default),
            Shape::Text { .. } => default,
        }
    }

    /// Canvas y of the view: rectangle origin, or first path point.
    pub fn y(&self, default: i64) -> i64 {
        match &self.shape {
            Shape::Rectangle { y, .. } => *y,
            Shape::Path { points, .. } => points.first().map(|p| p.y).unwrap_or(default),
            Shape::Text { .. } => default,
        }
    }

    /// Center of the rectangle representing an entity.
    pub fn center(&self) -> Point {
        match &self.shape {
            Shape::Rectangle {
                x,
                y,
                width,
                height,
                ..
            } => Point::new(x + width / 2, y + height / 2),
            Shape::Path { points, .. } => points.first().copied().unwrap_or_default(),
            Shape::Text { x, y, .. } => Point::new(*x, *y),
        }
    }

    /// Grow a rectangle shape, e.g. when an attribute row is added.
    pub fn grow_height(&mut self, amount: i64) {
        if let Shape::Rectangle { height, .. } = &mut self.shape {
            *height += amount;
        }
    }

    /// Rewrite the first path point after an endpoint move.
    pub fn update_source_point(&mut self, point: Point, detour_width: i64, detour_height: i64) {
        if let Shape::Path { points, .. } = &mut self.shape {
            if points.is_empty() {
                points.push(point);
            } else {
                points[0] = point;
            }
        }
        self.make_edge_visible(detour_width, detour_height);
    }

    /// Rewrite the last path point after an endpoint move.
    pub fn update_target_point(&mut self, point: Point, detour_width: i64, detour_height: i64) {
        if let Shape::Path { points, .. } = &mut self.shape {
            match points.last_mut() {
                Some(last) => *last = point,
                None => points.push(point),
            }
        }
        self.make_edge_visible(detour_width, detour_height);
    }

    /// A path whose two endpoints coincide is invisible; expand it into a
    /// four-corner detour so the edge can still be seen and picked.
    fn make_edge_visible(&mut self, detour_width: i64, detour_height: i64) {
        if let Shape::Path { points, .. } = &mut self.shape {
            if points.len() == 2 && points[0] == points[1] {
                let anchor = points[0];
                let mut first = anchor;
                first.x += detour_width;
                let mut second = anchor;
                second.x += detour_width;
                second.y += detour_height;
                let mut third = anchor;
                third.y += detour_height;
                *points = vec![anchor, first, second, third, anchor];
            }
        }
    }

    /// Exchange endpoint views and reverse the path. Used when a serialized
    /// relation view points the wrong way.
    pub fn invert(&mut self) {
        std::mem::swap(&mut self.source, &mut self.target);
        if let Shape::Path { points, .. } = &mut self.shape {
            points.reverse();
        }
    }

    // ── Synthesized views ───────────────────────────────────────────

    /// A rectangle view for an entity. Not yet attached to any diagram list.
    pub fn for_entity(
        id: ElementId,
        element_id: &ElementId,
        diagram: ElementId,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    ) -> Self {
        Self {
            shape: Shape::Rectangle {
                id: format!("{id}_shape"),
                x,
                y,
                width,
                height,
            },
            element: ViewRef::new(element_id.clone(), "Class"),
            view_type: CLASS_VIEW.into(),
            source: None,
            target: None,
            id,
            diagram,
        }
    }

    /// A polyline view for a relation or generalization. For generalization
    /// views the endpoint references are swapped, matching the convention of
    /// the modeling tools this format comes from.
    pub fn for_edge(
        id: ElementId,
        is_relation: bool,
        element_id: &ElementId,
        source_view: &ElementId,
        target_view: &ElementId,
        diagram: ElementId,
        points: Vec<Point>,
    ) -> Self {
        let (source_ref, target_ref) = if is_relation {
            (source_view.clone(), target_view.clone())
        } else {
            (target_view.clone(), source_view.clone())
        };
        Self {
            shape: Shape::Path {
                id: format!("{id}_path"),
                points,
            },
            element: ViewRef::new(
                element_id.clone(),
                if is_relation { "Relation" } else { "Generalization" },
            ),
            view_type: if is_relation {
                RELATION_VIEW.into()
            } else {
                GENERALIZATION_VIEW.into()
            },
            source: Some(ViewRef::new(source_ref, CLASS_VIEW)),
            target: Some(ViewRef::new(target_ref, CLASS_VIEW)),
            id,
            diagram,
        }
    }

    /// A text label view for a generalization set.
    pub fn for_set(id: ElementId, element_id: &ElementId, diagram: ElementId, x: i64, y: i64) -> Self {
        Self {
            shape: Shape::Text {
                id: format!("{id}_shape"),
                x,
                y,
                width: 50,
                height: 15,
                value: Some(String::new()),
            },
            element: ViewRef::new(element_id.clone(), "GeneralizationSet"),
            view_type: GEN_SET_VIEW.into(),
            source: None,
            target: None,
            id,
            diagram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rectangle_center_uses_integer_midpoint() {
        let view = View::for_entity(
            ElementId::new("v1"),
            &ElementId::new("e1"),
            ElementId::new("d1"),
            10,
            20,
            100,
            50,
        );
        assert_eq!(view.center(), Point::new(60, 45));
    }

    #[test]
    fn degenerate_path_expands_into_detour() {
        let mut view = View::for_edge(
            ElementId::new("v2"),
            true,
            &ElementId::new("r1"),
            &ElementId::new("sv"),
            &ElementId::new("tv"),
            ElementId::new("d1"),
            vec![Point::new(5, 5), Point::new(9, 9)],
        );
        view.update_target_point(Point::new(5, 5), 100, 50);
        let Shape::Path { points, .. } = &view.shape else {
            panic!("edge view must be a path");
        };
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], Point::new(5, 5));
        assert_eq!(points[2], Point::new(105, 55));
    }

    #[test]
    fn generalization_views_swap_endpoint_references() {
        let view = View::for_edge(
            ElementId::new("v3"),
            false,
            &ElementId::new("g1"),
            &ElementId::new("sv"),
            &ElementId::new("tv"),
            ElementId::new("d1"),
            vec![Point::new(0, 0), Point::new(1, 1)],
        );
        assert_eq!(view.source.as_ref().unwrap().id.as_str(), "tv");
        assert_eq!(view.target.as_ref().unwrap().id.as_str(), "sv");
    }

    #[test]
    fn parses_serialized_class_view() {
        let map = json!({
            "id": "v4",
            "type": "ClassView",
            "modelElement": {"id": "e1", "type": "Class"},
            "shape": {"id": "v4_shape", "type": "Rectangle", "x": 1, "y": 2, "width": 80, "height": 40},
        });
        let view = View::from_map(map.as_object().unwrap(), ElementId::new("d1")).unwrap();
        assert_eq!(view.x(0), 1);
        assert_eq!(view.y(0), 2);
        assert!(!view.is_edge_view());
    }

    #[test]
    fn invert_reverses_path_and_refs() {
        let mut view = View::for_edge(
            ElementId::new("v5"),
            true,
            &ElementId::new("r1"),
            &ElementId::new("sv"),
            &ElementId::new("tv"),
            ElementId::new("d1"),
            vec![Point::new(0, 0), Point::new(9, 9)],
        );
        view.invert();
        assert_eq!(view.source.as_ref().unwrap().id.as_str(), "tv");
        let Shape::Path { points, .. } = &view.shape else {
            panic!()
        };
        assert_eq!(points[0], Point::new(9, 9));
    }
}
