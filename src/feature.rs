//! The evaluation context: current zoom and the feature being evaluated.
//!
//! Accessors are read-only and must not outlive a single `evaluate` call —
//! the evaluator copies out whatever it needs (a `Value`, a `&str`) rather
//! than holding on to borrows across node boundaries.

use std::collections::BTreeMap;

use crate::value::Value;

/// A feature's geometry kind, as exposed to the `geometry-type` operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    Unknown,
}

impl GeometryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::Unknown => "Unknown",
        }
    }
}

/// A feature's attribute map, geometry kind, and optional id.
#[derive(Debug, Clone, Default)]
pub struct Feature {
    pub properties: BTreeMap<String, Value>,
    pub geometry_type: Option<GeometryType>,
    pub id: Option<Value>,
}

impl Feature {
    pub fn new() -> Feature {
        Feature::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Feature {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_geometry_type(mut self, geometry_type: GeometryType) -> Feature {
        self.geometry_type = Some(geometry_type);
        self
    }

    pub fn with_id(mut self, id: Value) -> Feature {
        self.id = Some(id);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// The (zoom, feature) pair the evaluator walks a tree against.
///
/// `feature` is optional: a camera function is evaluated without one (its
/// tree never calls `get`/`properties`/`geometry-type`/`id`, so the absence
/// never surfaces as a `MissingProperty` error in practice, but the type
/// keeps the contract explicit rather than fabricating an empty feature).
#[derive(Debug, Clone)]
pub struct EvaluationContext<'a> {
    pub zoom: Option<f64>,
    pub feature: Option<&'a Feature>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(zoom: f64, feature: &'a Feature) -> EvaluationContext<'a> {
        EvaluationContext {
            zoom: Some(zoom),
            feature: Some(feature),
        }
    }

    pub fn zoom_only(zoom: f64) -> EvaluationContext<'static> {
        EvaluationContext {
            zoom: Some(zoom),
            feature: None,
        }
    }

    pub fn feature_only(feature: &'a Feature) -> EvaluationContext<'a> {
        EvaluationContext {
            zoom: None,
            feature: Some(feature),
        }
    }

    /// A context with neither zoom nor feature, used to extract a constant
    /// value from a tree that is both feature- and zoom-constant (§4.7):
    /// such a tree never reaches into either accessor.
    pub fn none() -> EvaluationContext<'static> {
        EvaluationContext {
            zoom: None,
            feature: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_builder_reads_back() {
        let f = Feature::new()
            .with_property("p", Value::Number(1.0))
            .with_geometry_type(GeometryType::Point);
        assert_eq!(f.get("p"), Some(&Value::Number(1.0)));
        assert_eq!(f.get("missing"), None);
        assert_eq!(f.geometry_type, Some(GeometryType::Point));
    }
}
