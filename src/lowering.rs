//! Legacy stop-based function → expression tree lowering (§4.6).
//!
//! The style subsystem (out of scope, see §1) used to describe
//! zoom/property-dependent properties with a "stops" record instead of an
//! expression. This module rebuilds the same four stop kinds as trees made
//! of the very same nodes the parser itself produces, so a lowered
//! function is evaluated, classified, and depth-limited identically to a
//! hand-written expression.

use std::collections::HashMap;

use crate::curve::Interpolation;
use crate::expr::{Expr, MatchLabel};
use crate::operators::Operator;
use crate::value::{Type, Value};

/// A label in [`CategoricalStops`]. Mirrors the three scalar kinds the
/// original stops format allows as a categorical key.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoricalKey {
    Boolean(bool),
    Integer(i64),
    String(String),
}

#[derive(Debug, Clone)]
pub struct ExponentialStops {
    pub property: Option<String>,
    pub base: f64,
    pub stops: Vec<(f64, Value)>,
    pub output_type: Type,
    pub default: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct IntervalStops {
    pub property: Option<String>,
    pub stops: Vec<(f64, Value)>,
    pub output_type: Type,
    pub default: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct CategoricalStops {
    pub property: String,
    pub stops: Vec<(CategoricalKey, Value)>,
    pub output_type: Type,
    pub default: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct IdentityStops {
    pub property: String,
    pub value_type: Type,
    pub default: Option<Value>,
}

/// One of the four legacy function kinds, each lowered independently.
#[derive(Debug, Clone)]
pub enum StopFunction {
    Exponential(ExponentialStops),
    Interval(IntervalStops),
    Categorical(CategoricalStops),
    Identity(IdentityStops),
}

pub fn lower(function: &StopFunction) -> Expr {
    match function {
        StopFunction::Exponential(s) => lower_exponential(s),
        StopFunction::Interval(s) => lower_interval(s),
        StopFunction::Categorical(s) => lower_categorical(s),
        StopFunction::Identity(s) => lower_identity(s),
    }
}

/// `get(<type>, property)`: a raw `get` wrapped in the narrowest available
/// type-assertion/coercion operator for `target`, or left bare for types
/// with none (`Value`, `Object`).
fn typed_get(property: &str, target: &Type) -> Expr {
    let raw = Expr::compound(
        Operator::Get,
        Type::Value,
        vec![Expr::literal(Value::String(property.to_string()))],
    );
    match target {
        Type::Number => Expr::compound(Operator::NumberAssert, Type::Number, vec![raw]),
        Type::String => Expr::compound(Operator::StringAssert, Type::String, vec![raw]),
        Type::Boolean => Expr::compound(Operator::BooleanAssert, Type::Boolean, vec![raw]),
        Type::Color => Expr::compound(Operator::ToColor, Type::Color, vec![raw]),
        Type::Array(item, len) => Expr::array_assertion((**item).clone(), *len, raw),
        _ => raw,
    }
}

fn with_default(expr: Expr, default: &Option<Value>) -> Expr {
    match default {
        Some(value) if !value.is_null() => {
            let ty = expr.type_of();
            Expr::coalesce(ty, vec![expr, Expr::literal(value.clone())])
        }
        _ => expr,
    }
}

fn numeric_input(property: &Option<String>) -> Expr {
    match property {
        Some(name) => typed_get(name, &Type::Number),
        None => Expr::compound(Operator::Zoom, Type::Number, vec![]),
    }
}

fn lower_exponential(s: &ExponentialStops) -> Expr {
    let input = numeric_input(&s.property);
    let stops = s
        .stops
        .iter()
        .map(|(k, v)| (*k, Expr::literal(v.clone())))
        .collect();
    let curve = Expr::curve(
        s.output_type.clone(),
        input,
        Interpolation::Exponential { base: s.base },
        stops,
    );
    with_default(curve, &s.default)
}

fn lower_interval(s: &IntervalStops) -> Expr {
    let input = numeric_input(&s.property);
    let stops = s
        .stops
        .iter()
        .map(|(k, v)| (*k, Expr::literal(v.clone())))
        .collect();
    let curve = Expr::curve(s.output_type.clone(), input, Interpolation::Step, stops);
    with_default(curve, &s.default)
}

fn lower_categorical(s: &CategoricalStops) -> Expr {
    let is_boolean = s
        .stops
        .first()
        .is_some_and(|(k, _)| matches!(k, CategoricalKey::Boolean(_)));

    let tree = if is_boolean {
        let test = typed_get(&s.property, &Type::Boolean);
        let true_body = s
            .stops
            .iter()
            .find(|(k, _)| matches!(k, CategoricalKey::Boolean(true)))
            .map(|(_, v)| Expr::literal(v.clone()))
            .unwrap_or_else(|| Expr::literal(Value::Null));
        let false_body = s
            .stops
            .iter()
            .find(|(k, _)| matches!(k, CategoricalKey::Boolean(false)))
            .map(|(_, v)| Expr::literal(v.clone()))
            .unwrap_or_else(|| Expr::literal(Value::Null));
        Expr::case(s.output_type.clone(), vec![(test, true_body)], false_body)
    } else {
        let is_integer = matches!(s.stops[0].0, CategoricalKey::Integer(_));
        let input_type = if is_integer { Type::Number } else { Type::String };
        let input = typed_get(&s.property, &input_type);
        let mut bodies = Vec::with_capacity(s.stops.len());
        let mut lookup: HashMap<MatchLabel, usize> = HashMap::new();
        for (key, value) in &s.stops {
            let label = match key {
                CategoricalKey::Integer(n) => MatchLabel::Int(*n),
                CategoricalKey::String(s) => MatchLabel::Str(s.clone()),
                CategoricalKey::Boolean(_) => unreachable!("homogeneous label set"),
            };
            let index = bodies.len();
            bodies.push(Expr::literal(value.clone()));
            lookup.insert(label, index);
        }
        Expr::match_expr(
            s.output_type.clone(),
            input,
            bodies,
            lookup,
            Expr::literal(Value::Null),
        )
    };
    with_default(tree, &s.default)
}

fn lower_identity(s: &IdentityStops) -> Expr {
    let tree = typed_get(&s.property, &s.value_type);
    with_default(tree, &s.default)
}
