//! Interpolation kinds and the stop table shared by `step`, `interpolate`,
//! and legacy-function lowering (§4.4, §4.5).

use crate::color::Color;
use crate::value::{Type, Value};

/// How a [`crate::expr::Expr::Curve`] turns a sorted stop table into a
/// continuous function of its input.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpolation {
    /// Use the lower bracketing stop's body verbatim.
    Step,
    /// `base == 1.0` is linear; `base > 1.0` interpolates exponentially
    /// (see [`Interpolation::interp`]).
    Exponential { base: f64 },
}

impl Interpolation {
    /// `t` such that mixing the bracketing stops' bodies by `t` reproduces
    /// the curve's value at `x`. `x0 <= x <= x1` and `x0 < x1` are assumed
    /// (callers only call this between two distinct bracketing stops).
    pub fn interp(&self, x: f64, x0: f64, x1: f64) -> f64 {
        match self {
            Interpolation::Step => 0.0,
            Interpolation::Exponential { base } => {
                let d = x1 - x0;
                if d.abs() < f64::EPSILON {
                    return 0.0;
                }
                let progress = x - x0;
                if (*base - 1.0).abs() < 1e-6 {
                    progress / d
                } else {
                    (base.powf(progress) - 1.0) / (base.powf(d) - 1.0)
                }
            }
        }
    }
}

/// One (key, evaluated-body-value) pair, already reduced to a `Value` by
/// the caller (the expression evaluator, once it has walked each stop's
/// body expression). Used only as the shape `mix` operates over — the
/// `Curve` node itself stores stop *expressions*, not evaluated values.
pub struct MixInputs<'a> {
    pub lo: &'a Value,
    pub hi: &'a Value,
    pub t: f64,
}

/// Linearly mix two evaluated stop bodies of the same declared output type.
/// `output_type` selects the per-type mixing rule (§4.5): linear for
/// `Number`, per-channel linear on premultiplied RGBA for `Color`,
/// element-wise linear for a fixed-length numeric array. Any other output
/// type (reached only via `step`, which never calls this) just returns
/// `lo` unchanged.
pub fn mix(output_type: &Type, inputs: MixInputs<'_>) -> Value {
    let MixInputs { lo, hi, t } = inputs;
    match output_type {
        Type::Number => match (lo.as_number(), hi.as_number()) {
            (Some(a), Some(b)) => Value::Number(a + (b - a) * t),
            _ => lo.clone(),
        },
        Type::Color => match (lo, hi) {
            (Value::Color(a), Value::Color(b)) => Value::Color(Color::mix(a, b, t)),
            _ => lo.clone(),
        },
        Type::Array(item, _) if **item == Type::Number => match (lo.as_array(), hi.as_array()) {
            (Some(a), Some(b)) if a.len() == b.len() => {
                let mixed = a
                    .iter()
                    .zip(b.iter())
                    .map(|(x, y)| match (x.as_number(), y.as_number()) {
                        (Some(x), Some(y)) => Value::Number(x + (y - x) * t),
                        _ => x.clone(),
                    })
                    .collect();
                Value::Array(mixed)
            }
            _ => lo.clone(),
        },
        _ => lo.clone(),
    }
}

/// Whether a declared output type can be interpolated by an exponential or
/// linear curve (§4.4: "Numeric-interpolable bodies are required for
/// exponential over Number, Color, and fixed-length numeric Array").
pub fn is_interpolable(output_type: &Type) -> bool {
    matches!(output_type, Type::Number | Type::Color)
        || matches!(output_type, Type::Array(item, Some(_)) if **item == Type::Number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_interp_is_proportional() {
        let k = Interpolation::Exponential { base: 1.0 };
        assert_eq!(k.interp(5.0, 0.0, 10.0), 0.5);
    }

    #[test]
    fn exponential_base_above_one_is_not_linear_at_midpoint() {
        let k = Interpolation::Exponential { base: 2.0 };
        let t = k.interp(5.0, 0.0, 10.0);
        assert!(t < 0.5);
    }

    #[test]
    fn number_mix() {
        let out = mix(
            &Type::Number,
            MixInputs {
                lo: &Value::Number(0.0),
                hi: &Value::Number(100.0),
                t: 0.5,
            },
        );
        assert_eq!(out, Value::Number(50.0));
    }

    #[test]
    fn interpolable_types() {
        assert!(is_interpolable(&Type::Number));
        assert!(is_interpolable(&Type::Color));
        assert!(is_interpolable(&Type::array_of_length(Type::Number, 2)));
        assert!(!is_interpolable(&Type::array(Type::Number)));
        assert!(!is_interpolable(&Type::String));
    }
}
