//! The parsed expression tree (§3): a tagged-union node type with one
//! variant per syntactic form, each carrying its declared output type and
//! precomputed constancy flags.

use std::collections::HashMap;

use crate::curve::{self, Interpolation, MixInputs};
use crate::error::EvalError;
use crate::feature::EvaluationContext;
use crate::operators::{self, Operator};
use crate::value::{Type, Value};

/// A branch label in a `match` expression. Label sets are homogeneous
/// (§3 invariant ii): either every label across the whole `match` is an
/// `Int` or every one is a `Str`, never mixed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchLabel {
    Int(i64),
    Str(String),
}

/// The parsed expression tree. Immutable after construction; evaluation
/// never mutates a node (§5).
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(LiteralExpr),
    Compound(CompoundExpr),
    Coalesce(CoalesceExpr),
    Case(CaseExpr),
    Match(MatchExpr),
    Curve(CurveExpr),
    ArrayAssertion(ArrayAssertionExpr),
}

#[derive(Debug, Clone)]
pub struct LiteralExpr {
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct CompoundExpr {
    pub operator: Operator,
    pub ty: Type,
    pub args: Vec<Expr>,
    feature_constant: bool,
    zoom_constant: bool,
}

#[derive(Debug, Clone)]
pub struct CoalesceExpr {
    pub ty: Type,
    pub children: Vec<Expr>,
    feature_constant: bool,
    zoom_constant: bool,
}

#[derive(Debug, Clone)]
pub struct CaseExpr {
    pub ty: Type,
    pub branches: Vec<(Expr, Expr)>,
    pub otherwise: Box<Expr>,
    feature_constant: bool,
    zoom_constant: bool,
}

#[derive(Debug, Clone)]
pub struct MatchExpr {
    pub ty: Type,
    pub input: Box<Expr>,
    /// Shared branch bodies, referenced by index from `lookup` — this is
    /// the "secondary owning vector" from DESIGN.md's grounding for §9's
    /// body-sharing note: several labels can point at the same body index
    /// without requiring `Rc`.
    pub bodies: Vec<Expr>,
    pub lookup: HashMap<MatchLabel, usize>,
    pub otherwise: Box<Expr>,
    feature_constant: bool,
    zoom_constant: bool,
}

#[derive(Debug, Clone)]
pub struct CurveExpr {
    pub ty: Type,
    pub input: Box<Expr>,
    pub interpolation: Interpolation,
    pub stops: Vec<(f64, Expr)>,
    feature_constant: bool,
    zoom_constant: bool,
}

#[derive(Debug, Clone)]
pub struct ArrayAssertionExpr {
    pub item_type: Type,
    pub length: Option<usize>,
    pub child: Box<Expr>,
}

impl Expr {
    pub fn literal(value: Value) -> Expr {
        Expr::Literal(LiteralExpr { value })
    }

    pub fn compound(operator: Operator, ty: Type, args: Vec<Expr>) -> Expr {
        let feature_constant =
            operator.is_feature_constant() && args.iter().all(Expr::is_feature_constant);
        let zoom_constant = operator.is_zoom_constant() && args.iter().all(Expr::is_zoom_constant);
        Expr::Compound(CompoundExpr {
            operator,
            ty,
            args,
            feature_constant,
            zoom_constant,
        })
    }

    pub fn coalesce(ty: Type, children: Vec<Expr>) -> Expr {
        let feature_constant = children.iter().all(Expr::is_feature_constant);
        let zoom_constant = children.iter().all(Expr::is_zoom_constant);
        Expr::Coalesce(CoalesceExpr {
            ty,
            children,
            feature_constant,
            zoom_constant,
        })
    }

    pub fn case(ty: Type, branches: Vec<(Expr, Expr)>, otherwise: Expr) -> Expr {
        let feature_constant = branches
            .iter()
            .all(|(t, b)| t.is_feature_constant() && b.is_feature_constant())
            && otherwise.is_feature_constant();
        let zoom_constant = branches
            .iter()
            .all(|(t, b)| t.is_zoom_constant() && b.is_zoom_constant())
            && otherwise.is_zoom_constant();
        Expr::Case(CaseExpr {
            ty,
            branches,
            otherwise: Box::new(otherwise),
            feature_constant,
            zoom_constant,
        })
    }

    pub fn match_expr(
        ty: Type,
        input: Expr,
        bodies: Vec<Expr>,
        lookup: HashMap<MatchLabel, usize>,
        otherwise: Expr,
    ) -> Expr {
        let feature_constant = input.is_feature_constant()
            && bodies.iter().all(Expr::is_feature_constant)
            && otherwise.is_feature_constant();
        let zoom_constant = input.is_zoom_constant()
            && bodies.iter().all(Expr::is_zoom_constant)
            && otherwise.is_zoom_constant();
        Expr::Match(MatchExpr {
            ty,
            input: Box::new(input),
            bodies,
            lookup,
            otherwise: Box::new(otherwise),
            feature_constant,
            zoom_constant,
        })
    }

    pub fn curve(
        ty: Type,
        input: Expr,
        interpolation: Interpolation,
        stops: Vec<(f64, Expr)>,
    ) -> Expr {
        let feature_constant =
            input.is_feature_constant() && stops.iter().all(|(_, e)| e.is_feature_constant());
        // "zoom-constant iff input is" (§3) — stop bodies don't affect it.
        let zoom_constant = input.is_zoom_constant();
        Expr::Curve(CurveExpr {
            ty,
            input: Box::new(input),
            interpolation,
            stops,
            feature_constant,
            zoom_constant,
        })
    }

    pub fn array_assertion(item_type: Type, length: Option<usize>, child: Expr) -> Expr {
        Expr::ArrayAssertion(ArrayAssertionExpr {
            item_type,
            length,
            child: Box::new(child),
        })
    }

    pub fn type_of(&self) -> Type {
        match self {
            Expr::Literal(e) => e.value.type_of(),
            Expr::Compound(e) => e.ty.clone(),
            Expr::Coalesce(e) => e.ty.clone(),
            Expr::Case(e) => e.ty.clone(),
            Expr::Match(e) => e.ty.clone(),
            Expr::Curve(e) => e.ty.clone(),
            Expr::ArrayAssertion(e) => Type::Array(Box::new(e.item_type.clone()), e.length),
        }
    }

    pub fn is_feature_constant(&self) -> bool {
        match self {
            Expr::Literal(_) => true,
            Expr::Compound(e) => e.feature_constant,
            Expr::Coalesce(e) => e.feature_constant,
            Expr::Case(e) => e.feature_constant,
            Expr::Match(e) => e.feature_constant,
            Expr::Curve(e) => e.feature_constant,
            Expr::ArrayAssertion(e) => e.child.is_feature_constant(),
        }
    }

    pub fn is_zoom_constant(&self) -> bool {
        match self {
            Expr::Literal(_) => true,
            Expr::Compound(e) => e.zoom_constant,
            Expr::Coalesce(e) => e.zoom_constant,
            Expr::Case(e) => e.zoom_constant,
            Expr::Match(e) => e.zoom_constant,
            Expr::Curve(e) => e.zoom_constant,
            Expr::ArrayAssertion(e) => e.child.is_zoom_constant(),
        }
    }

    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(e) => Ok(e.value.clone()),
            Expr::Compound(e) => {
                let mut args = Vec::with_capacity(e.args.len());
                for arg in &e.args {
                    args.push(arg.evaluate(ctx)?);
                }
                operators::eval(e.operator, &args, ctx)
            }
            Expr::Coalesce(e) => eval_coalesce(e, ctx),
            Expr::Case(e) => eval_case(e, ctx),
            Expr::Match(e) => eval_match(e, ctx),
            Expr::Curve(e) => eval_curve(e, ctx),
            Expr::ArrayAssertion(e) => eval_array_assertion(e, ctx),
        }
    }
}

fn eval_coalesce(e: &CoalesceExpr, ctx: &EvaluationContext<'_>) -> Result<Value, EvalError> {
    let last = e.children.len() - 1;
    for (i, child) in e.children.iter().enumerate() {
        match child.evaluate(ctx) {
            Ok(value) => {
                if i == last || !value.is_null() {
                    return Ok(value);
                }
            }
            Err(err) => {
                if i == last {
                    return Err(err);
                }
            }
        }
    }
    Ok(Value::Null)
}

fn eval_case(e: &CaseExpr, ctx: &EvaluationContext<'_>) -> Result<Value, EvalError> {
    for (test, body) in &e.branches {
        if test.evaluate(ctx)?.as_bool().unwrap_or(false) {
            return body.evaluate(ctx);
        }
    }
    e.otherwise.evaluate(ctx)
}

fn eval_match(e: &MatchExpr, ctx: &EvaluationContext<'_>) -> Result<Value, EvalError> {
    let input = e.input.evaluate(ctx)?;
    let label = match &input {
        Value::Number(_) => input.as_safe_integer().map(MatchLabel::Int),
        Value::String(s) => Some(MatchLabel::Str(s.clone())),
        _ => None,
    };
    match label.and_then(|l| e.lookup.get(&l)) {
        Some(&index) => e.bodies[index].evaluate(ctx),
        None => e.otherwise.evaluate(ctx),
    }
}

fn eval_curve(e: &CurveExpr, ctx: &EvaluationContext<'_>) -> Result<Value, EvalError> {
    let input = e.input.evaluate(ctx)?;
    let x = input.as_number().ok_or_else(|| EvalError::TypeMismatch {
        expected: Type::Number,
        found: input.type_of(),
    })?;

    let stops = &e.stops;
    if x <= stops[0].0 {
        return stops[0].1.evaluate(ctx);
    }
    let last = stops.len() - 1;
    if x >= stops[last].0 {
        return stops[last].1.evaluate(ctx);
    }

    // Binary search for the bracketing pair: the greatest index whose key
    // is <= x (partition_point finds the first index where key > x).
    let hi_index = stops.partition_point(|(key, _)| *key <= x);
    let (x0, lo_expr) = &stops[hi_index - 1];
    let (x1, hi_expr) = &stops[hi_index];

    if matches!(e.interpolation, Interpolation::Step) {
        return lo_expr.evaluate(ctx);
    }

    let lo = lo_expr.evaluate(ctx)?;
    let hi = hi_expr.evaluate(ctx)?;
    let t = e.interpolation.interp(x, *x0, *x1);
    Ok(curve::mix(&e.ty, MixInputs { lo: &lo, hi: &hi, t }))
}

fn eval_array_assertion(
    e: &ArrayAssertionExpr,
    ctx: &EvaluationContext<'_>,
) -> Result<Value, EvalError> {
    let value = e.child.evaluate(ctx)?;
    let items = value.as_array().ok_or_else(|| EvalError::TypeMismatch {
        expected: Type::Array(Box::new(e.item_type.clone()), e.length),
        found: value.type_of(),
    })?;
    if let Some(n) = e.length {
        if items.len() != n {
            return Err(EvalError::TypeMismatch {
                expected: Type::Array(Box::new(e.item_type.clone()), e.length),
                found: value.type_of(),
            });
        }
    }
    if e.item_type != Type::Value {
        for item in items {
            if item.type_of() != e.item_type {
                return Err(EvalError::TypeMismatch {
                    expected: e.item_type.clone(),
                    found: item.type_of(),
                });
            }
        }
    }
    Ok(value)
}
