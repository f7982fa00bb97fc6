//! The built-in operator table (§4.4, §10.2): one closed enum, matched for
//! arity/parameter types at parse time and for semantics at evaluation
//! time. Closed by construction (no open string-keyed registry) since the
//! operator set is fixed at compile time, mirroring how the teacher
//! compiler's builtin-function recognizer is a `matches!` over a known
//! name set rather than a plugin table.

use crate::error::EvalError;
use crate::feature::EvaluationContext;
use crate::value::{Type, Value};

/// A built-in, non-control-flow operator. Control-flow forms (`coalesce`,
/// `case`, `match`, `step`/`interpolate`) and the `array` assertion are
/// their own [`crate::expr::Expr`] variants, not `Operator`s.
///
/// `EnumIter` lets callers (and this module's own tests) walk every operator
/// without keeping a parallel list in sync by hand — the same role
/// `strum::IntoEnumIterator` plays over the teacher compiler's `OpCode`/
/// `IntrinsicId` enums when it generates its language-reference listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter)]
pub enum Operator {
    Get,
    Properties,
    GeometryType,
    Id,
    Zoom,
    Has,
    At,
    Length,
    In,
    IndexOf,
    Slice,
    Typeof,
    ToString,
    ToNumber,
    ToBoolean,
    ToColor,
    Not,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    All,
    Any,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Concat,
    Upcase,
    Downcase,
    NumberAssert,
    StringAssert,
    BooleanAssert,
}

/// How many arguments an operator accepts. Used both to validate arity at
/// parse time and to render "Expected N arguments" messages.
#[derive(Debug, Clone, Copy)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match self {
            Arity::Exact(k) => n == *k,
            Arity::Range(lo, hi) => n >= *lo && n <= *hi,
            Arity::AtLeast(k) => n >= *k,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Arity::Exact(k) => k.to_string(),
            Arity::Range(lo, hi) => format!("{lo}-{hi}"),
            Arity::AtLeast(k) => format!("at least {k}"),
        }
    }
}

impl Operator {
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Get => "get",
            Operator::Properties => "properties",
            Operator::GeometryType => "geometry-type",
            Operator::Id => "id",
            Operator::Zoom => "zoom",
            Operator::Has => "has",
            Operator::At => "at",
            Operator::Length => "length",
            Operator::In => "in",
            Operator::IndexOf => "index-of",
            Operator::Slice => "slice",
            Operator::Typeof => "typeof",
            Operator::ToString => "to-string",
            Operator::ToNumber => "to-number",
            Operator::ToBoolean => "to-boolean",
            Operator::ToColor => "to-color",
            Operator::Not => "!",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::All => "all",
            Operator::Any => "any",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rem => "%",
            Operator::Pow => "^",
            Operator::Concat => "concat",
            Operator::Upcase => "upcase",
            Operator::Downcase => "downcase",
            Operator::NumberAssert => "number",
            Operator::StringAssert => "string",
            Operator::BooleanAssert => "boolean",
        }
    }

    pub fn from_name(name: &str) -> Option<Operator> {
        Some(match name {
            "get" => Operator::Get,
            "properties" => Operator::Properties,
            "geometry-type" => Operator::GeometryType,
            "id" => Operator::Id,
            "zoom" => Operator::Zoom,
            "has" => Operator::Has,
            "at" => Operator::At,
            "length" => Operator::Length,
            "in" => Operator::In,
            "index-of" => Operator::IndexOf,
            "slice" => Operator::Slice,
            "typeof" => Operator::Typeof,
            "to-string" => Operator::ToString,
            "to-number" => Operator::ToNumber,
            "to-boolean" => Operator::ToBoolean,
            "to-color" => Operator::ToColor,
            "!" => Operator::Not,
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "all" => Operator::All,
            "any" => Operator::Any,
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            "%" => Operator::Rem,
            "^" => Operator::Pow,
            "concat" => Operator::Concat,
            "upcase" => Operator::Upcase,
            "downcase" => Operator::Downcase,
            "number" => Operator::NumberAssert,
            "string" => Operator::StringAssert,
            "boolean" => Operator::BooleanAssert,
            _ => return None,
        })
    }

    pub fn arity(&self) -> Arity {
        use Operator::*;
        match self {
            Properties | GeometryType | Id | Zoom => Arity::Exact(0),
            Get | Has | Length | Typeof | ToString | ToNumber | ToBoolean | ToColor | Not
            | Upcase | Downcase | NumberAssert | StringAssert | BooleanAssert => Arity::Exact(1),
            At | In | IndexOf | Eq | Ne | Lt | Lte | Gt | Gte | Div | Rem | Pow => Arity::Exact(2),
            Slice => Arity::Range(2, 3),
            All | Any | Concat => Arity::AtLeast(1),
            Add | Mul => Arity::AtLeast(1),
            Sub => Arity::Range(1, 2),
        }
    }

    /// Expected type for argument `i` (0-indexed), used to parse each child
    /// with the right expectation (§4.4: "Parse each argument with expected
    /// type equal to the declared parameter type").
    pub fn param_type(&self, index: usize) -> Type {
        use Operator::*;
        match self {
            Get | Has => Type::String,
            At => {
                if index == 0 {
                    Type::Number
                } else {
                    Type::array(Type::Value)
                }
            }
            Length | Typeof | ToString | ToNumber | ToBoolean | ToColor | NumberAssert
            | StringAssert | BooleanAssert => Type::Value,
            In => Type::Value,
            IndexOf => Type::Value,
            Slice => {
                if index == 0 {
                    Type::Value
                } else {
                    Type::Number
                }
            }
            Not | All | Any => Type::Boolean,
            Eq | Ne => Type::Value,
            Lt | Lte | Gt | Gte => Type::Value,
            Add | Sub | Mul | Div | Rem | Pow => Type::Number,
            Concat => Type::Value,
            Upcase | Downcase => Type::String,
            Properties | GeometryType | Id | Zoom => Type::Value,
        }
    }

    pub fn result_type(&self) -> Type {
        use Operator::*;
        match self {
            Get => Type::Value,
            Properties => Type::Object,
            GeometryType => Type::String,
            Id => Type::Value,
            Zoom => Type::Number,
            Has | In | Not | Eq | Ne | Lt | Lte | Gt | Gte | All | Any => Type::Boolean,
            At | Slice | Concat => Type::Value,
            Length | IndexOf | Add | Sub | Mul | Div | Rem | Pow | ToNumber => Type::Number,
            Typeof | ToString | Upcase | Downcase => Type::String,
            ToBoolean => Type::Boolean,
            ToColor => Type::Color,
            NumberAssert => Type::Number,
            StringAssert => Type::String,
            BooleanAssert => Type::Boolean,
        }
    }

    /// `false` for the four leaf operators the spec singles out in §3 as
    /// reading per-feature state.
    pub fn is_feature_constant(&self) -> bool {
        !matches!(
            self,
            Operator::Get | Operator::Properties | Operator::GeometryType | Operator::Id
        )
    }

    /// `false` only for `zoom`.
    pub fn is_zoom_constant(&self) -> bool {
        !matches!(self, Operator::Zoom)
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn as_comparable_number(v: &Value) -> Option<f64> {
    v.as_number()
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Evaluate an already-resolved argument list. `Operator::Get`,
/// `Properties`, `GeometryType`, `Id`, and `Zoom` ignore `args` (they have
/// zero children, or in `Get`'s case the single child is the property name,
/// pre-evaluated into `args[0]`) and instead read `ctx`.
pub fn eval(op: Operator, args: &[Value], ctx: &EvaluationContext<'_>) -> Result<Value, EvalError> {
    use Operator::*;
    match op {
        Get => {
            let name = args[0].as_str().ok_or_else(|| EvalError::TypeMismatch {
                expected: Type::String,
                found: args[0].type_of(),
            })?;
            let feature = ctx.feature.ok_or_else(|| EvalError::MissingProperty {
                name: name.to_string(),
            })?;
            Ok(feature.get(name).cloned().unwrap_or(Value::Null))
        }
        Properties => {
            let feature = ctx.feature.ok_or_else(|| EvalError::MissingProperty {
                name: "<properties>".to_string(),
            })?;
            Ok(Value::Object(feature.properties.clone()))
        }
        GeometryType => {
            let feature = ctx.feature.ok_or_else(|| EvalError::MissingProperty {
                name: "<geometry-type>".to_string(),
            })?;
            let kind = feature
                .geometry_type
                .map(|g| g.as_str())
                .unwrap_or("Unknown");
            Ok(Value::String(kind.to_string()))
        }
        Id => {
            let feature = ctx.feature.ok_or_else(|| EvalError::MissingProperty {
                name: "<id>".to_string(),
            })?;
            Ok(feature.id.clone().unwrap_or(Value::Null))
        }
        Zoom => ctx.zoom.map(Value::Number).ok_or_else(|| {
            EvalError::Other("zoom() evaluated outside of a zoom-bearing context".to_string())
        }),
        Has => {
            let name = args[0].as_str().ok_or_else(|| EvalError::TypeMismatch {
                expected: Type::String,
                found: args[0].type_of(),
            })?;
            let feature = ctx.feature.ok_or_else(|| EvalError::MissingProperty {
                name: name.to_string(),
            })?;
            Ok(Value::Boolean(feature.get(name).is_some()))
        }
        At => {
            let index = args[0].as_safe_integer().ok_or_else(|| EvalError::TypeMismatch {
                expected: Type::Number,
                found: args[0].type_of(),
            })?;
            let items = args[1].as_array().ok_or_else(|| EvalError::TypeMismatch {
                expected: Type::array(Type::Value),
                found: args[1].type_of(),
            })?;
            if index < 0 || index as usize >= items.len() {
                return Err(EvalError::IndexOutOfRange {
                    index,
                    len: items.len(),
                });
            }
            Ok(items[index as usize].clone())
        }
        Length => match &args[0] {
            Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
            Value::Array(items) => Ok(Value::Number(items.len() as f64)),
            other => Err(EvalError::TypeMismatch {
                expected: Type::array(Type::Value),
                found: other.type_of(),
            }),
        },
        In => {
            let found = match &args[1] {
                Value::Array(items) => items.iter().any(|item| item == &args[0]),
                Value::String(haystack) => match args[0].as_str() {
                    Some(needle) => haystack.contains(needle),
                    None => false,
                },
                _ => false,
            };
            Ok(Value::Boolean(found))
        }
        IndexOf => {
            let index = match &args[1] {
                Value::Array(items) => items
                    .iter()
                    .position(|item| item == &args[0])
                    .map(|i| i as f64)
                    .unwrap_or(-1.0),
                Value::String(haystack) => match args[0].as_str() {
                    Some(needle) => haystack.find(needle).map(|i| i as f64).unwrap_or(-1.0),
                    None => -1.0,
                },
                _ => -1.0,
            };
            Ok(Value::Number(index))
        }
        Slice => {
            let start = args[1].as_safe_integer().unwrap_or(0).max(0) as usize;
            match &args[0] {
                Value::Array(items) => {
                    let end = args
                        .get(2)
                        .and_then(Value::as_safe_integer)
                        .map(|n| (n.max(0) as usize).min(items.len()))
                        .unwrap_or(items.len());
                    let start = start.min(end);
                    Ok(Value::Array(items[start..end].to_vec()))
                }
                Value::String(s) => {
                    let chars: Vec<char> = s.chars().collect();
                    let end = args
                        .get(2)
                        .and_then(Value::as_safe_integer)
                        .map(|n| (n.max(0) as usize).min(chars.len()))
                        .unwrap_or(chars.len());
                    let start = start.min(end);
                    Ok(Value::String(chars[start..end].iter().collect()))
                }
                other => Err(EvalError::TypeMismatch {
                    expected: Type::array(Type::Value),
                    found: other.type_of(),
                }),
            }
        }
        Typeof => Ok(Value::String(args[0].type_of().to_string())),
        ToString => Ok(Value::String(args[0].to_string())),
        ToNumber => match &args[0] {
            Value::Number(n) => Ok(Value::Number(*n)),
            Value::Boolean(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|_| EvalError::ConversionFailed {
                    target: "number".to_string(),
                }),
            other => Err(EvalError::ConversionFailed {
                target: format!("number (from {})", other.type_of()),
            }),
        },
        ToBoolean => Ok(Value::Boolean(truthy(&args[0]))),
        ToColor => match &args[0] {
            Value::Color(c) => Ok(Value::Color(*c)),
            Value::String(s) => crate::color::Color::parse(s).map(Value::Color).ok_or_else(|| {
                EvalError::ConversionFailed {
                    target: format!("color (from \"{s}\")"),
                }
            }),
            other => Err(EvalError::ConversionFailed {
                target: format!("color (from {})", other.type_of()),
            }),
        },
        Not => Ok(Value::Boolean(!truthy(&args[0]))),
        Eq => Ok(Value::Boolean(args[0] == args[1])),
        Ne => Ok(Value::Boolean(args[0] != args[1])),
        Lt | Lte | Gt | Gte => {
            let ord = compare(&args[0], &args[1]).ok_or_else(|| EvalError::TypeMismatch {
                expected: args[0].type_of(),
                found: args[1].type_of(),
            })?;
            use std::cmp::Ordering::*;
            let result = match (op, ord) {
                (Lt, Less) | (Lte, Less) | (Lte, Equal) => true,
                (Gt, Greater) | (Gte, Greater) | (Gte, Equal) => true,
                _ => false,
            };
            Ok(Value::Boolean(result))
        }
        All => Ok(Value::Boolean(args.iter().all(truthy))),
        Any => Ok(Value::Boolean(args.iter().any(truthy))),
        Add => Ok(Value::Number(args.iter().filter_map(as_comparable_number).sum())),
        Sub => {
            if args.len() == 1 {
                Ok(Value::Number(-args[0].as_number().unwrap_or(0.0)))
            } else {
                Ok(Value::Number(
                    args[0].as_number().unwrap_or(0.0) - args[1].as_number().unwrap_or(0.0),
                ))
            }
        }
        Mul => Ok(Value::Number(
            args.iter().filter_map(as_comparable_number).product(),
        )),
        Div => {
            let b = args[1].as_number().unwrap_or(0.0);
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Number(args[0].as_number().unwrap_or(0.0) / b))
        }
        Rem => {
            let b = args[1].as_number().unwrap_or(0.0);
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Number(args[0].as_number().unwrap_or(0.0) % b))
        }
        Pow => Ok(Value::Number(
            args[0].as_number().unwrap_or(0.0).powf(args[1].as_number().unwrap_or(0.0)),
        )),
        Concat => Ok(Value::String(args.iter().map(|v| v.to_string()).collect())),
        Upcase => Ok(Value::String(args[0].as_str().unwrap_or_default().to_uppercase())),
        Downcase => Ok(Value::String(args[0].as_str().unwrap_or_default().to_lowercase())),
        NumberAssert => match &args[0] {
            Value::Number(n) => Ok(Value::Number(*n)),
            other => Err(EvalError::TypeMismatch {
                expected: Type::Number,
                found: other.type_of(),
            }),
        },
        StringAssert => match &args[0] {
            Value::String(s) => Ok(Value::String(s.clone())),
            other => Err(EvalError::TypeMismatch {
                expected: Type::String,
                found: other.type_of(),
            }),
        },
        BooleanAssert => match &args[0] {
            Value::Boolean(b) => Ok(Value::Boolean(*b)),
            other => Err(EvalError::TypeMismatch {
                expected: Type::Boolean,
                found: other.type_of(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use strum::IntoEnumIterator;

    #[test]
    fn every_operator_name_roundtrips_through_from_name() {
        for op in Operator::iter() {
            assert_eq!(Operator::from_name(op.name()), Some(op), "{}", op.name());
        }
    }

    #[test]
    fn every_operator_declares_a_param_type_for_each_accepted_arity() {
        // Exercises param_type(i) across the full arity range so a
        // newly-added operator can't silently skip it.
        for op in Operator::iter() {
            let max_checked = match op.arity() {
                Arity::Exact(k) => k,
                Arity::Range(_, hi) => hi,
                Arity::AtLeast(k) => k.max(1),
            };
            for i in 0..max_checked {
                let _ = op.param_type(i);
            }
        }
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(Operator::from_name("not-an-operator"), None);
    }

    #[test]
    fn get_reads_feature_property() {
        let feature = Feature::new().with_property("p", Value::Number(3.0));
        let ctx = EvaluationContext::feature_only(&feature);
        let result = eval(Operator::Get, &[Value::String("p".to_string())], &ctx).unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn get_missing_property_is_null() {
        let feature = Feature::new();
        let ctx = EvaluationContext::feature_only(&feature);
        let result = eval(Operator::Get, &[Value::String("missing".to_string())], &ctx).unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn division_by_zero_errors() {
        let ctx = EvaluationContext::none();
        let err = eval(Operator::Div, &[Value::Number(1.0), Value::Number(0.0)], &ctx).unwrap_err();
        assert_eq!(err, EvalError::DivisionByZero);
    }

    #[test]
    fn at_out_of_range_errors() {
        let ctx = EvaluationContext::none();
        let arr = Value::Array(vec![Value::Number(1.0)]);
        let err = eval(Operator::At, &[Value::Number(5.0), arr], &ctx).unwrap_err();
        assert!(matches!(err, EvalError::IndexOutOfRange { .. }));
    }

    #[test]
    fn arity_ranges() {
        assert!(Operator::Slice.arity().accepts(2));
        assert!(Operator::Slice.arity().accepts(3));
        assert!(!Operator::Slice.arity().accepts(1));
        assert!(Operator::All.arity().accepts(1));
        assert!(Operator::All.arity().accepts(10));
    }
}
