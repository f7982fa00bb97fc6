//! The two error channels: accumulated parse errors and single-shot
//! evaluation errors.

use thiserror::Error;

use crate::context::Path;
use crate::value::Type;

/// A parse error paired with the path (child indices from the root) at
/// which it was recorded. `kind` carries the structured detail; `path` is
/// filled in by [`crate::context::ErrorSink::push`].
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind}")]
pub struct ParseError {
    pub path: Path,
    #[source]
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn with_path(self, path: Path) -> ParseError {
        ParseError { path, ..self }
    }
}

// Construction sugar: build a `ParseErrorKind` and let `ParsingContext::error`
// attach the path, so call sites can write `ctx.error(ParseError::UnknownOperator(..))`.
impl std::ops::Deref for ParseError {
    type Target = ParseErrorKind;
    fn deref(&self) -> &ParseErrorKind {
        &self.kind
    }
}

macro_rules! forward_kind_variants {
    ($($variant:ident $( ( $($field:ident : $ty:ty),* $(,)? ) )? ),* $(,)?) => {
        #[allow(non_snake_case)]
        impl ParseError {
            $(
                pub fn $variant($($($field: $ty),*)?) -> ParseError {
                    ParseError {
                        path: Vec::new(),
                        kind: ParseErrorKind::$variant $( { $($field),* } )?,
                    }
                }
            )*
        }
    };
}

forward_kind_variants!(
    UnknownOperator(operator: String),
    ExpectedExpression,
    ExpectedArguments(expected: String, found: usize),
    TypeMismatch(expected: Type, found: Type),
    DuplicateBranchLabel,
    NonIntegerBranchLabel,
    BranchLabelTooLarge,
    ExpectedAtLeastOneBranchLabel,
    NonAscendingStops,
    EmptyStops,
    InvalidColor(text: String),
    Malformed(detail: String),
);

/// Structured parse-error kinds. Representative set from the core spec
/// (§7.1), one variant per message shape.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseErrorKind {
    #[error("Unknown operator \"{operator}\"")]
    UnknownOperator { operator: String },

    #[error("Expected an expression")]
    ExpectedExpression,

    #[error("Expected {expected} arguments, but found {found}")]
    ExpectedArguments { expected: String, found: usize },

    #[error("Expected type {expected}, but found {found}")]
    TypeMismatch { expected: Type, found: Type },

    #[error("Branch labels must be unique")]
    DuplicateBranchLabel,

    #[error("Numeric branch labels must be integer values")]
    NonIntegerBranchLabel,

    #[error("Numeric values must be no larger than 9007199254740991")]
    BranchLabelTooLarge,

    #[error("Expected at least one branch label")]
    ExpectedAtLeastOneBranchLabel,

    #[error("Stop keys must be strictly ascending")]
    NonAscendingStops,

    #[error("Expected at least one stop")]
    EmptyStops,

    #[error("Could not parse \"{text}\" as a color")]
    InvalidColor { text: String },

    #[error("{detail}")]
    Malformed { detail: String },
}

/// Single-shot evaluation errors. The first error short-circuits the
/// containing evaluation; `coalesce` is the only place that catches one
/// from a non-final child and retries the next.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    #[error("Expected value to be of type {expected}, but found {found}")]
    TypeMismatch { expected: Type, found: Type },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Index {index} is out of range for array of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Property \"{name}\" not found in feature")]
    MissingProperty { name: String },

    #[error("Could not convert value to {target}")]
    ConversionFailed { target: String },

    #[error("{0}")]
    Other(String),
}
