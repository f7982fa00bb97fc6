//! Parsing context: expected-type plumbing, path breadcrumbs, and the
//! shared error sink.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::ParseError;
use crate::value::Type;

/// Sequence of child indices from the root, used to locate where an error
/// occurred without threading a source filename through the core.
pub type Path = Vec<usize>;

/// The shared, append-only error sink for a single `parse_expression` call.
/// Wrapped in `Rc<RefCell<_>>` so that cloning a [`ParsingContext`] to
/// descend into a child never clones the accumulated errors themselves.
#[derive(Debug, Default)]
pub struct ErrorSink(RefCell<Vec<ParseError>>);

impl ErrorSink {
    pub fn new() -> Rc<ErrorSink> {
        Rc::new(ErrorSink(RefCell::new(Vec::new())))
    }

    pub fn push(&self, path: Path, error: ParseError) {
        self.0.borrow_mut().push(error.with_path(path));
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn into_vec(self) -> Vec<ParseError> {
        self.0.into_inner()
    }

    pub fn take(&self) -> Vec<ParseError> {
        std::mem::take(&mut self.0.borrow_mut())
    }
}

/// Cheaply clonable parsing context: an optional expected type, the path to
/// the node currently being parsed, and a shared handle to the error sink.
#[derive(Clone)]
pub struct ParsingContext {
    pub expected: Option<Type>,
    pub path: Path,
    sink: Rc<ErrorSink>,
}

impl ParsingContext {
    /// A fresh root context with no expected type.
    pub fn new() -> ParsingContext {
        ParsingContext {
            expected: None,
            path: Vec::new(),
            sink: ErrorSink::new(),
        }
    }

    pub fn root_with_expected(expected: Type) -> ParsingContext {
        ParsingContext {
            expected: Some(expected),
            path: Vec::new(),
            sink: ErrorSink::new(),
        }
    }

    /// Descends into child `index`, inheriting the sink and optionally
    /// overriding the expected type.
    pub fn child(&self, index: usize, expected: Option<Type>) -> ParsingContext {
        let mut path = self.path.clone();
        path.push(index);
        ParsingContext {
            expected,
            path,
            sink: self.sink.clone(),
        }
    }

    pub fn with_expected(&self, expected: Option<Type>) -> ParsingContext {
        ParsingContext {
            expected,
            path: self.path.clone(),
            sink: self.sink.clone(),
        }
    }

    /// Records an error at the current path; does not stop the caller.
    pub fn error(&self, error: ParseError) {
        self.sink.push(self.path.clone(), error);
    }

    pub fn has_errors(&self) -> bool {
        !self.sink.is_empty()
    }

    /// Drains the accumulated errors. Intended to be called once, at the
    /// root, after a failed parse.
    pub fn take_errors(&self) -> Vec<ParseError> {
        self.sink.take()
    }
}

impl Default for ParsingContext {
    fn default() -> Self {
        ParsingContext::new()
    }
}
