//! A small jq dialect used to select or mask parts of a document.
//!
//! Queries are parsed once into an immutable [`Query`] tree and evaluated
//! lazily: [`Query::run`] returns an iterator that pulls results from the
//! tree on demand, with errors travelling inline as `Err` items.
//!
//! Supported syntax: `.`, `..`, `.foo`, `."foo"`, `.[n]`, `.[m:n]`, `.[]`,
//! `["key"]`, `?`, literals, `(q)`, `[q]`, `|`, `,`, `=`, `|=`, `==`, `!=`
//! and the functions `del/1`, `empty/0`, `error/0`, `error/1`, `not/0`,
//! `select/1` and `path/1`.
//!
//! ```
//! use jsondiff_core::{Node, Query};
//!
//! let query = Query::parse(".items[] | .name")?;
//! let doc = Node::from_json_str(r#"{"items":[{"name":"a"},{"name":"b"}]}"#)?;
//! let names: Vec<Node> = query.run(doc).collect::<Result<_, _>>()?;
//! assert_eq!(names, vec![Node::String("a".into()), Node::String("b".into())]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod eval;
mod parser;
mod path;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::Node;

pub use eval::Outputs;
pub use path::{Path, PathSegment};

/// A parsed query: either an atomic [`Term`] or a binary composite.
#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    /// A single term with its suffixes.
    Term(Term),
    /// `left <op> right`.
    Composite {
        /// The operator joining both sides.
        op: Operator,
        /// Left operand.
        left: Box<Query>,
        /// Right operand.
        right: Box<Query>,
    },
}

/// Binary operators, listed from loosest to tightest binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    /// `|`: feed every output of the left side into the right side.
    Pipe,
    /// `,`: outputs of the left side followed by outputs of the right side.
    Comma,
    /// `=`: set every path of the left side to each value of the right side.
    Assign,
    /// `|=`: replace every path of the left side with the right side applied to it.
    Update,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
}

impl Operator {
    fn precedence(self) -> u8 {
        match self {
            Self::Pipe => 0,
            Self::Comma => 1,
            Self::Assign | Self::Update => 2,
            Self::Equal | Self::NotEqual => 3,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Pipe => "|",
            Self::Comma => ",",
            Self::Assign => "=",
            Self::Update => "|=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
        }
    }
}

/// An atomic query step followed by postfix suffixes, e.g. `.a[0]?`.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    /// The head of the term.
    pub kind: TermKind,
    /// Field, index, slice, iteration and `?` suffixes, applied left to right.
    pub suffixes: Vec<Suffix>,
}

/// The head of a [`Term`].
#[derive(Clone, Debug, PartialEq)]
pub enum TermKind {
    /// `.`
    Identity,
    /// `..`
    Recurse,
    /// `null`, `true`, numbers and strings.
    Literal(Node),
    /// `( query )`
    Paren(Box<Query>),
    /// `[ query ]`; `[]` has no inner query.
    Array(Option<Box<Query>>),
    /// `name` or `name(arg; ...)`
    Func(FuncCall),
}

/// A function call term such as `del(.a)`.
#[derive(Clone, Debug, PartialEq)]
pub struct FuncCall {
    /// Function name.
    pub name: String,
    /// Arguments, separated by `;` in source.
    pub args: Vec<Query>,
}

/// Postfix operations applied to a term's outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Suffix {
    /// `.name`, `."name"` or `["name"]`.
    Field(String),
    /// `[n]`
    Index(i64),
    /// `[m:n]`, either bound may be omitted.
    Slice {
        /// Optional start bound.
        start: Option<i64>,
        /// Optional end bound.
        end: Option<i64>,
    },
    /// `[]`
    Iterate,
    /// `?`: suppress errors raised by everything to the left within the term.
    Optional,
}

const TERM_PRECEDENCE: u8 = 4;

impl Query {
    /// Parses jq source text.
    ///
    /// ```
    /// # use jsondiff_core::Query;
    /// let query = Query::parse(".b, .c")?;
    /// assert_eq!(query.decompose().len(), 2);
    /// assert!(Query::parse(".a |").is_err());
    /// # Ok::<(), jsondiff_core::QueryParseError>(())
    /// ```
    pub fn parse(source: &str) -> Result<Self, QueryParseError> {
        parser::parse_query(source)
    }

    /// Evaluates the query against `input`, producing outputs lazily.
    pub fn run(&self, input: Node) -> Outputs<'_> {
        eval::run(self, input)
    }

    /// Returns every location the query selects in `input`, in output order.
    ///
    /// ```
    /// # use jsondiff_core::{Node, Query};
    /// let doc = Node::from_json_str("{\"a\":[1,2]}")?;
    /// let paths = Query::parse(".a[]")?.paths(&doc)?;
    /// let rendered: Vec<String> = paths.iter().map(ToString::to_string).collect();
    /// assert_eq!(rendered, ["[\"a\",0]", "[\"a\",1]"]);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn paths(&self, input: &Node) -> Result<Vec<Path>, QueryError> {
        eval::paths(self, input)
    }

    /// Flattens composites into their leaf terms, depth-first and left to right.
    ///
    /// ```
    /// # use jsondiff_core::Query;
    /// let query = Query::parse(".a, (.b | .c), .d | .e")?;
    /// let terms: Vec<String> = query.decompose().iter().map(ToString::to_string).collect();
    /// assert_eq!(terms, [".a", "(.b | .c)", ".d", ".e"]);
    /// # Ok::<(), jsondiff_core::QueryParseError>(())
    /// ```
    #[must_use]
    pub fn decompose(&self) -> Vec<&Query> {
        let mut terms = Vec::new();
        self.collect_terms(&mut terms);
        terms
    }

    fn collect_terms<'a>(&'a self, terms: &mut Vec<&'a Query>) {
        match self {
            Self::Term(_) => terms.push(self),
            Self::Composite { left, right, .. } => {
                left.collect_terms(terms);
                right.collect_terms(terms);
            }
        }
    }

    /// Builds `left <op> right`.
    #[must_use]
    pub fn composite(op: Operator, left: Query, right: Query) -> Self {
        Self::Composite { op, left: Box::new(left), right: Box::new(right) }
    }

    /// Builds a call term `name(args...)`.
    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Query>) -> Self {
        Self::Term(Term {
            kind: TermKind::Func(FuncCall { name: name.into(), args }),
            suffixes: Vec::new(),
        })
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Term(_) => TERM_PRECEDENCE,
            Self::Composite { op, .. } => op.precedence(),
        }
    }
}

impl FromStr for Query {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, query: &Query, min_precedence: u8) -> fmt::Result {
    if query.precedence() < min_precedence {
        write!(f, "({query})")
    } else {
        write!(f, "{query}")
    }
}

/// Renders jq source with the minimum parentheses needed to re-parse the same tree.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term(term) => write!(f, "{term}"),
            Self::Composite { op, left, right } => {
                let precedence = op.precedence();
                let (left_min, right_min) = match op {
                    Operator::Pipe => (precedence + 1, precedence),
                    Operator::Comma => (precedence, precedence + 1),
                    _ => (precedence + 1, precedence + 1),
                };
                write_operand(f, left, left_min)?;
                match op {
                    Operator::Comma => f.write_str(", ")?,
                    other => write!(f, " {} ", other.symbol())?,
                }
                write_operand(f, right, right_min)
            }
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quoted(text: &str) -> String {
    Node::String(text.to_string()).to_string()
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut suffixes = self.suffixes.iter().peekable();
        match &self.kind {
            // `.` merges with a leading field or bracket suffix: `.a`, `.[0]`.
            TermKind::Identity => match suffixes.peek() {
                Some(Suffix::Field(_)) => {}
                _ => f.write_str(".")?,
            },
            TermKind::Recurse => f.write_str("..")?,
            TermKind::Literal(node) => write!(f, "{node}")?,
            TermKind::Paren(query) => write!(f, "({query})")?,
            TermKind::Array(None) => f.write_str("[]")?,
            TermKind::Array(Some(query)) => write!(f, "[{query}]")?,
            TermKind::Func(call) => write!(f, "{call}")?,
        }
        for suffix in suffixes {
            write!(f, "{suffix}")?;
        }
        Ok(())
    }
}

impl fmt::Display for FuncCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (idx, arg) in self.args.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) if is_identifier(name) => write!(f, ".{name}"),
            Self::Field(name) => write!(f, ".{}", quoted(name)),
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Slice { start, end } => {
                f.write_str("[")?;
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                f.write_str(":")?;
                if let Some(end) = end {
                    write!(f, "{end}")?;
                }
                f.write_str("]")
            }
            Self::Iterate => f.write_str("[]"),
            Self::Optional => f.write_str("?"),
        }
    }
}

/// Raised when query source text cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid query {query:?}: {message}")]
pub struct QueryParseError {
    query: String,
    message: String,
}

impl QueryParseError {
    pub(crate) fn new(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self { query: query.into(), message: message.into() }
    }

    /// The source text that failed to parse.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// A description of what went wrong.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error values emitted while evaluating a query.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum QueryError {
    /// Field or index access on a value that does not support it.
    #[error("cannot index {kind} with {key}")]
    CannotIndex {
        /// jq type name of the indexed value.
        kind: &'static str,
        /// The key, index or slice used.
        key: String,
    },
    /// `.[]` applied to a scalar.
    #[error("cannot iterate over {kind}")]
    CannotIterate {
        /// jq type name of the value.
        kind: &'static str,
    },
    /// A construct that does not denote a location was used where a path is required.
    #[error("invalid path expression: {expression}")]
    InvalidPath {
        /// The offending sub-query.
        expression: String,
    },
    /// A negative index pointed before the start of an array.
    #[error("out of bounds negative array index")]
    OutOfBounds,
    /// Assignment to an index past the largest array the evaluator will grow.
    #[error("array index too large")]
    IndexTooLarge,
    /// An array slice was assigned a non-array value.
    #[error("a slice of an array can only be assigned another array")]
    SliceAssignment,
    /// A function that the evaluator does not know.
    #[error("{name}/{arity} is not defined")]
    UnknownFunction {
        /// Function name.
        name: String,
        /// Number of arguments.
        arity: usize,
    },
    /// An error raised by `error` or `error(msg)`.
    #[error("{}", raised_message(.0))]
    Raised(Node),
}

fn raised_message(value: &Node) -> String {
    match value {
        Node::String(message) => message.clone(),
        other => format!("{other} (not a string)"),
    }
}
