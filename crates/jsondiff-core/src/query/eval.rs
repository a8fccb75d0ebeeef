//! Lazy evaluation of queries, plus the eager path mode used by `=`, `|=`, `del` and `path`.
use std::iter;

use super::path::{delete_path, delete_paths, get_path, resolve_index, set_path, slice_bounds};
use super::{FuncCall, Operator, Path, PathSegment, Query, QueryError, Suffix, Term, TermKind};
use crate::Node;

/// The lazy result stream of [`Query::run`](super::Query::run).
///
/// Errors are produced inline; consumers decide whether to stop at the first one.
pub type Outputs<'q> = Box<dyn Iterator<Item = Result<Node, QueryError>> + 'q>;

fn single<'q>(item: Result<Node, QueryError>) -> Outputs<'q> {
    Box::new(iter::once(item))
}

pub(super) fn is_builtin(name: &str, arity: usize) -> bool {
    matches!(
        (name, arity),
        ("del" | "path" | "select", 1) | ("empty" | "not", 0) | ("error", 0 | 1)
    )
}

pub(super) fn run(query: &Query, input: Node) -> Outputs<'_> {
    match query {
        Query::Term(term) => run_term(term, input),
        Query::Composite { op: Operator::Pipe, left, right } => {
            Box::new(run(left, input).flat_map(move |item| match item {
                Ok(value) => run(right, value),
                Err(err) => single(Err(err)),
            }))
        }
        Query::Composite { op: Operator::Comma, left, right } => {
            let second = input.clone();
            Box::new(run(left, input).chain(iter::once_with(move || run(right, second)).flatten()))
        }
        Query::Composite { op: Operator::Assign, left, right } => assign(left, right, input),
        Query::Composite { op: Operator::Update, left, right } => update(left, right, input),
        Query::Composite { op: op @ (Operator::Equal | Operator::NotEqual), left, right } => {
            compare(*op, left, right, input)
        }
    }
}

fn run_term<'q>(term: &'q Term, input: Node) -> Outputs<'q> {
    let head = run_kind(&term.kind, input);
    term.suffixes.iter().fold(head, |stream: Outputs<'q>, suffix| -> Outputs<'q> {
        match suffix {
            // `?` ends the stream quietly at the first error.
            Suffix::Optional => Box::new(stream.map_while(Result::ok).map(Ok::<Node, QueryError>)),
            _ => Box::new(stream.flat_map(move |item| match item {
                Ok(value) => apply_suffix(suffix, value),
                Err(err) => single(Err(err)),
            })),
        }
    })
}

fn run_kind(kind: &TermKind, input: Node) -> Outputs<'_> {
    match kind {
        TermKind::Identity => single(Ok(input)),
        TermKind::Recurse => {
            let mut found = Vec::new();
            recurse_values(input, &mut found);
            Box::new(found.into_iter().map(Ok::<Node, QueryError>))
        }
        TermKind::Literal(node) => single(Ok(node.clone())),
        TermKind::Paren(inner) => run(inner, input),
        TermKind::Array(None) => single(Ok(Node::Array(Vec::new()))),
        TermKind::Array(Some(inner)) => {
            single(run(inner, input).collect::<Result<Vec<_>, _>>().map(Node::Array))
        }
        TermKind::Func(call) => run_call(call, input),
    }
}

fn recurse_values(node: Node, found: &mut Vec<Node>) {
    let children: Vec<Node> = match &node {
        Node::Array(items) => items.clone(),
        Node::Object(map) => map.values().cloned().collect(),
        _ => Vec::new(),
    };
    found.push(node);
    for child in children {
        recurse_values(child, found);
    }
}

fn apply_suffix<'q>(suffix: &Suffix, value: Node) -> Outputs<'q> {
    match suffix {
        Suffix::Field(key) => single(get_path(&value, &[PathSegment::key(key.as_str())])),
        Suffix::Index(index) => single(get_path(&value, &[PathSegment::Index(*index)])),
        Suffix::Slice { start, end } => single(slice(&value, *start, *end)),
        Suffix::Iterate => match value {
            Node::Array(items) => Box::new(items.into_iter().map(Ok::<Node, QueryError>)),
            Node::Object(map) => Box::new(map.into_values().map(Ok::<Node, QueryError>)),
            other => single(Err(QueryError::CannotIterate { kind: other.kind() })),
        },
        Suffix::Optional => single(Ok(value)),
    }
}

fn slice(value: &Node, start: Option<i64>, end: Option<i64>) -> Result<Node, QueryError> {
    match value {
        Node::Null => Ok(Node::Null),
        Node::Array(items) => {
            let (start, end) = slice_bounds(items.len(), start, end);
            Ok(Node::Array(items[start..end].to_vec()))
        }
        Node::String(text) => {
            let chars: Vec<char> = text.chars().collect();
            let (start, end) = slice_bounds(chars.len(), start, end);
            Ok(Node::String(chars[start..end].iter().collect()))
        }
        other => Err(QueryError::CannotIndex { kind: other.kind(), key: "object".to_string() }),
    }
}

fn run_call(call: &FuncCall, input: Node) -> Outputs<'_> {
    match (call.name.as_str(), call.args.as_slice()) {
        ("empty", []) => Box::new(iter::empty()),
        ("error", []) => single(Err(QueryError::Raised(input))),
        ("error", [message]) => Box::new(
            run(message, input)
                .map(|item| item.and_then(|message| Err::<Node, _>(QueryError::Raised(message)))),
        ),
        ("not", []) => single(Ok(Node::Bool(!input.is_truthy()))),
        ("select", [filter]) => Box::new(run(filter, input.clone()).filter_map(move |item| {
            match item {
                Ok(condition) if condition.is_truthy() => Some(Ok(input.clone())),
                Ok(_) => None,
                Err(err) => Some(Err(err)),
            }
        })),
        ("path", [target]) => {
            let found = paths_of(target, Path::new(), input);
            let error = found.error.map(Err);
            Box::new(found.items.into_iter().map(|(path, _)| Ok(path.to_node())).chain(error))
        }
        ("del", [target]) => {
            single(paths(target, &input).and_then(|found| delete_paths(input, found)))
        }
        (name, args) => {
            single(Err(QueryError::UnknownFunction { name: name.to_string(), arity: args.len() }))
        }
    }
}

/// `lhs = rhs`: `rhs` runs against the input, and every value it yields is
/// written to all locations of `lhs`, each producing one output document.
fn assign<'q>(lhs: &'q Query, rhs: &'q Query, input: Node) -> Outputs<'q> {
    let targets = paths(lhs, &input);
    Box::new(run(rhs, input.clone()).map(move |item| {
        let value = item?;
        match &targets {
            Ok(found) => found
                .iter()
                .try_fold(input.clone(), |doc, path| set_path(doc, path.segments(), value.clone())),
            Err(err) => Err(err.clone()),
        }
    }))
}

/// `lhs |= f`: each location is replaced by the first output of `f`, or removed when `f` is empty.
fn update<'q>(lhs: &'q Query, f: &'q Query, input: Node) -> Outputs<'q> {
    let updated = paths(lhs, &input).and_then(|found| {
        found.into_iter().try_fold(input, |doc, path| {
            let current = get_path(&doc, path.segments())?;
            match run(f, current).next() {
                Some(Ok(value)) => set_path(doc, path.segments(), value),
                Some(Err(err)) => Err(err),
                None => delete_path(doc, path.segments()),
            }
        })
    });
    single(updated)
}

fn compare<'q>(op: Operator, lhs: &'q Query, rhs: &'q Query, input: Node) -> Outputs<'q> {
    let left_input = input.clone();
    let want_equal = op == Operator::Equal;
    Box::new(run(rhs, input).flat_map(move |right| -> Outputs<'q> {
        match right {
            Ok(right) => Box::new(
                run(lhs, left_input.clone())
                    .map(move |left| left.map(|left| Node::Bool((left == right) == want_equal))),
            ),
            Err(err) => single(Err(err)),
        }
    }))
}

// --- Path mode ---

/// Locations produced so far, and the error that stopped the stream, if any.
#[derive(Default)]
struct Partial {
    items: Vec<(Path, Node)>,
    error: Option<QueryError>,
}

impl Partial {
    fn single(path: Path, value: Node) -> Self {
        Self { items: vec![(path, value)], error: None }
    }

    fn failed(error: QueryError) -> Self {
        Self { items: Vec::new(), error: Some(error) }
    }

    fn extend(&mut self, other: Self) {
        self.items.extend(other.items);
        if self.error.is_none() {
            self.error = other.error;
        }
    }

    fn into_paths(self) -> Result<Vec<Path>, QueryError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.items.into_iter().map(|(path, _)| path).collect()),
        }
    }
}

pub(super) fn paths(query: &Query, input: &Node) -> Result<Vec<Path>, QueryError> {
    paths_of(query, Path::new(), input.clone()).into_paths()
}

fn paths_of(query: &Query, path: Path, value: Node) -> Partial {
    match query {
        Query::Term(term) => term_paths(term, path, value),
        Query::Composite { op: Operator::Pipe, left, right } => {
            let upstream = paths_of(left, path, value);
            let mut out = Partial::default();
            for (path, value) in upstream.items {
                out.extend(paths_of(right, path, value));
                if out.error.is_some() {
                    return out;
                }
            }
            out.error = upstream.error;
            out
        }
        Query::Composite { op: Operator::Comma, left, right } => {
            let mut out = paths_of(left, path.clone(), value.clone());
            if out.error.is_none() {
                out.extend(paths_of(right, path, value));
            }
            out
        }
        Query::Composite { .. } => {
            Partial::failed(QueryError::InvalidPath { expression: query.to_string() })
        }
    }
}

fn term_paths(term: &Term, path: Path, value: Node) -> Partial {
    let mut current = match &term.kind {
        TermKind::Identity => Partial::single(path, value),
        TermKind::Recurse => {
            let mut out = Partial::default();
            recurse_paths(path, value, &mut out.items);
            out
        }
        TermKind::Paren(inner) => paths_of(inner, path, value),
        TermKind::Func(call) => call_paths(call, path, value),
        TermKind::Literal(_) | TermKind::Array(_) => {
            return Partial::failed(QueryError::InvalidPath { expression: term.to_string() });
        }
    };
    for suffix in &term.suffixes {
        if let Suffix::Optional = suffix {
            current.error = None;
            continue;
        }
        let mut next = Partial::default();
        for (path, value) in current.items {
            next.extend(suffix_paths(suffix, path, value));
            if next.error.is_some() {
                break;
            }
        }
        if next.error.is_none() {
            next.error = current.error;
        }
        current = next;
    }
    current
}

fn recurse_paths(path: Path, value: Node, found: &mut Vec<(Path, Node)>) {
    let children: Vec<(PathSegment, Node)> = match &value {
        Node::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| (PathSegment::Index(idx as i64), item.clone()))
            .collect(),
        Node::Object(map) => {
            map.iter().map(|(key, item)| (PathSegment::key(key.as_str()), item.clone())).collect()
        }
        _ => Vec::new(),
    };
    found.push((path.clone(), value));
    for (segment, child) in children {
        recurse_paths(path.clone().with_segment(segment), child, found);
    }
}

fn step(path: Path, value: &Node, segment: PathSegment) -> Partial {
    match get_path(value, std::slice::from_ref(&segment)) {
        Ok(child) => Partial::single(path.with_segment(segment), child),
        Err(err) => Partial::failed(err),
    }
}

fn suffix_paths(suffix: &Suffix, path: Path, value: Node) -> Partial {
    match suffix {
        Suffix::Field(key) => step(path, &value, PathSegment::key(key.as_str())),
        Suffix::Index(index) => {
            // Known array lengths turn negative indices into absolute ones.
            let index = match &value {
                Node::Array(items) => {
                    resolve_index(items.len(), *index).map_or(*index, |resolved| resolved as i64)
                }
                _ => *index,
            };
            step(path, &value, PathSegment::Index(index))
        }
        Suffix::Slice { start, end } => match &value {
            Node::Array(items) => {
                let (start, end) = slice_bounds(items.len(), *start, *end);
                step(path, &value, PathSegment::Slice { start, end })
            }
            Node::Null => step(path, &value, PathSegment::Slice { start: 0, end: 0 }),
            other => Partial::failed(QueryError::CannotIndex {
                kind: other.kind(),
                key: "object".to_string(),
            }),
        },
        Suffix::Iterate => match value {
            Node::Array(items) => Partial {
                items: items
                    .into_iter()
                    .enumerate()
                    .map(|(idx, item)| (path.clone().with_segment(PathSegment::Index(idx as i64)), item))
                    .collect(),
                error: None,
            },
            Node::Object(map) => Partial {
                items: map
                    .into_iter()
                    .map(|(key, item)| (path.clone().with_segment(PathSegment::Key(key)), item))
                    .collect(),
                error: None,
            },
            other => Partial::failed(QueryError::CannotIterate { kind: other.kind() }),
        },
        Suffix::Optional => Partial::single(path, value),
    }
}

fn call_paths(call: &FuncCall, path: Path, value: Node) -> Partial {
    match (call.name.as_str(), call.args.as_slice()) {
        ("empty", []) => Partial::default(),
        ("error", []) => Partial::failed(QueryError::Raised(value)),
        ("error", [message]) => match run(message, value).next() {
            Some(Ok(message)) => Partial::failed(QueryError::Raised(message)),
            Some(Err(err)) => Partial::failed(err),
            None => Partial::default(),
        },
        ("select", [filter]) => {
            let mut out = Partial::default();
            for condition in run(filter, value.clone()) {
                match condition {
                    Ok(condition) if condition.is_truthy() => {
                        out.items.push((path.clone(), value.clone()));
                    }
                    Ok(_) => {}
                    Err(err) => {
                        out.error = Some(err);
                        break;
                    }
                }
            }
            out
        }
        (name, args) if is_builtin(name, args.len()) => {
            Partial::failed(QueryError::InvalidPath { expression: call.to_string() })
        }
        (name, args) => {
            Partial::failed(QueryError::UnknownFunction { name: name.to_string(), arity: args.len() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(text: &str) -> Node {
        Node::from_json_str(text).unwrap()
    }

    fn outputs(source: &str, input: &str) -> Vec<Result<Node, QueryError>> {
        let query = Query::parse(source).unwrap();
        query.run(node(input)).collect()
    }

    fn values(source: &str, input: &str) -> Vec<Node> {
        outputs(source, input).into_iter().collect::<Result<_, _>>().unwrap()
    }

    fn path_strings(source: &str, input: &str) -> Vec<String> {
        let query = Query::parse(source).unwrap();
        query.paths(&node(input)).unwrap().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn field_access_on_null_is_null() {
        assert_eq!(values(".a.b", "null"), vec![Node::Null]);
        assert_eq!(values(".missing", "{}"), vec![Node::Null]);
    }

    #[test]
    fn iterate_yields_values_in_key_order() {
        assert_eq!(values(".[]", "{\"b\":2,\"a\":1}"), vec![node("1"), node("2")]);
        assert_eq!(values(".[]?", "3"), Vec::<Node>::new());
    }

    #[test]
    fn comma_and_pipe_compose() {
        assert_eq!(
            values(".a, .b | ., .", "{\"a\":1,\"b\":2}"),
            vec![node("1"), node("1"), node("2"), node("2")]
        );
    }

    #[test]
    fn negative_indices_and_slices() {
        assert_eq!(values(".[-1]", "[1,2,3]"), vec![node("3")]);
        assert_eq!(values(".[1:]", "[1,2,3]"), vec![node("[2,3]")]);
        assert_eq!(values(".[:2]", "\"hello\""), vec![node("\"he\"")]);
    }

    #[test]
    fn errors_flow_inline() {
        let results = outputs("1, error(\"boom\"), 2", "null");
        assert_eq!(results[0], Ok(node("1")));
        assert_eq!(results[1], Err(QueryError::Raised(node("\"boom\""))));
        assert_eq!(results[2], Ok(node("2")));
    }

    #[test]
    fn optional_stops_at_the_first_error() {
        assert_eq!(values("(1, error, 2)?", "null"), vec![node("1")]);
        assert_eq!(values(".a[0]?", "{\"a\":{}}"), Vec::<Node>::new());
    }

    #[test]
    fn evaluation_is_lazy() {
        let query = Query::parse("1, error(\"late\")").unwrap();
        let first = query.run(Node::Null).next();
        assert_eq!(first, Some(Ok(node("1"))));
    }

    #[test]
    fn assignment_sets_every_path() {
        assert_eq!(
            values(".a = 1 | .b[1] = true", "{\"b\":[]}"),
            vec![node("{\"a\":1,\"b\":[null,true]}")]
        );
        assert_eq!(values(".[] = 0", "[1,2]"), vec![node("[0,0]")]);
        assert_eq!(values(".a = (1, 2)", "{}"), vec![node("{\"a\":1}"), node("{\"a\":2}")]);
    }

    #[test]
    fn assignment_value_comes_from_the_original_input() {
        assert_eq!(values(".a = .b", "{\"a\":1,\"b\":2}"), vec![node("{\"a\":2,\"b\":2}")]);
    }

    #[test]
    fn update_uses_first_output_or_deletes() {
        assert_eq!(values(".a |= (2, 3)", "{\"a\":1}"), vec![node("{\"a\":2}")]);
        assert_eq!(values(".a |= empty", "{\"a\":1,\"b\":2}"), vec![node("{\"b\":2}")]);
    }

    #[test]
    fn del_removes_every_location() {
        assert_eq!(values("del(.b, .c)", "{\"a\":1,\"b\":2,\"c\":3}"), vec![node("{\"a\":1}")]);
        assert_eq!(values("del(.[0], .[2])", "[1,2,3,4]"), vec![node("[2,4]")]);
        assert_eq!(values("del(.[] | select(. == 3))", "[1,3]"), vec![node("[1]")]);
    }

    #[test]
    fn del_of_missing_locations_is_a_no_op() {
        assert_eq!(values("del(.x.y)", "{\"a\":1}"), vec![node("{\"a\":1}")]);
    }

    #[test]
    fn select_and_comparisons() {
        assert_eq!(
            values(".[] | select(.k == 1) | .v", "[{\"k\":1,\"v\":\"a\"},{\"k\":2,\"v\":\"b\"}]"),
            vec![node("\"a\"")]
        );
        assert_eq!(values(".a != null", "{\"a\":1}"), vec![Node::Bool(true)]);
        assert_eq!(values("1 == 1.0", "null"), vec![Node::Bool(true)]);
        assert_eq!(values(".a | not", "{\"a\":false}"), vec![Node::Bool(true)]);
    }

    #[test]
    fn paths_follow_output_order() {
        assert_eq!(path_strings(".a, .b[0]", "{}"), ["[\"a\"]", "[\"b\",0]"]);
        assert_eq!(path_strings(".[-1]", "[1,2,3]"), ["[2]"]);
        assert_eq!(path_strings("..", "{\"a\":[1]}"), ["[]", "[\"a\"]", "[\"a\",0]"]);
        assert_eq!(path_strings(".[1:]", "[1,2,3]"), ["[{\"end\":3,\"start\":1}]"]);
    }

    #[test]
    fn path_function_emits_arrays() {
        assert_eq!(values("path(.a[0])", "null"), vec![node("[\"a\",0]")]);
    }

    #[test]
    fn non_path_expressions_are_rejected() {
        let query = Query::parse("del(1)").unwrap();
        let result: Vec<_> = query.run(Node::Null).collect();
        assert_eq!(result, vec![Err(QueryError::InvalidPath { expression: "1".to_string() })]);
    }

    #[test]
    fn indexing_scalars_is_an_error() {
        let results = outputs(".a", "5");
        assert_eq!(
            results,
            vec![Err(QueryError::CannotIndex { kind: "number", key: "\"a\"".to_string() })]
        );
        assert_eq!(
            outputs(".[]", "true"),
            vec![Err(QueryError::CannotIterate { kind: "boolean" })]
        );
    }
}
