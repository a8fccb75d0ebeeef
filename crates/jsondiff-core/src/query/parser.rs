//! A `nom`-based parser for the query language.
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, anychar, char, i64 as integer, multispace0, none_of},
    combinator::{map, map_res, not, opt, recognize, success, value},
    multi::{many0, separated_list1},
    number::complete::double,
    sequence::{delimited, pair, preceded, separated_pair, terminated},
};

use super::eval::is_builtin;
use super::{FuncCall, Operator, Query, QueryError, QueryParseError, Suffix, Term, TermKind};
use crate::{Node, Number};

/// Deepest bracket, parenthesis or argument list nesting accepted.
const MAX_GROUP_DEPTH: usize = 64;
/// Bound on the depth of the parsed tree, operators included.
const MAX_TREE_DEPTH: usize = 1024;

pub(super) fn parse_query(source: &str) -> Result<Query, QueryParseError> {
    if too_deep(source) {
        return Err(QueryParseError::new(source, "query nesting too deep"));
    }
    let query = match pipe(source) {
        Ok(("", query)) => query,
        Ok((rest, _)) => return Err(QueryParseError::new(source, unexpected(source, rest))),
        Err(nom::Err::Error(err) | nom::Err::Failure(err)) => {
            return Err(QueryParseError::new(source, unexpected(source, err.input)));
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(QueryParseError::new(source, "unexpected end of input"));
        }
    };
    check_functions(&query).map_err(|err| QueryParseError::new(source, err.to_string()))?;
    Ok(query)
}

/// Scans the source for how deep the parser and the resulting tree would nest.
///
/// Groups open a level; every operator adds one to the depth of the level it
/// sits in. String literals are skipped.
fn too_deep(source: &str) -> bool {
    let mut levels = vec![0_usize];
    let mut depth = 0;
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            '(' | '[' => {
                levels.push(0);
                depth += 1;
            }
            ')' | ']' if levels.len() > 1 => {
                depth -= levels.pop().map_or(0, |operators| operators + 1);
            }
            '|' | '=' | '!' | ',' => {
                if c != ',' && chars.peek() == Some(&'=') {
                    chars.next();
                }
                if let Some(operators) = levels.last_mut() {
                    *operators += 1;
                }
                depth += 1;
            }
            _ => {}
        }
        if levels.len() > MAX_GROUP_DEPTH || depth > MAX_TREE_DEPTH {
            return true;
        }
    }
    false
}

fn unexpected(source: &str, rest: &str) -> String {
    if rest.trim().is_empty() {
        "unexpected end of input".to_string()
    } else {
        format!("unexpected token at position {}", source.len() - rest.len())
    }
}

fn check_functions(query: &Query) -> Result<(), QueryError> {
    match query {
        Query::Composite { left, right, .. } => {
            check_functions(left)?;
            check_functions(right)
        }
        Query::Term(term) => match &term.kind {
            TermKind::Paren(inner) | TermKind::Array(Some(inner)) => check_functions(inner),
            TermKind::Func(call) => {
                if !is_builtin(&call.name, call.args.len()) {
                    return Err(QueryError::UnknownFunction {
                        name: call.name.clone(),
                        arity: call.args.len(),
                    });
                }
                call.args.iter().try_for_each(check_functions)
            }
            _ => Ok(()),
        },
    }
}

// --- Operators, loosest first ---

fn pipe(input: &str) -> IResult<&str, Query> {
    let (input, first) = comma(input)?;
    let (input, mut rest) =
        many0(preceded(ws(terminated(char('|'), not(char('=')))), comma)).parse(input)?;
    // Pipes associate to the right.
    let query = match rest.pop() {
        Some(last) => {
            let right = rest
                .into_iter()
                .rev()
                .fold(last, |right, left| Query::composite(Operator::Pipe, left, right));
            Query::composite(Operator::Pipe, first, right)
        }
        None => first,
    };
    Ok((input, query))
}

fn comma(input: &str) -> IResult<&str, Query> {
    let (input, first) = assign(input)?;
    let (input, rest) = many0(preceded(ws(char(',')), assign)).parse(input)?;
    let query = rest
        .into_iter()
        .fold(first, |left, right| Query::composite(Operator::Comma, left, right));
    Ok((input, query))
}

fn assign(input: &str) -> IResult<&str, Query> {
    let operator = ws(alt((
        value(Operator::Update, tag("|=")),
        value(Operator::Assign, terminated(char('='), not(char('=')))),
    )));
    let (input, left) = compare(input)?;
    let (input, right) = opt(pair(operator, compare)).parse(input)?;
    Ok((input, binary(left, right)))
}

fn compare(input: &str) -> IResult<&str, Query> {
    let operator = ws(alt((
        value(Operator::Equal, tag("==")),
        value(Operator::NotEqual, tag("!=")),
    )));
    let (input, left) = term(input)?;
    let (input, right) = opt(pair(operator, term)).parse(input)?;
    Ok((input, binary(left, right)))
}

fn binary(left: Query, right: Option<(Operator, Query)>) -> Query {
    match right {
        Some((op, right)) => Query::composite(op, left, right),
        None => left,
    }
}

// --- Terms ---

fn term(input: &str) -> IResult<&str, Query> {
    map(ws(pair(primary, many0(suffix))), |((kind, mut suffixes), rest)| {
        suffixes.extend(rest);
        Query::Term(Term { kind, suffixes })
    })
    .parse(input)
}

fn primary(input: &str) -> IResult<&str, (TermKind, Vec<Suffix>)> {
    alt((
        value((TermKind::Recurse, Vec::new()), tag("..")),
        map(preceded(char('.'), field_name), |name| {
            (TermKind::Identity, vec![Suffix::Field(name)])
        }),
        value((TermKind::Identity, Vec::new()), char('.')),
        map(string_literal, |text| (TermKind::Literal(Node::String(text)), Vec::new())),
        map(delimited(char('('), pipe, ws(char(')'))), |inner| {
            (TermKind::Paren(Box::new(inner)), Vec::new())
        }),
        map(delimited(char('['), opt(pipe), ws(char(']'))), |inner| {
            (TermKind::Array(inner.map(Box::new)), Vec::new())
        }),
        map(word, |kind| (kind, Vec::new())),
        map(map_res(double, Number::new), |number| {
            (TermKind::Literal(Node::Number(number)), Vec::new())
        }),
    ))
    .parse(input)
}

/// Keywords and function calls.
fn word(input: &str) -> IResult<&str, TermKind> {
    let (input, name) = identifier(input)?;
    match name {
        "null" => Ok((input, TermKind::Literal(Node::Null))),
        "true" => Ok((input, TermKind::Literal(Node::Bool(true)))),
        "false" => Ok((input, TermKind::Literal(Node::Bool(false)))),
        _ => {
            let (input, args) = opt(delimited(
                char('('),
                separated_list1(ws(char(';')), pipe),
                ws(char(')')),
            ))
            .parse(input)?;
            let call = FuncCall { name: name.to_string(), args: args.unwrap_or_default() };
            Ok((input, TermKind::Func(call)))
        }
    }
}

fn suffix(input: &str) -> IResult<&str, Suffix> {
    alt((
        value(Suffix::Optional, char('?')),
        map(preceded(char('.'), field_name), Suffix::Field),
        preceded(opt(char('.')), bracket),
    ))
    .parse(input)
}

fn bracket(input: &str) -> IResult<&str, Suffix> {
    delimited(
        char('['),
        ws(alt((
            map(string_literal, Suffix::Field),
            map(
                separated_pair(opt(ws(integer)), char(':'), opt(ws(integer))),
                |(start, end)| Suffix::Slice { start, end },
            ),
            map(integer, Suffix::Index),
            success(Suffix::Iterate),
        ))),
        char(']'),
    )
    .parse(input)
}

// --- Lexical pieces ---

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn field_name(input: &str) -> IResult<&str, String> {
    alt((map(identifier, str::to_string), string_literal)).parse(input)
}

/// A JSON string literal, escapes decoded by serde_json.
fn string_literal(input: &str) -> IResult<&str, String> {
    map_res(
        recognize(delimited(
            char('"'),
            many0(alt((preceded(char('\\'), anychar), none_of("\"\\")))),
            char('"'),
        )),
        |text: &str| serde_json::from_str::<String>(text),
    )
    .parse(input)
}

/// A combinator that takes a parser `inner` and produces a parser that consumes surrounding whitespace.
fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> Suffix {
        Suffix::Field(name.to_string())
    }

    fn identity(suffixes: Vec<Suffix>) -> Query {
        Query::Term(Term { kind: TermKind::Identity, suffixes })
    }

    #[test]
    fn parses_field_chains() {
        let query = parse_query(".a.\"b c\"[0][-1:][]?").unwrap();
        assert_eq!(
            query,
            identity(vec![
                field("a"),
                field("b c"),
                Suffix::Index(0),
                Suffix::Slice { start: Some(-1), end: None },
                Suffix::Iterate,
                Suffix::Optional,
            ])
        );
    }

    #[test]
    fn bracket_string_is_a_field() {
        assert_eq!(parse_query(".[\"a\"]").unwrap(), identity(vec![field("a")]));
        assert_eq!(parse_query(".a.[1]").unwrap(), parse_query(".a[1]").unwrap());
    }

    #[test]
    fn pipe_is_right_associative_and_comma_left() {
        let query = parse_query(".a, .b, .c | .d | .e").unwrap();
        let Query::Composite { op: Operator::Pipe, left, right } = query else {
            panic!("expected a pipe at the root");
        };
        assert!(matches!(*left, Query::Composite { op: Operator::Comma, ref left, .. }
            if matches!(**left, Query::Composite { op: Operator::Comma, .. })));
        assert!(matches!(*right, Query::Composite { op: Operator::Pipe, .. }));
    }

    #[test]
    fn update_is_not_a_pipe() {
        let query = parse_query(".a |= 1").unwrap();
        assert!(matches!(query, Query::Composite { op: Operator::Update, .. }));
        let query = parse_query(".a == 1").unwrap();
        assert!(matches!(query, Query::Composite { op: Operator::Equal, .. }));
    }

    #[test]
    fn keywords_become_literals() {
        let query = parse_query("[null, true, false, 1.5, \"x\\n\"]").unwrap();
        assert_eq!(query.to_string(), "[null, true, false, 1.5, \"x\\n\"]");
    }

    #[test]
    fn function_arguments_are_separated_by_semicolons() {
        let query = parse_query("del(.a, .b)").unwrap();
        let Query::Term(Term { kind: TermKind::Func(call), .. }) = query else {
            panic!("expected a call");
        };
        assert_eq!(call.name, "del");
        assert_eq!(call.args.len(), 1);
    }

    #[test]
    fn rejects_malformed_input() {
        for (source, message) in [
            ("", "unexpected end of input"),
            ("   ", "unexpected end of input"),
            (".a |", "unexpected token at position 3"),
            (".a )", "unexpected token at position 3"),
            (".a = .b = .c", "unexpected token at position 8"),
            ("nope(.a)", "nope/1 is not defined"),
            ("del", "del/0 is not defined"),
        ] {
            let err = parse_query(source).unwrap_err();
            assert_eq!(err.message(), message, "source {source:?}");
            assert_eq!(err.query(), source);
        }
    }

    #[test]
    fn deep_nesting_is_rejected_before_parsing() {
        let source = format!("{}.{}", "(".repeat(50_000), ")".repeat(50_000));
        assert_eq!(parse_query(&source).unwrap_err().message(), "query nesting too deep");

        let source = format!("{}.", "[".repeat(MAX_GROUP_DEPTH + 1));
        assert_eq!(parse_query(&source).unwrap_err().message(), "query nesting too deep");

        let source = vec!["."; MAX_TREE_DEPTH + 2].join(" | ");
        assert_eq!(parse_query(&source).unwrap_err().message(), "query nesting too deep");
    }

    #[test]
    fn long_flat_queries_still_parse() {
        let fields: Vec<String> = (0..500).map(|n| format!(".f{n}")).collect();
        let query = parse_query(&fields.join(", ")).unwrap();
        assert_eq!(query.decompose().len(), 500);

        let nested = format!("{}.a{}", "(".repeat(16), ")".repeat(16));
        assert!(parse_query(&nested).is_ok());
        assert!(parse_query(".a | \"|=(\" | .b").is_ok());
    }
}
