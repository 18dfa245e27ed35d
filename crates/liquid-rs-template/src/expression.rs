//! Expressions and variable markup.
//!
//! An [`Expression`] is the smallest evaluable unit of a template: a literal,
//! a variable path such as `product.variants[0].title`, a range `(1..n)` or a
//! bracketed list `[a, "b", 3]`. A [`Variable`] is an expression followed by
//! a filter chain, which is what `{{ ... }}` markup and the right-hand side of
//! `assign` compile to.

use once_cell::sync::Lazy;
use regex::Regex;

use liquid_rs_core::error::{LiquidError, LiquidResult};

use crate::context::Context;
use crate::value::Value;

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").expect("integer regex is valid"));
static FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+\.\d+$").expect("float regex is valid"));
static RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\(\s*(\S+?)\s*\.\.\s*(\S+?)\s*\)$").expect("range regex is valid")
});

/// Longest range that is turned into a list outside of `for` and `tablerow`.
/// Longer ranges evaluate to nil.
pub const MAX_RANGE_LENGTH: i64 = 100_000;

/// A compiled expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal value: `nil`, `true`, `"text"`, `42`, `1.5`.
    Literal(Value),
    /// A variable lookup.
    Path(VariablePath),
    /// An inclusive integer range `(start..end)`.
    Range(Box<Expression>, Box<Expression>),
    /// A bracketed list literal `[a, b, c]`.
    Array(Vec<Expression>),
}

/// A dotted / bracketed variable path.
#[derive(Debug, Clone, PartialEq)]
pub struct VariablePath {
    /// The first name, looked up in the scope stack.
    pub root: String,
    /// The lookups applied after the root, in order.
    pub segments: Vec<Segment>,
    /// The path as written in the template.
    pub raw: String,
}

/// One step of a [`VariablePath`].
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// `.name`
    Key(String),
    /// `[expression]`, resolved at render time.
    Index(Box<Expression>),
}

impl Expression {
    /// Evaluates the expression against a context. Never fails: anything
    /// unresolvable is `nil`.
    pub fn evaluate(&self, context: &Context) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Path(path) => context.variable(path),
            Self::Range(start, end) => {
                let (start, end) = range_bounds(start, end, context);
                if i128::from(end) - i128::from(start) >= i128::from(MAX_RANGE_LENGTH) {
                    tracing::debug!(start, end, "range too long to evaluate as a list");
                    return Value::Nil;
                }
                Value::List((start..=end).map(Value::Integer).collect())
            }
            Self::Array(items) => Value::List(items.iter().map(|e| e.evaluate(context)).collect()),
        }
    }

    /// The inclusive bounds of a range expression, or `None` for any other
    /// expression.
    pub fn range(&self, context: &Context) -> Option<(i64, i64)> {
        match self {
            Self::Range(start, end) => Some(range_bounds(start, end, context)),
            _ => None,
        }
    }

    /// The markup text this expression refers to, used for loop and cycle names.
    pub fn raw(&self) -> String {
        match self {
            Self::Literal(Value::String(s)) => format!("'{s}'"),
            Self::Literal(value) => value.to_liquid_string(),
            Self::Path(path) => path.raw.clone(),
            Self::Range(start, end) => format!("({}..{})", start.raw(), end.raw()),
            Self::Array(items) => {
                let inner: Vec<String> = items.iter().map(Self::raw).collect();
                format!("[{}]", inner.join(", "))
            }
        }
    }
}

fn range_bounds(start: &Expression, end: &Expression, context: &Context) -> (i64, i64) {
    (
        start.evaluate(context).as_integer().unwrap_or(0),
        end.evaluate(context).as_integer().unwrap_or(0),
    )
}

/// Parses a single expression.
///
/// `""`, `nil` and `null` are nil. Quoted text is a string, `-?\d+` an
/// integer and `-?\d+\.\d+` a float. Anything else is a variable path.
///
/// # Errors
///
/// Returns [`LiquidError::Syntax`] for paths containing characters that are
/// not valid in a variable name.
pub fn parse_expression(markup: &str) -> LiquidResult<Expression> {
    let s = markup.trim();

    match s {
        "" | "nil" | "null" => return Ok(Expression::Literal(Value::Nil)),
        "true" => return Ok(Expression::Literal(Value::Bool(true))),
        "false" => return Ok(Expression::Literal(Value::Bool(false))),
        _ => {}
    }

    if is_quoted(s) {
        return Ok(Expression::Literal(Value::String(s[1..s.len() - 1].to_string())));
    }

    if INTEGER.is_match(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Ok(Expression::Literal(Value::Integer(i)));
        }
    }

    if FLOAT.is_match(s) {
        if let Ok(f) = s.parse::<f64>() {
            return Ok(Expression::Literal(Value::Float(f)));
        }
    }

    if let Some(caps) = RANGE.captures(s) {
        return Ok(Expression::Range(
            Box::new(parse_expression(&caps[1])?),
            Box::new(parse_expression(&caps[2])?),
        ));
    }

    if s.starts_with('[') && s.ends_with(']') {
        let inner = s[1..s.len() - 1].trim();
        if inner.is_empty() {
            return Ok(Expression::Array(Vec::new()));
        }
        let items = split_unquoted(inner, ',')
            .into_iter()
            .map(parse_expression)
            .collect::<LiquidResult<Vec<_>>>()?;
        return Ok(Expression::Array(items));
    }

    parse_path(s).map(Expression::Path)
}

fn is_quoted(s: &str) -> bool {
    s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
}

const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '?'
}

/// Parses `name(.key|[expr])*`.
fn parse_path(s: &str) -> LiquidResult<VariablePath> {
    let invalid = || LiquidError::syntax("Invalid variable name", s);

    let root_end = s.find(|c: char| !is_name_char(c)).unwrap_or(s.len());
    if root_end == 0 {
        return Err(invalid());
    }
    let root = s[..root_end].to_string();

    let mut segments = Vec::new();
    let mut rest = &s[root_end..];
    while !rest.is_empty() {
        if let Some(after_dot) = rest.strip_prefix('.') {
            let end = after_dot
                .find(|c: char| !is_name_char(c))
                .unwrap_or(after_dot.len());
            if end == 0 {
                return Err(invalid());
            }
            segments.push(Segment::Key(after_dot[..end].to_string()));
            rest = &after_dot[end..];
        } else if rest.starts_with('[') {
            let close = find_matching_bracket(rest).ok_or_else(invalid)?;
            let inner = parse_expression(&rest[1..close])?;
            segments.push(Segment::Index(Box::new(inner)));
            rest = &rest[close + 1..];
        } else {
            return Err(invalid());
        }
    }

    Ok(VariablePath {
        root,
        segments,
        raw: s.to_string(),
    })
}

/// Returns the byte offset of the `]` closing the `[` at the start of `s`.
fn find_matching_bracket(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, ch) in s.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

// ── Quote-aware splitting ───────────────────────────────────────────

/// Splits on `sep` outside quotes, brackets and parentheses.
pub(crate) fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut depth = 0usize;

    for (i, ch) in s.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                result.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    result.push(&s[start..]);
    result
}

/// Finds the first `target` that is not inside quotes.
pub(crate) fn find_unquoted(s: &str, target: char) -> Option<usize> {
    let mut quote: Option<char> = None;

    for (i, ch) in s.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, c) if c == target => return Some(i),
            _ => {}
        }
    }
    None
}

/// Splits on whitespace outside quotes.
pub(crate) fn split_fragments(s: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;

    for (i, ch) in s.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, c) if c.is_whitespace() => {
                if let Some(st) = start.take() {
                    result.push(&s[st..i]);
                }
            }
            (None, c) => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                start.get_or_insert(i);
            }
        }
    }
    if let Some(st) = start {
        result.push(&s[st..]);
    }
    result
}

// ── Variables and filter chains ─────────────────────────────────────

/// A filter invocation inside a variable: `name: arg, arg`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCall {
    /// The filter name, e.g. `upcase` or `truncate`.
    pub name: String,
    /// Argument expressions, resolved at render time.
    pub args: Vec<Expression>,
}

/// An expression followed by zero or more filters.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// The base expression. `None` for empty markup such as `{{ }}`.
    pub expression: Option<Expression>,
    /// Filters applied left to right.
    pub filters: Vec<FilterCall>,
}

impl Variable {
    /// Resolves the expression and runs it through the filter chain.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by filter implementations. Unknown filters
    /// are not errors.
    pub fn evaluate(&self, context: &Context) -> LiquidResult<Value> {
        let mut value = self
            .expression
            .as_ref()
            .map_or(Value::Nil, |e| e.evaluate(context));

        for filter in &self.filters {
            let args: Vec<Value> = filter.args.iter().map(|a| a.evaluate(context)).collect();
            value = context.filters().apply(&filter.name, &value, &args)?;
        }
        Ok(value)
    }
}

/// Parses variable markup: `expression | filter: arg | filter`.
///
/// # Errors
///
/// Returns [`LiquidError::Syntax`] for an invalid base expression, an empty
/// filter name or an invalid filter argument.
pub fn parse_variable(markup: &str) -> LiquidResult<Variable> {
    let parts = split_unquoted(markup, '|');
    let base = parts[0].trim();
    let expression = if base.is_empty() {
        None
    } else {
        Some(parse_expression(base)?)
    };

    let filters = parts[1..]
        .iter()
        .map(|part| parse_filter_call(part.trim(), markup))
        .collect::<LiquidResult<Vec<_>>>()?;

    Ok(Variable {
        expression,
        filters,
    })
}

fn parse_filter_call(s: &str, markup: &str) -> LiquidResult<FilterCall> {
    let (name, arg_str) = match find_unquoted(s, ':') {
        Some(colon) => (s[..colon].trim(), Some(s[colon + 1..].trim())),
        None => (s, None),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(LiquidError::syntax(
            format!("Invalid filter name '{name}'"),
            markup,
        ));
    }

    let args = match arg_str {
        Some(a) if !a.is_empty() => split_unquoted(a, ',')
            .into_iter()
            .map(parse_expression)
            .collect::<LiquidResult<Vec<_>>>()?,
        _ => Vec::new(),
    };

    Ok(FilterCall {
        name: name.to_string(),
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(parse_expression("nil").unwrap(), Expression::Literal(Value::Nil));
        assert_eq!(parse_expression("null").unwrap(), Expression::Literal(Value::Nil));
        assert_eq!(parse_expression("").unwrap(), Expression::Literal(Value::Nil));
        assert_eq!(
            parse_expression("true").unwrap(),
            Expression::Literal(Value::Bool(true))
        );
        assert_eq!(
            parse_expression("'hi there'").unwrap(),
            Expression::Literal(Value::from("hi there"))
        );
        assert_eq!(
            parse_expression("\"x\"").unwrap(),
            Expression::Literal(Value::from("x"))
        );
        assert_eq!(
            parse_expression("-12").unwrap(),
            Expression::Literal(Value::Integer(-12))
        );
        assert_eq!(
            parse_expression("3.25").unwrap(),
            Expression::Literal(Value::Float(3.25))
        );
    }

    #[test]
    fn test_dotted_path() {
        let Expression::Path(path) = parse_expression("product.title").unwrap() else {
            panic!("Expected path");
        };
        assert_eq!(path.root, "product");
        assert_eq!(path.segments, vec![Segment::Key("title".into())]);
        assert_eq!(path.raw, "product.title");
    }

    #[test]
    fn test_bracket_path() {
        let Expression::Path(path) = parse_expression("items[0].name").unwrap() else {
            panic!("Expected path");
        };
        assert_eq!(path.root, "items");
        assert_eq!(path.segments.len(), 2);
        assert_eq!(
            path.segments[0],
            Segment::Index(Box::new(Expression::Literal(Value::Integer(0))))
        );
    }

    #[test]
    fn test_nested_bracket_path() {
        let Expression::Path(path) = parse_expression("a[b[\"c]\"]]").unwrap() else {
            panic!("Expected path");
        };
        assert_eq!(path.segments.len(), 1);
    }

    #[test]
    fn test_question_mark_names() {
        assert!(matches!(
            parse_expression("product.available?").unwrap(),
            Expression::Path(_)
        ));
    }

    #[test]
    fn test_invalid_path() {
        assert!(matches!(
            parse_expression("a..b"),
            Err(LiquidError::Syntax(_))
        ));
        assert!(parse_expression("a b").is_err());
        assert!(parse_expression("items[0").is_err());
    }

    #[test]
    fn test_range_and_array() {
        assert!(matches!(
            parse_expression("(1..5)").unwrap(),
            Expression::Range(_, _)
        ));
        let Expression::Array(items) = parse_expression("[1, 'a', x]").unwrap() else {
            panic!("Expected array");
        };
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_range_evaluation() {
        let mut ctx = Context::new();
        ctx.set("n", 3);
        let range = parse_expression("(1..n)").unwrap();
        assert_eq!(range.range(&ctx), Some((1, 3)));
        assert_eq!(
            range.evaluate(&ctx),
            Value::List(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
        );
        assert_eq!(parse_expression("x").unwrap().range(&ctx), None);
    }

    #[test]
    fn test_oversized_range_is_nil() {
        let ctx = Context::new();
        let range = parse_expression("(1..9999999999)").unwrap();
        assert_eq!(range.evaluate(&ctx), Value::Nil);
        assert_eq!(range.range(&ctx), Some((1, 9_999_999_999)));
    }

    #[test]
    fn test_split_unquoted() {
        assert_eq!(split_unquoted("a | 'b|c' | d", '|'), vec!["a ", " 'b|c' ", " d"]);
        assert_eq!(split_unquoted("x[1,2], y", ','), vec!["x[1,2]", " y"]);
    }

    #[test]
    fn test_find_unquoted() {
        assert_eq!(find_unquoted("'a:b': c", ':'), Some(5));
        assert_eq!(find_unquoted("no colon", ':'), None);
    }

    #[test]
    fn test_split_fragments() {
        assert_eq!(
            split_fragments("a == 'b c'  and x"),
            vec!["a", "==", "'b c'", "and", "x"]
        );
    }

    #[test]
    fn test_parse_variable_with_filters() {
        let var = parse_variable(" name | upcase | truncate: 10, '..' ").unwrap();
        assert!(var.expression.is_some());
        assert_eq!(var.filters.len(), 2);
        assert_eq!(var.filters[0].name, "upcase");
        assert_eq!(var.filters[1].name, "truncate");
        assert_eq!(var.filters[1].args.len(), 2);
    }

    #[test]
    fn test_parse_variable_pipe_in_string() {
        let var = parse_variable("'a|b' | size").unwrap();
        assert_eq!(
            var.expression,
            Some(Expression::Literal(Value::from("a|b")))
        );
        assert_eq!(var.filters.len(), 1);
    }

    #[test]
    fn test_parse_variable_empty() {
        let var = parse_variable("  ").unwrap();
        assert!(var.expression.is_none());
        assert!(var.filters.is_empty());
    }

    #[test]
    fn test_parse_variable_bad_filter_name() {
        assert!(parse_variable("x | ").is_err());
    }

    #[test]
    fn test_evaluate_range() {
        let ctx = Context::new();
        let expr = parse_expression("(2..4)").unwrap();
        assert_eq!(
            expr.evaluate(&ctx),
            Value::List(vec![Value::Integer(2), Value::Integer(3), Value::Integer(4)])
        );
    }

    #[test]
    fn test_raw_round_trips_markup() {
        assert_eq!(parse_expression("a.b[0]").unwrap().raw(), "a.b[0]");
        assert_eq!(parse_expression("'x'").unwrap().raw(), "'x'");
    }
}
