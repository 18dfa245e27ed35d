use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use liquid_rs_core::error::{LiquidError, LiquidResult};

use crate::context::Context;
use crate::expression::{parse_expression, Expression};
use crate::parser::{render_nodes, Node, Parser, TokenStream};
use crate::value::Value;

/// `item in collection` followed by the rest of the markup.
static LOOP_SYNTAX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)^\s*(\w+)\s+in\s+(\([^)]*\)|\[[^\]]*\]|"[^"]*"|'[^']*'|[^\s,]+)\s*(.*)$"#)
        .expect("loop syntax regex is valid")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\w+)\s*:\s*("[^"]*"|'[^']*'|[^\s,]+)"#).expect("attribute regex is valid")
});

/// The header shared by `for` and `tablerow`.
#[derive(Debug)]
pub(crate) struct LoopHeader {
    pub(crate) variable: String,
    pub(crate) collection: Expression,
    /// `variable-collection`, the key of the `offset: continue` register.
    pub(crate) name: String,
    pub(crate) attributes: BTreeMap<String, LoopAttribute>,
    pub(crate) reversed: bool,
}

#[derive(Debug)]
pub(crate) enum LoopAttribute {
    Expr(Expression),
    /// `offset: continue`
    Continue,
}

impl LoopHeader {
    pub(crate) fn parse(tag: &str, markup: &str) -> LiquidResult<Self> {
        let caps = LOOP_SYNTAX.captures(markup).ok_or_else(|| {
            LiquidError::syntax(
                format!("Syntax Error in '{tag}' - Valid syntax: {tag} [item] in [collection]"),
                markup,
            )
        })?;

        let variable = caps[1].to_string();
        let collection_markup = caps[2].to_string();
        let rest = caps.get(3).map_or("", |m| m.as_str());

        let mut attributes = BTreeMap::new();
        for attr in ATTRIBUTE.captures_iter(rest) {
            let value = if &attr[1] == "offset" && &attr[2] == "continue" {
                LoopAttribute::Continue
            } else {
                LoopAttribute::Expr(parse_expression(&attr[2])?)
            };
            attributes.insert(attr[1].to_string(), value);
        }
        let reversed = rest.split_whitespace().any(|word| word == "reversed");

        Ok(Self {
            name: format!("{variable}-{collection_markup}"),
            collection: parse_expression(&collection_markup)?,
            variable,
            attributes,
            reversed,
        })
    }

    fn attribute(&self, name: &str, context: &Context) -> Option<i64> {
        match self.attributes.get(name)? {
            LoopAttribute::Expr(expr) => expr.evaluate(context).as_integer(),
            LoopAttribute::Continue => None,
        }
    }

    /// Evaluates the collection. Dicts yield `[key, value]` pairs and ranges
    /// stay as bounds.
    pub(crate) fn items(&self, context: &Context) -> LoopItems {
        if let Some((start, end)) = self.collection.range(context) {
            return LoopItems::Range { start, end };
        }
        LoopItems::List(match self.collection.evaluate(context) {
            Value::List(items) => items,
            Value::Dict(map) => map
                .into_iter()
                .map(|(k, v)| Value::List(vec![Value::String(k), v]))
                .collect(),
            Value::Nil => Vec::new(),
            Value::String(s) if s.is_empty() => Vec::new(),
            other => vec![other],
        })
    }

    /// The `offset`, honoring `offset: continue`.
    pub(crate) fn offset(&self, context: &Context) -> usize {
        let offset = match self.attributes.get("offset") {
            Some(LoopAttribute::Continue) => context
                .register_entry("for", &self.name)
                .as_integer()
                .unwrap_or(0),
            Some(LoopAttribute::Expr(_)) => self.attribute("offset", context).unwrap_or(0),
            None => 0,
        };
        usize::try_from(offset).unwrap_or(0)
    }

    /// The `limit`, if one was given.
    pub(crate) fn limit(&self, context: &Context) -> Option<usize> {
        self.attributes
            .get("limit")
            .map(|_| usize::try_from(self.attribute("limit", context).unwrap_or(0)).unwrap_or(0))
    }

    /// An integer attribute other than `offset`/`limit`, such as `cols`.
    pub(crate) fn integer(&self, name: &str, context: &Context) -> Option<i64> {
        self.attribute(name, context)
    }
}

/// The items a loop walks over.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LoopItems {
    /// `start..=end`, empty when `start > end`.
    Range { start: i64, end: i64 },
    List(Vec<Value>),
}

impl LoopItems {
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Range { start, end } if start <= end => {
                usize::try_from(i128::from(*end) - i128::from(*start) + 1).unwrap_or(usize::MAX)
            }
            Self::Range { .. } => 0,
            Self::List(items) => items.len(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keeps `limit` items starting at `from`. Ranges are cut arithmetically.
    pub(crate) fn segment(self, from: usize, limit: Option<usize>) -> Self {
        let len = self.len();
        match self {
            Self::List(items) => Self::List(segment(items, from, limit)),
            Self::Range { start, .. } => {
                let skip = from.min(len);
                let count = limit.map_or(len - skip, |l| l.min(len - skip));
                if count == 0 {
                    return Self::Range { start: 1, end: 0 };
                }
                // Both offsets are within the original range, so they fit in an i64.
                let first = i128::from(start) + i128::try_from(skip).unwrap_or(0);
                let last = first + i128::try_from(count - 1).unwrap_or(0);
                Self::Range {
                    start: i64::try_from(first).unwrap_or(i64::MAX),
                    end: i64::try_from(last).unwrap_or(i64::MAX),
                }
            }
        }
    }

    /// Yields the items in order, or back to front when `reversed`.
    pub(crate) fn into_values(self, reversed: bool) -> Box<dyn Iterator<Item = Value>> {
        match (self, reversed) {
            (Self::Range { start, end }, false) => Box::new((start..=end).map(Value::Integer)),
            (Self::Range { start, end }, true) => {
                Box::new((start..=end).rev().map(Value::Integer))
            }
            (Self::List(items), false) => Box::new(items.into_iter()),
            (Self::List(items), true) => Box::new(items.into_iter().rev()),
        }
    }
}

/// Cuts `items[from..from + limit]`, clamped to the list.
pub(crate) fn segment(mut items: Vec<Value>, from: usize, limit: Option<usize>) -> Vec<Value> {
    let len = items.len();
    let start = from.min(len);
    let end = limit.map_or(len, |l| start.saturating_add(l).min(len));
    items.truncate(end);
    items.drain(..start);
    items
}

/// The iteration metadata shared by `forloop` and `tablerowloop`.
pub(crate) fn loop_metadata(name: &str, index0: usize, length: usize) -> BTreeMap<String, Value> {
    let mut meta = BTreeMap::new();
    meta.insert("name".to_string(), Value::from(name));
    meta.insert("length".to_string(), Value::from(length));
    meta.insert("index".to_string(), Value::from(index0 + 1));
    meta.insert("index0".to_string(), Value::from(index0));
    meta.insert("rindex".to_string(), Value::from(length - index0));
    meta.insert("rindex0".to_string(), Value::from(length - index0 - 1));
    meta.insert("first".to_string(), Value::Bool(index0 == 0));
    meta.insert("last".to_string(), Value::Bool(index0 + 1 == length));
    meta
}

/// `{% for %}` with an optional `{% else %}` body.
#[derive(Debug)]
pub struct For {
    header: LoopHeader,
    body: Vec<Node>,
    else_body: Option<Vec<Node>>,
}

impl For {
    pub(crate) fn parse(
        markup: &str,
        parser: &mut Parser<'_>,
        tokens: &mut TokenStream,
    ) -> LiquidResult<Self> {
        let header = LoopHeader::parse("for", markup)?;
        let (body, delimiter) = parser.parse_until(tokens, Some("for"), &["else", "endfor"])?;
        let else_body = match delimiter {
            Some(d) if d.name == "else" => {
                Some(parser.parse_until(tokens, Some("for"), &["endfor"])?.0)
            }
            _ => None,
        };

        Ok(Self {
            header,
            body,
            else_body,
        })
    }

    pub(crate) fn render(&self, context: &mut Context, output: &mut String) -> LiquidResult<()> {
        let items = self.header.items(context);
        if items.is_empty() {
            return match &self.else_body {
                Some(body) => context.stack(|ctx| render_nodes(body, ctx, output)),
                None => Ok(()),
            };
        }

        let from = self.header.offset(context);
        let limit = self.header.limit(context);
        let segment = items.segment(from, limit);
        let length = segment.len();

        context.set_register_entry("for", &self.header.name, Value::from(from.saturating_add(length)));

        context.stack(|ctx| {
            for (index0, item) in segment.into_values(self.header.reversed).enumerate() {
                ctx.set(self.header.variable.as_str(), item);
                ctx.set(
                    "forloop",
                    Value::Dict(loop_metadata(&self.header.name, index0, length)),
                );
                render_nodes(&self.body, ctx, output)?;
            }
            Ok(())
        })
    }
}
