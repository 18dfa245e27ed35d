use once_cell::sync::Lazy;
use regex::Regex;

use liquid_rs_core::error::{LiquidError, LiquidResult};

use crate::context::Context;
use crate::expression::{parse_expression, Expression};
use crate::parser::{render_nodes, Node, Parser};
use crate::value::Value;

static INCLUDE_SYNTAX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)^\s*("[^"]*"|'[^']*')\s*(?:(with|for)\s+("[^"]*"|'[^']*'|[^\s,]+))?\s*(.*)$"#)
        .expect("include regex is valid")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\w+)\s*:\s*("[^"]*"|'[^']*'|[^\s,]+)"#).expect("attribute regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    With,
    For,
}

/// `{% include 'name' [with|for value] [key: value]* %}`.
///
/// The included template is read through the engine's file system and
/// compiled when the including template is parsed.
#[derive(Debug)]
pub struct Include {
    template_name: String,
    variable: Option<(Binding, Expression)>,
    attributes: Vec<(String, Expression)>,
    nodes: Vec<Node>,
}

impl Include {
    pub(crate) fn parse(markup: &str, parser: &mut Parser<'_>) -> LiquidResult<Self> {
        let caps = INCLUDE_SYNTAX.captures(markup).ok_or_else(|| {
            LiquidError::syntax(
                "Error in tag 'include' - Valid syntax: include '[template]' (with|for) [object|collection]",
                markup,
            )
        })?;

        let quoted = &caps[1];
        let template_name = quoted[1..quoted.len() - 1].to_string();

        let variable = match (caps.get(2), caps.get(3)) {
            (Some(kind), Some(expr)) => {
                let binding = if kind.as_str() == "for" {
                    Binding::For
                } else {
                    Binding::With
                };
                Some((binding, parse_expression(expr.as_str())?))
            }
            _ => None,
        };

        let rest = caps.get(4).map_or("", |m| m.as_str());
        let attributes = ATTRIBUTE
            .captures_iter(rest)
            .map(|attr| Ok((attr[1].to_string(), parse_expression(&attr[2])?)))
            .collect::<LiquidResult<Vec<_>>>()?;

        let nodes = parser.parse_include(&template_name)?;

        Ok(Self {
            template_name,
            variable,
            attributes,
            nodes,
        })
    }

    /// The name the bound value is visible under: the last path component
    /// of the template name.
    fn bind_name(&self) -> &str {
        self.template_name
            .rsplit('/')
            .next()
            .unwrap_or(&self.template_name)
    }

    pub(crate) fn render(&self, context: &mut Context, output: &mut String) -> LiquidResult<()> {
        let attributes: Vec<(String, Value)> = self
            .attributes
            .iter()
            .map(|(k, expr)| (k.clone(), expr.evaluate(context)))
            .collect();
        let bound = match &self.variable {
            Some((_, expr)) => expr.evaluate(context),
            None => context.get(self.bind_name()),
        };
        let name = self.bind_name().to_string();

        context.stack(|ctx| {
            ctx.merge(attributes);
            match (&self.variable, bound) {
                (Some((Binding::For, _)), Value::List(items)) => {
                    for item in items {
                        ctx.set(name.as_str(), item);
                        render_nodes(&self.nodes, ctx, output)?;
                    }
                    Ok(())
                }
                (_, value) => {
                    ctx.set(name.as_str(), value);
                    render_nodes(&self.nodes, ctx, output)
                }
            }
        })
    }
}
