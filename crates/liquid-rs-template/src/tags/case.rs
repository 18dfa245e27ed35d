use liquid_rs_core::error::{LiquidError, LiquidResult};

use super::condition::{compare, Operator};
use crate::context::Context;
use crate::expression::{parse_expression, split_fragments, split_unquoted, Expression};
use crate::parser::{render_nodes, Node, Parser, TokenStream};

const DELIMITERS: [&str; 3] = ["when", "else", "endcase"];

/// `{% case %}` / `{% when %}` / `{% else %}`.
///
/// Every `when` clause matching the switch value renders, not only the first.
#[derive(Debug)]
pub struct Case {
    subject: Expression,
    whens: Vec<(Vec<Expression>, Vec<Node>)>,
    else_body: Option<Vec<Node>>,
}

impl Case {
    pub(crate) fn parse(
        markup: &str,
        parser: &mut Parser<'_>,
        tokens: &mut TokenStream,
    ) -> LiquidResult<Self> {
        if markup.trim().is_empty() {
            return Err(LiquidError::syntax(
                "Syntax Error in 'case' - Valid syntax: case [condition]",
                markup,
            ));
        }
        let subject = parse_expression(markup)?;

        // Anything between `case` and the first `when` is dropped.
        let (_, mut delimiter) = parser.parse_until(tokens, Some("case"), &DELIMITERS)?;

        let mut whens = Vec::new();
        let mut else_body = None;

        while let Some(current) = delimiter.take() {
            match current.name.as_str() {
                "when" => {
                    let values = parse_when_values(&current.markup)?;
                    let (body, next) = parser.parse_until(tokens, Some("case"), &DELIMITERS)?;
                    whens.push((values, body));
                    delimiter = next;
                }
                "else" => {
                    let (body, next) = parser.parse_until(tokens, Some("case"), &DELIMITERS)?;
                    else_body = Some(body);
                    delimiter = next;
                }
                _ => {}
            }
        }

        Ok(Self {
            subject,
            whens,
            else_body,
        })
    }

    pub(crate) fn render(&self, context: &mut Context, output: &mut String) -> LiquidResult<()> {
        let subject = self.subject.evaluate(context);
        let mut matched = false;

        for (values, body) in &self.whens {
            let hit = values
                .iter()
                .any(|v| compare(&subject, Operator::Eq, &v.evaluate(context)));
            if hit {
                matched = true;
                context.stack(|ctx| render_nodes(body, ctx, output))?;
            }
        }

        if !matched {
            if let Some(body) = &self.else_body {
                context.stack(|ctx| render_nodes(body, ctx, output))?;
            }
        }
        Ok(())
    }
}

/// Parses `a, b or c` into its values.
fn parse_when_values(markup: &str) -> LiquidResult<Vec<Expression>> {
    let values = split_unquoted(markup, ',')
        .into_iter()
        .flat_map(split_fragments)
        .filter(|fragment| *fragment != "or")
        .map(parse_expression)
        .collect::<LiquidResult<Vec<_>>>()?;

    if values.is_empty() {
        return Err(LiquidError::syntax(
            "Syntax Error in 'when' - Valid when condition: when [condition]",
            markup,
        ));
    }
    Ok(values)
}
