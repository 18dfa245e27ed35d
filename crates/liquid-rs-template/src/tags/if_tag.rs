use liquid_rs_core::error::LiquidResult;

use super::condition::Condition;
use crate::context::Context;
use crate::parser::{render_nodes, Node, Parser, TokenStream};

/// `{% if %}` / `{% unless %}` with `elsif` and `else` branches.
#[derive(Debug)]
pub struct If {
    /// Branches in source order; the first whose condition holds renders.
    branches: Vec<(Condition, Vec<Node>)>,
    else_body: Option<Vec<Node>>,
    /// `unless`: the first condition is negated.
    negate_first: bool,
}

impl If {
    pub(crate) fn parse(
        tag: &str,
        markup: &str,
        parser: &mut Parser<'_>,
        tokens: &mut TokenStream,
    ) -> LiquidResult<Self> {
        let end = format!("end{tag}");
        let delimiters = ["elsif", "else", end.as_str()];

        let mut branches = Vec::new();
        let mut else_body = None;
        let mut condition = Condition::parse(markup)?;

        loop {
            let (body, delimiter) = parser.parse_until(tokens, Some(tag), &delimiters)?;
            branches.push((condition, body));

            let Some(delimiter) = delimiter else { break };
            match delimiter.name.as_str() {
                "elsif" => condition = Condition::parse(&delimiter.markup)?,
                "else" => {
                    let (body, _) = parser.parse_until(tokens, Some(tag), &[end.as_str()])?;
                    else_body = Some(body);
                    break;
                }
                _ => break,
            }
        }

        Ok(Self {
            branches,
            else_body,
            negate_first: tag == "unless",
        })
    }

    pub(crate) fn render(&self, context: &mut Context, output: &mut String) -> LiquidResult<()> {
        for (i, (condition, body)) in self.branches.iter().enumerate() {
            let mut holds = condition.evaluate(context);
            if i == 0 && self.negate_first {
                holds = !holds;
            }
            if holds {
                return context.stack(|ctx| render_nodes(body, ctx, output));
            }
        }

        match &self.else_body {
            Some(body) => context.stack(|ctx| render_nodes(body, ctx, output)),
            None => Ok(()),
        }
    }
}
