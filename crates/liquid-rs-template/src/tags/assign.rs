use once_cell::sync::Lazy;
use regex::Regex;

use liquid_rs_core::error::{LiquidError, LiquidResult};

use crate::context::Context;
use crate::expression::{parse_variable, Variable};
use crate::parser::{render_nodes, Node, Parser, TokenStream};

static ASSIGN_SYNTAX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*([\w\-]+)\s*=\s*(.+?)\s*$").expect("assign regex is valid")
});

static CAPTURE_SYNTAX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w+)\s*$").expect("capture regex is valid"));

/// `{% assign name = value | filter %}`: binds in the innermost scope.
#[derive(Debug)]
pub struct Assign {
    name: String,
    value: Variable,
}

impl Assign {
    pub(crate) fn parse(markup: &str) -> LiquidResult<Self> {
        let caps = ASSIGN_SYNTAX.captures(markup).ok_or_else(|| {
            LiquidError::syntax(
                "Syntax Error in 'assign' - Valid syntax: assign [var] = [source]",
                markup,
            )
        })?;
        Ok(Self {
            name: caps[1].to_string(),
            value: parse_variable(&caps[2])?,
        })
    }

    pub(crate) fn render(&self, context: &mut Context) -> LiquidResult<()> {
        let value = self.value.evaluate(context)?;
        context.set(self.name.as_str(), value);
        Ok(())
    }
}

/// `{% capture name %}...{% endcapture %}`: renders the body and binds the
/// result as a string in the scope the tag runs in.
#[derive(Debug)]
pub struct Capture {
    name: String,
    body: Vec<Node>,
}

impl Capture {
    pub(crate) fn parse(
        markup: &str,
        parser: &mut Parser<'_>,
        tokens: &mut TokenStream,
    ) -> LiquidResult<Self> {
        let caps = CAPTURE_SYNTAX.captures(markup).ok_or_else(|| {
            LiquidError::syntax(
                "Syntax Error in 'capture' - Valid syntax: capture [var]",
                markup,
            )
        })?;
        let (body, _) = parser.parse_until(tokens, Some("capture"), &["endcapture"])?;
        Ok(Self {
            name: caps[1].to_string(),
            body,
        })
    }

    pub(crate) fn render(&self, context: &mut Context) -> LiquidResult<()> {
        let mut captured = String::new();
        context.stack(|ctx| render_nodes(&self.body, ctx, &mut captured))?;
        context.set(self.name.as_str(), captured);
        Ok(())
    }
}
