use liquid_rs_core::error::{LiquidError, LiquidResult};

use crate::context::Context;
use crate::expression::{find_unquoted, parse_expression, split_unquoted, Expression};

/// `{% cycle [group:] a, b, c %}`: emits the next value of the list each
/// time it renders. Positions live in `registers["cycle"]`, keyed by the
/// group name or, without a group, by the value markup.
#[derive(Debug)]
pub struct Cycle {
    group: Option<Expression>,
    key: String,
    values: Vec<Expression>,
}

impl Cycle {
    pub(crate) fn parse(markup: &str) -> LiquidResult<Self> {
        let (group, values_markup) = match find_unquoted(markup, ':') {
            Some(colon) => (
                Some(parse_expression(&markup[..colon])?),
                &markup[colon + 1..],
            ),
            None => (None, markup),
        };

        let raw_values: Vec<&str> = split_unquoted(values_markup, ',')
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();
        if raw_values.is_empty() {
            return Err(LiquidError::syntax(
                "Syntax Error in 'cycle' - Valid syntax: cycle [name :] var [, var2, var3 ...]",
                markup,
            ));
        }

        let values = raw_values
            .iter()
            .map(|v| parse_expression(v))
            .collect::<LiquidResult<Vec<_>>>()?;

        Ok(Self {
            group,
            key: raw_values.concat(),
            values,
        })
    }

    pub(crate) fn render(&self, context: &mut Context, output: &mut String) -> LiquidResult<()> {
        let key = self
            .group
            .as_ref()
            .map_or_else(|| self.key.clone(), |g| g.evaluate(context).to_liquid_string());

        let position = context
            .register_entry("cycle", &key)
            .as_integer()
            .and_then(|p| usize::try_from(p).ok())
            .unwrap_or(0)
            % self.values.len();

        output.push_str(&self.values[position].evaluate(context).to_liquid_string());
        context.set_register_entry("cycle", key, ((position + 1) % self.values.len()).into());
        Ok(())
    }
}
