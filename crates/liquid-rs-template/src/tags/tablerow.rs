use liquid_rs_core::error::LiquidResult;

use super::for_loop::{loop_metadata, LoopHeader};
use crate::context::Context;
use crate::parser::{render_nodes, Node, Parser, TokenStream};
use crate::value::Value;

/// `{% tablerow item in collection cols: n %}`: renders an HTML table body,
/// one `<td>` per item and a new `<tr>` every `cols` cells.
#[derive(Debug)]
pub struct TableRow {
    header: LoopHeader,
    body: Vec<Node>,
}

impl TableRow {
    pub(crate) fn parse(
        markup: &str,
        parser: &mut Parser<'_>,
        tokens: &mut TokenStream,
    ) -> LiquidResult<Self> {
        let header = LoopHeader::parse("tablerow", markup)?;
        let (body, _) = parser.parse_until(tokens, Some("tablerow"), &["endtablerow"])?;
        Ok(Self { header, body })
    }

    pub(crate) fn render(&self, context: &mut Context, output: &mut String) -> LiquidResult<()> {
        let from = self.header.offset(context);
        let limit = self.header.limit(context);
        let items = self.header.items(context).segment(from, limit);
        if items.is_empty() {
            return Ok(());
        }

        let length = items.len();
        let cols = self
            .header
            .integer("cols", context)
            .and_then(|c| usize::try_from(c).ok())
            .filter(|c| *c > 0)
            .unwrap_or(length);

        context.stack(|ctx| {
            output.push_str("<tr class=\"row1\">\n");
            for (index0, item) in items.into_values(false).enumerate() {
                let col0 = index0 % cols;
                let row = index0 / cols + 1;

                let mut meta = loop_metadata(&self.header.name, index0, length);
                meta.insert("col".to_string(), Value::from(col0 + 1));
                meta.insert("col0".to_string(), Value::from(col0));
                meta.insert("col_first".to_string(), Value::Bool(col0 == 0));
                meta.insert("col_last".to_string(), Value::Bool(col0 + 1 == cols));
                meta.insert("row".to_string(), Value::from(row));

                ctx.set(self.header.variable.as_str(), item);
                ctx.set("tablerowloop", Value::Dict(meta));

                output.push_str(&format!("<td class=\"col{}\">", col0 + 1));
                render_nodes(&self.body, ctx, output)?;
                output.push_str("</td>");

                if col0 + 1 == cols && index0 + 1 != length {
                    output.push_str(&format!("</tr>\n<tr class=\"row{}\">", row + 1));
                }
            }
            output.push_str("</tr>\n");
            Ok(())
        })
    }
}
