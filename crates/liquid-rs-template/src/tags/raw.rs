use liquid_rs_core::error::{LiquidError, LiquidResult};

use crate::lexer::Token;
use crate::parser::{split_tag_markup, TokenStream};

fn tag_name(token: &Token) -> Option<&str> {
    match token {
        Token::Tag(markup) => split_tag_markup(markup).map(|(name, _)| name),
        _ => None,
    }
}

/// `{% raw %}...{% endraw %}`: the body is emitted exactly as written.
#[derive(Debug)]
pub struct Raw {
    pub(crate) body: String,
}

impl Raw {
    pub(crate) fn parse(tokens: &mut TokenStream) -> LiquidResult<Self> {
        let mut body = String::new();
        while let Some(token) = tokens.shift() {
            if tag_name(&token) == Some("endraw") {
                return Ok(Self { body });
            }
            body.push_str(&token.source());
        }
        Err(LiquidError::UnterminatedBlock {
            tag: "raw".to_string(),
        })
    }
}

/// Consumes a `{% comment %}` body without parsing it. Nested comments are
/// balanced.
pub(crate) fn skip_comment(tokens: &mut TokenStream) -> LiquidResult<()> {
    let mut depth = 1usize;
    while let Some(token) = tokens.shift() {
        match tag_name(&token) {
            Some("comment") => depth += 1,
            Some("endcomment") => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
    Err(LiquidError::UnterminatedBlock {
        tag: "comment".to_string(),
    })
}
