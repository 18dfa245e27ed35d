//! Block parser.
//!
//! Turns the token stream produced by the [lexer](crate::lexer) into a tree of
//! [`Node`]s. Block tags consume tokens recursively through
//! [`Parser::parse_until`], which stops at one of the caller's delimiter tags
//! (`else`, `elsif`, `when`, the block's `end` tag) and hands it back.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use liquid_rs_core::error::{LiquidError, LiquidResult};
use liquid_rs_core::logging::parse_span;

use crate::context::Context;
use crate::expression::{parse_variable, Variable};
use crate::file_system::FileSystem;
use crate::lexer::{tokenize, Token};
use crate::library::TagParser;
use crate::tags::{Tag, TagKind};

static TAG_MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*(\w+)\s*(.*?)\s*$").expect("tag markup regex is valid"));

/// A node of the compiled template tree.
#[derive(Debug)]
pub enum Node {
    /// Literal text, emitted unchanged.
    Text(String),
    /// `{{ expression | filters }}`.
    Variable(Variable),
    /// A tag node.
    Tag(Tag),
}

impl Node {
    /// Renders this node into `output`.
    pub fn render(&self, context: &mut Context, output: &mut String) -> LiquidResult<()> {
        match self {
            Self::Text(text) => output.push_str(text),
            Self::Variable(variable) => {
                output.push_str(&variable.evaluate(context)?.to_liquid_string());
            }
            Self::Tag(tag) => tag.render(context, output)?,
        }
        Ok(())
    }
}

/// Renders a node list into `output`.
pub fn render_nodes(nodes: &[Node], context: &mut Context, output: &mut String) -> LiquidResult<()> {
    for node in nodes {
        node.render(context, output)?;
    }
    Ok(())
}

/// Renders a node list into a new string.
pub fn render_to_string(nodes: &[Node], context: &mut Context) -> LiquidResult<String> {
    let mut output = String::new();
    render_nodes(nodes, context, &mut output)?;
    Ok(output)
}

/// Splits tag markup into its name and the rest.
pub(crate) fn split_tag_markup(markup: &str) -> Option<(&str, &str)> {
    let caps = TAG_MARKUP.captures(markup)?;
    let name = caps.get(1)?.as_str();
    let rest = caps.get(2).map_or("", |m| m.as_str());
    Some((name, rest))
}

/// The tokens left to parse, consumed front to back.
#[derive(Debug, Default)]
pub struct TokenStream {
    tokens: VecDeque<Token>,
}

impl TokenStream {
    /// Tokenizes `source`.
    pub fn new(source: &str) -> Self {
        Self {
            tokens: tokenize(source).into(),
        }
    }

    /// Removes and returns the next token.
    pub fn shift(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }

    /// Returns `true` when every token has been consumed.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// The delimiter tag that ended a [`Parser::parse_until`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    /// The tag name, e.g. `else` or `endif`.
    pub name: String,
    /// The markup after the tag name.
    pub markup: String,
}

/// Parse-time state: registered custom tags, the file system used by
/// `include`, and the current include nesting.
pub struct Parser<'a> {
    custom_tags: &'a HashMap<String, Arc<dyn TagParser>>,
    file_system: &'a dyn FileSystem,
    max_include_depth: usize,
    include_depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser at include depth zero.
    pub fn new(
        custom_tags: &'a HashMap<String, Arc<dyn TagParser>>,
        file_system: &'a dyn FileSystem,
        max_include_depth: usize,
    ) -> Self {
        Self {
            custom_tags,
            file_system,
            max_include_depth,
            include_depth: 0,
        }
    }

    /// Parses a complete document.
    pub fn parse_document(&mut self, source: &str) -> LiquidResult<Vec<Node>> {
        let mut tokens = TokenStream::new(source);
        let (nodes, _) = self.parse_until(&mut tokens, None, &[])?;
        Ok(nodes)
    }

    /// Parses nodes until one of `delimiters` is reached.
    ///
    /// `block` names the enclosing block tag for error messages, or `None` at
    /// document level. Inside a block, running out of tokens is
    /// [`LiquidError::UnterminatedBlock`]; at document level it simply ends
    /// the parse and the returned delimiter is `None`.
    pub fn parse_until(
        &mut self,
        tokens: &mut TokenStream,
        block: Option<&str>,
        delimiters: &[&str],
    ) -> LiquidResult<(Vec<Node>, Option<Delimiter>)> {
        let mut nodes = Vec::new();

        while let Some(token) = tokens.shift() {
            match token {
                Token::Literal(text) => {
                    if text == "{{" || text == "{%" {
                        return Err(LiquidError::syntax(
                            format!("Markup starting with '{text}' was not properly terminated"),
                            format!("{text}{}", peek_text(tokens)),
                        ));
                    }
                    nodes.push(Node::Text(text));
                }
                Token::Variable(markup) => {
                    nodes.push(Node::Variable(parse_variable(&markup)?));
                }
                Token::Tag(markup) => {
                    let Some((name, rest)) = split_tag_markup(&markup) else {
                        return Err(LiquidError::syntax(
                            "Tag was not properly terminated",
                            format!("{{%{markup}%}}"),
                        ));
                    };

                    if delimiters.contains(&name) {
                        return Ok((
                            nodes,
                            Some(Delimiter {
                                name: name.to_string(),
                                markup: rest.to_string(),
                            }),
                        ));
                    }

                    nodes.push(self.parse_tag(name, rest, &markup, block, tokens)?);
                }
            }
        }

        match block {
            Some(tag) => Err(LiquidError::UnterminatedBlock {
                tag: tag.to_string(),
            }),
            None => Ok((nodes, None)),
        }
    }

    fn parse_tag(
        &mut self,
        name: &str,
        rest: &str,
        markup: &str,
        block: Option<&str>,
        tokens: &mut TokenStream,
    ) -> LiquidResult<Node> {
        if let Some(kind) = TagKind::from_name(name) {
            return kind.parse(rest, self, tokens).map(Node::Tag);
        }

        if let Some(tag_parser) = self.custom_tags.get(name).cloned() {
            let mut body = BlockBody {
                parser: self,
                tokens,
            };
            return tag_parser.parse(name, rest, &mut body).map(|t| Node::Tag(Tag::Custom(t)));
        }

        match block {
            Some(block) if name.starts_with("end") => Err(LiquidError::syntax(
                format!("'{name}' is not a valid delimiter for {block} tags. use end{block}"),
                format!("{{%{markup}%}}"),
            )),
            _ => Err(LiquidError::UnknownTag {
                tag: name.to_string(),
                markup: format!("{{%{markup}%}}"),
            }),
        }
    }

    /// Reads, tokenizes and parses an included template one level deeper.
    pub(crate) fn parse_include(&mut self, name: &str) -> LiquidResult<Vec<Node>> {
        if self.include_depth >= self.max_include_depth {
            return Err(LiquidError::IncludeDepthExceeded {
                name: name.to_string(),
                depth: self.max_include_depth,
            });
        }

        let span = parse_span(name, self.include_depth + 1);
        let _guard = span.enter();
        let source = self.file_system.read_template(name)?;

        let mut child = Parser {
            custom_tags: self.custom_tags,
            file_system: self.file_system,
            max_include_depth: self.max_include_depth,
            include_depth: self.include_depth + 1,
        };
        child.parse_document(&source)
    }
}

fn peek_text(tokens: &TokenStream) -> String {
    match tokens.tokens.front() {
        Some(Token::Literal(text)) => text.clone(),
        _ => String::new(),
    }
}

/// Access to the remaining token stream for custom block tags.
pub struct BlockBody<'p, 'a> {
    parser: &'p mut Parser<'a>,
    tokens: &'p mut TokenStream,
}

impl BlockBody<'_, '_> {
    /// Parses the tag body until one of `delimiters`. See [`Parser::parse_until`].
    pub fn parse_until(
        &mut self,
        tag: &str,
        delimiters: &[&str],
    ) -> LiquidResult<(Vec<Node>, Option<Delimiter>)> {
        self.parser.parse_until(self.tokens, Some(tag), delimiters)
    }
}
