//! Built-in template tags.
//!
//! Tag names are resolved through a closed set ([`TagKind`]); anything else is
//! looked up among the custom tags registered on the engine.
//!
//! ## Supported Tags
//!
//! ### Control Flow
//! - `{% if %}` / `{% elsif %}` / `{% else %}` / `{% endif %}`
//! - `{% unless %}` / `{% endunless %}`
//! - `{% case %}` / `{% when %}` / `{% else %}` / `{% endcase %}`
//!
//! ### Iteration
//! - `{% for %}` / `{% else %}` / `{% endfor %}`
//! - `{% tablerow %}` / `{% endtablerow %}`
//! - `{% cycle %}`
//!
//! ### Variables
//! - `{% assign name = value | filter %}`
//! - `{% capture name %}` / `{% endcapture %}`
//!
//! ### Composition
//! - `{% include 'name' with value key: value %}`
//!
//! ### Verbatim
//! - `{% comment %}` / `{% endcomment %}`
//! - `{% raw %}` / `{% endraw %}`
//!
//! ## The `forloop` Variable
//!
//! | Variable | Description |
//! |---|---|
//! | `forloop.name` | `variable-collection`, the loop's register key |
//! | `forloop.length` | Number of iterations |
//! | `forloop.index` | 1-based iteration count |
//! | `forloop.index0` | 0-based iteration count |
//! | `forloop.rindex` | Iterations left, including this one |
//! | `forloop.rindex0` | Iterations left, excluding this one |
//! | `forloop.first` | `true` on the first iteration |
//! | `forloop.last` | `true` on the last iteration |

pub mod condition;

mod assign;
mod case;
mod cycle;
mod for_loop;
mod if_tag;
mod include;
mod raw;
mod tablerow;

use liquid_rs_core::error::LiquidResult;

use crate::context::Context;
use crate::library::CustomTag;
use crate::parser::{Parser, TokenStream};

pub use assign::{Assign, Capture};
pub use case::Case;
pub use cycle::Cycle;
pub use for_loop::For;
pub use if_tag::If;
pub use include::Include;
pub use raw::Raw;
pub use tablerow::TableRow;

/// A compiled tag node.
#[derive(Debug)]
pub enum Tag {
    /// `{% assign %}`
    Assign(Assign),
    /// `{% capture %}`
    Capture(Capture),
    /// `{% comment %}`; renders nothing.
    Comment,
    /// `{% raw %}`
    Raw(Raw),
    /// `{% cycle %}`
    Cycle(Cycle),
    /// `{% for %}`
    For(For),
    /// `{% if %}` and `{% unless %}`
    If(If),
    /// `{% case %}`
    Case(Case),
    /// `{% include %}`
    Include(Include),
    /// `{% tablerow %}`
    TableRow(TableRow),
    /// A host-registered tag.
    Custom(Box<dyn CustomTag>),
}

impl Tag {
    /// Renders the tag into `output`.
    pub fn render(&self, context: &mut Context, output: &mut String) -> LiquidResult<()> {
        match self {
            Self::Assign(tag) => tag.render(context),
            Self::Capture(tag) => tag.render(context),
            Self::Comment => Ok(()),
            Self::Raw(tag) => {
                output.push_str(&tag.body);
                Ok(())
            }
            Self::Cycle(tag) => tag.render(context, output),
            Self::For(tag) => tag.render(context, output),
            Self::If(tag) => tag.render(context, output),
            Self::Case(tag) => tag.render(context, output),
            Self::Include(tag) => tag.render(context, output),
            Self::TableRow(tag) => tag.render(context, output),
            Self::Custom(tag) => tag.render(context, output),
        }
    }
}

/// The built-in tag names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Assign,
    Capture,
    Comment,
    Raw,
    Cycle,
    For,
    If,
    Unless,
    Case,
    Include,
    TableRow,
}

impl TagKind {
    /// Every built-in tag.
    pub const ALL: [Self; 11] = [
        Self::Assign,
        Self::Capture,
        Self::Comment,
        Self::Raw,
        Self::Cycle,
        Self::For,
        Self::If,
        Self::Unless,
        Self::Case,
        Self::Include,
        Self::TableRow,
    ];

    /// Looks up a built-in tag by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The name the tag is written as.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Capture => "capture",
            Self::Comment => "comment",
            Self::Raw => "raw",
            Self::Cycle => "cycle",
            Self::For => "for",
            Self::If => "if",
            Self::Unless => "unless",
            Self::Case => "case",
            Self::Include => "include",
            Self::TableRow => "tablerow",
        }
    }

    /// Parses the tag's markup and, for block tags, its body.
    pub fn parse(
        self,
        markup: &str,
        parser: &mut Parser<'_>,
        tokens: &mut TokenStream,
    ) -> LiquidResult<Tag> {
        match self {
            Self::Assign => Assign::parse(markup).map(Tag::Assign),
            Self::Capture => Capture::parse(markup, parser, tokens).map(Tag::Capture),
            Self::Comment => raw::skip_comment(tokens).map(|()| Tag::Comment),
            Self::Raw => Raw::parse(tokens).map(Tag::Raw),
            Self::Cycle => Cycle::parse(markup).map(Tag::Cycle),
            Self::For => For::parse(markup, parser, tokens).map(Tag::For),
            Self::If => If::parse("if", markup, parser, tokens).map(Tag::If),
            Self::Unless => If::parse("unless", markup, parser, tokens).map(Tag::If),
            Self::Case => Case::parse(markup, parser, tokens).map(Tag::Case),
            Self::Include => Include::parse(markup, parser).map(Tag::Include),
            Self::TableRow => TableRow::parse(markup, parser, tokens).map(Tag::TableRow),
        }
    }
}

/// Returns the names of all built-in tags.
pub fn builtin_tag_names() -> Vec<&'static str> {
    TagKind::ALL.iter().map(|kind| kind.name()).collect()
}
