//! # liquid-rs-template
//!
//! The Liquid template language engine: a tokenizer, a recursive block parser
//! producing a node tree, a scoped render context, control-flow tags and a
//! filter pipeline.
//!
//! ## Modules
//!
//! - [`lexer`] - Splits source text into literal, tag and variable tokens
//! - [`parser`] - Builds the node tree and renders it
//! - [`expression`] - Literals, variable paths and filter chains
//! - [`value`] - The dynamic [`Value`](value::Value) type
//! - [`context`] - Scopes, registers and variable resolution
//! - [`drop`] - Host objects with a restricted attribute surface
//! - [`tags`] - Built-in tags
//! - [`filters`] - Built-in filters and the filter registry
//! - [`file_system`] - Template sources for `include`
//! - [`library`] - Custom tags and filter libraries
//! - [`engine`] - The [`Template`](engine::Template) and [`Engine`](engine::Engine) entry points

pub mod context;
pub mod drop;
pub mod engine;
pub mod expression;
pub mod file_system;
pub mod filters;
pub mod lexer;
pub mod library;
pub mod parser;
pub mod tags;
pub mod value;

pub use context::Context;
pub use engine::{Engine, Template};
pub use value::Value;
