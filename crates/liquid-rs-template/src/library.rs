//! Custom tags and filter libraries.
//!
//! Hosts extend the engine in two ways:
//!
//! - [`TagParser`] / [`CustomTag`]: a full custom tag with its own markup
//!   grammar and, optionally, a body parsed through [`BlockBody`].
//! - [`Library`]: a named bundle of filters and simple tags, installed on an
//!   engine in one call.
//!
//! ## Examples
//!
//! ```
//! use liquid_rs_template::engine::Engine;
//! use liquid_rs_template::library::Library;
//! use liquid_rs_template::value::Value;
//!
//! let mut lib = Library::new("shop");
//! lib.register_filter("money", |value, _args| {
//!     Ok(Value::from(format!("${:.2}", value.as_float().unwrap_or(0.0))))
//! });
//! lib.register_simple_tag("greet", |args| {
//!     let name = args.first().map_or("World".to_string(), Value::to_liquid_string);
//!     format!("Hello, {name}!")
//! });
//!
//! let mut engine = Engine::new();
//! engine.register_library(&lib);
//!
//! let template = engine.parse("{% greet 'Ada' %} {{ 5 | money }}").unwrap();
//! let mut ctx = engine.new_context();
//! assert_eq!(template.render(&mut ctx).unwrap(), "Hello, Ada! $5.00");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use liquid_rs_core::error::LiquidResult;

use crate::context::Context;
use crate::expression::{parse_expression, split_unquoted, Expression};
use crate::filters::{Filter, FnFilter};
use crate::value::Value;

pub use crate::parser::BlockBody;

/// A compiled custom tag node.
pub trait CustomTag: fmt::Debug + Send + Sync {
    /// Renders the tag into `output`.
    fn render(&self, context: &mut Context, output: &mut String) -> LiquidResult<()>;
}

/// Compiles occurrences of a custom tag.
pub trait TagParser: Send + Sync {
    /// Parses one occurrence of the tag.
    ///
    /// `tag` is the tag name and `markup` the text after it. Block tags read
    /// their body with [`BlockBody::parse_until`].
    fn parse(
        &self,
        tag: &str,
        markup: &str,
        body: &mut BlockBody<'_, '_>,
    ) -> LiquidResult<Box<dyn CustomTag>>;
}

/// A simple tag function: receives the resolved arguments, returns the output.
pub type SimpleTagFn = fn(&[Value]) -> String;

/// A tag of the form `{% name arg, arg %}` backed by a [`SimpleTagFn`].
#[derive(Clone, Copy)]
pub struct SimpleTag {
    func: SimpleTagFn,
}

impl SimpleTag {
    /// Wraps `func`.
    pub const fn new(func: SimpleTagFn) -> Self {
        Self { func }
    }
}

impl TagParser for SimpleTag {
    fn parse(
        &self,
        tag: &str,
        markup: &str,
        _body: &mut BlockBody<'_, '_>,
    ) -> LiquidResult<Box<dyn CustomTag>> {
        let args = if markup.trim().is_empty() {
            Vec::new()
        } else {
            split_unquoted(markup, ',')
                .into_iter()
                .map(parse_expression)
                .collect::<LiquidResult<Vec<_>>>()?
        };
        Ok(Box::new(SimpleTagNode {
            name: tag.to_string(),
            args,
            func: self.func,
        }))
    }
}

struct SimpleTagNode {
    name: String,
    args: Vec<Expression>,
    func: SimpleTagFn,
}

impl fmt::Debug for SimpleTagNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleTagNode")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl CustomTag for SimpleTagNode {
    fn render(&self, context: &mut Context, output: &mut String) -> LiquidResult<()> {
        let args: Vec<Value> = self.args.iter().map(|a| a.evaluate(context)).collect();
        output.push_str(&(self.func)(&args));
        Ok(())
    }
}

/// A named collection of custom filters and tags.
pub struct Library {
    name: String,
    filters: Vec<Arc<dyn Filter>>,
    tags: HashMap<String, Arc<dyn TagParser>>,
}

impl Library {
    /// Creates an empty library.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
            tags: HashMap::new(),
        }
    }

    /// Returns the library name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a filter implementation.
    pub fn add_filter(&mut self, filter: Arc<dyn Filter>) {
        self.filters.push(filter);
    }

    /// Adds a closure filter.
    pub fn register_filter<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&Value, &[Value]) -> LiquidResult<Value> + Send + Sync + 'static,
    {
        self.add_filter(Arc::new(FnFilter::new(name, func)));
    }

    /// Adds a custom tag parser.
    pub fn register_tag(&mut self, name: impl Into<String>, parser: Arc<dyn TagParser>) {
        self.tags.insert(name.into(), parser);
    }

    /// Adds a simple tag.
    pub fn register_simple_tag(&mut self, name: impl Into<String>, func: SimpleTagFn) {
        self.register_tag(name, Arc::new(SimpleTag::new(func)));
    }

    /// The filters in this library.
    pub fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }

    /// The tags in this library, by name.
    pub const fn tags(&self) -> &HashMap<String, Arc<dyn TagParser>> {
        &self.tags
    }

    /// Returns `true` if the library defines the tag `name`.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// Returns `true` if the library defines the filter `name`.
    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.iter().any(|f| f.name() == name)
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filters: Vec<&str> = self.filters.iter().map(|f| f.name()).collect();
        let mut tags: Vec<&String> = self.tags.keys().collect();
        tags.sort();
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("filters", &filters)
            .field("tags", &tags)
            .finish()
    }
}
