//! Template engine: parsing and rendering.
//!
//! [`Template`] is a compiled node tree. It is parsed once and can be
//! rendered any number of times, from any number of threads, each render with
//! its own [`Context`]. [`Engine`] carries what parsing and rendering need
//! from the host: the file system for includes, custom tags, filters and the
//! include depth limit.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use liquid_rs_core::error::LiquidResult;
use liquid_rs_core::logging::{parse_span, render_span};
use liquid_rs_core::settings::Settings;

use crate::context::Context;
use crate::file_system::{BlankFileSystem, FileSystem, LocalFileSystem};
use crate::filters::{Filter, FilterRegistry};
use crate::library::{Library, TagParser};
use crate::parser::{render_nodes, Node, Parser};
use crate::value::Value;

/// Span name used for templates that were not loaded by name.
const INLINE: &str = "<inline>";

/// A compiled template.
///
/// # Examples
///
/// ```
/// use liquid_rs_template::engine::Template;
///
/// let template = Template::parse("Hello {{ name | upcase }}!").unwrap();
/// let output = template
///     .render_with([("name", "world")], Vec::new(), Vec::<(String, String)>::new())
///     .unwrap();
/// assert_eq!(output, "Hello WORLD!");
/// ```
#[derive(Debug)]
pub struct Template {
    name: Option<String>,
    nodes: Vec<Node>,
}

impl Template {
    /// Parses `source` with no includes and no custom tags.
    ///
    /// # Errors
    ///
    /// Returns a parse error ([`LiquidError::is_parse_error`]) for invalid markup.
    ///
    /// [`LiquidError::is_parse_error`]: liquid_rs_core::error::LiquidError::is_parse_error
    pub fn parse(source: &str) -> LiquidResult<Self> {
        Engine::new().parse(source)
    }

    /// The name the template was loaded under, if it came from a file system.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The compiled top-level nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Renders the template with `context`.
    ///
    /// Registers and global-scope assignments made during the render stay in
    /// the context.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by filters and custom tags.
    pub fn render(&self, context: &mut Context) -> LiquidResult<String> {
        let span = render_span(self.name.as_deref().unwrap_or(INLINE), self.nodes.len());
        let _guard = span.enter();

        let mut output = String::new();
        render_nodes(&self.nodes, context, &mut output)?;
        tracing::debug!(bytes = output.len(), "rendered template");
        Ok(output)
    }

    /// Renders with a fresh context built from `assigns`, extra `filters` and
    /// initial `registers`.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by filters.
    pub fn render_with<A, K, V, R, RK, RV>(
        &self,
        assigns: A,
        filters: Vec<Arc<dyn Filter>>,
        registers: R,
    ) -> LiquidResult<String>
    where
        A: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
        R: IntoIterator<Item = (RK, RV)>,
        RK: Into<String>,
        RV: Into<Value>,
    {
        let mut context = Context::new();
        for filter in filters {
            context.filters_mut().register(filter);
        }
        for (k, v) in registers {
            context.set_register(k, v);
        }
        context.merge(assigns);
        self.render(&mut context)
    }
}

/// Parse-time and render-time configuration for templates.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use liquid_rs_template::engine::Engine;
/// use liquid_rs_template::file_system::MemoryFileSystem;
///
/// let fs = MemoryFileSystem::new();
/// fs.add("greeting", "Hi {{ greeting }}!");
///
/// let engine = Engine::new().with_file_system(Arc::new(fs));
/// let template = engine.parse("{% include 'greeting' with name %}").unwrap();
///
/// let mut ctx = engine.new_context();
/// ctx.set("name", "Ada");
/// assert_eq!(template.render(&mut ctx).unwrap(), "Hi Ada!");
/// ```
pub struct Engine {
    file_system: Arc<dyn FileSystem>,
    tags: HashMap<String, Arc<dyn TagParser>>,
    filters: FilterRegistry,
    max_include_depth: usize,
}

impl Engine {
    /// Creates an engine with the built-in filters and no includes.
    pub fn new() -> Self {
        Self {
            file_system: Arc::new(BlankFileSystem),
            tags: HashMap::new(),
            filters: FilterRegistry::with_builtins(),
            max_include_depth: Settings::default().max_include_depth,
        }
    }

    /// Creates an engine from settings. A non-empty `template_dirs` installs a
    /// [`LocalFileSystem`] over those directories.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut engine = Self::new();
        if !settings.template_dirs.is_empty() {
            engine.file_system = Arc::new(LocalFileSystem::from_settings(settings));
        }
        engine.max_include_depth = settings.max_include_depth;
        engine
    }

    /// Replaces the file system used by `include` and [`get_template`](Self::get_template).
    #[must_use]
    pub fn with_file_system(mut self, file_system: Arc<dyn FileSystem>) -> Self {
        self.file_system = file_system;
        self
    }

    /// Sets the maximum include nesting.
    #[must_use]
    pub const fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Registers a custom tag.
    pub fn register_tag(&mut self, name: impl Into<String>, parser: Arc<dyn TagParser>) {
        self.tags.insert(name.into(), parser);
    }

    /// Registers a filter available to every context this engine creates.
    pub fn register_filter(&mut self, filter: Arc<dyn Filter>) {
        self.filters.register(filter);
    }

    /// Installs every filter and tag of a library.
    pub fn register_library(&mut self, library: &Library) {
        tracing::debug!(library = library.name(), "registering library");
        for filter in library.filters() {
            self.filters.register(Arc::clone(filter));
        }
        for (name, parser) in library.tags() {
            self.tags.insert(name.clone(), Arc::clone(parser));
        }
    }

    /// Parses `source`.
    ///
    /// # Errors
    ///
    /// Returns a parse error for invalid markup or includes that cannot be
    /// resolved.
    pub fn parse(&self, source: &str) -> LiquidResult<Template> {
        self.parse_named(None, source)
    }

    fn parse_named(&self, name: Option<&str>, source: &str) -> LiquidResult<Template> {
        let span = parse_span(name.unwrap_or(INLINE), 0);
        let _guard = span.enter();

        let mut parser = Parser::new(&self.tags, self.file_system.as_ref(), self.max_include_depth);
        let nodes = parser.parse_document(source)?;
        tracing::debug!(bytes = source.len(), nodes = nodes.len(), "parsed template");
        Ok(Template {
            name: name.map(str::to_string),
            nodes,
        })
    }

    /// Loads `name` through the file system and parses it.
    ///
    /// # Errors
    ///
    /// Returns the file system's error if the template cannot be read, or a
    /// parse error.
    pub fn get_template(&self, name: &str) -> LiquidResult<Template> {
        let source = self.file_system.read_template(name)?;
        self.parse_named(Some(name), &source)
    }

    /// Creates a context holding this engine's filters.
    pub fn new_context(&self) -> Context {
        Context::with_filters(self.filters.clone())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.tags.keys().collect();
        tags.sort();
        f.debug_struct("Engine")
            .field("tags", &tags)
            .field("filters", &self.filters)
            .field("max_include_depth", &self.max_include_depth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_system::MemoryFileSystem;
    use liquid_rs_core::error::LiquidError;

    fn render(source: &str) -> String {
        let template = Template::parse(source).unwrap();
        template.render(&mut Context::new()).unwrap()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(render("just text"), "just text");
    }

    #[test]
    fn test_render_with_assigns_and_registers() {
        let template = Template::parse("{{ a }}-{{ b }}").unwrap();
        let output = template
            .render_with(
                [("a", Value::from(1)), ("b", Value::from("two"))],
                Vec::new(),
                [("page", "home")],
            )
            .unwrap();
        assert_eq!(output, "1-two");
    }

    #[test]
    fn test_render_with_extra_filter() {
        let template = Template::parse("{{ 'x' | shout }}").unwrap();
        let shout: Arc<dyn Filter> = Arc::new(crate::filters::FnFilter::new("shout", |v, _| {
            Ok(Value::from(format!("{v}!")))
        }));
        let output = template
            .render_with(Vec::<(String, Value)>::new(), vec![shout], Vec::<(String, Value)>::new())
            .unwrap();
        assert_eq!(output, "x!");
    }

    #[test]
    fn test_engine_filters_reach_contexts() {
        let mut engine = Engine::new();
        engine.register_filter(Arc::new(crate::filters::FnFilter::new("twice", |v, _| {
            Ok(Value::from(format!("{v}{v}")))
        })));
        let template = engine.parse("{{ 'ab' | twice }}").unwrap();
        let mut ctx = engine.new_context();
        assert_eq!(template.render(&mut ctx).unwrap(), "abab");
    }

    #[test]
    fn test_get_template_through_file_system() {
        let fs = MemoryFileSystem::new();
        fs.add("page", "{{ title }}");
        let engine = Engine::new().with_file_system(Arc::new(fs));
        let template = engine.get_template("page").unwrap();
        assert_eq!(template.name(), Some("page"));

        let mut ctx = engine.new_context();
        ctx.set("title", "Home");
        assert_eq!(template.render(&mut ctx).unwrap(), "Home");
    }

    #[test]
    fn test_get_template_missing() {
        let engine = Engine::new();
        assert!(matches!(
            engine.get_template("page"),
            Err(LiquidError::MissingInclude(_))
        ));
    }

    #[test]
    fn test_from_settings_uses_local_file_system() {
        let dir = std::env::temp_dir().join("liquid_rs_test_engine_settings");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("_nav.liquid"), "nav").unwrap();

        let settings = Settings {
            template_dirs: vec![dir.clone()],
            ..Settings::default()
        };
        let engine = Engine::from_settings(&settings);
        let template = engine.parse("[{% include 'nav' %}]").unwrap();
        assert_eq!(template.render(&mut engine.new_context()).unwrap(), "[nav]");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_template_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Template>();
        assert_send_sync::<Engine>();
    }
}
