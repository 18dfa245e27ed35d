//! Integration tests for host extensions: custom tags, filters and libraries.

use std::sync::Arc;

use liquid_rs_core::error::{LiquidError, LiquidResult};
use liquid_rs_template::context::Context;
use liquid_rs_template::expression::{parse_expression, Expression};
use liquid_rs_template::library::{BlockBody, CustomTag, Library, TagParser};
use liquid_rs_template::parser::{render_nodes, render_to_string, Node};
use liquid_rs_template::{Engine, Value};

// ── A block tag ─────────────────────────────────────────────────────

/// `{% shout %}...{% endshout %}`: renders its body upper-cased.
#[derive(Debug)]
struct Shout {
    body: Vec<Node>,
}

impl CustomTag for Shout {
    fn render(&self, context: &mut Context, output: &mut String) -> LiquidResult<()> {
        let inner = context.stack(|ctx| render_to_string(&self.body, ctx))?;
        output.push_str(&inner.to_uppercase());
        Ok(())
    }
}

struct ShoutParser;

impl TagParser for ShoutParser {
    fn parse(
        &self,
        tag: &str,
        _markup: &str,
        body: &mut BlockBody<'_, '_>,
    ) -> LiquidResult<Box<dyn CustomTag>> {
        let end = format!("end{tag}");
        let (nodes, _) = body.parse_until(tag, &[end.as_str()])?;
        Ok(Box::new(Shout { body: nodes }))
    }
}

// ── A tag with an argument and a delimiter ──────────────────────────

/// `{% repeat n %}body{% separator %}sep{% endrepeat %}`.
#[derive(Debug)]
struct Repeat {
    times: Expression,
    body: Vec<Node>,
    separator: Vec<Node>,
}

impl CustomTag for Repeat {
    fn render(&self, context: &mut Context, output: &mut String) -> LiquidResult<()> {
        let times = self.times.evaluate(context).as_integer().unwrap_or(0);
        for i in 0..times {
            if i > 0 {
                render_nodes(&self.separator, context, output)?;
            }
            render_nodes(&self.body, context, output)?;
        }
        Ok(())
    }
}

struct RepeatParser;

impl TagParser for RepeatParser {
    fn parse(
        &self,
        tag: &str,
        markup: &str,
        body: &mut BlockBody<'_, '_>,
    ) -> LiquidResult<Box<dyn CustomTag>> {
        if markup.is_empty() {
            return Err(LiquidError::syntax("repeat requires a count", markup));
        }
        let times = parse_expression(markup)?;
        let (nodes, delimiter) = body.parse_until(tag, &["separator", "endrepeat"])?;
        let separator = match delimiter {
            Some(d) if d.name == "separator" => body.parse_until(tag, &["endrepeat"])?.0,
            _ => Vec::new(),
        };
        Ok(Box::new(Repeat {
            times,
            body: nodes,
            separator,
        }))
    }
}

fn engine() -> Engine {
    let mut engine = Engine::new();
    engine.register_tag("shout", Arc::new(ShoutParser));
    engine.register_tag("repeat", Arc::new(RepeatParser));
    engine
}

fn render(engine: &Engine, source: &str) -> String {
    let template = engine.parse(source).unwrap();
    let mut ctx = engine.new_context();
    ctx.set("name", "ada");
    ctx.set("n", 3);
    template.render(&mut ctx).unwrap()
}

#[test]
fn test_custom_block_tag() {
    assert_eq!(
        render(&engine(), "Hi {% shout %}{{ name }}!{% endshout %}"),
        "Hi ADA!"
    );
}

#[test]
fn test_custom_block_tag_nests_builtin_tags() {
    assert_eq!(
        render(
            &engine(),
            "{% shout %}{% for i in (1..2) %}{{ name }}{% endfor %}{% endshout %}"
        ),
        "ADAADA"
    );
}

#[test]
fn test_custom_tag_with_intermediate_delimiter() {
    assert_eq!(
        render(&engine(), "{% repeat n %}x{% separator %},{% endrepeat %}"),
        "x,x,x"
    );
    assert_eq!(render(&engine(), "{% repeat 2 %}y{% endrepeat %}"), "yy");
}

#[test]
fn test_custom_tag_errors() {
    let engine = engine();
    assert!(matches!(
        engine.parse("{% repeat %}x{% endrepeat %}"),
        Err(LiquidError::Syntax(_))
    ));
    assert!(matches!(
        engine.parse("{% shout %}never closed"),
        Err(LiquidError::UnterminatedBlock { ref tag }) if tag == "shout"
    ));
}

#[test]
fn test_custom_tags_are_per_engine() {
    assert!(matches!(
        Engine::new().parse("{% shout %}x{% endshout %}"),
        Err(LiquidError::UnknownTag { .. })
    ));
}

// ── Libraries ───────────────────────────────────────────────────────

#[test]
fn test_library_filters_and_simple_tags() {
    let mut lib = Library::new("shop");
    lib.register_filter("money", |value, _| {
        Ok(Value::from(format!(
            "${:.2}",
            value.as_float().unwrap_or(0.0)
        )))
    });
    lib.register_simple_tag("join_args", |args| {
        args.iter()
            .map(Value::to_liquid_string)
            .collect::<Vec<_>>()
            .join("+")
    });

    let mut engine = Engine::new();
    engine.register_library(&lib);

    let template = engine
        .parse("{{ price | money }} {% join_args 1, name, 'z' %}")
        .unwrap();
    let mut ctx = engine.new_context();
    ctx.set("price", 12.5);
    ctx.set("name", "ada");
    assert_eq!(template.render(&mut ctx).unwrap(), "$12.50 1+ada+z");
}

#[test]
fn test_custom_filter_overrides_builtin() {
    let mut engine = Engine::new();
    engine.register_filter(Arc::new(liquid_rs_template::filters::FnFilter::new(
        "upcase",
        |_, _| Ok(Value::from("overridden")),
    )));
    let template = engine.parse("{{ 'a' | upcase }}").unwrap();
    assert_eq!(
        template.render(&mut engine.new_context()).unwrap(),
        "overridden"
    );
}
