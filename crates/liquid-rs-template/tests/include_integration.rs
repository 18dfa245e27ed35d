//! Integration tests for `{% include %}` and template file systems.

use std::sync::Arc;

use liquid_rs_core::error::LiquidError;
use liquid_rs_template::file_system::MemoryFileSystem;
use liquid_rs_template::{Context, Engine, Value};

fn engine_with(templates: &[(&str, &str)]) -> Engine {
    let fs = MemoryFileSystem::new();
    for (name, source) in templates {
        fs.add(*name, *source);
    }
    Engine::new().with_file_system(Arc::new(fs))
}

fn render(engine: &Engine, source: &str, data: serde_json::Value) -> String {
    let template = engine.parse(source).unwrap();
    let mut ctx = engine.new_context();
    if let Value::Dict(map) = Value::from(data) {
        ctx.merge(map);
    }
    template.render(&mut ctx).unwrap()
}

// ── Binding ─────────────────────────────────────────────────────────

#[test]
fn test_include_with_binds_template_name() {
    let engine = engine_with(&[("product", "{{ product.title }}")]);
    assert_eq!(
        render(
            &engine,
            "{% include 'product' with featured %}",
            serde_json::json!({"featured": {"title": "Hat"}})
        ),
        "Hat"
    );
}

#[test]
fn test_include_without_with_uses_same_named_variable() {
    let engine = engine_with(&[("product", "{{ product.title }}")]);
    assert_eq!(
        render(
            &engine,
            "{% include 'product' %}",
            serde_json::json!({"product": {"title": "Cap"}})
        ),
        "Cap"
    );
}

#[test]
fn test_include_for_iterates_list() {
    let engine = engine_with(&[("item", "<{{ item }}>")]);
    assert_eq!(
        render(
            &engine,
            "{% include 'item' for items %}",
            serde_json::json!({"items": ["a", "b"]})
        ),
        "<a><b>"
    );
}

#[test]
fn test_include_binds_last_path_component() {
    let engine = engine_with(&[("shop/card", "[{{ card }}]")]);
    assert_eq!(
        render(
            &engine,
            "{% include 'shop/card' with p %}",
            serde_json::json!({"p": "x"})
        ),
        "[x]"
    );
}

#[test]
fn test_include_attributes() {
    let engine = engine_with(&[("badge", "{{ color }}-{{ size }}")]);
    assert_eq!(
        render(
            &engine,
            "{% include 'badge', color: 'red', size: 2 %}",
            serde_json::json!({})
        ),
        "red-2"
    );
}

#[test]
fn test_include_attributes_do_not_leak() {
    let engine = engine_with(&[("badge", "{{ color }}-{{ size }}")]);
    assert_eq!(
        render(
            &engine,
            "{% include 'badge' color: 'red' %}[{{ color }}]",
            serde_json::json!({})
        ),
        "red-[]"
    );
}

#[test]
fn test_included_template_sees_outer_variables() {
    let engine = engine_with(&[("header", "<h1>{{ shop_name }}</h1>")]);
    assert_eq!(
        render(
            &engine,
            "{% include 'header' %}",
            serde_json::json!({"shop_name": "Acme"})
        ),
        "<h1>Acme</h1>"
    );
}

#[test]
fn test_nested_includes() {
    let engine = engine_with(&[("outer", "({% include 'inner' %})"), ("inner", "in")]);
    assert_eq!(
        render(&engine, "{% include 'outer' %}", serde_json::json!({})),
        "(in)"
    );
}

// ── Errors ──────────────────────────────────────────────────────────

#[test]
fn test_missing_include_fails_at_parse_time() {
    let engine = engine_with(&[]);
    let err = engine.parse("{% include 'nope' %}").unwrap_err();
    assert!(matches!(err, LiquidError::MissingInclude(_)));
    assert!(err.is_parse_error());
}

#[test]
fn test_default_engine_refuses_includes() {
    let err = liquid_rs_template::Template::parse("{% include 'x' %}").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing include: This liquid context does not allow includes."
    );
}

#[test]
fn test_recursive_include_hits_depth_limit() {
    let engine = engine_with(&[("loop", "{% include 'loop' %}")]).with_max_include_depth(5);
    let err = engine.parse("{% include 'loop' %}").unwrap_err();
    assert!(matches!(
        err,
        LiquidError::IncludeDepthExceeded { ref name, depth: 5 } if name == "loop"
    ));
}

#[test]
fn test_unquoted_include_name_is_syntax_error() {
    let engine = engine_with(&[("product", "x")]);
    assert!(matches!(
        engine.parse("{% include product %}"),
        Err(LiquidError::Syntax(_))
    ));
}

// ── Thread sharing ──────────────────────────────────────────────────

#[test]
fn test_template_renders_concurrently() {
    let engine = engine_with(&[("row", "{{ row }};")]);
    let template = Arc::new(engine.parse("{% include 'row' for rows %}").unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let template = Arc::clone(&template);
            std::thread::spawn(move || {
                let mut ctx = Context::new();
                ctx.set("rows", Value::from(vec![i, i + 1]));
                template.render(&mut ctx).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("{i};{};", i + 1));
    }
}
