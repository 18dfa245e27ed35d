//! Integration tests for parsing and rendering.
//!
//! Exercises the full pipeline: source -> tokens -> node tree -> output,
//! across tags, filters, scoping rules and error reporting.

use std::sync::Arc;

use liquid_rs_core::error::LiquidError;
use liquid_rs_template::drop::LazyDrop;
use liquid_rs_template::filters::FnFilter;
use liquid_rs_template::{Context, Template, Value};

fn context_from(data: serde_json::Value) -> Context {
    let mut ctx = Context::new();
    if let Value::Dict(map) = Value::from(data) {
        ctx.merge(map);
    }
    ctx
}

fn render(source: &str, data: serde_json::Value) -> String {
    let template = Template::parse(source).unwrap();
    template.render(&mut context_from(data)).unwrap()
}

// ── Variables ───────────────────────────────────────────────────────

#[test]
fn test_variable_output() {
    assert_eq!(
        render("Hello {{ name }}!", serde_json::json!({"name": "Ada"})),
        "Hello Ada!"
    );
}

#[test]
fn test_missing_paths_render_empty() {
    assert_eq!(render("[{{ a.b.c }}]", serde_json::json!({})), "[]");
    assert_eq!(render("[{{ missing | upcase }}]", serde_json::json!({})), "[]");
    assert_eq!(
        render("[{{ a.b.c }}]", serde_json::json!({"a": {"b": 1}})),
        "[]"
    );
}

#[test]
fn test_unknown_filter_passes_value_through() {
    assert_eq!(render("{{ \"x\" | nope }}", serde_json::json!({})), "x");
}

#[test]
fn test_filter_chain_with_arguments() {
    assert_eq!(
        render(
            "{{ 'hello world' | capitalize | replace: 'world', 'there' }}",
            serde_json::json!({})
        ),
        "Hello there"
    );
    assert_eq!(
        render("{{ price | times: 2 | plus: 1 }}", serde_json::json!({"price": 10})),
        "21"
    );
}

#[test]
fn test_filter_arguments_resolve_variables() {
    assert_eq!(
        render(
            "{{ greeting | append: name }}",
            serde_json::json!({"greeting": "Hi ", "name": "Ada"})
        ),
        "Hi Ada"
    );
}

#[test]
fn test_booleans_render_as_digits() {
    assert_eq!(render("{{ true }}{{ false }}", serde_json::json!({})), "10");
}

#[test]
fn test_empty_variable_markup_renders_nothing() {
    assert_eq!(render("a{{ }}b", serde_json::json!({})), "ab");
}

#[test]
fn test_bracket_and_size_lookups() {
    let data = serde_json::json!({
        "products": [{"title": "Hat"}, {"title": "Shirt"}, {"title": "Shoes"}],
        "key": "title"
    });
    assert_eq!(render("{{ products[1].title }}", data.clone()), "Shirt");
    assert_eq!(render("{{ products[-1].title }}", data.clone()), "Shoes");
    assert_eq!(render("{{ products[0][key] }}", data.clone()), "Hat");
    assert_eq!(render("{{ products.size }}", data.clone()), "3");
    assert_eq!(render("{{ products.first.title }}", data), "Hat");
}

// ── assign / capture / scoping ──────────────────────────────────────

#[test]
fn test_assign_with_filters() {
    assert_eq!(
        render("{% assign n = 3 | plus: 2 %}{{ n }}", serde_json::json!({})),
        "5"
    );
    assert_eq!(
        render("{% assign x = 'v' | upcase %}{{ x }}", serde_json::json!({})),
        "V"
    );
}

#[test]
fn test_capture() {
    assert_eq!(
        render(
            "{% capture greeting %}Hi {{ name }}{% endcapture %}{{ greeting }}!",
            serde_json::json!({"name": "Ada"})
        ),
        "Hi Ada!"
    );
}

#[test]
fn test_block_scopes_do_not_leak() {
    assert_eq!(
        render(
            "{% if true %}{% assign inner = 1 %}{% endif %}[{{ inner }}]",
            serde_json::json!({})
        ),
        "[]"
    );
    assert_eq!(
        render("{% for i in (1..2) %}{% endfor %}[{{ i }}]", serde_json::json!({})),
        "[]"
    );
}

#[test]
fn test_inner_assign_shadows_outer() {
    assert_eq!(
        render(
            "{% if true %}{% assign x = 'inner' %}{{ x }}{% endif %}-{{ x }}",
            serde_json::json!({"x": "outer"})
        ),
        "inner-outer"
    );
}

#[test]
fn test_context_stack_balanced_after_render() {
    let template =
        Template::parse("{% for i in (1..3) %}{% if i > 1 %}{{ i }}{% endif %}{% endfor %}")
            .unwrap();
    let mut ctx = Context::new();
    assert_eq!(template.render(&mut ctx).unwrap(), "23");
    assert_eq!(ctx.depth(), 1);
}

// ── if / unless ─────────────────────────────────────────────────────

#[test]
fn test_if_else() {
    assert_eq!(
        render("{% if false %}a{% else %}b{% endif %}", serde_json::json!({})),
        "b"
    );
    assert_eq!(
        render("{% if true %}a{% else %}b{% endif %}", serde_json::json!({})),
        "a"
    );
}

#[test]
fn test_elsif_chain() {
    let source = "{% if n > 10 %}big{% elsif n > 5 %}medium{% else %}small{% endif %}";
    assert_eq!(render(source, serde_json::json!({"n": 20})), "big");
    assert_eq!(render(source, serde_json::json!({"n": 7})), "medium");
    assert_eq!(render(source, serde_json::json!({"n": 1})), "small");
}

#[test]
fn test_unless() {
    let source = "{% unless flag %}off{% else %}on{% endunless %}";
    assert_eq!(render(source, serde_json::json!({"flag": false})), "off");
    assert_eq!(render(source, serde_json::json!({"flag": true})), "on");
}

#[test]
fn test_if_empty_keyword() {
    let source = "{% if items == empty %}empty{% else %}full{% endif %}";
    assert_eq!(render(source, serde_json::json!({"items": []})), "empty");
    assert_eq!(render(source, serde_json::json!({"items": [1]})), "full");
}

#[test]
fn test_if_orders_lists_against_empty() {
    let source = "{% if items > empty %}gt{% endif %}|{% if empty < items %}lt{% endif %}|\
                  {% if items >= empty %}ge{% endif %}";
    assert_eq!(render(source, serde_json::json!({"items": [1, 2]})), "gt|lt|ge");
    assert_eq!(render(source, serde_json::json!({"items": []})), "||ge");
}

#[test]
fn test_if_contains_and_logic() {
    let data = serde_json::json!({"title": "Pro Shirt", "tags": ["sale", "new"]});
    assert_eq!(
        render("{% if title contains 'Pro' %}yes{% endif %}", data.clone()),
        "yes"
    );
    assert_eq!(
        render(
            "{% if tags contains 'sale' and title contains 'Shirt' %}both{% endif %}",
            data.clone()
        ),
        "both"
    );
    assert_eq!(
        render("{% if tags contains 'old' or false %}x{% else %}y{% endif %}", data),
        "y"
    );
}

#[test]
fn test_unterminated_if_is_parse_error() {
    let err = Template::parse("{% if x %}never closed").unwrap_err();
    assert!(matches!(err, LiquidError::UnterminatedBlock { ref tag } if tag == "if"));
    assert!(err.is_parse_error());
}

#[test]
fn test_invalid_operator_is_parse_error() {
    assert!(matches!(
        Template::parse("{% if a =! b %}x{% endif %}"),
        Err(LiquidError::Syntax(_))
    ));
}

// ── case ────────────────────────────────────────────────────────────

#[test]
fn test_case_renders_every_matching_when() {
    let source = "{% case x %}{% when 1 %}one{% when 1, 2 %}also{% else %}none{% endcase %}";
    assert_eq!(render(source, serde_json::json!({"x": 1})), "onealso");
    assert_eq!(render(source, serde_json::json!({"x": 2})), "also");
    assert_eq!(render(source, serde_json::json!({"x": 3})), "none");
}

#[test]
fn test_case_when_with_or() {
    let source = "{% case size %}{% when 'S' or 'M' %}small{% when 'L' %}large{% endcase %}";
    assert_eq!(render(source, serde_json::json!({"size": "M"})), "small");
    assert_eq!(render(source, serde_json::json!({"size": "L"})), "large");
    assert_eq!(render(source, serde_json::json!({"size": "XL"})), "");
}

// ── for ─────────────────────────────────────────────────────────────

#[test]
fn test_forloop_metadata() {
    assert_eq!(
        render(
            "{% for i in items %}{{ forloop.index }}:{{ forloop.last }} {% endfor %}",
            serde_json::json!({"items": [1, 2, 3]})
        ),
        "1:0 2:0 3:1 "
    );
    assert_eq!(
        render(
            "{% for i in items %}{{ forloop.rindex }}{{ forloop.first }}{{ forloop.length }},{% endfor %}",
            serde_json::json!({"items": ["a", "b"]})
        ),
        "212,102,"
    );
}

#[test]
fn test_for_limit_offset_reversed() {
    assert_eq!(
        render(
            "{% for i in (1..6) limit: 2 offset: 1 %}{{ i }}{% endfor %}",
            serde_json::json!({})
        ),
        "23"
    );
    assert_eq!(
        render("{% for i in (1..3) reversed %}{{ i }}{% endfor %}", serde_json::json!({})),
        "321"
    );
}

#[test]
fn test_for_over_huge_range_only_walks_the_segment() {
    assert_eq!(
        render(
            "{% for i in (1..9999999999) limit: 2 %}{{ i }},{% endfor %}",
            serde_json::json!({})
        ),
        "1,2,"
    );
    assert_eq!(
        render(
            "{% for i in (1..n) offset: 9999999997 reversed %}{{ i }}{{ forloop.length }},{% endfor %}",
            serde_json::json!({"n": 9_999_999_999_i64})
        ),
        "99999999992,99999999982,"
    );
    assert_eq!(
        render(
            "{% tablerow i in (1..9999999999) limit: 1 %}{{ i }}{% endtablerow %}",
            serde_json::json!({})
        ),
        "<tr class=\"row1\">\n<td class=\"col1\">1</td></tr>\n"
    );
}

#[test]
fn test_huge_range_outside_loops_is_nil() {
    assert_eq!(
        render(
            "{% assign r = (1..9999999999) %}[{{ r | size }}]",
            serde_json::json!({})
        ),
        "[0]"
    );
}

#[test]
fn test_range_offset_continue() {
    let source = "{% for i in (1..5) limit: 2 %}{{ i }}{% endfor %};\
                  {% for i in (1..5) offset: continue %}{{ i }}{% endfor %}";
    assert_eq!(render(source, serde_json::json!({})), "12;345");
}

#[test]
fn test_for_offset_continue() {
    let source = "{% for i in items limit: 2 %}{{ i }}{% endfor %};\
                  {% for i in items limit: 2 offset: continue %}{{ i }}{% endfor %};\
                  {% for i in items offset: continue %}{{ i }}{% endfor %}";
    assert_eq!(
        render(source, serde_json::json!({"items": [1, 2, 3, 4, 5]})),
        "12;34;5"
    );
}

#[test]
fn test_for_else_on_empty_collection() {
    let source = "{% for i in list %}x{% else %}none{% endfor %}";
    assert_eq!(render(source, serde_json::json!({"list": []})), "none");
    assert_eq!(render(source, serde_json::json!({})), "none");
}

#[test]
fn test_for_over_range_with_variable_and_literal_list() {
    assert_eq!(
        render("{% for i in (1..n) %}{{ i }}{% endfor %}", serde_json::json!({"n": 3})),
        "123"
    );
    assert_eq!(
        render("{% for c in ['r', 'g'] %}{{ c }}{% endfor %}", serde_json::json!({})),
        "rg"
    );
}

#[test]
fn test_for_over_dict_yields_pairs() {
    assert_eq!(
        render(
            "{% for pair in h %}{{ pair[0] }}={{ pair[1] }};{% endfor %}",
            serde_json::json!({"h": {"b": 2, "a": 1}})
        ),
        "a=1;b=2;"
    );
}

// ── cycle ───────────────────────────────────────────────────────────

#[test]
fn test_cycle_wraps() {
    assert_eq!(
        render(
            "{% cycle 'a','b','c' %},{% cycle 'a','b','c' %},{% cycle 'a','b','c' %},{% cycle 'a','b','c' %}",
            serde_json::json!({})
        ),
        "a,b,c,a"
    );
}

#[test]
fn test_cycle_groups_are_independent() {
    assert_eq!(
        render(
            "{% cycle 'g1': 1, 2 %}{% cycle 'g2': 1, 2 %}{% cycle 'g1': 1, 2 %}",
            serde_json::json!({})
        ),
        "112"
    );
}

#[test]
fn test_cycle_in_loop() {
    assert_eq!(
        render(
            "{% for i in (1..4) %}{% cycle 'odd', 'even' %} {% endfor %}",
            serde_json::json!({})
        ),
        "odd even odd even "
    );
}

#[test]
fn test_registers_persist_across_renders_with_same_context() {
    let template = Template::parse("{% cycle 'a', 'b' %}").unwrap();
    let mut ctx = Context::new();
    assert_eq!(template.render(&mut ctx).unwrap(), "a");
    assert_eq!(template.render(&mut ctx).unwrap(), "b");
    assert_eq!(template.render(&mut Context::new()).unwrap(), "a");
}

// ── tablerow ────────────────────────────────────────────────────────

#[test]
fn test_tablerow() {
    assert_eq!(
        render(
            "{% tablerow i in items cols: 2 %}{{ i }}{% endtablerow %}",
            serde_json::json!({"items": [1, 2, 3]})
        ),
        "<tr class=\"row1\">\n<td class=\"col1\">1</td><td class=\"col2\">2</td></tr>\n\
         <tr class=\"row2\"><td class=\"col1\">3</td></tr>\n"
    );
}

#[test]
fn test_tablerowloop_variables() {
    assert_eq!(
        render(
            "{% tablerow i in items cols: 2 %}{{ tablerowloop.row }}{{ tablerowloop.col_last }}{% endtablerow %}",
            serde_json::json!({"items": ["a", "b"]})
        ),
        "<tr class=\"row1\">\n<td class=\"col1\">10</td><td class=\"col2\">11</td></tr>\n"
    );
}

#[test]
fn test_tablerow_empty_collection() {
    assert_eq!(
        render(
            "{% tablerow i in items %}{{ i }}{% endtablerow %}",
            serde_json::json!({"items": []})
        ),
        ""
    );
}

// ── raw / comment ───────────────────────────────────────────────────

#[test]
fn test_raw_emits_markup_verbatim() {
    assert_eq!(
        render("{% raw %}{{ not parsed }}{% if %}{% endraw %}", serde_json::json!({})),
        "{{ not parsed }}{% if %}"
    );
}

#[test]
fn test_nested_comments() {
    assert_eq!(
        render(
            "a{% comment %}{% if %}{% comment %}x{% endcomment %}{{ y }}{% endcomment %}b",
            serde_json::json!({})
        ),
        "ab"
    );
}

// ── Errors ──────────────────────────────────────────────────────────

#[test]
fn test_unknown_tag_error() {
    let err = Template::parse("{% frobnicate x %}").unwrap_err();
    assert_eq!(err.to_string(), "Unknown tag 'frobnicate' in: {% frobnicate x %}");
}

#[test]
fn test_unterminated_variable_error() {
    let err = Template::parse("Hi {{ name").unwrap_err();
    assert!(matches!(err, LiquidError::Syntax(_)));
}

#[test]
fn test_filter_errors_propagate() {
    let template = Template::parse("{{ 1 | fail }}").unwrap();
    let fail = FnFilter::new("fail", |_, _| {
        Err(LiquidError::Filter {
            name: "fail".into(),
            message: "always fails".into(),
        })
    });
    let mut ctx = Context::new();
    ctx.filters_mut().register(Arc::new(fail));
    let err = template.render(&mut ctx).unwrap_err();
    assert!(!err.is_parse_error());
    assert!(err.to_string().contains("always fails"));
}

// ── Determinism ─────────────────────────────────────────────────────

#[test]
fn test_parse_is_idempotent() {
    let source = "{% for p in products limit: 2 %}{{ p.title | upcase }}\
                  {% if p.price > 10 %}!{% endif %}{% cycle 'x', 'y' %}{% endfor %}";
    let first = format!("{:?}", Template::parse(source).unwrap().nodes());
    let second = format!("{:?}", Template::parse(source).unwrap().nodes());
    assert_eq!(first, second);
}

#[test]
fn test_render_is_deterministic_with_fresh_context() {
    let template = Template::parse(
        "{% for p in products %}{% cycle 'a', 'b' %}{{ p.title }}{% endfor %}",
    )
    .unwrap();
    let data = serde_json::json!({"products": [{"title": "Hat"}, {"title": "Cap"}]});
    let first = template.render(&mut context_from(data.clone())).unwrap();
    let second = template.render(&mut context_from(data)).unwrap();
    assert_eq!(first, "aHatbCap");
    assert_eq!(first, second);
}

// ── Drops ───────────────────────────────────────────────────────────

#[test]
fn test_drop_surface() {
    let product = LazyDrop::new("product")
        .attribute("title", |_| Value::from("Shirt"))
        .attribute("discounted", |ctx| {
            Value::Bool(ctx.get("sale").is_truthy())
        });
    let template = Template::parse(
        "{{ product.title }}|{{ product.secret }}|{{ product }}|{{ product.discounted }}",
    )
    .unwrap();
    let mut ctx = Context::new();
    ctx.set("product", Value::drop(product));
    ctx.set("sale", true);
    assert_eq!(template.render(&mut ctx).unwrap(), "Shirt||product|1");
}
