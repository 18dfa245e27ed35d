//! Integration tests for the `render` and `check` commands.

use std::path::PathBuf;

use liquid_rs_cli::command::CommandRegistry;
use liquid_rs_cli::commands::register_builtin_commands;
use liquid_rs_cli::load_settings;
use liquid_rs_core::{LiquidError, LiquidResult, Settings};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("liquid_rs_cli_test_{name}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn run(args: &[&str]) -> LiquidResult<String> {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);

    let mut argv = vec!["liquid"];
    argv.extend_from_slice(args);
    let matches = registry.build_cli().try_get_matches_from(argv).unwrap();

    let mut out = Vec::new();
    registry.execute(&matches, &Settings::default(), &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

// ── render ──────────────────────────────────────────────────────────

#[test]
fn test_render_with_inline_data() {
    let dir = scratch_dir("render_inline");
    let page = dir.join("page.liquid");
    std::fs::write(&page, "Hello {{ name | upcase }}!").unwrap();

    let output = run(&["render", page.to_str().unwrap(), "--data", r#"{"name": "ada"}"#]).unwrap();
    assert_eq!(output, "Hello ADA!");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_render_with_data_file() {
    let dir = scratch_dir("render_data_file");
    let page = dir.join("page.liquid");
    let data = dir.join("data.json");
    std::fs::write(&page, "{% for i in items %}{{ i }}{% endfor %}").unwrap();
    std::fs::write(&data, r#"{"items": [1, 2, 3]}"#).unwrap();

    let output = run(&[
        "render",
        page.to_str().unwrap(),
        "--data-file",
        data.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(output, "123");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_render_with_partials() {
    let dir = scratch_dir("render_partials");
    let partials = dir.join("partials");
    std::fs::create_dir_all(&partials).unwrap();
    std::fs::write(partials.join("_badge.liquid"), "[{{ badge }}]").unwrap();
    let page = dir.join("page.liquid");
    std::fs::write(&page, "{% include 'badge' with label %}").unwrap();

    let output = run(&[
        "render",
        page.to_str().unwrap(),
        "--templates",
        partials.to_str().unwrap(),
        "--data",
        r#"{"label": "new"}"#,
    ])
    .unwrap();
    assert_eq!(output, "[new]");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_render_rejects_non_object_data() {
    let dir = scratch_dir("render_bad_data");
    let page = dir.join("page.liquid");
    std::fs::write(&page, "x").unwrap();

    let result = run(&["render", page.to_str().unwrap(), "--data", "[1]"]);
    assert!(matches!(result, Err(LiquidError::Configuration(_))));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_render_missing_file() {
    let result = run(&["render", "/nonexistent/liquid_rs_cli/page.liquid"]);
    assert!(matches!(result, Err(LiquidError::Io(_))));
}

// ── check ───────────────────────────────────────────────────────────

#[test]
fn test_check_valid_template() {
    let dir = scratch_dir("check_valid");
    let page = dir.join("page.liquid");
    std::fs::write(&page, "{% if a %}{{ a }}{% endif %}").unwrap();

    let path = page.to_str().unwrap();
    assert_eq!(run(&["check", path]).unwrap(), format!("{path}: ok\n"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_check_reports_syntax_errors() {
    let dir = scratch_dir("check_invalid");
    let page = dir.join("page.liquid");
    std::fs::write(&page, "{% if a %}never closed").unwrap();

    let err = run(&["check", page.to_str().unwrap()]).unwrap_err();
    assert!(err.is_parse_error());

    std::fs::remove_dir_all(&dir).ok();
}

// ── settings ────────────────────────────────────────────────────────

#[test]
fn test_load_settings_from_config_flag() {
    let dir = scratch_dir("settings");
    let config = dir.join("liquid.toml");
    std::fs::write(&config, "debug = true\nmax_include_depth = 4\n").unwrap();

    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);
    let matches = registry
        .build_cli()
        .try_get_matches_from(["liquid", "--config", config.to_str().unwrap(), "check", "x"])
        .unwrap();

    let settings = load_settings(&matches).unwrap();
    assert!(settings.debug);
    assert_eq!(settings.max_include_depth, 4);

    std::fs::remove_dir_all(&dir).ok();
}
