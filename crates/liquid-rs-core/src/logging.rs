//! Logging for liquid-rs.
//!
//! [`setup_logging`] installs a [`tracing`] subscriber configured from
//! [`Settings`]. The engine tags its events with [`parse_span`] and
//! [`render_span`], so events from nested includes carry the name and depth
//! of the template that produced them.

use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// The `tracing` target of the template engine's events.
pub const ENGINE_TARGET: &str = "liquid_rs_template";

/// Builds the event filter for `settings`.
///
/// An unparsable `log_level` falls back to `info`. In debug mode the engine
/// target is raised to `debug` unless `log_level` already names it.
pub fn log_filter(settings: &Settings) -> EnvFilter {
    let filter =
        EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if !settings.debug || settings.log_level.contains(ENGINE_TARGET) {
        return filter;
    }
    match format!("{ENGINE_TARGET}=debug").parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Installs the global subscriber. Output goes to stderr, pretty-printed in
/// debug mode and as JSON lines otherwise, so rendered templates on stdout
/// stay clean. A second call is ignored.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(log_filter(settings))
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if settings.debug {
        builder
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
    } else {
        builder.json().try_init()
    };

    if installed.is_ok() {
        tracing::debug!(level = %settings.log_level, debug = settings.debug, "logging ready");
    }
}

/// Span for parsing one template source. `include_depth` is 0 for the
/// document being parsed and grows by one per nested include.
pub fn parse_span(template: &str, include_depth: usize) -> tracing::Span {
    tracing::debug_span!("parse", template, include_depth)
}

/// Span for one render of a compiled template.
///
/// # Examples
///
/// ```
/// use liquid_rs_core::logging::render_span;
///
/// let span = render_span("product.liquid", 12);
/// let _guard = span.enter();
/// tracing::debug!("rendering");
/// ```
pub fn render_span(template: &str, nodes: usize) -> tracing::Span {
    tracing::debug_span!("render", template, nodes)
}
