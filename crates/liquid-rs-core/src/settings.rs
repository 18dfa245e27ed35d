//! Engine settings.
//!
//! [`Settings`] is a plain value: it is built explicitly (from defaults, a
//! configuration file, or environment variables via
//! [`settings_loader`](crate::settings_loader)) and handed to whoever needs it.
//! There is no process-wide settings instance.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the liquid-rs engine and its tooling.
///
/// # Examples
///
/// ```
/// use liquid_rs_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(!settings.debug);
/// assert_eq!(settings.max_include_depth, 32);
/// assert_eq!(settings.partial_path("product"), "_product.liquid");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The `tracing` filter directive, e.g. `"info"` or `"liquid_rs_template=debug"`.
    pub log_level: String,

    // ── Templates ────────────────────────────────────────────────────

    /// Directories searched by the local file system for included templates.
    pub template_dirs: Vec<PathBuf>,
    /// File name pattern for included templates; `{name}` is replaced by the
    /// last component of the template name.
    pub template_pattern: String,
    /// Maximum nesting of `{% include %}` chains before parsing fails.
    pub max_include_depth: usize,
}

impl Settings {
    /// Expands [`Settings::template_pattern`] for a template name.
    ///
    /// Directory components of `name` are kept in front of the expanded file
    /// name, so `"shop/product"` becomes `"shop/_product.liquid"`.
    pub fn partial_path(&self, name: &str) -> String {
        match name.rsplit_once('/') {
            Some((dir, base)) => format!("{dir}/{}", self.template_pattern.replace("{name}", base)),
            None => self.template_pattern.replace("{name}", name),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            template_dirs: Vec::new(),
            template_pattern: "_{name}.liquid".to_string(),
            max_include_depth: 32,
        }
    }
}
