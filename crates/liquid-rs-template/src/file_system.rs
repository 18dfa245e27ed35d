//! Template file systems.
//!
//! `{% include %}` reads templates through a [`FileSystem`]. The engine ships
//! three: [`BlankFileSystem`] refuses every include, [`MemoryFileSystem`]
//! serves templates from a map, and [`LocalFileSystem`] reads partials from
//! disk using the `_{name}.liquid` naming convention.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use regex::Regex;

use liquid_rs_core::error::{LiquidError, LiquidResult};
use liquid_rs_core::settings::Settings;

/// Reads template source text by name.
pub trait FileSystem: Send + Sync {
    /// Returns the source of the template called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LiquidError::MissingInclude`] if the template cannot be found
    /// and [`LiquidError::IllegalTemplateName`] for names the file system
    /// refuses to resolve.
    fn read_template(&self, name: &str) -> LiquidResult<String>;
}

/// A file system that allows no includes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankFileSystem;

impl FileSystem for BlankFileSystem {
    fn read_template(&self, _name: &str) -> LiquidResult<String> {
        Err(LiquidError::MissingInclude(
            "This liquid context does not allow includes.".to_string(),
        ))
    }
}

/// Serves templates from an in-memory map of name to source.
///
/// Useful in tests and for hosts that keep templates in a database.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    templates: RwLock<HashMap<String, String>>,
}

impl MemoryFileSystem {
    /// Creates an empty file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a file system from a map of template names to sources.
    pub fn from_map(templates: HashMap<String, String>) -> Self {
        Self {
            templates: RwLock::new(templates),
        }
    }

    /// Adds or replaces a template.
    pub fn add(&self, name: impl Into<String>, source: impl Into<String>) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), source.into());
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_template(&self, name: &str) -> LiquidResult<String> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| LiquidError::MissingInclude(format!("No such template '{name}'")))
    }
}

static TEMPLATE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_][a-zA-Z0-9_/]*$").expect("template name regex is valid")
});

/// Reads partials from one or more root directories.
///
/// `read_template("shop/product")` looks for `<root>/shop/_product.liquid`
/// under each root in turn. Names may only contain ASCII letters, digits,
/// `_` and `/`, and may not start with `/`.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    roots: Vec<PathBuf>,
    pattern: String,
}

impl LocalFileSystem {
    /// Creates a file system rooted at `roots` with the default `_{name}.liquid` pattern.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            pattern: Settings::default().template_pattern,
        }
    }

    /// Creates a file system from the template settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            roots: settings.template_dirs.clone(),
            pattern: settings.template_pattern.clone(),
        }
    }

    /// Returns the full path `name` maps to under the first root, without
    /// checking that it exists.
    ///
    /// # Errors
    ///
    /// Returns [`LiquidError::IllegalTemplateName`] for invalid names.
    pub fn full_path(&self, name: &str) -> LiquidResult<PathBuf> {
        let relative = self.relative_path(name)?;
        Ok(self
            .roots
            .first()
            .map_or_else(|| PathBuf::from(&relative), |root| root.join(&relative)))
    }

    fn relative_path(&self, name: &str) -> LiquidResult<String> {
        if !TEMPLATE_NAME.is_match(name) {
            return Err(LiquidError::IllegalTemplateName(name.to_string()));
        }
        let settings = Settings {
            template_pattern: self.pattern.clone(),
            ..Settings::default()
        };
        Ok(settings.partial_path(name))
    }
}

impl FileSystem for LocalFileSystem {
    fn read_template(&self, name: &str) -> LiquidResult<String> {
        let relative = self.relative_path(name)?;

        for root in &self.roots {
            let path = root.join(&relative);
            if path.is_file() {
                return std::fs::read_to_string(&path).map_err(|e| {
                    LiquidError::MissingInclude(format!(
                        "Error reading template '{}': {e}",
                        path.display()
                    ))
                });
            }
        }

        Err(LiquidError::MissingInclude(format!(
            "No such template '{name}'"
        )))
    }
}
