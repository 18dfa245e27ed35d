//! # liquid-rs
//!
//! The Liquid template language for Rust.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `liquid-rs` for the whole engine, or on individual
//! crates for finer-grained control.
//!
//! ## Examples
//!
//! ```
//! use liquid_rs::{Context, Template};
//!
//! let template = Template::parse("{% for p in products %}{{ p | upcase }} {% endfor %}").unwrap();
//!
//! let mut ctx = Context::new();
//! ctx.set("products", vec!["hat", "cap"]);
//! assert_eq!(template.render(&mut ctx).unwrap(), "HAT CAP ");
//! ```

/// Error types, settings, and logging setup.
pub use liquid_rs_core as core;

/// Tokenizer, parser, context, tags, and filters.
pub use liquid_rs_template as template;

/// The `liquid` command-line tool.
#[cfg(feature = "cli")]
pub use liquid_rs_cli as cli;

pub use liquid_rs_core::{LiquidError, LiquidResult, Settings};
pub use liquid_rs_template::drop::{LazyDrop, LiquidDrop};
pub use liquid_rs_template::file_system::{
    BlankFileSystem, FileSystem, LocalFileSystem, MemoryFileSystem,
};
pub use liquid_rs_template::library::{CustomTag, Library, TagParser};
pub use liquid_rs_template::{Context, Engine, Template, Value};

/// Third-party re-exports.
pub use serde_json;
pub use tracing;
