//! Core error types for the liquid-rs template engine.
//!
//! [`LiquidError`] separates the two failure classes of the engine. Parse-time
//! problems (bad markup, unknown tags, unterminated blocks, unresolvable
//! includes) abort compilation and carry the offending markup. Render-time
//! lookup misses never surface here at all: they resolve to `nil` inside the
//! engine. The remaining variants cover host-facing failures such as filter
//! errors raised by custom filters, configuration problems and I/O.

use thiserror::Error;

/// The primary error type for liquid-rs.
///
/// # Examples
///
/// ```
/// use liquid_rs_core::error::LiquidError;
///
/// let err = LiquidError::UnknownTag {
///     tag: "frobnicate".to_string(),
///     markup: "{% frobnicate x %}".to_string(),
/// };
/// assert!(err.is_parse_error());
/// assert_eq!(err.to_string(), "Unknown tag 'frobnicate' in: {% frobnicate x %}");
/// ```
#[derive(Error, Debug)]
pub enum LiquidError {
    // ── Parse time ───────────────────────────────────────────────────

    /// Markup that does not match the grammar of the construct it belongs to.
    #[error("Liquid syntax error: {0}")]
    Syntax(String),

    /// A tag name with no registered implementation and no enclosing block
    /// willing to handle it.
    #[error("Unknown tag '{tag}' in: {markup}")]
    UnknownTag {
        /// The tag name.
        tag: String,
        /// The full tag markup.
        markup: String,
    },

    /// The token stream ended before a block saw its terminator.
    #[error("'{tag}' tag was never closed, expected '{{% end{tag} %}}'")]
    UnterminatedBlock {
        /// The name of the unterminated block tag.
        tag: String,
    },

    /// The file system provider could not resolve an included template.
    #[error("Missing include: {0}")]
    MissingInclude(String),

    /// A template name rejected by a file system provider.
    #[error("Illegal template name: '{0}'")]
    IllegalTemplateName(String),

    /// Include chains nested deeper than the configured limit.
    #[error("Include depth of {depth} exceeded while including '{name}'")]
    IncludeDepthExceeded {
        /// The template being included when the limit was hit.
        name: String,
        /// The configured limit.
        depth: usize,
    },

    // ── Render time ──────────────────────────────────────────────────

    /// A filter implementation reported a failure.
    #[error("Filter '{name}' failed: {message}")]
    Filter {
        /// The filter name.
        name: String,
        /// What went wrong.
        message: String,
    },

    /// Unbalanced scope handling, such as popping the global frame.
    #[error("Context stack error: {0}")]
    ContextStack(String),

    /// Any other render-time failure raised by a custom tag.
    #[error("Render error: {0}")]
    Render(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LiquidError {
    /// Returns `true` for errors raised while compiling a template.
    ///
    /// These errors abort the parse entirely; no partial tree is produced.
    pub const fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::Syntax(_)
                | Self::UnknownTag { .. }
                | Self::UnterminatedBlock { .. }
                | Self::MissingInclude(_)
                | Self::IllegalTemplateName(_)
                | Self::IncludeDepthExceeded { .. }
        )
    }

    /// Builds a [`LiquidError::Syntax`] that quotes the offending markup.
    pub fn syntax(message: impl AsRef<str>, markup: impl AsRef<str>) -> Self {
        Self::Syntax(format!("{} in: {}", message.as_ref(), markup.as_ref()))
    }
}

/// A convenience type alias for `Result<T, LiquidError>`.
pub type LiquidResult<T> = Result<T, LiquidError>;
