//! Template lexer (tokenizer).
//!
//! Converts raw template source text into a flat stream of [`Token`]s:
//! literal text runs, tag markup (`{% %}`) and variable markup (`{{ }}`).
//! Tokenizing never fails. A bare `{%` or `{{` without its closer is emitted
//! as a literal token of its own so the parser can report it.

use once_cell::sync::Lazy;
use regex::Regex;

/// A token produced by the template lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A literal text segment.
    Literal(String),
    /// The raw text between `{%` and `%}`, untrimmed.
    Tag(String),
    /// The raw text between `{{` and `}}`, untrimmed.
    Variable(String),
}

impl Token {
    /// Reconstructs the source text this token was cut from.
    pub fn source(&self) -> String {
        match self {
            Self::Literal(text) => text.clone(),
            Self::Tag(markup) => format!("{{%{markup}%}}"),
            Self::Variable(markup) => format!("{{{{{markup}}}}}"),
        }
    }
}

static TOKENIZER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\{%.*?%\}|\{\{.*?\}\}|\{%|\{\{").expect("tokenizer regex is valid")
});

/// Tokenizes a template source string into a sequence of [`Token`]s.
///
/// Empty literal runs between adjacent markers are dropped.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for m in TOKENIZER.find_iter(source) {
        if m.start() > last {
            tokens.push(Token::Literal(source[last..m.start()].to_string()));
        }

        let text = m.as_str();
        let token = if text.len() >= 4 && text.starts_with("{%") {
            Token::Tag(text[2..text.len() - 2].to_string())
        } else if text.len() >= 4 && text.starts_with("{{") {
            Token::Variable(text[2..text.len() - 2].to_string())
        } else {
            Token::Literal(text.to_string())
        };
        tokens.push(token);
        last = m.end();
    }

    if last < source.len() {
        tokens.push(Token::Literal(source[last..].to_string()));
    }

    tokens
}
