//! Template filters.
//!
//! Every filter implements [`Filter`] and is looked up by name in a
//! [`FilterRegistry`]. The registry fails open: applying a filter name that
//! is not registered returns the input unchanged.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use liquid_rs_core::error::LiquidResult;

use crate::value::Value;

/// A template filter.
///
/// Takes the piped-in value and the resolved arguments and returns the
/// transformed value.
pub trait Filter: Send + Sync {
    /// Returns the name the filter is invoked by.
    fn name(&self) -> &str;

    /// Applies the filter to a value with the given arguments.
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value>;
}

type FilterFunction = dyn Fn(&Value, &[Value]) -> LiquidResult<Value> + Send + Sync;

/// A filter backed by a closure.
///
/// ```
/// use liquid_rs_template::filters::{Filter, FnFilter};
/// use liquid_rs_template::value::Value;
///
/// let shout = FnFilter::new("shout", |v, _| Ok(Value::from(format!("{v}!"))));
/// assert_eq!(shout.apply(&Value::from("hi"), &[]).unwrap(), Value::from("hi!"));
/// ```
pub struct FnFilter {
    name: String,
    func: Box<FilterFunction>,
}

impl FnFilter {
    /// Wraps `func` as a filter called `name`.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> LiquidResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl Filter for FnFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        (self.func)(value, args)
    }
}

/// A set of filters keyed by name.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in filter.
    pub fn with_builtins() -> Self {
        BUILTINS.clone()
    }

    /// Registers a filter, replacing any filter of the same name.
    pub fn register(&mut self, filter: Arc<dyn Filter>) {
        self.filters.insert(filter.name().to_string(), filter);
    }

    /// Registers a closure as a filter.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&Value, &[Value]) -> LiquidResult<Value> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnFilter::new(name, func)));
    }

    /// Returns `true` if a filter called `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Applies the filter called `name`. Unknown names return the value unchanged.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by the filter implementation.
    pub fn apply(&self, name: &str, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        match self.filters.get(name) {
            Some(filter) => filter.apply(value, args),
            None => {
                tracing::debug!(filter = name, "unknown filter, passing value through");
                Ok(value.clone())
            }
        }
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.filters.keys().collect();
        names.sort();
        f.debug_struct("FilterRegistry")
            .field("filters", &names)
            .finish()
    }
}

static BUILTINS: Lazy<FilterRegistry> = Lazy::new(|| {
    let mut r = FilterRegistry::new();
    register_all(&mut r);
    r
});

fn register_all(r: &mut FilterRegistry) {
    // String filters
    r.register(Arc::new(DowncaseFilter));
    r.register(Arc::new(UpcaseFilter));
    r.register(Arc::new(CapitalizeFilter));
    r.register(Arc::new(EscapeFilter("escape")));
    r.register(Arc::new(EscapeFilter("h")));
    r.register(Arc::new(EscapeOnceFilter));
    r.register(Arc::new(StripHtmlFilter));
    r.register(Arc::new(StripNewlinesFilter));
    r.register(Arc::new(NewlineToBrFilter));
    r.register(Arc::new(ReplaceFilter));
    r.register(Arc::new(ReplaceFirstFilter));
    r.register(Arc::new(RemoveFilter));
    r.register(Arc::new(RemoveFirstFilter));
    r.register(Arc::new(AppendFilter));
    r.register(Arc::new(PrependFilter));
    r.register(Arc::new(TruncateFilter));
    r.register(Arc::new(TruncatewordsFilter));
    r.register(Arc::new(SplitFilter));
    r.register(Arc::new(StripFilter));
    r.register(Arc::new(LstripFilter));
    r.register(Arc::new(RstripFilter));
    r.register(Arc::new(UrlEncodeFilter));
    r.register(Arc::new(UrlDecodeFilter));

    // List filters
    r.register(Arc::new(SizeFilter));
    r.register(Arc::new(JoinFilter));
    r.register(Arc::new(SortFilter));
    r.register(Arc::new(ReverseFilter));
    r.register(Arc::new(MapFilter));
    r.register(Arc::new(FirstFilter));
    r.register(Arc::new(LastFilter));
    r.register(Arc::new(UniqFilter));
    r.register(Arc::new(CompactFilter));
    r.register(Arc::new(SliceFilter));

    // Number filters
    r.register(Arc::new(PlusFilter));
    r.register(Arc::new(MinusFilter));
    r.register(Arc::new(TimesFilter));
    r.register(Arc::new(DividedByFilter));
    r.register(Arc::new(ModuloFilter));
    r.register(Arc::new(RoundFilter));
    r.register(Arc::new(CeilFilter));
    r.register(Arc::new(FloorFilter));
    r.register(Arc::new(AbsFilter));

    // Other
    r.register(Arc::new(DefaultFilter));
    r.register(Arc::new(DateFilter));
}

// ── Argument helpers ────────────────────────────────────────────────

fn arg_string(args: &[Value], index: usize) -> String {
    args.get(index).map(Value::to_liquid_string).unwrap_or_default()
}

fn arg_integer(args: &[Value], index: usize) -> Option<i64> {
    args.get(index).and_then(Value::as_integer)
}

fn to_usize(i: i64) -> usize {
    usize::try_from(i).unwrap_or(0)
}

fn to_list(value: &Value) -> Vec<Value> {
    match value {
        Value::List(items) => items.clone(),
        Value::Nil => Vec::new(),
        other => vec![other.clone()],
    }
}

// ============================================================
// String filters
// ============================================================

struct DowncaseFilter;
impl Filter for DowncaseFilter {
    fn name(&self) -> &str {
        "downcase"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        Ok(Value::String(value.to_liquid_string().to_lowercase()))
    }
}

struct UpcaseFilter;
impl Filter for UpcaseFilter {
    fn name(&self) -> &str {
        "upcase"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        Ok(Value::String(value.to_liquid_string().to_uppercase()))
    }
}

struct CapitalizeFilter;
impl Filter for CapitalizeFilter {
    fn name(&self) -> &str {
        "capitalize"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        let s = value.to_liquid_string();
        let mut chars = s.chars();
        let result = match chars.next() {
            Some(c) => format!("{}{}", c.to_uppercase(), chars.as_str().to_lowercase()),
            None => String::new(),
        };
        Ok(Value::String(result))
    }
}

/// Escapes `&`, `<`, `>`, `"` and `'` as HTML entities.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

struct EscapeFilter(&'static str);
impl Filter for EscapeFilter {
    fn name(&self) -> &str {
        self.0
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        if value.is_nil() {
            return Ok(Value::Nil);
        }
        Ok(Value::String(escape_html(&value.to_liquid_string())))
    }
}

static ESCAPE_ONCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"&(?:[a-zA-Z]+|#\d+|#x[0-9a-fA-F]+);|[&<>"']"#).expect("escape_once regex is valid")
});

struct EscapeOnceFilter;
impl Filter for EscapeOnceFilter {
    fn name(&self) -> &str {
        "escape_once"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        let s = value.to_liquid_string();
        let escaped = ESCAPE_ONCE.replace_all(&s, |caps: &regex::Captures<'_>| {
            let m = &caps[0];
            if m.len() > 1 {
                m.to_string()
            } else {
                escape_html(m)
            }
        });
        Ok(Value::String(escaped.into_owned()))
    }
}

static STRIP_HTML_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script.*?</script>|<!--.*?-->|<style.*?</style>")
        .expect("strip_html block regex is valid")
});
static STRIP_HTML_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<.*?>").expect("strip_html tag regex is valid"));

struct StripHtmlFilter;
impl Filter for StripHtmlFilter {
    fn name(&self) -> &str {
        "strip_html"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        let s = value.to_liquid_string();
        let without_blocks = STRIP_HTML_BLOCKS.replace_all(&s, "");
        Ok(Value::String(
            STRIP_HTML_TAGS.replace_all(&without_blocks, "").into_owned(),
        ))
    }
}

struct StripNewlinesFilter;
impl Filter for StripNewlinesFilter {
    fn name(&self) -> &str {
        "strip_newlines"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        let s = value.to_liquid_string();
        Ok(Value::String(s.replace("\r\n", "").replace('\n', "")))
    }
}

struct NewlineToBrFilter;
impl Filter for NewlineToBrFilter {
    fn name(&self) -> &str {
        "newline_to_br"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        let s = value.to_liquid_string();
        Ok(Value::String(s.replace("\r\n", "\n").replace('\n', "<br />\n")))
    }
}

struct ReplaceFilter;
impl Filter for ReplaceFilter {
    fn name(&self) -> &str {
        "replace"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        let s = value.to_liquid_string();
        Ok(Value::String(s.replace(&arg_string(args, 0), &arg_string(args, 1))))
    }
}

struct ReplaceFirstFilter;
impl Filter for ReplaceFirstFilter {
    fn name(&self) -> &str {
        "replace_first"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        let s = value.to_liquid_string();
        Ok(Value::String(s.replacen(&arg_string(args, 0), &arg_string(args, 1), 1)))
    }
}

struct RemoveFilter;
impl Filter for RemoveFilter {
    fn name(&self) -> &str {
        "remove"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        let s = value.to_liquid_string();
        Ok(Value::String(s.replace(&arg_string(args, 0), "")))
    }
}

struct RemoveFirstFilter;
impl Filter for RemoveFirstFilter {
    fn name(&self) -> &str {
        "remove_first"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        let s = value.to_liquid_string();
        Ok(Value::String(s.replacen(&arg_string(args, 0), "", 1)))
    }
}

struct AppendFilter;
impl Filter for AppendFilter {
    fn name(&self) -> &str {
        "append"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        Ok(Value::String(format!(
            "{}{}",
            value.to_liquid_string(),
            arg_string(args, 0)
        )))
    }
}

struct PrependFilter;
impl Filter for PrependFilter {
    fn name(&self) -> &str {
        "prepend"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        Ok(Value::String(format!(
            "{}{}",
            arg_string(args, 0),
            value.to_liquid_string()
        )))
    }
}

struct TruncateFilter;
impl Filter for TruncateFilter {
    fn name(&self) -> &str {
        "truncate"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        if value.is_nil() {
            return Ok(Value::Nil);
        }
        let s = value.to_liquid_string();
        let length = to_usize(arg_integer(args, 0).unwrap_or(50));
        let ellipsis = args
            .get(1)
            .map_or_else(|| "...".to_string(), Value::to_liquid_string);

        if s.chars().count() <= length {
            return Ok(Value::String(s));
        }
        let keep = length.saturating_sub(ellipsis.chars().count());
        let truncated: String = s.chars().take(keep).collect();
        Ok(Value::String(format!("{truncated}{ellipsis}")))
    }
}

struct TruncatewordsFilter;
impl Filter for TruncatewordsFilter {
    fn name(&self) -> &str {
        "truncatewords"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        if value.is_nil() {
            return Ok(Value::Nil);
        }
        let s = value.to_liquid_string();
        let max_words = to_usize(arg_integer(args, 0).unwrap_or(15)).max(1);
        let ellipsis = args
            .get(1)
            .map_or_else(|| "...".to_string(), Value::to_liquid_string);

        let words: Vec<&str> = s.split_whitespace().collect();
        if words.len() <= max_words {
            return Ok(Value::String(s));
        }
        Ok(Value::String(format!(
            "{}{ellipsis}",
            words[..max_words].join(" ")
        )))
    }
}

struct SplitFilter;
impl Filter for SplitFilter {
    fn name(&self) -> &str {
        "split"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        let s = value.to_liquid_string();
        let pattern = arg_string(args, 0);
        let mut parts: Vec<String> = if pattern.is_empty() {
            s.chars().map(String::from).collect()
        } else if pattern == " " {
            s.split_whitespace().map(String::from).collect()
        } else {
            s.split(pattern.as_str()).map(String::from).collect()
        };
        while parts.last().is_some_and(String::is_empty) {
            parts.pop();
        }
        Ok(Value::from(parts))
    }
}

struct StripFilter;
impl Filter for StripFilter {
    fn name(&self) -> &str {
        "strip"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        Ok(Value::String(value.to_liquid_string().trim().to_string()))
    }
}

struct LstripFilter;
impl Filter for LstripFilter {
    fn name(&self) -> &str {
        "lstrip"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        Ok(Value::String(
            value.to_liquid_string().trim_start().to_string(),
        ))
    }
}

struct RstripFilter;
impl Filter for RstripFilter {
    fn name(&self) -> &str {
        "rstrip"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        Ok(Value::String(value.to_liquid_string().trim_end().to_string()))
    }
}

/// Characters left unescaped by `url_encode`, besides ASCII alphanumerics.
const URL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

struct UrlEncodeFilter;
impl Filter for UrlEncodeFilter {
    fn name(&self) -> &str {
        "url_encode"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        if value.is_nil() {
            return Ok(Value::Nil);
        }
        let s = value.to_liquid_string();
        let encoded = utf8_percent_encode(&s, URL_ENCODE_SET)
            .to_string()
            .replace("%20", "+");
        Ok(Value::String(encoded))
    }
}

struct UrlDecodeFilter;
impl Filter for UrlDecodeFilter {
    fn name(&self) -> &str {
        "url_decode"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        if value.is_nil() {
            return Ok(Value::Nil);
        }
        let s = value.to_liquid_string().replace('+', " ");
        Ok(Value::String(
            percent_decode_str(&s).decode_utf8_lossy().into_owned(),
        ))
    }
}

// ============================================================
// List filters
// ============================================================

struct SizeFilter;
impl Filter for SizeFilter {
    fn name(&self) -> &str {
        "size"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        Ok(Value::from(value.len().unwrap_or(0)))
    }
}

struct JoinFilter;
impl Filter for JoinFilter {
    fn name(&self) -> &str {
        "join"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        let Value::List(items) = value else {
            return Ok(value.clone());
        };
        let glue = args
            .first()
            .map_or_else(|| " ".to_string(), Value::to_liquid_string);
        let joined = items
            .iter()
            .map(Value::to_liquid_string)
            .collect::<Vec<_>>()
            .join(&glue);
        Ok(Value::String(joined))
    }
}

fn sort_key(item: &Value, property: Option<&str>) -> Value {
    match (item, property) {
        (Value::Dict(map), Some(prop)) => map.get(prop).cloned().unwrap_or(Value::Nil),
        (_, Some(_)) => Value::Nil,
        (v, None) => v.clone(),
    }
}

fn compare_for_sort(a: &Value, b: &Value) -> Ordering {
    match (a.is_nil(), b.is_nil()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.liquid_cmp(b).unwrap_or(Ordering::Equal),
    }
}

struct SortFilter;
impl Filter for SortFilter {
    fn name(&self) -> &str {
        "sort"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        let property = args.first().and_then(Value::as_str);
        let mut items = to_list(value);
        items.sort_by(|a, b| compare_for_sort(&sort_key(a, property), &sort_key(b, property)));
        Ok(Value::List(items))
    }
}

struct ReverseFilter;
impl Filter for ReverseFilter {
    fn name(&self) -> &str {
        "reverse"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        let mut items = to_list(value);
        items.reverse();
        Ok(Value::List(items))
    }
}

struct MapFilter;
impl Filter for MapFilter {
    fn name(&self) -> &str {
        "map"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        let property = arg_string(args, 0);
        let mapped = to_list(value)
            .iter()
            .map(|item| match item {
                Value::Dict(map) => map.get(&property).cloned().unwrap_or(Value::Nil),
                _ => Value::Nil,
            })
            .collect();
        Ok(Value::List(mapped))
    }
}

struct FirstFilter;
impl Filter for FirstFilter {
    fn name(&self) -> &str {
        "first"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        Ok(value
            .as_list()
            .and_then(<[Value]>::first)
            .cloned()
            .unwrap_or(Value::Nil))
    }
}

struct LastFilter;
impl Filter for LastFilter {
    fn name(&self) -> &str {
        "last"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        Ok(value
            .as_list()
            .and_then(<[Value]>::last)
            .cloned()
            .unwrap_or(Value::Nil))
    }
}

struct UniqFilter;
impl Filter for UniqFilter {
    fn name(&self) -> &str {
        "uniq"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        let mut unique: Vec<Value> = Vec::new();
        for item in to_list(value) {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Ok(Value::List(unique))
    }
}

struct CompactFilter;
impl Filter for CompactFilter {
    fn name(&self) -> &str {
        "compact"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        Ok(Value::List(
            to_list(value).into_iter().filter(|v| !v.is_nil()).collect(),
        ))
    }
}

/// Resolves a possibly negative `offset` and a `length` into a range of `len`.
fn slice_range(len: usize, offset: i64, length: i64) -> Option<std::ops::Range<usize>> {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let start = if offset < 0 { len_i + offset } else { offset };
    if start < 0 || start >= len_i || length <= 0 {
        return None;
    }
    let end = start.saturating_add(length).min(len_i);
    Some(to_usize(start)..to_usize(end))
}

struct SliceFilter;
impl Filter for SliceFilter {
    fn name(&self) -> &str {
        "slice"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        let offset = arg_integer(args, 0).unwrap_or(0);
        let length = arg_integer(args, 1).unwrap_or(1);

        match value {
            Value::List(items) => Ok(Value::List(
                slice_range(items.len(), offset, length)
                    .map(|r| items[r].to_vec())
                    .unwrap_or_default(),
            )),
            Value::Nil => Ok(Value::Nil),
            other => {
                let chars: Vec<char> = other.to_liquid_string().chars().collect();
                Ok(Value::String(
                    slice_range(chars.len(), offset, length)
                        .map(|r| chars[r].iter().collect())
                        .unwrap_or_default(),
                ))
            }
        }
    }
}

// ============================================================
// Number filters
// ============================================================

/// Coerces a value to a number the way arithmetic filters see it.
fn to_number(value: &Value) -> Value {
    match value {
        Value::Integer(_) | Value::Float(_) => value.clone(),
        Value::String(s) => {
            let s = s.trim();
            if s.contains('.') {
                s.parse::<f64>().map_or(Value::Integer(0), Value::Float)
            } else {
                s.parse::<i64>().map_or(Value::Integer(0), Value::Integer)
            }
        }
        Value::Bool(b) => Value::Integer(i64::from(*b)),
        _ => Value::Integer(0),
    }
}

fn arithmetic(
    value: &Value,
    args: &[Value],
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Value {
    let left = to_number(value);
    let right = to_number(args.first().unwrap_or(&Value::Nil));
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => {
            int_op(*a, *b).map_or(Value::Nil, Value::Integer)
        }
        _ => {
            let a = left.as_float().unwrap_or(0.0);
            let b = right.as_float().unwrap_or(0.0);
            Value::Float(float_op(a, b))
        }
    }
}

struct PlusFilter;
impl Filter for PlusFilter {
    fn name(&self) -> &str {
        "plus"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        Ok(arithmetic(value, args, i64::checked_add, |a, b| a + b))
    }
}

struct MinusFilter;
impl Filter for MinusFilter {
    fn name(&self) -> &str {
        "minus"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        Ok(arithmetic(value, args, i64::checked_sub, |a, b| a - b))
    }
}

struct TimesFilter;
impl Filter for TimesFilter {
    fn name(&self) -> &str {
        "times"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        Ok(arithmetic(value, args, i64::checked_mul, |a, b| a * b))
    }
}

/// Integer division rounding toward negative infinity.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

/// Remainder with the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

fn is_zero(value: &Value) -> bool {
    to_number(value).as_float() == Some(0.0)
}

struct DividedByFilter;
impl Filter for DividedByFilter {
    fn name(&self) -> &str {
        "divided_by"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        if args.first().map_or(true, is_zero) {
            return Ok(Value::Nil);
        }
        Ok(arithmetic(value, args, floor_div, |a, b| a / b))
    }
}

struct ModuloFilter;
impl Filter for ModuloFilter {
    fn name(&self) -> &str {
        "modulo"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        if args.first().map_or(true, is_zero) {
            return Ok(Value::Nil);
        }
        Ok(arithmetic(value, args, floor_mod, |a, b| a - b * (a / b).floor()))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_integer(f: f64) -> Value {
    Value::Integer(f as i64)
}

struct RoundFilter;
impl Filter for RoundFilter {
    fn name(&self) -> &str {
        "round"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        let number = to_number(value);
        let digits = arg_integer(args, 0).unwrap_or(0);
        match number {
            Value::Integer(_) => Ok(number),
            _ => {
                let f = number.as_float().unwrap_or(0.0);
                if digits <= 0 {
                    return Ok(float_to_integer(f.round()));
                }
                let factor = 10f64.powi(i32::try_from(digits).unwrap_or(i32::MAX));
                Ok(Value::Float((f * factor).round() / factor))
            }
        }
    }
}

struct CeilFilter;
impl Filter for CeilFilter {
    fn name(&self) -> &str {
        "ceil"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        let number = to_number(value);
        match number {
            Value::Integer(_) => Ok(number),
            _ => Ok(float_to_integer(number.as_float().unwrap_or(0.0).ceil())),
        }
    }
}

struct FloorFilter;
impl Filter for FloorFilter {
    fn name(&self) -> &str {
        "floor"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        let number = to_number(value);
        match number {
            Value::Integer(_) => Ok(number),
            _ => Ok(float_to_integer(number.as_float().unwrap_or(0.0).floor())),
        }
    }
}

struct AbsFilter;
impl Filter for AbsFilter {
    fn name(&self) -> &str {
        "abs"
    }
    fn apply(&self, value: &Value, _args: &[Value]) -> LiquidResult<Value> {
        Ok(match to_number(value) {
            Value::Integer(i) => Value::Integer(i.saturating_abs()),
            Value::Float(f) => Value::Float(f.abs()),
            other => other,
        })
    }
}

// ============================================================
// Other filters
// ============================================================

struct DefaultFilter;
impl Filter for DefaultFilter {
    fn name(&self) -> &str {
        "default"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        if value.is_blank() {
            Ok(args.first().cloned().unwrap_or(Value::Nil))
        } else {
            Ok(value.clone())
        }
    }
}

fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Integer(ts) => DateTime::from_timestamp(*ts, 0).map(|dt| dt.naive_utc()),
        Value::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("now") || s.eq_ignore_ascii_case("today") {
                return Some(Local::now().naive_local());
            }
            if let Ok(ts) = s.parse::<i64>() {
                return DateTime::from_timestamp(ts, 0).map(|dt| dt.naive_utc());
            }
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_local())
                .ok()
                .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
                .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok())
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
        }
        _ => None,
    }
}

struct DateFilter;
impl Filter for DateFilter {
    fn name(&self) -> &str {
        "date"
    }
    fn apply(&self, value: &Value, args: &[Value]) -> LiquidResult<Value> {
        let format = arg_string(args, 0);
        if format.is_empty() {
            return Ok(value.clone());
        }
        let Some(date) = parse_date(value) else {
            return Ok(value.clone());
        };
        let items: Vec<Item<'_>> = StrftimeItems::new(&format).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            tracing::debug!(format = %format, "invalid date format, passing value through");
            return Ok(value.clone());
        }
        Ok(Value::String(
            date.format_with_items(items.into_iter()).to_string(),
        ))
    }
}
