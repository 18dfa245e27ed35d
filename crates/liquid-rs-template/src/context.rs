//! Render context: scoped variables, registers and filters.
//!
//! A [`Context`] holds a stack of variable scopes (innermost last), a map of
//! registers that tags use to keep state across invocations (cycle positions,
//! `offset: continue` bookmarks) and the filter registry for the render.
//! Lookups never fail; anything that cannot be resolved is [`Value::Nil`].

use std::collections::{BTreeMap, HashMap};

use liquid_rs_core::error::{LiquidError, LiquidResult};

use crate::expression::{parse_expression, Segment, VariablePath};
use crate::filters::FilterRegistry;
use crate::value::Value;

/// Variables, registers and filters for one render.
///
/// ```
/// use liquid_rs_template::context::Context;
/// use liquid_rs_template::value::Value;
///
/// let mut ctx = Context::new();
/// ctx.set("name", "liquid");
/// assert_eq!(ctx.get("name"), Value::from("liquid"));
///
/// ctx.push();
/// ctx.set("name", "shadowed");
/// assert_eq!(ctx.get("name"), Value::from("shadowed"));
///
/// ctx.pop().unwrap();
/// assert_eq!(ctx.get("name"), Value::from("liquid"));
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    scopes: Vec<HashMap<String, Value>>,
    registers: HashMap<String, Value>,
    filters: FilterRegistry,
}

impl Context {
    /// Creates a context with one empty scope and the built-in filters.
    pub fn new() -> Self {
        Self::with_filters(FilterRegistry::with_builtins())
    }

    /// Creates a context with one empty scope and the given filters.
    pub fn with_filters(filters: FilterRegistry) -> Self {
        Self {
            scopes: vec![HashMap::new()],
            registers: HashMap::new(),
            filters,
        }
    }

    // ── Scopes ──────────────────────────────────────────────────────

    /// Pushes a new, empty innermost scope.
    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pops the innermost scope.
    ///
    /// # Errors
    ///
    /// Returns [`LiquidError::ContextStack`] when only the global scope is left.
    pub fn pop(&mut self) -> LiquidResult<()> {
        if self.scopes.len() <= 1 {
            return Err(LiquidError::ContextStack(
                "cannot pop the global scope".to_string(),
            ));
        }
        self.scopes.pop();
        Ok(())
    }

    /// Runs `f` inside a freshly pushed scope. The scope is popped afterwards
    /// whether or not `f` succeeds.
    pub fn stack<T>(&mut self, f: impl FnOnce(&mut Self) -> LiquidResult<T>) -> LiquidResult<T> {
        self.push();
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// The number of scopes on the stack, always at least one.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Binds `key` in the innermost scope.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(key.into(), value.into());
        }
    }

    /// Binds every entry of `values` in the innermost scope.
    pub fn merge<I, K, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (k, v) in values {
            self.set(k, v);
        }
    }

    // ── Resolution ──────────────────────────────────────────────────

    /// Resolves an expression written in template syntax: a literal or a
    /// variable path. Invalid markup resolves to `nil`.
    pub fn resolve(&self, markup: &str) -> Value {
        parse_expression(markup).map_or(Value::Nil, |expr| expr.evaluate(self))
    }

    /// Shorthand for [`resolve`](Self::resolve).
    pub fn get(&self, markup: &str) -> Value {
        self.resolve(markup)
    }

    /// Looks up a compiled variable path.
    pub fn variable(&self, path: &VariablePath) -> Value {
        let Some(mut current) = self.find_root(&path.root) else {
            tracing::trace!(path = %path.raw, "unresolved variable");
            return Value::Nil;
        };

        let last = path.segments.len().saturating_sub(1);
        for (i, segment) in path.segments.iter().enumerate() {
            let key = match segment {
                Segment::Key(name) => Value::String(name.clone()),
                Segment::Index(expr) => expr.evaluate(self),
            };
            current = self.lookup(&normalize(current), &key, i == last);
            if current.is_nil() {
                break;
            }
        }

        normalize(current)
    }

    fn find_root(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
    }

    fn lookup(&self, container: &Value, key: &Value, is_last: bool) -> Value {
        match container {
            Value::Dict(map) => {
                let name = key.to_liquid_string();
                match map.get(&name) {
                    Some(v) => v.clone(),
                    None if is_last && name == "size" => Value::from(map.len()),
                    None => Value::Nil,
                }
            }
            Value::List(items) => match key {
                Value::Integer(i) => list_index(items, *i),
                Value::String(name) => match name.as_str() {
                    "size" if is_last => Value::from(items.len()),
                    "first" => items.first().cloned().unwrap_or(Value::Nil),
                    "last" => items.last().cloned().unwrap_or(Value::Nil),
                    _ => name
                        .parse::<i64>()
                        .map_or(Value::Nil, |i| list_index(items, i)),
                },
                _ => Value::Nil,
            },
            Value::Drop(drop) => {
                let name = key.to_liquid_string();
                if drop.has_key(&name) {
                    drop.invoke(&name, self)
                } else {
                    Value::Nil
                }
            }
            _ => Value::Nil,
        }
    }

    // ── Registers ───────────────────────────────────────────────────

    /// Returns a register, or `nil` if it was never set.
    pub fn register(&self, name: &str) -> Value {
        self.registers.get(name).cloned().unwrap_or(Value::Nil)
    }

    /// Sets a register.
    pub fn set_register(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.registers.insert(name.into(), value.into());
    }

    /// Reads `registers[group][key]`.
    pub fn register_entry(&self, group: &str, key: &str) -> Value {
        match self.registers.get(group) {
            Some(Value::Dict(map)) => map.get(key).cloned().unwrap_or(Value::Nil),
            _ => Value::Nil,
        }
    }

    /// Writes `registers[group][key]`, turning the group into a dict if needed.
    pub fn set_register_entry(&mut self, group: &str, key: impl Into<String>, value: Value) {
        let entry = self
            .registers
            .entry(group.to_string())
            .or_insert_with(|| Value::Dict(BTreeMap::new()));
        if !matches!(entry, Value::Dict(_)) {
            *entry = Value::Dict(BTreeMap::new());
        }
        if let Value::Dict(map) = entry {
            map.insert(key.into(), value);
        }
    }

    // ── Filters ─────────────────────────────────────────────────────

    /// The filters available to this render.
    pub const fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Mutable access to the filters, for adding render-local filters.
    pub fn filters_mut(&mut self) -> &mut FilterRegistry {
        &mut self.filters
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(value: Value) -> Value {
    if let Value::Drop(drop) = &value {
        if let Some(plain) = drop.to_value() {
            return plain;
        }
    }
    value
}

fn list_index(items: &[Value], index: i64) -> Value {
    let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
    let i = if index < 0 { len + index } else { index };
    usize::try_from(i)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .unwrap_or(Value::Nil)
}
