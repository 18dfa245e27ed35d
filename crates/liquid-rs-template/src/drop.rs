//! Drops: host objects exposed to templates.
//!
//! A drop decides which attribute names a template may read. Lookups on a
//! drop go through [`LiquidDrop::has_key`] first and only then through
//! [`LiquidDrop::invoke`], so nothing outside the declared surface leaks.
//!
//! The context is passed to `invoke` on every call instead of being stored
//! on the drop. A drop can therefore be shared between renders.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::value::Value;

/// A host object with a restricted, template-visible attribute surface.
pub trait LiquidDrop: fmt::Debug + Send + Sync {
    /// Returns `true` if templates may read the attribute `name`.
    fn has_key(&self, name: &str) -> bool;

    /// Produces the value of attribute `name`.
    ///
    /// Only called after [`has_key`](Self::has_key) returned `true`.
    fn invoke(&self, name: &str, context: &Context) -> Value;

    /// Optionally converts the drop into a plain value before a path lookup
    /// descends into it. Returning `None` keeps the drop itself.
    fn to_value(&self) -> Option<Value> {
        None
    }

    /// The string printed when the drop itself is output.
    fn to_liquid_string(&self) -> String {
        self.to_value()
            .map(|v| v.to_liquid_string())
            .unwrap_or_default()
    }
}

type Attribute = Arc<dyn Fn(&Context) -> Value + Send + Sync>;

/// A drop built from named closures, each evaluated on access.
///
/// ```
/// use liquid_rs_template::drop::LazyDrop;
/// use liquid_rs_template::value::Value;
///
/// let product = LazyDrop::new("product")
///     .attribute("title", |_| Value::from("Shirt"))
///     .attribute("on_sale", |ctx| ctx.get("sale_active"));
/// ```
#[derive(Clone)]
pub struct LazyDrop {
    name: String,
    attributes: BTreeMap<String, Attribute>,
}

impl LazyDrop {
    /// Creates an empty drop. `name` is what the drop prints as.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute computed by `f` every time it is read.
    #[must_use]
    pub fn attribute<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Context) -> Value + Send + Sync + 'static,
    {
        self.attributes.insert(name.into(), Arc::new(f));
        self
    }
}

impl fmt::Debug for LazyDrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyDrop")
            .field("name", &self.name)
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LiquidDrop for LazyDrop {
    fn has_key(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    fn invoke(&self, name: &str, context: &Context) -> Value {
        self.attributes
            .get(name)
            .map_or(Value::Nil, |attr| attr(context))
    }

    fn to_liquid_string(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Counter(i64);

    impl LiquidDrop for Counter {
        fn has_key(&self, name: &str) -> bool {
            name == "count"
        }

        fn invoke(&self, _name: &str, _context: &Context) -> Value {
            Value::Integer(self.0)
        }
    }

    #[test]
    fn test_default_string_is_empty_without_to_value() {
        assert_eq!(Counter(3).to_liquid_string(), "");
    }

    #[test]
    fn test_lazy_drop_reads_context() {
        let drop = LazyDrop::new("greeter").attribute("who", |ctx| ctx.get("name"));
        let mut ctx = Context::new();
        ctx.set("name", "Ada");
        assert!(drop.has_key("who"));
        assert!(!drop.has_key("secret"));
        assert_eq!(drop.invoke("who", &ctx), Value::from("Ada"));
        assert_eq!(drop.to_liquid_string(), "greeter");
    }

    #[test]
    fn test_lazy_drop_evaluates_on_each_access() {
        let drop = LazyDrop::new("d").attribute("n", |ctx| ctx.get("n"));
        let mut ctx = Context::new();
        ctx.set("n", 1);
        assert_eq!(drop.invoke("n", &ctx), Value::Integer(1));
        ctx.set("n", 2);
        assert_eq!(drop.invoke("n", &ctx), Value::Integer(2));
    }
}
