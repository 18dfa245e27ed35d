//! Conditions for `if`, `unless`, `elsif` and `case`/`when`.
//!
//! A condition is one or more comparisons joined by `and` / `or`. Joins are
//! right-associative with no precedence between the two operators, so
//! `a and b or c` means `a and (b or c)`.

use std::cmp::Ordering;

use liquid_rs_core::error::{LiquidError, LiquidResult};

use crate::context::Context;
use crate::expression::{parse_expression, split_fragments, Expression};
use crate::value::Value;

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=` or `<>`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `contains`
    Contains,
}

impl Operator {
    fn from_markup(op: &str) -> Option<Self> {
        match op {
            "==" => Some(Self::Eq),
            "!=" | "<>" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "<=" => Some(Self::Le),
            ">=" => Some(Self::Ge),
            "contains" => Some(Self::Contains),
            _ => None,
        }
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// An ordinary expression.
    Expr(Expression),
    /// The `empty` keyword.
    Empty,
    /// The `blank` keyword.
    Blank,
}

impl Operand {
    fn parse(markup: &str) -> LiquidResult<Self> {
        match markup {
            "empty" => Ok(Self::Empty),
            "blank" => Ok(Self::Blank),
            _ => parse_expression(markup).map(Self::Expr),
        }
    }

    fn evaluate(&self, context: &Context) -> Value {
        match self {
            Self::Expr(expr) => expr.evaluate(context),
            Self::Empty | Self::Blank => Value::Nil,
        }
    }
}

/// `left` or `left op right`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    left: Operand,
    right: Option<(Operator, Operand)>,
}

impl Comparison {
    /// Evaluates the comparison.
    pub fn evaluate(&self, context: &Context) -> bool {
        let Some((op, right)) = &self.right else {
            return self.left.evaluate(context).is_truthy();
        };

        match (&self.left, right) {
            (Operand::Empty, other) => compare_with_empty(&other.evaluate(context), *op, true),
            (other, Operand::Empty) => compare_with_empty(&other.evaluate(context), *op, false),
            (Operand::Blank, other) | (other, Operand::Blank) => {
                keyword_check(*op, &other.evaluate(context), Value::is_blank)
            }
            (left, right) => compare(&left.evaluate(context), *op, &right.evaluate(context)),
        }
    }
}

/// Lists compare their length against `empty` as 0. Anything else only
/// supports `==` and `!=`.
fn compare_with_empty(value: &Value, op: Operator, empty_on_left: bool) -> bool {
    let Some(items) = value.as_list() else {
        return keyword_check(op, value, |v| v.is_empty() == Some(true));
    };
    let count = Value::from(items.len());
    let zero = Value::Integer(0);
    if empty_on_left {
        compare(&zero, op, &count)
    } else {
        compare(&count, op, &zero)
    }
}

fn keyword_check(op: Operator, value: &Value, test: impl Fn(&Value) -> bool) -> bool {
    match op {
        Operator::Eq => test(value),
        Operator::Ne => !test(value),
        _ => false,
    }
}

/// How a value takes part in `==` and ordering comparisons. Collections
/// compare as `true`.
fn comparable(value: &Value) -> Value {
    match value {
        Value::List(_) | Value::Dict(_) => Value::Bool(true),
        Value::Drop(drop) => drop.to_value().map_or_else(|| value.clone(), |v| comparable(&v)),
        _ => value.clone(),
    }
}

/// Applies `op` to two values.
///
/// `nil == nil` is true, `!=` with a non-nil side is true and every other
/// comparison involving `nil` is false.
pub fn compare(left: &Value, op: Operator, right: &Value) -> bool {
    if op == Operator::Contains {
        return contains(left, right);
    }

    let left = comparable(left);
    let right = comparable(right);

    if left.is_nil() || right.is_nil() {
        return match op {
            Operator::Eq => left.is_nil() && right.is_nil(),
            Operator::Ne => !(left.is_nil() && right.is_nil()),
            _ => false,
        };
    }

    match op {
        Operator::Eq => left.liquid_eq(&right),
        Operator::Ne => !left.liquid_eq(&right),
        Operator::Lt => left.liquid_cmp(&right) == Some(Ordering::Less),
        Operator::Gt => left.liquid_cmp(&right) == Some(Ordering::Greater),
        Operator::Le => matches!(
            left.liquid_cmp(&right),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Ge => matches!(
            left.liquid_cmp(&right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Contains => false,
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::String(s) => !needle.is_nil() && s.contains(&needle.to_liquid_string()),
        Value::List(items) => items.iter().any(|item| item.liquid_eq(needle)),
        Value::Dict(map) => map.contains_key(&needle.to_liquid_string()),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Logic {
    And,
    Or,
}

/// A chain of comparisons joined by `and` / `or`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    head: Comparison,
    rest: Option<(Logic, Box<Condition>)>,
}

impl Condition {
    /// Parses condition markup such as `a > 1 and b contains "x"`.
    ///
    /// # Errors
    ///
    /// Returns [`LiquidError::Syntax`] for unknown operators, dangling
    /// `and` / `or`, or comparisons that are not `left op right`.
    pub fn parse(markup: &str) -> LiquidResult<Self> {
        let fragments = split_fragments(markup);
        let mut groups: Vec<Vec<&str>> = vec![Vec::new()];
        let mut joins = Vec::new();

        for fragment in fragments {
            match fragment {
                "and" => {
                    joins.push(Logic::And);
                    groups.push(Vec::new());
                }
                "or" => {
                    joins.push(Logic::Or);
                    groups.push(Vec::new());
                }
                _ => {
                    if let Some(group) = groups.last_mut() {
                        group.push(fragment);
                    }
                }
            }
        }

        let mut comparisons = groups
            .iter()
            .map(|group| parse_comparison(group, markup))
            .collect::<LiquidResult<Vec<_>>>()?;

        // Fold from the right: `a and b or c` becomes `a and (b or c)`.
        let mut condition = Self {
            head: comparisons.pop().ok_or_else(|| syntax(markup))?,
            rest: None,
        };
        while let Some(head) = comparisons.pop() {
            let logic = joins.pop().ok_or_else(|| syntax(markup))?;
            condition = Self {
                head,
                rest: Some((logic, Box::new(condition))),
            };
        }
        Ok(condition)
    }

    /// Evaluates the condition, short-circuiting left to right.
    pub fn evaluate(&self, context: &Context) -> bool {
        let head = self.head.evaluate(context);
        match &self.rest {
            None => head,
            Some((Logic::And, rest)) => head && rest.evaluate(context),
            Some((Logic::Or, rest)) => head || rest.evaluate(context),
        }
    }
}

fn syntax(markup: &str) -> LiquidError {
    LiquidError::syntax("Invalid condition", markup)
}

fn parse_comparison(fragments: &[&str], markup: &str) -> LiquidResult<Comparison> {
    match fragments {
        [left] => Ok(Comparison {
            left: Operand::parse(left)?,
            right: None,
        }),
        [left, op, right] => {
            let op = Operator::from_markup(op).ok_or_else(|| {
                LiquidError::syntax(format!("Unknown operator {op}"), markup)
            })?;
            Ok(Comparison {
                left: Operand::parse(left)?,
                right: Some((op, Operand::parse(right)?)),
            })
        }
        _ => Err(syntax(markup)),
    }
}
