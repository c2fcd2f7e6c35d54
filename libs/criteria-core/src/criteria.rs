//! Immutable predicate tree over named fields.

use std::fmt;

use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

/// SQL-style pattern: `%` matches any run, `_` one character, `\` escapes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LikePattern {
    pub pattern: String,
    pub case_insensitive: bool,
}

impl LikePattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            case_insensitive: false,
        }
    }

    pub fn ignore_case(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            case_insensitive: true,
        }
    }

    /// Case-insensitive "contains" with the wildcard characters of `term` escaped.
    pub fn contains_ignore_case(term: &str) -> Self {
        Self::ignore_case(format!("%{}%", like_escape(term)))
    }
}

pub fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            c => out.push(c),
        }
    }
    out
}

/// Closed set of predicate nodes.
///
/// Build compound nodes through [`Criteria::and`] / [`Criteria::or`]: they drop
/// `Empty` children, flatten nested nodes of the same combinator and collapse
/// single-child and empty lists, so structurally equal predicates compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Criteria {
    #[default]
    Empty,
    Equals(String, Value),
    NotEquals(String, Value),
    Compare(String, CompareOp, Value),
    Like(String, LikePattern),
    In(String, Vec<Value>),
    NotIn(String, Vec<Value>),
    IsNull(String),
    IsNotNull(String),
    And(Vec<Criteria>),
    Or(Vec<Criteria>),
}

impl Criteria {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::Equals(field.into(), value.into())
    }

    pub fn not_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::NotEquals(field.into(), value.into())
    }

    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Criteria::Compare(field.into(), op, value.into())
    }

    pub fn like(field: impl Into<String>, pattern: LikePattern) -> Self {
        Criteria::Like(field.into(), pattern)
    }

    pub fn and(children: impl IntoIterator<Item = Criteria>) -> Self {
        Self::combine(children, true)
    }

    pub fn or(children: impl IntoIterator<Item = Criteria>) -> Self {
        Self::combine(children, false)
    }

    fn combine(children: impl IntoIterator<Item = Criteria>, conjunction: bool) -> Self {
        let mut out = Vec::new();
        for child in children {
            match child.normalized() {
                Criteria::Empty => {}
                Criteria::And(inner) if conjunction => out.extend(inner),
                Criteria::Or(inner) if !conjunction => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => Criteria::Empty,
            1 => out.pop().unwrap_or_default(),
            _ if conjunction => Criteria::And(out),
            _ => Criteria::Or(out),
        }
    }

    /// Re-applies the `and`/`or` normalization to a tree that may have been built
    /// from the raw variants.
    pub fn normalized(self) -> Self {
        match self {
            Criteria::And(children) => Self::combine(children, true),
            Criteria::Or(children) => Self::combine(children, false),
            leaf => leaf,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Criteria::Empty)
    }

    /// Field referenced by a leaf node.
    pub fn field(&self) -> Option<&str> {
        match self {
            Criteria::Equals(f, _)
            | Criteria::NotEquals(f, _)
            | Criteria::Compare(f, _, _)
            | Criteria::Like(f, _)
            | Criteria::In(f, _)
            | Criteria::NotIn(f, _)
            | Criteria::IsNull(f)
            | Criteria::IsNotNull(f) => Some(f),
            Criteria::Empty | Criteria::And(_) | Criteria::Or(_) => None,
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            Criteria::And(children) | Criteria::Or(children) => {
                1 + children.iter().map(Criteria::node_count).sum::<usize>()
            }
            _ => 1,
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
    f.write_str("[")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{v}")?;
    }
    f.write_str("]")
}

fn write_children(f: &mut fmt::Formatter<'_>, children: &[Criteria], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, c) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{c}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criteria::Empty => f.write_str("()"),
            Criteria::Equals(k, v) => write!(f, "{k} = {v}"),
            Criteria::NotEquals(k, v) => write!(f, "{k} != {v}"),
            Criteria::Compare(k, op, v) => write!(f, "{k} {} {v}", op.symbol()),
            Criteria::Like(k, p) if p.case_insensitive => write!(f, "{k} ILIKE {}", p.pattern),
            Criteria::Like(k, p) => write!(f, "{k} LIKE {}", p.pattern),
            Criteria::In(k, vs) => {
                write!(f, "{k} IN ")?;
                write_list(f, vs)
            }
            Criteria::NotIn(k, vs) => {
                write!(f, "{k} NOT IN ")?;
                write_list(f, vs)
            }
            Criteria::IsNull(k) => write!(f, "{k} IS NULL"),
            Criteria::IsNotNull(k) => write!(f, "{k} IS NOT NULL"),
            Criteria::And(children) => write_children(f, children, " AND "),
            Criteria::Or(children) => write_children(f, children, " OR "),
        }
    }
}
