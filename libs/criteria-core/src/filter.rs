//! RHS filter parsing: `field → ["op:value", ...]` into [`Criteria`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::criteria::{CompareOp, Criteria, LikePattern};
use crate::error::{Error, Result};
use crate::schema::{FieldRef, FieldSchema};
use crate::value::{FieldKind, Value};

/// Separator between the members of an `in:`/`nin:` list.
pub const LIST_SEPARATOR: char = '|';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    ILike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl FilterOp {
    pub const ALL: [FilterOp; 12] = [
        FilterOp::Eq,
        FilterOp::Ne,
        FilterOp::Gt,
        FilterOp::Gte,
        FilterOp::Lt,
        FilterOp::Lte,
        FilterOp::Like,
        FilterOp::ILike,
        FilterOp::In,
        FilterOp::NotIn,
        FilterOp::IsNull,
        FilterOp::IsNotNull,
    ];

    pub fn token(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "lk",
            FilterOp::ILike => "ilk",
            FilterOp::In => "in",
            FilterOp::NotIn => "nin",
            FilterOp::IsNull => "nul",
            FilterOp::IsNotNull => "nnul",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.token().eq_ignore_ascii_case(token))
    }

    /// Operators a field of `kind` accepts unless its spec overrides them.
    pub fn defaults_for(kind: FieldKind) -> &'static [FilterOp] {
        use FilterOp::*;
        match kind {
            FieldKind::String => &[Eq, Ne, Like, ILike, In, NotIn, IsNull, IsNotNull],
            FieldKind::Number | FieldKind::Date => {
                &[Eq, Ne, Gt, Gte, Lt, Lte, In, NotIn, IsNull, IsNotNull]
            }
            FieldKind::Enum | FieldKind::Uuid => &[Eq, Ne, In, NotIn, IsNull, IsNotNull],
            FieldKind::Bool => &[Eq, Ne, IsNull, IsNotNull],
        }
    }
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// How the values given for a single field combine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    #[serde(default)]
    pub operator_values: Vec<String>,
    #[serde(default)]
    pub combinator: Combinator,
}

impl FilterCondition {
    pub fn new<I, S>(field: impl Into<String>, operator_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            operator_values: operator_values.into_iter().map(Into::into).collect(),
            combinator: Combinator::And,
        }
    }

    pub fn any(mut self) -> Self {
        self.combinator = Combinator::Or;
        self
    }
}

/// Parse filter conditions into one criteria tree.
///
/// Values for one field combine with that field's combinator; different fields
/// always combine with `And`. Caller order is preserved so the output is
/// reproducible. Returns `Empty` when nothing was supplied.
pub fn parse_filters(schema: &FieldSchema, conditions: &[FilterCondition]) -> Result<Criteria> {
    let mut per_field = Vec::with_capacity(conditions.len());
    for cond in conditions {
        let field = schema
            .get(&cond.field)
            .ok_or_else(|| Error::InvalidFilterField(cond.field.clone()))?;
        if cond.operator_values.is_empty() {
            continue;
        }

        let nodes = cond
            .operator_values
            .iter()
            .map(|raw| parse_operator_value(field, raw))
            .collect::<Result<Vec<_>>>()?;

        per_field.push(match cond.combinator {
            Combinator::And => Criteria::and(nodes),
            Combinator::Or => Criteria::or(nodes),
        });
    }

    let criteria = Criteria::and(per_field);
    debug!(entity = schema.entity(), filter = %criteria, "parsed filters");
    Ok(criteria)
}

fn parse_operator_value(field: FieldRef<'_>, raw: &str) -> Result<Criteria> {
    let invalid_op = |token: &str| Error::InvalidFilterOperator {
        field: field.name.to_string(),
        operator: token.to_string(),
    };

    let (token, value) = raw.split_once(':').ok_or_else(|| invalid_op(raw))?;
    let op = FilterOp::from_token(token)
        .filter(|op| field.spec.allows(*op))
        .ok_or_else(|| invalid_op(token))?;

    let name = field.name.to_string();
    Ok(match op {
        FilterOp::Eq => Criteria::Equals(name, typed(field, value)?),
        FilterOp::Ne => Criteria::NotEquals(name, typed(field, value)?),
        FilterOp::Gt => Criteria::Compare(name, CompareOp::Gt, typed(field, value)?),
        FilterOp::Gte => Criteria::Compare(name, CompareOp::Gte, typed(field, value)?),
        FilterOp::Lt => Criteria::Compare(name, CompareOp::Lt, typed(field, value)?),
        FilterOp::Lte => Criteria::Compare(name, CompareOp::Lte, typed(field, value)?),
        FilterOp::Like => Criteria::Like(name, LikePattern::new(value)),
        FilterOp::ILike => Criteria::Like(name, LikePattern::ignore_case(value)),
        FilterOp::In => Criteria::In(name, typed_list(field, value)?),
        FilterOp::NotIn => Criteria::NotIn(name, typed_list(field, value)?),
        FilterOp::IsNull => Criteria::IsNull(name),
        FilterOp::IsNotNull => Criteria::IsNotNull(name),
    })
}

fn typed(field: FieldRef<'_>, raw: &str) -> Result<Value> {
    field
        .spec
        .parse_value(raw)
        .map_err(|e| Error::InvalidFilterValue {
            field: field.name.to_string(),
            value: e.raw,
            expected: e.expected,
        })
}

/// `a|b|c`, blank items skipped. At least one item is required.
fn typed_list(field: FieldRef<'_>, raw: &str) -> Result<Vec<Value>> {
    let values = raw
        .split(LIST_SEPARATOR)
        .filter(|s| !s.trim().is_empty())
        .map(|s| typed(field, s))
        .collect::<Result<Vec<_>>>()?;
    if values.is_empty() {
        return Err(Error::InvalidFilterValue {
            field: field.name.to_string(),
            value: raw.to_string(),
            expected: field.spec.kind,
        });
    }
    Ok(values)
}
