//! Sort directives, always terminated by the schema's unique tie-breaker.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::FieldSchema;
use crate::value::FieldKind;

pub const MAX_SORT_FIELDS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn reverse(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }

    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortDir::Asc => ordering,
            SortDir::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }

    fn sign(self) -> char {
        match self {
            SortDir::Asc => '+',
            SortDir::Desc => '-',
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub field: String,
    pub dir: SortDir,
    pub kind: FieldKind,
}

/// Validated, non-empty sort. The tie-breaker field is always present, which
/// gives a total order over rows.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortSpec {
    keys: Vec<SortKey>,
    tiebreaker: usize,
}

impl SortSpec {
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Primary sort key.
    pub fn leading(&self) -> &SortKey {
        &self.keys[0]
    }

    pub fn tiebreaker(&self) -> &SortKey {
        &self.keys[self.tiebreaker]
    }

    pub fn tiebreaker_index(&self) -> usize {
        self.tiebreaker
    }

    /// Same fields with every direction flipped; used to walk backwards.
    pub fn reversed(&self) -> Self {
        Self {
            keys: self
                .keys
                .iter()
                .map(|k| SortKey {
                    dir: k.dir.reverse(),
                    ..k.clone()
                })
                .collect(),
            tiebreaker: self.tiebreaker,
        }
    }

    /// Compact form used inside cursors: `-createdAt,+email,-id`.
    pub fn to_signed_tokens(&self) -> String {
        self.keys
            .iter()
            .map(|k| format!("{}{}", k.dir.sign(), k.field))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn equals_signed_tokens(&self, signed: &str) -> bool {
        let parsed: Vec<(&str, SortDir)> = signed
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|seg| match seg.as_bytes()[0] {
                b'+' => (&seg[1..], SortDir::Asc),
                b'-' => (&seg[1..], SortDir::Desc),
                _ => (seg, SortDir::Asc),
            })
            .collect();
        parsed.len() == self.keys.len()
            && parsed
                .iter()
                .zip(&self.keys)
                .all(|((f, d), k)| *f == k.field && *d == k.dir)
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .keys
            .iter()
            .map(|k| format!("{} {}", k.field, k.dir.as_str()))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Parse `direction:field` tokens (`asc:email`, `desc:createdAt`); a bare field
/// sorts ascending.
///
/// The tie-breaker is appended with the direction of the last directive, or
/// `desc` when no directive was given (most recent first). An explicit
/// tie-breaker directive keeps its position and direction.
pub fn parse_sort<I, S>(schema: &FieldSchema, tokens: I) -> Result<SortSpec>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut keys: Vec<SortKey> = Vec::new();

    for token in tokens {
        let token = token.as_ref().trim();
        if token.is_empty() {
            continue;
        }
        let (dir, field) = match token.split_once(':') {
            Some((d, f)) => (parse_dir(d)?, f.trim()),
            None => (SortDir::Asc, token),
        };
        if field.is_empty() {
            return Err(Error::InvalidSortField(token.to_string()));
        }

        let spec = schema
            .get(field)
            .filter(|f| f.spec.sortable)
            .ok_or_else(|| Error::InvalidSortField(field.to_string()))?;
        if keys.iter().any(|k| k.field == spec.name) {
            return Err(Error::InvalidSortField(format!("duplicate sort field {}", spec.name)));
        }
        if keys.len() == MAX_SORT_FIELDS {
            return Err(Error::InvalidSortField("too many sort fields".into()));
        }

        keys.push(SortKey {
            field: spec.name.to_string(),
            dir,
            kind: spec.spec.kind,
        });
    }

    let tb = schema.tiebreaker();
    let tiebreaker = match keys.iter().position(|k| k.field == tb.name) {
        Some(i) => i,
        None => {
            let dir = keys.last().map(|k| k.dir).unwrap_or(SortDir::Desc);
            keys.push(SortKey {
                field: tb.name.to_string(),
                dir,
                kind: tb.spec.kind,
            });
            keys.len() - 1
        }
    };

    let spec = SortSpec { keys, tiebreaker };
    debug!(entity = schema.entity(), sort = %spec, "parsed sort");
    Ok(spec)
}

fn parse_dir(raw: &str) -> Result<SortDir> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "asc" => Ok(SortDir::Asc),
        "desc" => Ok(SortDir::Desc),
        _ => Err(Error::InvalidSortDirection(raw.to_string())),
    }
}
