//! Boundary with the persistence layer.
//!
//! The store receives a criteria tree, an order and a bound, and turns them into
//! whatever its backend speaks. It never sees request parameters or cursor tokens.

use async_trait::async_trait;

use criteria_core::{CompareOp, Criteria, Record, SortDir, SortKey, SortSpec, Value};

/// One keyset read: rows matching `criteria`, strictly after `after` in `sort`
/// order, at most `limit` of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeysetQuery {
    pub criteria: Criteria,
    pub sort: SortSpec,
    /// One value per sort key, `None` inside for a missing value. `None` reads
    /// from the start.
    pub after: Option<Vec<Option<Value>>>,
    pub limit: u64,
}

impl KeysetQuery {
    /// The "strictly after" bound as a criteria tree:
    /// `(k0 > v0) OR (k0 = v0 AND k1 > v1) OR ...`, with `<` for descending keys.
    ///
    /// A missing value orders before every present one, so ascending keys put
    /// nulls first and descending keys put them last. Stores must sort the same
    /// way (`NULLS FIRST` on `ASC`, `NULLS LAST` on `DESC`).
    pub fn seek_criteria(&self) -> Criteria {
        let Some(after) = &self.after else {
            return Criteria::Empty;
        };

        let keys = self.sort.keys();
        let branches = (0..keys.len().min(after.len())).filter_map(|i| {
            let step = past(&keys[i], after[i].as_ref())?;
            let prefix = keys[..i]
                .iter()
                .zip(after)
                .map(|(k, v)| at(k, v.as_ref()));
            Some(Criteria::and(prefix.chain(std::iter::once(step))))
        });
        Criteria::or(branches)
    }

    /// Caller criteria and the seek bound together.
    pub fn effective_criteria(&self) -> Criteria {
        Criteria::and([self.criteria.clone(), self.seek_criteria()])
    }
}

/// Rows whose `key` equals `value`.
fn at(key: &SortKey, value: Option<&Value>) -> Criteria {
    match value {
        Some(v) => Criteria::equals(key.field.clone(), v.clone()),
        None => Criteria::IsNull(key.field.clone()),
    }
}

/// Rows strictly past `value` on `key` alone; `None` when nothing can be.
fn past(key: &SortKey, value: Option<&Value>) -> Option<Criteria> {
    let field = key.field.clone();
    match (key.dir, value) {
        (SortDir::Asc, Some(v)) => Some(Criteria::compare(field, CompareOp::Gt, v.clone())),
        (SortDir::Asc, None) => Some(Criteria::IsNotNull(field)),
        (SortDir::Desc, Some(v)) => Some(Criteria::or([
            Criteria::compare(field.clone(), CompareOp::Lt, v.clone()),
            Criteria::IsNull(field),
        ])),
        (SortDir::Desc, None) => None,
    }
}

/// One numbered-page read plus a total count of matching rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OffsetQuery {
    pub criteria: Criteria,
    pub sort: SortSpec,
    pub offset: u64,
    pub limit: u64,
}

/// Port implemented by the persistence layer. Object-safe and async-friendly via
/// `async_trait`; errors are passed through to the caller untouched.
#[async_trait]
pub trait PageStore: Send + Sync {
    type Row: Record + Send;

    async fn fetch_keyset(&self, query: &KeysetQuery) -> anyhow::Result<Vec<Self::Row>>;

    async fn fetch_offset(&self, query: &OffsetQuery) -> anyhow::Result<(Vec<Self::Row>, u64)>;
}
