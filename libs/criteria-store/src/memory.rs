//! Reference store that evaluates criteria in process.
//!
//! Useful for tests, fixtures and small static datasets. Null handling follows SQL:
//! a comparison against a missing value is false, except `IsNull`.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use tracing::trace;

use criteria_core::{Criteria, LikePattern, Record, SortSpec};

use crate::store::{KeysetQuery, OffsetQuery, PageStore};

#[derive(Debug, Default)]
pub struct InMemoryStore<R> {
    rows: Vec<R>,
    calls: AtomicUsize,
}

impl<R> InMemoryStore<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Number of fetches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::Relaxed)
    }
}

impl<R: Record + Clone> InMemoryStore<R> {
    /// Every row matching `criteria`, in `sort` order, without paging.
    pub fn select(&self, criteria: &Criteria, sort: &SortSpec) -> Vec<R> {
        let mut out: Vec<R> = self
            .rows
            .iter()
            .filter(|r| matches(criteria, *r))
            .cloned()
            .collect();
        out.sort_by(|a, b| compare_rows(a, b, sort));
        out
    }
}

#[async_trait]
impl<R> PageStore for InMemoryStore<R>
where
    R: Record + Clone + Send + Sync,
{
    type Row = R;

    async fn fetch_keyset(&self, query: &KeysetQuery) -> anyhow::Result<Vec<R>> {
        self.calls.fetch_add(1, AtomicOrdering::Relaxed);
        let mut rows = self.select(&query.effective_criteria(), &query.sort);
        rows.truncate(usize::try_from(query.limit)?);
        trace!(rows = rows.len(), "in-memory keyset fetch");
        Ok(rows)
    }

    async fn fetch_offset(&self, query: &OffsetQuery) -> anyhow::Result<(Vec<R>, u64)> {
        self.calls.fetch_add(1, AtomicOrdering::Relaxed);
        let all = self.select(&query.criteria, &query.sort);
        let total = all.len() as u64;
        let rows = all
            .into_iter()
            .skip(usize::try_from(query.offset)?)
            .take(usize::try_from(query.limit)?)
            .collect();
        Ok((rows, total))
    }
}

/// Evaluate `criteria` against one row.
pub fn matches<R: Record + ?Sized>(criteria: &Criteria, row: &R) -> bool {
    let eq = |field: &str, v: &criteria_core::Value| {
        row.field_value(field)
            .and_then(|x| x.compare(v))
            .is_some_and(Ordering::is_eq)
    };

    match criteria {
        Criteria::Empty => true,
        Criteria::Equals(f, v) => eq(f, v),
        Criteria::NotEquals(f, v) => row
            .field_value(f)
            .and_then(|x| x.compare(v))
            .is_some_and(Ordering::is_ne),
        Criteria::Compare(f, op, v) => row
            .field_value(f)
            .and_then(|x| x.compare(v))
            .is_some_and(|o| match op {
                criteria_core::CompareOp::Gt => o.is_gt(),
                criteria_core::CompareOp::Gte => o.is_ge(),
                criteria_core::CompareOp::Lt => o.is_lt(),
                criteria_core::CompareOp::Lte => o.is_le(),
            }),
        Criteria::Like(f, p) => row
            .field_value(f)
            .is_some_and(|x| x.as_str().is_some_and(|s| like_match(p, s))),
        Criteria::In(f, vs) => vs.iter().any(|v| eq(f, v)),
        Criteria::NotIn(f, vs) => row.field_value(f).is_some() && !vs.iter().any(|v| eq(f, v)),
        Criteria::IsNull(f) => row.field_value(f).is_none(),
        Criteria::IsNotNull(f) => row.field_value(f).is_some(),
        Criteria::And(cs) => cs.iter().all(|c| matches(c, row)),
        Criteria::Or(cs) => cs.iter().any(|c| matches(c, row)),
    }
}

/// Total order of two rows under `sort`. A missing value orders below any present
/// one before the key direction applies: nulls lead ascending keys, trail descending.
pub fn compare_rows<R: Record + ?Sized>(a: &R, b: &R, sort: &SortSpec) -> Ordering {
    for key in sort.keys() {
        let ord = match (a.field_value(&key.field), b.field_value(&key.field)) {
            (Some(x), Some(y)) => x.compare(&y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ord = key.dir.apply(ord);
        if ord.is_ne() {
            return ord;
        }
    }
    Ordering::Equal
}

#[derive(Debug, PartialEq)]
enum Tok {
    Any,
    One,
    Lit(char),
}

fn tokenize(pattern: &str) -> Vec<Tok> {
    let mut out = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        out.push(match c {
            '%' => Tok::Any,
            '_' => Tok::One,
            '\\' => Tok::Lit(chars.next().unwrap_or('\\')),
            c => Tok::Lit(c),
        });
    }
    out
}

/// SQL `LIKE` matching with `\` as the escape character.
pub fn like_match(pattern: &LikePattern, text: &str) -> bool {
    let (pat, text) = if pattern.case_insensitive {
        (pattern.pattern.to_lowercase(), text.to_lowercase())
    } else {
        (pattern.pattern.clone(), text.to_string())
    };
    let toks = tokenize(&pat);
    let text: Vec<char> = text.chars().collect();

    // dp[j]: toks[..i] matches text[..j]
    let mut dp = vec![false; text.len() + 1];
    dp[0] = true;
    for tok in &toks {
        let mut next = vec![false; text.len() + 1];
        match tok {
            Tok::Any => {
                let mut seen = false;
                for j in 0..=text.len() {
                    seen |= dp[j];
                    next[j] = seen;
                }
            }
            Tok::One => {
                for j in 1..=text.len() {
                    next[j] = dp[j - 1];
                }
            }
            Tok::Lit(c) => {
                for j in 1..=text.len() {
                    next[j] = dp[j - 1] && text[j - 1] == *c;
                }
            }
        }
        dp = next;
    }
    dp[text.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use criteria_core::{CompareOp, DynRecord, Value};

    fn row() -> DynRecord {
        DynRecord::new()
            .with("name", "Jo_hn 100%")
            .with("age", 40)
    }

    #[test]
    fn like_wildcards_and_escapes() {
        assert!(like_match(&LikePattern::new("Jo%"), "Jo_hn"));
        assert!(!like_match(&LikePattern::new("jo%"), "Jo_hn"));
        assert!(like_match(&LikePattern::ignore_case("jo%"), "Jo_hn"));
        assert!(like_match(&LikePattern::new("J_\\_hn"), "Jo_hn"));
        assert!(!like_match(&LikePattern::new("J_\\_hn"), "Joxhn"));
        assert!(like_match(&LikePattern::contains_ignore_case("100%"), "x 100% y"));
        assert!(!like_match(&LikePattern::contains_ignore_case("100%"), "x 1000 y"));
        assert!(like_match(&LikePattern::new("%"), ""));
    }

    #[test]
    fn null_semantics() {
        let r = row();
        assert!(matches(&Criteria::IsNull("email".into()), &r));
        assert!(!matches(&Criteria::not_equals("email", "x"), &r));
        assert!(!matches(&Criteria::NotIn("email".into(), vec![Value::from("x")]), &r));
        assert!(matches(&Criteria::compare("age", CompareOp::Gte, 40), &r));
        assert!(!matches(&Criteria::compare("age", CompareOp::Gt, 40), &r));
        // kinds never compare across each other
        assert!(!matches(&Criteria::equals("age", "40"), &r));
    }

    #[test]
    fn empty_matches_everything() {
        assert!(matches(&Criteria::Empty, &row()));
    }
}
