//! Filter hashing utilities for cursor consistency checks

use sha2::{Digest, Sha256};

use crate::criteria::Criteria;
use crate::value::Value;

/// Normalize a criteria tree into a stable, kind-tagged string for hashing.
#[must_use]
pub fn normalize_criteria_for_hash(criteria: &Criteria) -> String {
    fn value(v: &Value) -> String {
        format!("{}({})", v.kind().as_str().to_uppercase(), v.render())
    }

    fn list(vs: &[Value]) -> String {
        vs.iter().map(value).collect::<Vec<_>>().join(",")
    }

    fn children(cs: &[Criteria]) -> String {
        cs.iter().map(normalize).collect::<Vec<_>>().join(",")
    }

    fn normalize(c: &Criteria) -> String {
        match c {
            Criteria::Empty => "EMPTY".to_string(),
            Criteria::Equals(f, v) => format!("EQ({f},{})", value(v)),
            Criteria::NotEquals(f, v) => format!("NE({f},{})", value(v)),
            Criteria::Compare(f, op, v) => format!("CMP({f},{},{})", op.symbol(), value(v)),
            Criteria::Like(f, p) => format!(
                "LIKE({f},{},{})",
                if p.case_insensitive { "I" } else { "S" },
                p.pattern
            ),
            Criteria::In(f, vs) => format!("IN({f},{})", list(vs)),
            Criteria::NotIn(f, vs) => format!("NIN({f},{})", list(vs)),
            Criteria::IsNull(f) => format!("NULL({f})"),
            Criteria::IsNotNull(f) => format!("NNULL({f})"),
            Criteria::And(cs) => format!("AND({})", children(cs)),
            Criteria::Or(cs) => format!("OR({})", children(cs)),
        }
    }

    normalize(criteria)
}

/// 16 hex characters (64 bits) of SHA-256 over the normalized criteria.
#[must_use]
pub fn short_filter_hash(criteria: &Criteria) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_criteria_for_hash(criteria).as_bytes());
    let bytes = hasher.finalize();
    hex::encode(&bytes[..8])
}
