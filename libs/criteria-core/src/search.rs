//! Free-text search: one case-insensitive "contains" per searchable field, OR-ed.

use tracing::debug;

use crate::criteria::{Criteria, LikePattern};
use crate::schema::FieldSchema;

/// Compile a free-text term. A blank or absent term yields `Empty`.
///
/// A match on any searchable field qualifies a row, which is the opposite
/// combinator from cross-field filters.
pub fn compile_search(schema: &FieldSchema, term: Option<&str>) -> Criteria {
    let term = match term.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Criteria::Empty,
    };

    let criteria = Criteria::or(
        schema
            .searchable_fields()
            .map(|f| Criteria::like(f.name, LikePattern::contains_ignore_case(term))),
    );
    debug!(entity = schema.entity(), search = %criteria, "compiled search term");
    criteria
}
