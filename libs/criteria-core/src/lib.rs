//! Filtering, search and keyset-cursor primitives for list endpoints.
//!
//! Request parameters flow through [`parse_filters`] and [`compile_search`], are merged
//! with the caller's [`Scope`] by [`compose`], and ordered by a [`SortSpec`] from
//! [`parse_sort`]. [`CursorCodec`] turns a row position into an opaque token and back.
//! Nothing here touches storage; see the `criteria-store` crate for page execution.

pub mod compose;
pub mod criteria;
pub mod cursor;
pub mod error;
pub mod filter;
pub mod hash;
pub mod page;
pub mod record;
pub mod schema;
pub mod search;
pub mod sort;
pub mod value;

pub use compose::{compose, Scope};
pub use criteria::{like_escape, CompareOp, Criteria, LikePattern};
pub use cursor::{base64_url, CursorCodec, CursorPosition, Nav, CURSOR_VERSION};
pub use error::{CursorFault, Error, Result};
pub use filter::{parse_filters, Combinator, FilterCondition, FilterOp, LIST_SEPARATOR};
pub use hash::{normalize_criteria_for_hash, short_filter_hash};
pub use page::{CursorPage, OffsetPage, Page};
pub use record::{DynRecord, Record};
pub use schema::{FieldRef, FieldSchema, FieldSpec, SchemaBuilder};
pub use search::compile_search;
pub use sort::{parse_sort, SortDir, SortKey, SortSpec, MAX_SORT_FIELDS};
pub use value::{FieldKind, Value, ValueParseError};
