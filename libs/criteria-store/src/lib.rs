//! Page assembly for list endpoints: request preparation, keyset and offset paging
//! over an abstract [`PageStore`], plus an in-memory store.

pub mod config;
pub mod memory;
pub mod paginate;
pub mod request;
pub mod store;

pub use config::{clamp_limit, LimitCfg, QueryConfig};
pub use memory::InMemoryStore;
pub use paginate::{PageError, Paginator};
pub use request::{ListRequest, Pagination, PreparedMode, PreparedQuery};
pub use store::{KeysetQuery, OffsetQuery, PageStore};
