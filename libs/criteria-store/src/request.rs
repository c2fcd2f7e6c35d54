use serde::{Deserialize, Serialize};

use criteria_core::{Criteria, CursorPosition, FilterCondition, SortSpec};

/// Raw list parameters as handed over by the transport layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListRequest {
    pub filters: Vec<FilterCondition>,
    pub search: Option<String>,
    pub sort: Vec<String>,
    pub pagination: Pagination,
}

impl ListRequest {
    pub fn filter(mut self, condition: FilterCondition) -> Self {
        self.filters.push(condition);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort_by(mut self, token: impl Into<String>) -> Self {
        self.sort.push(token.into());
        self
    }

    pub fn keyset(mut self, size: Option<u64>, cursor: Option<String>) -> Self {
        self.pagination = Pagination::Keyset { size, cursor };
        self
    }

    pub fn offset(mut self, page: u64, size: Option<u64>) -> Self {
        self.pagination = Pagination::Offset { page, size };
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Pagination {
    Keyset {
        #[serde(default)]
        size: Option<u64>,
        #[serde(default)]
        cursor: Option<String>,
    },
    /// Zero-based page number.
    Offset {
        page: u64,
        #[serde(default)]
        size: Option<u64>,
    },
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::Keyset {
            size: None,
            cursor: None,
        }
    }
}

/// Fully validated request, ready for a single store call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedQuery {
    pub criteria: Criteria,
    pub sort: SortSpec,
    pub filter_hash: String,
    pub mode: PreparedMode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreparedMode {
    Keyset {
        limit: u64,
        position: Option<CursorPosition>,
    },
    Offset {
        page: u64,
        size: u64,
    },
}
