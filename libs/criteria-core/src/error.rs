use thiserror::Error;

use crate::value::FieldKind;

/// Why a cursor token was refused. Every fault surfaces as [`Error::InvalidCursor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorFault {
    Base64,
    Json,
    Version,
    Checksum,
    SortMismatch,
    FilterMismatch,
    KeyCount,
    KeyType,
}

impl CursorFault {
    pub fn describe(self) -> &'static str {
        match self {
            CursorFault::Base64 => "invalid base64url encoding",
            CursorFault::Json => "malformed payload",
            CursorFault::Version => "unsupported version",
            CursorFault::Checksum => "checksum mismatch",
            CursorFault::SortMismatch => "produced under a different sort",
            CursorFault::FilterMismatch => "produced under a different filter",
            CursorFault::KeyCount => "key count does not match the sort",
            CursorFault::KeyType => "key does not match the field type",
        }
    }
}

impl std::fmt::Display for CursorFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unknown filter field: {0}")]
    InvalidFilterField(String),

    #[error("unsupported filter operator '{operator}' for field {field}")]
    InvalidFilterOperator { field: String, operator: String },

    #[error("invalid value for filter field {field}: '{value}' is not a valid {expected}")]
    InvalidFilterValue {
        field: String,
        value: String,
        expected: FieldKind,
    },

    #[error("unsupported sort field: {0}")]
    InvalidSortField(String),

    #[error("invalid sort direction: {0}")]
    InvalidSortDirection(String),

    #[error("invalid cursor: {0}")]
    InvalidCursor(CursorFault),

    #[error("query is missing its mandatory scope constraint")]
    MissingScope,

    #[error("invalid page size: {0}")]
    InvalidPageSize(u64),

    #[error("cannot build cursor from row: field {field} {reason}")]
    UnencodableRow { field: String, reason: &'static str },

    #[error("invalid field schema: {0}")]
    Schema(String),
}

impl Error {
    /// Stable machine-readable code for transport mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidFilterField(_) => "INVALID_FILTER_FIELD",
            Error::InvalidFilterOperator { .. } => "INVALID_FILTER_OPERATOR",
            Error::InvalidFilterValue { .. } => "INVALID_FILTER_VALUE",
            Error::InvalidSortField(_) => "INVALID_SORT_FIELD",
            Error::InvalidSortDirection(_) => "INVALID_SORT_DIRECTION",
            Error::InvalidCursor(_) => "INVALID_CURSOR",
            Error::MissingScope => "MISSING_SCOPE",
            Error::InvalidPageSize(_) => "INVALID_PAGE_SIZE",
            Error::UnencodableRow { .. } => "UNENCODABLE_ROW",
            Error::Schema(_) => "INVALID_SCHEMA",
        }
    }

    /// `true` when the caller's input is at fault ("bad request"); `false` for
    /// programming errors in the composing service.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Error::MissingScope | Error::UnencodableRow { .. } | Error::Schema(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
