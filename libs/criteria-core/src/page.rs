use serde::{Deserialize, Serialize};

/// One keyset page. A `None` cursor means there is nothing further in that direction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage<T> {
    pub data: Vec<T>,
    pub next_page_cursor: Option<String>,
    pub prev_page_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    pub fn new(
        data: Vec<T>,
        next_page_cursor: Option<String>,
        prev_page_cursor: Option<String>,
    ) -> Self {
        Self {
            data,
            next_page_cursor,
            prev_page_cursor,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), None, None)
    }

    /// Map rows while preserving the cursors (domain -> DTO convenience)
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> CursorPage<U> {
        CursorPage {
            data: self.data.into_iter().map(f).collect(),
            next_page_cursor: self.next_page_cursor,
            prev_page_cursor: self.prev_page_cursor,
        }
    }
}

/// One numbered page plus totals. `page` is zero-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetPage<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> OffsetPage<T> {
    pub fn new(data: Vec<T>, page: u64, size: u64, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(size)
        };
        Self {
            data,
            page,
            size,
            total_elements,
            total_pages,
        }
    }

    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> OffsetPage<U> {
        OffsetPage {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// Result of a list request; the variant follows the request's pagination mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Page<T> {
    Cursor(CursorPage<T>),
    Offset(OffsetPage<T>),
}

impl<T> Page<T> {
    pub fn data(&self) -> &[T] {
        match self {
            Page::Cursor(p) => &p.data,
            Page::Offset(p) => &p.data,
        }
    }

    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        match self {
            Page::Cursor(p) => Page::Cursor(p.map_items(f)),
            Page::Offset(p) => Page::Offset(p.map_items(f)),
        }
    }
}
