//! Page assembly on top of a [`PageStore`].
//!
//! Every request is validated completely in [`Paginator::prepare`] before the store
//! is touched. Keyset pages over-fetch by one row to detect whether more rows exist;
//! the extra row is never returned.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use criteria_core::{
    compile_search, compose, parse_filters, parse_sort, short_filter_hash, CursorCodec,
    CursorPage, CursorPosition, Error, FieldSchema, Nav, OffsetPage, Page, Scope,
};

use crate::config::{clamp_limit, LimitCfg, QueryConfig};
use crate::request::{ListRequest, Pagination, PreparedMode, PreparedQuery};
use crate::store::{KeysetQuery, OffsetQuery, PageStore};

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Query(#[from] Error),

    /// Store failure, passed through unchanged.
    #[error(transparent)]
    Store(anyhow::Error),
}

impl PageError {
    pub fn is_client_error(&self) -> bool {
        match self {
            PageError::Query(e) => e.is_client_error(),
            PageError::Store(_) => false,
        }
    }
}

/// Long-lived, per-entity paging entry point. Cheap to clone and share.
#[derive(Clone, Debug)]
pub struct Paginator {
    schema: Arc<FieldSchema>,
    codec: CursorCodec,
    limits: LimitCfg,
}

impl Paginator {
    pub fn new(schema: Arc<FieldSchema>, config: &QueryConfig) -> Self {
        let codec = match &config.cursor_secret {
            Some(secret) => CursorCodec::with_secret(secret.clone()),
            None => CursorCodec::new(),
        };
        Self {
            schema,
            codec,
            limits: config.limits(),
        }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn limits(&self) -> LimitCfg {
        self.limits
    }

    /// Validate and compile a request. No I/O; every input error surfaces here.
    #[instrument(
        name = "criteria_store.paginator.prepare",
        skip(self, request, scope),
        fields(entity = %self.schema.entity())
    )]
    pub fn prepare(
        &self,
        request: &ListRequest,
        scope: Option<&Scope>,
    ) -> Result<PreparedQuery, Error> {
        if let Some(scope) = scope {
            scope.validate(&self.schema)?;
        }
        let filter = parse_filters(&self.schema, &request.filters)?;
        let search = compile_search(&self.schema, request.search.as_deref());
        let criteria = compose(scope, filter, search)?;
        let sort = parse_sort(&self.schema, &request.sort)?;
        let filter_hash = short_filter_hash(&criteria);

        let mode = match &request.pagination {
            Pagination::Keyset { size, cursor } => {
                let limit = clamp_limit(*size, self.limits)?;
                let position = cursor
                    .as_deref()
                    .map(|token| self.codec.decode(token, &sort, Some(&filter_hash)))
                    .transpose()
                    .inspect_err(|e| warn!(error = %e, "cursor rejected"))?;
                PreparedMode::Keyset { limit, position }
            }
            Pagination::Offset { page, size } => PreparedMode::Offset {
                page: *page,
                size: clamp_limit(*size, self.limits)?,
            },
        };

        debug!(criteria = %criteria, sort = %sort, "prepared list query");
        Ok(PreparedQuery {
            criteria,
            sort,
            filter_hash,
            mode,
        })
    }

    /// Prepare and execute one page request with exactly one store call.
    #[instrument(
        name = "criteria_store.paginator.fetch_page",
        skip(self, store, request, scope),
        fields(entity = %self.schema.entity())
    )]
    pub async fn fetch_page<S>(
        &self,
        store: &S,
        request: &ListRequest,
        scope: Option<&Scope>,
    ) -> Result<Page<S::Row>, PageError>
    where
        S: PageStore + ?Sized,
    {
        let prepared = self.prepare(request, scope)?;
        self.execute(store, &prepared).await
    }

    pub async fn execute<S>(
        &self,
        store: &S,
        prepared: &PreparedQuery,
    ) -> Result<Page<S::Row>, PageError>
    where
        S: PageStore + ?Sized,
    {
        match &prepared.mode {
            PreparedMode::Keyset { limit, position } => self
                .fetch_keyset(store, prepared, *limit, position.as_ref())
                .await
                .map(Page::Cursor),
            PreparedMode::Offset { page, size } => self
                .fetch_offset(store, prepared, *page, *size)
                .await
                .map(Page::Offset),
        }
    }

    async fn fetch_keyset<S>(
        &self,
        store: &S,
        prepared: &PreparedQuery,
        limit: u64,
        position: Option<&CursorPosition>,
    ) -> Result<CursorPage<S::Row>, PageError>
    where
        S: PageStore + ?Sized,
    {
        let backward = position.is_some_and(|p| p.nav() == Nav::Prev);
        let query = KeysetQuery {
            criteria: prepared.criteria.clone(),
            sort: if backward {
                prepared.sort.reversed()
            } else {
                prepared.sort.clone()
            },
            after: position.map(|p| p.keys().to_vec()),
            limit: limit + 1,
        };

        let mut rows = store
            .fetch_keyset(&query)
            .await
            .map_err(PageError::Store)?;

        let has_more = rows.len() as u64 > limit;
        if has_more {
            rows.truncate(limit as usize);
        }
        if backward {
            rows.reverse();
        }
        debug!(rows = rows.len(), has_more, backward, "fetched keyset page");

        let encode = |row: &S::Row, nav: Nav| {
            self.codec
                .encode(row, &prepared.sort, nav, Some(&prepared.filter_hash))
        };
        let (next, prev) = if backward {
            (rows.last().is_some(), has_more)
        } else {
            (has_more, position.is_some())
        };
        let next_page_cursor = match rows.last() {
            Some(row) if next => Some(encode(row, Nav::Next)?),
            _ => None,
        };
        let prev_page_cursor = match rows.first() {
            Some(row) if prev => Some(encode(row, Nav::Prev)?),
            _ => None,
        };

        Ok(CursorPage::new(rows, next_page_cursor, prev_page_cursor))
    }

    async fn fetch_offset<S>(
        &self,
        store: &S,
        prepared: &PreparedQuery,
        page: u64,
        size: u64,
    ) -> Result<OffsetPage<S::Row>, PageError>
    where
        S: PageStore + ?Sized,
    {
        let query = OffsetQuery {
            criteria: prepared.criteria.clone(),
            sort: prepared.sort.clone(),
            offset: page.saturating_mul(size),
            limit: size,
        };
        let (rows, total) = store
            .fetch_offset(&query)
            .await
            .map_err(PageError::Store)?;
        debug!(rows = rows.len(), total, "fetched offset page");
        Ok(OffsetPage::new(rows, page, size, total))
    }

    /// Follow `nextPageCursor` from the first page until exhausted and
    /// concatenate every page. Offset requests are read as keyset with the same size.
    #[instrument(
        name = "criteria_store.paginator.fetch_all",
        skip(self, store, request, scope),
        fields(entity = %self.schema.entity())
    )]
    pub async fn fetch_all<S>(
        &self,
        store: &S,
        request: &ListRequest,
        scope: Option<&Scope>,
    ) -> Result<Vec<S::Row>, PageError>
    where
        S: PageStore + ?Sized,
    {
        let size = match &request.pagination {
            Pagination::Keyset { size, .. } | Pagination::Offset { size, .. } => *size,
        };
        let mut request = request.clone();
        let mut cursor = None;
        let mut out = Vec::new();
        loop {
            request.pagination = Pagination::Keyset { size, cursor };
            let prepared = self.prepare(&request, scope)?;
            let PreparedMode::Keyset { limit, position } = &prepared.mode else {
                break;
            };
            let page = self
                .fetch_keyset(store, &prepared, *limit, position.as_ref())
                .await?;
            out.extend(page.data);
            match page.next_page_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(out)
    }
}
