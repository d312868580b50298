//! Sort and page translation.
//!
//! Turns a [`PageRequest`] into an offset, a limit and a deterministic
//! ordering. Pages are 1-based; every ordering ends with the entity's id
//! so repeated requests page through the same sequence.

use serde::{Deserialize, Serialize};

use crate::criteria::{PageRequest, SortDirection};
use crate::error::{QueryError, QueryResult};
use crate::schema::{AttributeRef, Catalog, EntitySchema};
use crate::sql::expr::{col, json_text, Expr};
use crate::sql::query::OrderByExpr;

/// Page size when the request names none.
pub const DEFAULT_LIMIT: i64 = 20;

/// Hard ceiling on page size; configuration may lower it, never raise it.
pub const MAX_LIMIT: i64 = 1000;

/// Page size bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLimits {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

impl PageLimits {
    /// The effective maximum, never above [`MAX_LIMIT`].
    pub fn max(&self) -> i64 {
        self.max_limit.clamp(1, MAX_LIMIT)
    }
}

/// Offset, limit and ordering for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTranslation {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
    pub order: Vec<OrderByExpr>,
}

#[derive(Debug, Clone, Copy)]
pub struct PageTranslator<'a> {
    catalog: &'a Catalog,
    limits: PageLimits,
}

impl<'a> PageTranslator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            limits: PageLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn translate(
        &self,
        request: &PageRequest,
        entity: &EntitySchema,
    ) -> QueryResult<PageTranslation> {
        if request.page < 1 {
            return Err(QueryError::InvalidPageRequest(format!(
                "page must be at least 1, got {}",
                request.page
            )));
        }
        let max = self.limits.max();
        let limit = request.limit.unwrap_or(self.limits.default_limit);
        if limit < 1 || limit > max {
            return Err(QueryError::InvalidPageRequest(format!(
                "limit must be between 1 and {}, got {}",
                max, limit
            )));
        }

        let page = request.page as u64;
        let limit = limit as u64;
        let offset = (page - 1).checked_mul(limit).ok_or_else(|| {
            QueryError::InvalidPageRequest(format!("page {} is out of range", request.page))
        })?;

        let id = col(&entity.id_column);
        let mut order = Vec::with_capacity(request.sort.len() + 1);
        for sort in &request.sort {
            let expr = self.sort_expr(entity, &sort.field)?;
            let mut ob = match sort.direction {
                SortDirection::Asc => OrderByExpr::asc(expr),
                SortDirection::Desc => OrderByExpr::desc(expr),
            };
            ob = match sort.nulls_first {
                Some(true) => ob.nulls_first(),
                Some(false) => ob.nulls_last(),
                None => ob,
            };
            order.push(ob);
        }
        if !order.iter().any(|ob| ob.expr == id) {
            order.push(OrderByExpr::asc(id));
        }

        Ok(PageTranslation {
            page,
            limit,
            offset,
            order,
        })
    }

    /// Resolve a sort field. Related fields other than the id cannot be
    /// sorted on.
    fn sort_expr(&self, entity: &EntitySchema, field: &str) -> QueryResult<Expr> {
        let attr = self.catalog.resolve(entity, field).map_err(|e| {
            QueryError::InvalidPageRequest(format!("cannot sort by '{}': {}", field, e))
        })?;
        match attr {
            AttributeRef::Column(column) => Ok(col(&column.column)),
            AttributeRef::Relationship {
                relationship,
                target,
                column,
            } if column.column == target.id_column => Ok(col(&relationship.foreign_key)),
            AttributeRef::Relationship { .. } => Err(QueryError::InvalidPageRequest(format!(
                "cannot sort by related field '{}'",
                field
            ))),
            AttributeRef::CustomField { column, key } => Ok(json_text(col(column), &key)),
        }
    }
}

/// Paging metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_info: self.page_info,
        }
    }
}
