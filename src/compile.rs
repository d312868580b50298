//! End-to-end compilation from a search request to SQL.
//!
//! ```text
//! SearchRequest → Compose → QuerySpecification ─┐
//!               → Translate → PageTranslation  ─┴→ SELECT + COUNT SQL
//! ```
//!
//! # Example
//!
//! ```ignore
//! use crm_query::compile::{compile_search, CompileOptions};
//! use crm_query::prelude::*;
//!
//! let catalog = Catalog::crm();
//! let request: SearchRequest = serde_json::from_str(r#"{
//!     "filters": [{ "field": "leadScore", "operator": "GREATER_THAN", "value": 80 }],
//!     "sort": [{ "field": "leadScore", "direction": "DESC" }]
//! }"#)?;
//!
//! let options = CompileOptions::default().with_dialect(Dialect::MySql);
//! let out = compile_search(&catalog, "lead", &TenantId::new("t1"), &request, &options)?;
//! println!("{}", out.select_sql);
//! ```

use crate::criteria::{SearchRequest, TenantId};
use crate::error::QueryError;
use crate::page::{PageLimits, PageTranslation, PageTranslator};
use crate::schema::Catalog;
use crate::specification::{QuerySpecification, SpecificationComposer};
use crate::sql::query::Query;
use crate::sql::Dialect;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),

    #[error(transparent)]
    Query(#[from] QueryError),
}

pub type CompileResult<T> = Result<T, CompileError>;

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// SQL dialect to generate.
    pub dialect: Dialect,
    pub limits: PageLimits,
}

impl CompileOptions {
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// A compiled search: the page query, its count query, and the pieces
/// they were built from.
#[derive(Debug, Clone)]
pub struct CompiledSearch {
    pub specification: QuerySpecification,
    pub page: PageTranslation,
    pub select: Query,
    pub count: Query,
    pub select_sql: String,
    pub count_sql: String,
    pub dialect: Dialect,
}

/// Compile `request` against the entity named `entity`.
pub fn compile_search(
    catalog: &Catalog,
    entity: &str,
    tenant: &TenantId,
    request: &SearchRequest,
    options: &CompileOptions,
) -> CompileResult<CompiledSearch> {
    let schema = catalog
        .entity(entity)
        .ok_or_else(|| CompileError::UnknownEntity(entity.to_string()))?;

    let specification = SpecificationComposer::new(catalog).compose(request, schema, tenant)?;
    let page = PageTranslator::new(catalog)
        .with_limits(options.limits)
        .translate(&request.page, schema)?;

    let select = specification.to_select_query(&page);
    let count = specification.to_count_query();
    let select_sql = select.to_sql(options.dialect);
    let count_sql = count.to_sql(options.dialect);
    tracing::trace!(entity, dialect = %options.dialect, sql = %select_sql, "compiled search");

    Ok(CompiledSearch {
        specification,
        page,
        select,
        count,
        select_sql,
        count_sql,
        dialect: options.dialect,
    })
}
