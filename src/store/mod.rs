//! Record stores that execute compiled searches.
//!
//! A [`RecordStore`] runs the page and count queries produced by
//! [`compile_search`](crate::compile::compile_search) and returns records
//! keyed by wire field name. [`SqliteStore`] is the bundled implementation.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::compile::{compile_search, CompileError, CompileOptions};
use crate::criteria::{SearchRequest, TenantId};
use crate::page::{Page, PageInfo};
use crate::schema::{Catalog, EntitySchema};
use crate::sql::query::Query;
use crate::sql::Dialect;

/// A fetched record: field name to JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur while executing a search.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Cannot store field '{field}' on entity '{entity}'")]
    UnknownField { entity: String, field: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait RecordStore {
    /// Dialect the store's SQL must be rendered in.
    fn dialect(&self) -> Dialect;

    /// Run a page query, returning records of `entity`.
    fn fetch(&self, entity: &EntitySchema, query: &Query) -> StoreResult<Vec<Record>>;

    /// Run a count query.
    fn count(&self, query: &Query) -> StoreResult<u64>;
}

/// Compile `request` for the store's dialect, run both queries and
/// assemble the page.
pub fn search<S: RecordStore + ?Sized>(
    store: &S,
    catalog: &Catalog,
    entity: &str,
    tenant: &TenantId,
    request: &SearchRequest,
    options: &CompileOptions,
) -> StoreResult<Page<Record>> {
    let options = options.clone().with_dialect(store.dialect());
    let compiled = compile_search(catalog, entity, tenant, request, &options)?;
    let schema = catalog
        .entity(entity)
        .ok_or_else(|| CompileError::UnknownEntity(entity.to_string()))?;

    let items = store.fetch(schema, &compiled.select)?;
    let total = store.count(&compiled.count)?;
    Ok(Page {
        items,
        page_info: PageInfo::new(compiled.page.page, compiled.page.limit, total),
    })
}
