//! # crm-query
//!
//! Tenant-scoped search for CRM records, compiled to multi-dialect SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │      SearchRequest (JSON body, typed request, params)    │
//! │  (filters, custom fields, search, hierarchy, related)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [schema::Catalog::resolve]
//! ┌─────────────────────────────────────────────────────────┐
//! │       AttributeRef (column, one-hop relation, JSON)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [predicate + operator table]
//! ┌─────────────────────────────────────────────────────────┐
//! │     QuerySpecification (tenant guard AND predicates)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [page + compile]
//! ┌─────────────────────────────────────────────────────────┐
//! │       SELECT / COUNT SQL (Postgres, MySQL, SQLite)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [store]
//! ┌─────────────────────────────────────────────────────────┐
//! │                Page<Record> + PageInfo                   │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod compile;
pub mod config;
pub mod criteria;
pub mod error;
pub mod operator;
pub mod page;
pub mod params;
pub mod predicate;
pub mod request;
pub mod schema;
pub mod specification;
pub mod sql;
pub mod store;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{compile_search, CompileError, CompileOptions, CompiledSearch};
    pub use crate::criteria::{
        FilterCriterion, HierarchyFilter, PageRequest, RelatedFilter, SearchRequest,
        SortCriterion, SortDirection, TenantId, Value, ValueKind,
    };
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::operator::Operator;
    pub use crate::page::{Page, PageInfo, PageLimits, PageTranslation, PageTranslator};
    pub use crate::params::{parse_flat, EnumParseMode};
    pub use crate::predicate::PredicateBuilder;
    pub use crate::request::EntitySearchRequest;
    pub use crate::schema::{Catalog, EntitySchema};
    pub use crate::specification::{QuerySpecification, SpecificationComposer};
    pub use crate::sql::{Dialect, SqlDialect};
    pub use crate::store::{search, Record, RecordStore, SqliteStore};
}

pub use criteria::{SearchRequest, TenantId};
pub use error::{QueryError, QueryResult};
pub use schema::Catalog;
pub use sql::Dialect;
