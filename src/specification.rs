//! Query specifications and their composition.
//!
//! A [`QuerySpecification`] is a tenant-scoped boolean filter over one
//! entity. The tenant guard is not part of the composable filter: it is
//! always emitted as the first conjunct of the final predicate, so no
//! combination of caller criteria can widen a query past its tenant.
//!
//! The composer turns a [`SearchRequest`] into a single specification by
//! AND-ing the predicate for every filter, custom-field condition, search
//! term, hierarchy and relationship constraint.

use tracing::debug;

use crate::criteria::{FilterCriterion, SearchRequest, TenantId};
use crate::error::QueryResult;
use crate::operator::Fidelity;
use crate::page::PageTranslation;
use crate::predicate::{BuiltPredicate, PredicateBuilder};
use crate::schema::{Catalog, EntitySchema};
use crate::sql::expr::{col, count_star, Expr, ExprExt};
use crate::sql::query::{Query, SelectExpr, TableRef};
use crate::sql::Dialect;

/// A tenant-scoped filter over one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpecification {
    entity: String,
    table: String,
    tenant_column: String,
    tenant: TenantId,
    filter: Expr,
    best_effort: Vec<String>,
}

impl QuerySpecification {
    /// Every record of `entity` belonging to `tenant`.
    pub fn all(entity: &EntitySchema, tenant: &TenantId) -> Self {
        Self::matching(entity, tenant, Expr::from(true))
    }

    pub fn matching(entity: &EntitySchema, tenant: &TenantId, filter: Expr) -> Self {
        Self {
            entity: entity.name.clone(),
            table: entity.table.clone(),
            tenant_column: entity.tenant_column.clone(),
            tenant: tenant.clone(),
            filter,
            best_effort: Vec::new(),
        }
    }

    fn from_built(entity: &EntitySchema, tenant: &TenantId, built: BuiltPredicate, field: &str) -> Self {
        let mut spec = Self::matching(entity, tenant, built.expr);
        if built.fidelity == Fidelity::BestEffort {
            spec.best_effort.push(field.to_string());
        }
        spec
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// The caller-derived filter, without the tenant guard.
    pub fn filter(&self) -> &Expr {
        &self.filter
    }

    /// Fields whose predicates only approximate their criteria.
    pub fn best_effort_fields(&self) -> &[String] {
        &self.best_effort
    }

    pub fn is_exact(&self) -> bool {
        self.best_effort.is_empty()
    }

    pub fn tenant_guard(&self) -> Expr {
        col(&self.tenant_column).eq(self.tenant.as_str())
    }

    /// The full predicate: tenant guard first, then the filter.
    pub fn predicate(&self) -> Expr {
        if self.filter.is_true() {
            self.tenant_guard()
        } else {
            self.tenant_guard().and(self.filter.clone())
        }
    }

    /// # Panics
    ///
    /// Panics if the two specifications target different tenants or
    /// entities.
    pub fn and(mut self, other: QuerySpecification) -> QuerySpecification {
        self.check_compatible(&other);
        self.filter = if self.filter.is_true() {
            other.filter
        } else if other.filter.is_true() {
            self.filter
        } else {
            self.filter.and(other.filter)
        };
        self.best_effort.extend(other.best_effort);
        self
    }

    /// # Panics
    ///
    /// Panics if the two specifications target different tenants or
    /// entities.
    pub fn or(mut self, other: QuerySpecification) -> QuerySpecification {
        self.check_compatible(&other);
        self.filter = if self.filter.is_true() || other.filter.is_true() {
            Expr::from(true)
        } else {
            self.filter.or(other.filter)
        };
        self.best_effort.extend(other.best_effort);
        self
    }

    fn check_compatible(&self, other: &QuerySpecification) {
        assert_eq!(
            self.tenant, other.tenant,
            "cannot combine specifications across tenants"
        );
        assert_eq!(
            self.entity, other.entity,
            "cannot combine specifications across entities"
        );
    }

    pub fn to_select_query(&self, page: &PageTranslation) -> Query {
        Query::new()
            .select_star()
            .from(TableRef::new(&self.table))
            .filter(self.predicate())
            .order_by(page.order.clone())
            .limit(page.limit)
            .offset(page.offset)
    }

    pub fn to_count_query(&self) -> Query {
        Query::new()
            .select(vec![SelectExpr::new(count_star()).with_alias("total")])
            .from(TableRef::new(&self.table))
            .filter(self.predicate())
    }

    /// The WHERE predicate rendered for `dialect`.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.predicate().to_sql(dialect)
    }
}

/// AND together `specs`; no specifications means every tenant record.
pub fn and_all(
    entity: &EntitySchema,
    tenant: &TenantId,
    specs: impl IntoIterator<Item = QuerySpecification>,
) -> QuerySpecification {
    specs
        .into_iter()
        .fold(QuerySpecification::all(entity, tenant), QuerySpecification::and)
}

/// OR together `specs`; no specifications means every tenant record.
pub fn or_any(
    entity: &EntitySchema,
    tenant: &TenantId,
    specs: impl IntoIterator<Item = QuerySpecification>,
) -> QuerySpecification {
    specs
        .into_iter()
        .reduce(QuerySpecification::or)
        .unwrap_or_else(|| QuerySpecification::all(entity, tenant))
}

/// Builds specifications from search requests.
#[derive(Debug, Clone, Copy)]
pub struct SpecificationComposer<'a> {
    catalog: &'a Catalog,
}

impl<'a> SpecificationComposer<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// AND the predicates of `filters`.
    ///
    /// Fails on the first criterion that does not resolve or validate.
    pub fn compose_filters(
        &self,
        filters: &[FilterCriterion],
        entity: &EntitySchema,
        tenant: &TenantId,
    ) -> QueryResult<QuerySpecification> {
        let builder = PredicateBuilder::new(self.catalog, tenant);
        let specs = filters
            .iter()
            .map(|f| {
                builder
                    .build(f, entity)
                    .map(|built| QuerySpecification::from_built(entity, tenant, built, f.field()))
            })
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(and_all(entity, tenant, specs))
    }

    /// Everything a search request constrains, AND-ed.
    pub fn compose(
        &self,
        request: &SearchRequest,
        entity: &EntitySchema,
        tenant: &TenantId,
    ) -> QueryResult<QuerySpecification> {
        let builder = PredicateBuilder::new(self.catalog, tenant);
        let mut spec = self.compose_filters(&request.filters, entity, tenant)?;

        for (key, value) in &request.custom_fields_query {
            let built = builder.custom_field_equals(entity, key, value)?;
            spec = spec.and(QuerySpecification::from_built(entity, tenant, built, key));
        }

        if let Some(term) = request.page.search_term() {
            let fields = request.page.search_fields.as_deref();
            if let Some(built) = builder.search(entity, term, fields)? {
                spec = spec.and(QuerySpecification::from_built(entity, tenant, built, "search"));
            }
        }

        if let Some(hierarchy) = &request.hierarchy {
            let expr = builder.hierarchy(entity, hierarchy)?;
            spec = spec.and(QuerySpecification::matching(entity, tenant, expr));
        }

        if let Some(related) = &request.related {
            let expr = builder.related(entity, related)?;
            spec = spec.and(QuerySpecification::matching(entity, tenant, expr));
        }

        debug!(
            entity = %entity.name,
            tenant = %tenant,
            filters = request.filters.len(),
            custom_fields = request.custom_fields_query.len(),
            exact = spec.is_exact(),
            "composed query specification"
        );
        if !spec.is_exact() {
            debug!(
                entity = %entity.name,
                fields = ?spec.best_effort_fields(),
                "specification contains best-effort comparisons"
            );
        }

        Ok(spec)
    }
}
