//! Criteria model: the caller-facing description of a search.
//!
//! A [`SearchRequest`] carries filter, sort and paging criteria plus the
//! optional search term, custom-field, hierarchy and relationship filters.
//! Criteria are validated when they are constructed (or deserialized), so
//! an arity mismatch never reaches the predicate builder.
//!
//! ```json
//! {
//!   "page": 1,
//!   "limit": 20,
//!   "sort": [{ "field": "leadScore", "direction": "DESC" }],
//!   "filters": [
//!     { "field": "status", "operator": "EQUALS", "value": "QUALIFIED" },
//!     { "field": "leadScore", "operator": "GREATER_THAN", "value": 80 }
//!   ],
//!   "customFieldsQuery": { "tier": "gold" }
//! }
//! ```

mod value;

pub use value::{Value, ValueKind};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::operator::{Arity, Operator};

// =============================================================================
// Tenant
// =============================================================================

/// The tenant every query is scoped to.
///
/// Supplied by the request context, never by the caller's criteria.
/// Deserializing a blank id fails instead of producing an unscoped tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TryFrom<String> for TenantId {
    type Error = String;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        if id.trim().is_empty() {
            return Err("tenant id must not be empty".to_string());
        }
        Ok(Self(id))
    }
}

impl From<TenantId> for String {
    fn from(tenant: TenantId) -> Self {
        tenant.0
    }
}

impl TenantId {
    /// # Panics
    ///
    /// Panics if `id` is empty. An unscoped query is a programming error.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        assert!(!id.trim().is_empty(), "tenant id must not be empty");
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Filter criterion
// =============================================================================

/// One filter condition on an attribute path.
///
/// The operator's arity decides which of `value` / `values` must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilterCriterion", rename_all = "camelCase")]
pub struct FilterCriterion {
    field: String,
    operator: Operator,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<Vec<Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFilterCriterion {
    field: String,
    operator: Operator,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    values: Option<Vec<Value>>,
}

impl TryFrom<RawFilterCriterion> for FilterCriterion {
    type Error = QueryError;

    fn try_from(raw: RawFilterCriterion) -> Result<Self, Self::Error> {
        FilterCriterion::new(raw.field, raw.operator, raw.value, raw.values)
    }
}

impl FilterCriterion {
    /// Build a criterion, checking the operator's arity.
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value: Option<Value>,
        values: Option<Vec<Value>>,
    ) -> QueryResult<Self> {
        let field = field.into();
        if field.trim().is_empty() {
            return Err(QueryError::malformed(field, "field must not be empty"));
        }

        let has_values = values.as_ref().is_some_and(|v| !v.is_empty());
        match operator.arity() {
            Arity::None => {
                if value.is_some() || has_values {
                    return Err(QueryError::malformed(
                        field,
                        format!("{} takes no value", operator),
                    ));
                }
            }
            Arity::Single => {
                if value.is_none() || has_values {
                    return Err(QueryError::malformed(
                        field,
                        format!("{} takes exactly one value", operator),
                    ));
                }
            }
            Arity::Multi => {
                if value.is_some() || !has_values {
                    return Err(QueryError::malformed(
                        field,
                        format!("{} takes a non-empty list of values", operator),
                    ));
                }
            }
            Arity::Pair => {
                let len = values.as_ref().map_or(0, Vec::len);
                if value.is_some() || len != 2 {
                    return Err(QueryError::malformed(
                        field,
                        format!("{} takes exactly two values, got {}", operator, len),
                    ));
                }
            }
        }

        Ok(Self {
            field,
            operator,
            value,
            values: values.filter(|v| !v.is_empty()),
        })
    }

    pub fn single(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> QueryResult<Self> {
        Self::new(field, operator, Some(value.into()), None)
    }

    pub fn multi(
        field: impl Into<String>,
        operator: Operator,
        values: Vec<Value>,
    ) -> QueryResult<Self> {
        Self::new(field, operator, None, Some(values))
    }

    pub fn pair(
        field: impl Into<String>,
        operator: Operator,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> QueryResult<Self> {
        Self::new(field, operator, None, Some(vec![low.into(), high.into()]))
    }

    pub fn unary(field: impl Into<String>, operator: Operator) -> QueryResult<Self> {
        Self::new(field, operator, None, None)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn values(&self) -> &[Value] {
        self.values.as_deref().unwrap_or(&[])
    }

    /// All operand values in order, whichever slot they came in.
    pub fn operands(&self) -> Vec<&Value> {
        self.value.iter().chain(self.values()).collect()
    }
}

// =============================================================================
// Sorting and paging
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc")]
    Asc,
    #[serde(alias = "desc")]
    Desc,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortCriterion {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
    /// `None` leaves NULL placement to the database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nulls_first: Option<bool>,
}

impl SortCriterion {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
            nulls_first: None,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
            nulls_first: None,
        }
    }
}

/// Paging, ordering and free-text search shared by every entity search.
///
/// `page` is 1-based. Values are kept signed so out-of-range input is
/// reported as an invalid page request rather than a decoding failure.
/// A missing `limit` takes the configured default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageRequest {
    pub page: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    pub sort: Vec<SortCriterion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<Vec<String>>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: None,
            sort: Vec::new(),
            search: None,
            search_fields: None,
        }
    }
}

impl PageRequest {
    /// The search term, if it is non-blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// =============================================================================
// Search request
// =============================================================================

/// Restrict results to the subtree under a parent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyFilter {
    pub parent_id: String,
    #[serde(default)]
    pub include_descendants: bool,
}

/// Restrict results to records related to another record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedFilter {
    pub related_record_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
}

/// A complete search over one entity type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub filters: Vec<FilterCriterion>,
    /// Exact-match conditions on custom-field keys.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields_query: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<HierarchyFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<RelatedFilter>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, criterion: FilterCriterion) -> Self {
        self.filters.push(criterion);
        self
    }

    pub fn sort(mut self, sort: SortCriterion) -> Self {
        self.page.sort.push(sort);
        self
    }

    pub fn page(mut self, page: i64, limit: i64) -> Self {
        self.page.page = page;
        self.page.limit = Some(limit);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.page.search = Some(term.into());
        self
    }

    pub fn search_fields(mut self, fields: Vec<String>) -> Self {
        self.page.search_fields = Some(fields);
        self
    }

    pub fn custom_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom_fields_query.insert(key.into(), value.into());
        self
    }

    pub fn under_parent(mut self, parent_id: impl Into<String>, include_descendants: bool) -> Self {
        self.hierarchy = Some(HierarchyFilter {
            parent_id: parent_id.into(),
            include_descendants,
        });
        self
    }

    pub fn related_to(
        mut self,
        record_id: impl Into<String>,
        relationship_type: Option<&str>,
    ) -> Self {
        self.related = Some(RelatedFilter {
            related_record_id: record_id.into(),
            relationship_type: relationship_type.map(String::from),
        });
        self
    }
}
