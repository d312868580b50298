//! Entity-specific search requests.
//!
//! Each request type carries named, typed filters for one entity (status
//! lists, owner ids, numeric and date windows, parent or related account)
//! and expands into a generic [`SearchRequest`]. Free-form `filters` and
//! `customFields` are passed through unchanged.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::criteria::{
    FilterCriterion, HierarchyFilter, PageRequest, RelatedFilter, SearchRequest, Value,
};
use crate::error::QueryResult;
use crate::operator::Operator;

/// A typed request for one entity type.
pub trait EntitySearchRequest {
    /// Catalog name of the entity searched.
    const ENTITY: &'static str;

    fn into_search_request(self) -> QueryResult<SearchRequest>;
}

/// Accumulates criteria for the named filters that are set.
#[derive(Default)]
struct Criteria {
    filters: Vec<FilterCriterion>,
}

impl Criteria {
    fn equals(&mut self, field: &str, value: Option<impl Into<Value>>) -> QueryResult<()> {
        if let Some(v) = value {
            self.filters
                .push(FilterCriterion::single(field, Operator::Equals, v)?);
        }
        Ok(())
    }

    fn contains(&mut self, field: &str, value: Option<String>) -> QueryResult<()> {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            self.filters
                .push(FilterCriterion::single(field, Operator::Contains, v)?);
        }
        Ok(())
    }

    fn any_of(&mut self, field: &str, values: Vec<String>) -> QueryResult<()> {
        if !values.is_empty() {
            let values = values.into_iter().map(Value::from).collect();
            self.filters
                .push(FilterCriterion::multi(field, Operator::In, values)?);
        }
        Ok(())
    }

    /// `both` is the operator used when both bounds are present.
    fn window(
        &mut self,
        field: &str,
        both: Operator,
        low: Option<Value>,
        high: Option<Value>,
    ) -> QueryResult<()> {
        let criterion = match (low, high) {
            (Some(low), Some(high)) => FilterCriterion::pair(field, both, low, high)?,
            (Some(low), None) => FilterCriterion::single(field, Operator::GreaterThanOrEqual, low)?,
            (None, Some(high)) => FilterCriterion::single(field, Operator::LessThanOrEqual, high)?,
            (None, None) => return Ok(()),
        };
        self.filters.push(criterion);
        Ok(())
    }

    fn numbers(&mut self, field: &str, low: Option<f64>, high: Option<f64>) -> QueryResult<()> {
        self.window(
            field,
            Operator::Between,
            low.map(Value::from),
            high.map(Value::from),
        )
    }

    fn dates(
        &mut self,
        field: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> QueryResult<()> {
        self.window(
            field,
            Operator::DateRange,
            from.map(Value::from),
            to.map(Value::from),
        )
    }

    fn finish(
        mut self,
        page: PageRequest,
        extra: Vec<FilterCriterion>,
        custom_fields: BTreeMap<String, Value>,
    ) -> SearchRequest {
        self.filters.extend(extra);
        SearchRequest {
            page,
            filters: self.filters,
            custom_fields_query: custom_fields,
            hierarchy: None,
            related: None,
        }
    }
}

fn related(account_id: Option<String>, relationship_type: Option<String>) -> Option<RelatedFilter> {
    account_id.map(|id| RelatedFilter {
        related_record_id: id,
        relationship_type,
    })
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountSearchRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub name: Option<String>,
    pub account_types: Vec<String>,
    pub statuses: Vec<String>,
    pub industry: Option<String>,
    pub owner_id: Option<String>,
    pub min_annual_revenue: Option<f64>,
    pub max_annual_revenue: Option<f64>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    /// Restrict to this account's children.
    pub parent_account_id: Option<String>,
    /// With `parentAccountId`: the parent and its whole subtree.
    pub include_descendants: bool,
    pub related_account_id: Option<String>,
    pub relationship_type: Option<String>,
    pub custom_fields: BTreeMap<String, Value>,
    pub filters: Vec<FilterCriterion>,
}

impl EntitySearchRequest for AccountSearchRequest {
    const ENTITY: &'static str = "account";

    fn into_search_request(self) -> QueryResult<SearchRequest> {
        let mut c = Criteria::default();
        c.contains("name", self.name)?;
        c.any_of("accountType", self.account_types)?;
        c.any_of("status", self.statuses)?;
        c.equals("industry", self.industry)?;
        c.equals("ownerId", self.owner_id)?;
        c.numbers("annualRevenue", self.min_annual_revenue, self.max_annual_revenue)?;
        c.dates("createdAt", self.created_from, self.created_to)?;

        let mut request = c.finish(self.page, self.filters, self.custom_fields);
        request.hierarchy = self.parent_account_id.map(|parent_id| HierarchyFilter {
            parent_id,
            include_descendants: self.include_descendants,
        });
        request.related = related(self.related_account_id, self.relationship_type);
        Ok(request)
    }
}

// =============================================================================
// Contacts
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactSearchRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub statuses: Vec<String>,
    pub owner_id: Option<String>,
    pub account_id: Option<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub related_account_id: Option<String>,
    pub relationship_type: Option<String>,
    pub custom_fields: BTreeMap<String, Value>,
    pub filters: Vec<FilterCriterion>,
}

impl EntitySearchRequest for ContactSearchRequest {
    const ENTITY: &'static str = "contact";

    fn into_search_request(self) -> QueryResult<SearchRequest> {
        let mut c = Criteria::default();
        c.contains("firstName", self.first_name)?;
        c.contains("lastName", self.last_name)?;
        c.equals("email", self.email)?;
        c.contains("jobTitle", self.job_title)?;
        c.any_of("status", self.statuses)?;
        c.equals("ownerId", self.owner_id)?;
        c.equals("accountId", self.account_id)?;
        c.dates("createdAt", self.created_from, self.created_to)?;

        let mut request = c.finish(self.page, self.filters, self.custom_fields);
        request.related = related(self.related_account_id, self.relationship_type);
        Ok(request)
    }
}

// =============================================================================
// Leads
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeadSearchRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub company: Option<String>,
    pub email: Option<String>,
    pub statuses: Vec<String>,
    pub sources: Vec<String>,
    pub min_lead_score: Option<f64>,
    pub max_lead_score: Option<f64>,
    pub owner_id: Option<String>,
    pub account_id: Option<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub related_account_id: Option<String>,
    pub relationship_type: Option<String>,
    pub custom_fields: BTreeMap<String, Value>,
    pub filters: Vec<FilterCriterion>,
}

impl EntitySearchRequest for LeadSearchRequest {
    const ENTITY: &'static str = "lead";

    fn into_search_request(self) -> QueryResult<SearchRequest> {
        let mut c = Criteria::default();
        c.contains("company", self.company)?;
        c.equals("email", self.email)?;
        c.any_of("status", self.statuses)?;
        c.any_of("source", self.sources)?;
        c.numbers("leadScore", self.min_lead_score, self.max_lead_score)?;
        c.equals("ownerId", self.owner_id)?;
        c.equals("accountId", self.account_id)?;
        c.dates("createdAt", self.created_from, self.created_to)?;

        let mut request = c.finish(self.page, self.filters, self.custom_fields);
        request.related = related(self.related_account_id, self.relationship_type);
        Ok(request)
    }
}

// =============================================================================
// Deals
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DealSearchRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub name: Option<String>,
    pub stages: Vec<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub close_from: Option<NaiveDate>,
    pub close_to: Option<NaiveDate>,
    pub owner_id: Option<String>,
    pub account_id: Option<String>,
    pub contact_id: Option<String>,
    pub related_account_id: Option<String>,
    pub relationship_type: Option<String>,
    pub custom_fields: BTreeMap<String, Value>,
    pub filters: Vec<FilterCriterion>,
}

impl EntitySearchRequest for DealSearchRequest {
    const ENTITY: &'static str = "deal";

    fn into_search_request(self) -> QueryResult<SearchRequest> {
        let mut c = Criteria::default();
        c.contains("name", self.name)?;
        c.any_of("stage", self.stages)?;
        c.numbers("amount", self.min_amount, self.max_amount)?;
        c.dates("closeDate", self.close_from, self.close_to)?;
        c.equals("ownerId", self.owner_id)?;
        c.equals("accountId", self.account_id)?;
        c.equals("contactId", self.contact_id)?;

        let mut request = c.finish(self.page, self.filters, self.custom_fields);
        request.related = related(self.related_account_id, self.relationship_type);
        Ok(request)
    }
}

// =============================================================================
// Activities
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivitySearchRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub subject: Option<String>,
    pub activity_types: Vec<String>,
    pub statuses: Vec<String>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    pub owner_id: Option<String>,
    pub account_id: Option<String>,
    pub contact_id: Option<String>,
    pub deal_id: Option<String>,
    pub lead_id: Option<String>,
    pub related_account_id: Option<String>,
    pub relationship_type: Option<String>,
    pub custom_fields: BTreeMap<String, Value>,
    pub filters: Vec<FilterCriterion>,
}

impl EntitySearchRequest for ActivitySearchRequest {
    const ENTITY: &'static str = "activity";

    fn into_search_request(self) -> QueryResult<SearchRequest> {
        let mut c = Criteria::default();
        c.contains("subject", self.subject)?;
        c.any_of("activityType", self.activity_types)?;
        c.any_of("status", self.statuses)?;
        c.dates("dueDate", self.due_from, self.due_to)?;
        c.equals("ownerId", self.owner_id)?;
        c.equals("accountId", self.account_id)?;
        c.equals("contactId", self.contact_id)?;
        c.equals("dealId", self.deal_id)?;
        c.equals("leadId", self.lead_id)?;

        let mut request = c.finish(self.page, self.filters, self.custom_fields);
        request.related = related(self.related_account_id, self.relationship_type);
        Ok(request)
    }
}
