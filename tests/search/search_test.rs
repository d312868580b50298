//! End-to-end searches against the SQLite fixture.

#[path = "../common/mod.rs"]
mod common;

use common::{sorted, t1, t2, Fixture};
use crm_query::compile::CompileError;
use crm_query::criteria::{FilterCriterion, SortCriterion, SortDirection, Value};
use crm_query::operator::Operator;
use crm_query::store::StoreError;
use crm_query::{QueryError, SearchRequest};

fn query_error(err: StoreError) -> QueryError {
    match err {
        StoreError::Compile(CompileError::Query(e)) => e,
        other => panic!("expected a query error, got {}", other),
    }
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Tenant isolation and defaults
// ============================================================================

#[test]
fn test_empty_request_returns_every_tenant_record() {
    let fx = Fixture::new();
    let page = fx.search("lead", &t1(), &SearchRequest::new()).unwrap();

    assert_eq!(page.page_info.total, 3);
    assert_eq!(page.page_info.limit, 20);
    assert_eq!(page.items.len(), 3);
    assert!(!page.page_info.has_next);
}

#[test]
fn test_tenants_never_see_each_other() {
    let fx = Fixture::new();
    let request = SearchRequest::new().custom_field("tier", "gold");

    assert_eq!(sorted(fx.ids("account", &t1(), &request)), ids(&["A", "B"]));
    assert_eq!(fx.ids("account", &t2(), &request), ids(&["X"]));
    assert!(fx.ids("lead", &crm_query::TenantId::new("nobody"), &SearchRequest::new()).is_empty());
}

#[test]
fn test_in_filter_stays_inside_tenant() {
    let fx = Fixture::new();
    let request = SearchRequest::new().filter(
        FilterCriterion::multi(
            "status",
            Operator::In,
            vec![Value::text("NEW"), Value::text("QUALIFIED")],
        )
        .unwrap(),
    );
    assert_eq!(sorted(fx.ids("lead", &t1(), &request)), ids(&["L1", "L2", "L3"]));
}

// ============================================================================
// Comparison and range filters
// ============================================================================

#[test]
fn test_lead_score_example() {
    let fx = Fixture::new();
    let request: SearchRequest = serde_json::from_str(
        r#"{
            "filters": [{"field": "leadScore", "operator": "GREATER_THAN", "value": 80}],
            "sort": [{"field": "leadScore", "direction": "DESC"}],
            "page": 1,
            "limit": 10
        }"#,
    )
    .unwrap();

    let page = fx.search("lead", &t1(), &request).unwrap();
    let scores: Vec<i64> = page
        .items
        .iter()
        .map(|r| r["leadScore"].as_i64().unwrap())
        .collect();
    assert_eq!(scores, vec![95, 85]);
    assert_eq!(page.page_info.total, 2);
    assert_eq!(page.page_info.total_pages, 1);
}

#[test]
fn test_between_is_inclusive() {
    let fx = Fixture::new();
    let request = SearchRequest::new().filter(
        FilterCriterion::pair("amount", Operator::Between, 1000_i64, 5000_i64).unwrap(),
    );
    assert_eq!(sorted(fx.ids("deal", &t1(), &request)), ids(&["DL1", "DL2"]));
}

#[test]
fn test_reversed_range_matches_nothing() {
    let fx = Fixture::new();
    let request = SearchRequest::new().filter(
        FilterCriterion::pair("amount", Operator::Between, 5000_i64, 1000_i64).unwrap(),
    );
    let page = fx.search("deal", &t1(), &request).unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.page_info.total, 0);
}

#[test]
fn test_date_range() {
    let fx = Fixture::new();
    let request: SearchRequest = serde_json::from_str(
        r#"{"filters": [{"field": "closeDate", "operator": "DATE_RANGE",
                         "values": ["2024-03-01", "2024-03-31"]}]}"#,
    )
    .unwrap();
    assert_eq!(sorted(fx.ids("deal", &t1(), &request)), ids(&["DL1", "DL2"]));

    let request: SearchRequest = serde_json::from_str(
        r#"{"filters": [{"field": "createdAt", "operator": "DATE_RANGE",
                         "values": ["2024-01-01", "2024-03-31"]}]}"#,
    )
    .unwrap();
    assert_eq!(sorted(fx.ids("lead", &t1(), &request)), ids(&["L1", "L2"]));
}

#[test]
fn test_date_upper_bound_includes_the_whole_day() {
    use crm_query::request::{EntitySearchRequest, LeadSearchRequest};

    let fx = Fixture::new();
    // L2 was created at noon on 2024-02-20.
    let request: SearchRequest = serde_json::from_str(
        r#"{"filters": [{"field": "createdAt", "operator": "DATE_RANGE",
                         "values": ["2024-02-20", "2024-02-20"]}]}"#,
    )
    .unwrap();
    assert_eq!(fx.ids("lead", &t1(), &request), ids(&["L2"]));

    let typed: LeadSearchRequest =
        serde_json::from_str(r#"{"createdFrom": "2024-01-01", "createdTo": "2024-02-20"}"#)
            .unwrap();
    let request = typed.into_search_request().unwrap();
    assert_eq!(sorted(fx.ids("lead", &t1(), &request)), ids(&["L1", "L2"]));

    let typed: LeadSearchRequest = serde_json::from_str(r#"{"createdTo": "2024-02-20"}"#).unwrap();
    let request = typed.into_search_request().unwrap();
    assert_eq!(sorted(fx.ids("lead", &t1(), &request)), ids(&["L1", "L2"]));

    // Strictly after the day excludes it entirely.
    let request = SearchRequest::new().filter(
        FilterCriterion::single("createdAt", Operator::GreaterThan, "2024-02-20").unwrap(),
    );
    assert_eq!(fx.ids("lead", &t1(), &request), ids(&["L3"]));
}

#[test]
fn test_date_range_rejects_non_dates() {
    let fx = Fixture::new();
    let request = SearchRequest::new().filter(
        FilterCriterion::pair("createdAt", Operator::DateRange, 1_i64, 2_i64).unwrap(),
    );
    let err = query_error(fx.search("lead", &t1(), &request).unwrap_err());
    assert_eq!(err.code(), "MALFORMED_FILTER");
}

#[test]
fn test_null_checks() {
    let fx = Fixture::new();
    let request = SearchRequest::new()
        .filter(FilterCriterion::unary("annualRevenue", Operator::IsNull).unwrap());
    assert_eq!(fx.ids("account", &t1(), &request), ids(&["C"]));

    let request = SearchRequest::new()
        .filter(FilterCriterion::unary("parentId", Operator::IsNotNull).unwrap());
    assert_eq!(sorted(fx.ids("account", &t1(), &request)), ids(&["A1", "A2"]));
}

#[test]
fn test_enum_values_match_case_insensitively() {
    let fx = Fixture::new();
    let request = SearchRequest::new()
        .filter(FilterCriterion::single("status", Operator::Equals, "qualified").unwrap());
    assert_eq!(sorted(fx.ids("lead", &t1(), &request)), ids(&["L1", "L2"]));
}

// ============================================================================
// Text search
// ============================================================================

#[test]
fn test_search_is_case_insensitive() {
    let fx = Fixture::new();
    let request = SearchRequest::new().search("ACME");
    assert_eq!(sorted(fx.ids("account", &t1(), &request)), ids(&["A", "A1", "A2"]));
}

#[test]
fn test_search_wildcards_are_literal() {
    let fx = Fixture::new();
    assert_eq!(
        fx.ids("account", &t1(), &SearchRequest::new().search("50%")),
        ids(&["C"])
    );
    assert_eq!(
        fx.ids("account", &t1(), &SearchRequest::new().search("a_c")),
        ids(&["D"])
    );
}

#[test]
fn test_search_fields_override_defaults() {
    let fx = Fixture::new();
    let request = SearchRequest::new()
        .search("retail")
        .search_fields(vec!["industry".to_string()]);
    assert_eq!(
        sorted(fx.ids("account", &t1(), &request)),
        ids(&["A", "A1", "A2", "C"])
    );

    let request = SearchRequest::new()
        .search("retail")
        .search_fields(vec!["name".to_string()]);
    assert!(fx.ids("account", &t1(), &request).is_empty());
}

// ============================================================================
// Custom fields
// ============================================================================

#[test]
fn test_custom_field_equality() {
    let fx = Fixture::new();
    let request: SearchRequest =
        serde_json::from_str(r#"{"customFieldsQuery": {"tier": "silver"}}"#).unwrap();
    assert_eq!(fx.ids("account", &t1(), &request), ids(&["A1"]));

    let request = SearchRequest::new().filter(
        FilterCriterion::single("customFields.seats", Operator::Equals, 40_i64).unwrap(),
    );
    assert_eq!(fx.ids("account", &t1(), &request), ids(&["A"]));
}

#[test]
fn test_custom_field_booleans_compare_as_words() {
    let fx = Fixture::new();
    fx.insert(
        "account",
        &t1(),
        serde_json::json!({"id": "E", "name": "Epsilon", "status": "ACTIVE",
                           "hierarchyPath": "/E", "customFields": {"vip": true}}),
    );
    let request = SearchRequest::new().custom_field("vip", true);
    assert_eq!(fx.ids("account", &t1(), &request), ids(&["E"]));

    let request = SearchRequest::new().custom_field("vip", false);
    assert!(fx.ids("account", &t1(), &request).is_empty());
}

#[test]
fn test_custom_field_missing_key_matches_nothing() {
    let fx = Fixture::new();
    let request = SearchRequest::new().custom_field("region", "emea");
    assert!(fx.ids("account", &t1(), &request).is_empty());
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn test_hierarchy_descendants() {
    let fx = Fixture::new();
    assert_eq!(
        sorted(fx.ids("account", &t1(), &SearchRequest::new().under_parent("A", true))),
        ids(&["A", "A1", "A2"])
    );
    assert_eq!(
        sorted(fx.ids("account", &t1(), &SearchRequest::new().under_parent("A1", true))),
        ids(&["A1", "A2"])
    );
}

#[test]
fn test_hierarchy_direct_children() {
    let fx = Fixture::new();
    assert_eq!(
        fx.ids("account", &t1(), &SearchRequest::new().under_parent("A", false)),
        ids(&["A1"])
    );
}

#[test]
fn test_hierarchy_requires_hierarchical_entity() {
    let fx = Fixture::new();
    let err = query_error(
        fx.search("lead", &t1(), &SearchRequest::new().under_parent("A", true))
            .unwrap_err(),
    );
    assert_eq!(err.code(), "MALFORMED_FILTER");
}

// ============================================================================
// Paging and sorting
// ============================================================================

#[test]
fn test_paging_offsets() {
    let fx = Fixture::new();
    let request = SearchRequest::new()
        .sort(SortCriterion::asc("name"))
        .page(2, 2);
    let page = fx.search("account", &t1(), &request).unwrap();

    let got: Vec<_> = page.items.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(got, vec!["A2", "B"]);
    assert_eq!(page.page_info.total, 6);
    assert_eq!(page.page_info.total_pages, 3);
    assert!(page.page_info.has_next);
    assert!(page.page_info.has_prev);

    let past_end = fx
        .search("account", &t1(), &SearchRequest::new().page(4, 2))
        .unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.page_info.total, 6);
}

#[test]
fn test_sort_nulls_first() {
    let fx = Fixture::new();
    let request = SearchRequest::new().sort(SortCriterion {
        field: "annualRevenue".into(),
        direction: SortDirection::Desc,
        nulls_first: Some(true),
    });
    assert_eq!(
        fx.ids("account", &t1(), &request),
        ids(&["C", "D", "A", "B", "A1", "A2"])
    );
}

#[test]
fn test_unsorted_pages_are_deterministic() {
    let fx = Fixture::new();
    let first = fx.ids("account", &t1(), &SearchRequest::new().page(1, 3));
    let second = fx.ids("account", &t1(), &SearchRequest::new().page(2, 3));
    assert_eq!(first, ids(&["A", "A1", "A2"]));
    assert_eq!(second, ids(&["B", "C", "D"]));
}

#[test]
fn test_invalid_page_requests() {
    let fx = Fixture::new();
    for request in [
        SearchRequest::new().page(0, 10),
        SearchRequest::new().page(1, 0),
        SearchRequest::new().page(1, 1001),
        SearchRequest::new().sort(SortCriterion::asc("nickname")),
    ] {
        let err = query_error(fx.search("lead", &t1(), &request).unwrap_err());
        assert_eq!(err.code(), "INVALID_PAGE_REQUEST");
    }
}

// ============================================================================
// Validation errors
// ============================================================================

#[test]
fn test_multi_hop_paths_are_rejected() {
    let fx = Fixture::new();
    let request = SearchRequest::new().filter(
        FilterCriterion::single("account.parentAccount.name", Operator::Equals, "Acme").unwrap(),
    );
    let err = query_error(fx.search("lead", &t1(), &request).unwrap_err());
    assert_eq!(
        err,
        QueryError::UnsupportedPathDepth {
            path: "account.parentAccount.name".into(),
            hops: 2
        }
    );
}

#[test]
fn test_unknown_field_and_wrong_operator() {
    let fx = Fixture::new();
    let request = SearchRequest::new()
        .filter(FilterCriterion::single("nickname", Operator::Equals, "x").unwrap());
    let err = query_error(fx.search("lead", &t1(), &request).unwrap_err());
    assert_eq!(err, QueryError::unknown_field("lead", "nickname"));

    let request = SearchRequest::new()
        .filter(FilterCriterion::single("leadScore", Operator::Like, "9%").unwrap());
    let err = query_error(fx.search("lead", &t1(), &request).unwrap_err());
    assert_eq!(err.code(), "UNSUPPORTED_OPERATOR_FOR_TYPE");
}

#[test]
fn test_malformed_json_filter_is_rejected_on_parse() {
    let result: Result<SearchRequest, _> = serde_json::from_str(
        r#"{"filters": [{"field": "amount", "operator": "BETWEEN", "values": [1]}]}"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_unknown_entity() {
    let fx = Fixture::new();
    let err = fx.search("invoice", &t1(), &SearchRequest::new()).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Compile(CompileError::UnknownEntity(ref e)) if e == "invoice"
    ));
}

// ============================================================================
// Typed entity requests
// ============================================================================

#[test]
fn test_typed_lead_request() {
    use crm_query::request::{EntitySearchRequest, LeadSearchRequest};

    let fx = Fixture::new();
    let typed = LeadSearchRequest {
        statuses: vec!["QUALIFIED".into()],
        min_lead_score: Some(90.0),
        ..LeadSearchRequest::default()
    };
    let request = typed.into_search_request().unwrap();
    assert_eq!(fx.ids(LeadSearchRequest::ENTITY, &t1(), &request), ids(&["L1"]));

    let typed: LeadSearchRequest = serde_json::from_str(
        r#"{"createdFrom": "2024-02-01", "createdTo": "2024-12-31", "sort": [{"field": "createdAt"}]}"#,
    )
    .unwrap();
    let request = typed.into_search_request().unwrap();
    assert_eq!(fx.ids("lead", &t1(), &request), ids(&["L2", "L3"]));
}
