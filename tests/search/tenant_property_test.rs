//! Tenant isolation over generated request combinations.
//!
//! Whatever filters, search term, custom-field, hierarchy and relationship
//! criteria a request carries, every row it returns belongs to the tenant
//! it was run for.

#[path = "../common/mod.rs"]
mod common;

use common::{t1, t2, Fixture};
use crm_query::criteria::{FilterCriterion, Value};
use crm_query::operator::Operator;
use crm_query::{SearchRequest, TenantId};
use proptest::prelude::*;
use serde_json::json;

fn arb_tenant() -> impl Strategy<Value = TenantId> {
    prop_oneof![Just(t1()), Just(t2())]
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Acme".to_string()),
        Just("Acme Corp".to_string()),
        Just("Retail".to_string()),
        Just("50%".to_string()),
        "[a-zA-Z_% ]{1,6}",
    ]
}

fn arb_account_id() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("A".to_string()),
        Just("A1".to_string()),
        Just("B".to_string()),
        Just("C".to_string()),
        Just("X".to_string()),
        Just("missing".to_string()),
    ]
}

fn arb_date() -> impl Strategy<Value = Value> {
    (2023i32..2026, 1u32..13, 1u32..29).prop_map(|(y, m, d)| {
        Value::Date(chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap())
    })
}

fn arb_account_filter() -> impl Strategy<Value = FilterCriterion> {
    prop_oneof![
        (
            prop_oneof![
                Just(Operator::Equals),
                Just(Operator::NotEquals),
                Just(Operator::Contains),
                Just(Operator::StartsWith),
                Just(Operator::EndsWith),
                Just(Operator::Ilike),
            ],
            arb_text(),
        )
            .prop_map(|(op, text)| FilterCriterion::single("name", op, text).unwrap()),
        prop::collection::vec(arb_text(), 1..3).prop_map(|values| {
            let values = values.into_iter().map(Value::from).collect();
            FilterCriterion::multi("industry", Operator::In, values).unwrap()
        }),
        (0i64..10_000, 0i64..10_000).prop_map(|(low, high)| {
            FilterCriterion::pair("annualRevenue", Operator::Between, low, high).unwrap()
        }),
        (
            prop_oneof![
                Just(Operator::GreaterThan),
                Just(Operator::LessThanOrEqual),
                Just(Operator::NotEquals),
            ],
            0i64..10_000,
        )
            .prop_map(|(op, n)| FilterCriterion::single("annualRevenue", op, n).unwrap()),
        prop_oneof![Just("ACTIVE"), Just("inactive"), Just("CLOSED")]
            .prop_map(|s| FilterCriterion::single("status", Operator::Equals, s).unwrap()),
        prop_oneof![Just(Operator::IsNull), Just(Operator::IsNotNull)]
            .prop_map(|op| FilterCriterion::unary("parentId", op).unwrap()),
        (arb_date(), arb_date()).prop_map(|(from, to)| {
            FilterCriterion::pair("createdAt", Operator::DateRange, from, to).unwrap()
        }),
        arb_text().prop_map(|text| {
            FilterCriterion::single("parentAccount.name", Operator::Equals, text).unwrap()
        }),
        prop_oneof![Just("gold"), Just("silver")].prop_map(|tier| {
            FilterCriterion::single("customFields.tier", Operator::Equals, tier).unwrap()
        }),
    ]
}

fn arb_account_request() -> impl Strategy<Value = SearchRequest> {
    (
        prop::collection::vec(arb_account_filter(), 0..3),
        prop::option::of(arb_text()),
        prop::option::of(prop_oneof![Just("gold"), Just("silver"), Just("bronze")]),
        prop::option::of((arb_account_id(), any::<bool>())),
        prop::option::of((
            arb_account_id(),
            prop::option::of(prop_oneof![Just("PARTNER"), Just("VENDOR")]),
        )),
    )
        .prop_map(|(filters, search, tier, hierarchy, related)| {
            let mut request = SearchRequest::new();
            for filter in filters {
                request = request.filter(filter);
            }
            if let Some(term) = search {
                request = request.search(term);
            }
            if let Some(tier) = tier {
                request = request.custom_field("tier", tier);
            }
            if let Some((parent, descendants)) = hierarchy {
                request = request.under_parent(parent, descendants);
            }
            if let Some((record, kind)) = related {
                request = request.related_to(record, kind);
            }
            request
        })
}

fn arb_contact_request() -> impl Strategy<Value = SearchRequest> {
    (
        prop::option::of(arb_text()),
        prop::option::of(arb_text()),
        prop::option::of(arb_account_id()),
        prop::option::of((
            arb_account_id(),
            prop::option::of(prop_oneof![Just("PARTNER"), Just("VENDOR")]),
        )),
    )
        .prop_map(|(account_name, search, account_id, related)| {
            let mut request = SearchRequest::new();
            if let Some(name) = account_name {
                request = request.filter(
                    FilterCriterion::single("account.name", Operator::Contains, name).unwrap(),
                );
            }
            if let Some(term) = search {
                request = request.search(term);
            }
            if let Some(id) = account_id {
                request = request
                    .filter(FilterCriterion::single("accountId", Operator::Equals, id).unwrap());
            }
            if let Some((record, kind)) = related {
                request = request.related_to(record, kind);
            }
            request
        })
}

/// The shared fixture plus a second-tenant contact pointing at its
/// look-alike account.
fn fixture() -> Fixture {
    let fx = Fixture::new();
    fx.insert(
        "contact",
        &t2(),
        json!({"id": "K9", "firstName": "Ann", "lastName": "Lee", "email": "ann@acme.test",
               "accountId": "X"}),
    );
    fx
}

fn assert_scoped(
    fx: &Fixture,
    entity: &str,
    tenant: &TenantId,
    request: &SearchRequest,
) -> Result<(), TestCaseError> {
    let page = fx
        .search(entity, tenant, &request.clone().page(1, 1000))
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert!(page.page_info.total as usize >= page.items.len());
    for row in &page.items {
        prop_assert_eq!(&row["tenantId"], &json!(tenant.as_str()), "row {:?}", row);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn account_results_stay_in_tenant(tenant in arb_tenant(), request in arb_account_request()) {
        let fx = fixture();
        assert_scoped(&fx, "account", &tenant, &request)?;
    }

    #[test]
    fn contact_results_stay_in_tenant(tenant in arb_tenant(), request in arb_contact_request()) {
        let fx = fixture();
        assert_scoped(&fx, "contact", &tenant, &request)?;
    }
}
