//! Shared SQLite fixture for integration tests.
//!
//! Tenant `t1` owns an account tree `A -> A1 -> A2` plus accounts `B`, `C`
//! and `D`; tenant `t2` owns a look-alike account `X`. Links (tenant `t1`):
//! `A-B` PARTNER, `C-A` VENDOR, and an inactive `A-D` PARTNER.

#![allow(dead_code)]

use crm_query::compile::CompileOptions;
use crm_query::page::Page;
use crm_query::store::{self, Record, SqliteStore, StoreResult};
use crm_query::{Catalog, SearchRequest, TenantId};
use serde_json::{json, Value as Json};

pub struct Fixture {
    pub catalog: Catalog,
    pub store: SqliteStore,
}

pub fn t1() -> TenantId {
    TenantId::new("t1")
}

pub fn t2() -> TenantId {
    TenantId::new("t2")
}

fn record(value: Json) -> Record {
    match value {
        Json::Object(map) => map,
        other => panic!("fixture record must be an object, got {}", other),
    }
}

impl Fixture {
    pub fn new() -> Self {
        let catalog = Catalog::crm();
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_tables(&catalog).unwrap();
        let fixture = Self { catalog, store };
        fixture.seed();
        fixture
    }

    pub fn insert(&self, entity: &str, tenant: &TenantId, value: Json) {
        let schema = self.catalog.entity(entity).unwrap();
        self.store.insert(schema, tenant, &record(value)).unwrap();
    }

    fn seed(&self) {
        let (t1, t2) = (t1(), t2());

        for account in [
            json!({"id": "A", "name": "Acme Corp", "industry": "Retail", "status": "ACTIVE",
                   "hierarchyPath": "/A", "hierarchyLevel": 0, "annualRevenue": 5000,
                   "customFields": {"tier": "gold", "seats": 40}}),
            json!({"id": "A1", "name": "Acme West", "industry": "Retail", "status": "ACTIVE",
                   "parentId": "A", "hierarchyPath": "/A/A1", "hierarchyLevel": 1,
                   "annualRevenue": 1000, "customFields": {"tier": "silver"}}),
            json!({"id": "A2", "name": "Acme West Coast", "industry": "Retail", "status": "INACTIVE",
                   "parentId": "A1", "hierarchyPath": "/A/A1/A2", "hierarchyLevel": 2,
                   "annualRevenue": 250}),
            json!({"id": "B", "name": "Beta LLC", "industry": "Finance", "status": "ACTIVE",
                   "hierarchyPath": "/B", "hierarchyLevel": 0, "annualRevenue": 3000,
                   "customFields": {"tier": "gold"}}),
            json!({"id": "C", "name": "Gamma 50% Off", "industry": "Retail", "status": "SUSPENDED",
                   "hierarchyPath": "/C", "hierarchyLevel": 0}),
            json!({"id": "D", "name": "Delta_Co", "industry": "Energy", "status": "CLOSED",
                   "hierarchyPath": "/D", "hierarchyLevel": 0, "annualRevenue": 9000}),
        ] {
            self.insert("account", &t1, account);
        }
        self.insert(
            "account",
            &t2,
            json!({"id": "X", "name": "Acme Corp", "industry": "Retail", "status": "ACTIVE",
                   "hierarchyPath": "/X", "hierarchyLevel": 0, "customFields": {"tier": "gold"}}),
        );

        for lead in [
            json!({"id": "L1", "firstName": "Ada", "lastName": "Lovelace", "company": "Acme Corp",
                   "status": "QUALIFIED", "leadScore": 95, "accountId": "A",
                   "createdAt": "2024-01-15T09:30:00Z"}),
            json!({"id": "L2", "firstName": "Grace", "lastName": "Hopper", "company": "Beta LLC",
                   "status": "QUALIFIED", "leadScore": 85, "accountId": "B",
                   "createdAt": "2024-02-20T12:00:00Z"}),
            json!({"id": "L3", "firstName": "Alan", "lastName": "Turing", "company": "Gamma",
                   "status": "NEW", "leadScore": 70, "accountId": "D",
                   "createdAt": "2024-04-01T08:00:00Z"}),
        ] {
            self.insert("lead", &t1, lead);
        }
        self.insert(
            "lead",
            &t2,
            json!({"id": "L9", "firstName": "Eve", "lastName": "Other", "status": "QUALIFIED",
                   "leadScore": 99, "createdAt": "2024-01-01T00:00:00Z"}),
        );

        for contact in [
            json!({"id": "K1", "firstName": "Ann", "lastName": "Lee", "email": "ann@acme.test",
                   "accountId": "A"}),
            json!({"id": "K2", "firstName": "Bo", "lastName": "Park", "email": "bo@beta.test",
                   "accountId": "B"}),
            json!({"id": "K3", "firstName": "Cy", "lastName": "Diaz", "accountId": "D"}),
        ] {
            self.insert("contact", &t1, contact);
        }

        for deal in [
            json!({"id": "DL1", "name": "Acme renewal", "stage": "PROPOSAL", "amount": 1000,
                   "accountId": "A", "closeDate": "2024-03-01"}),
            json!({"id": "DL2", "name": "Beta expansion", "stage": "NEGOTIATION", "amount": 5000,
                   "accountId": "B", "closeDate": "2024-03-31"}),
            json!({"id": "DL3", "name": "Delta pilot", "stage": "CLOSED_WON", "amount": 7500,
                   "accountId": "D", "closeDate": "2024-06-30"}),
        ] {
            self.insert("deal", &t1, deal);
        }

        let links = &self
            .catalog
            .entity("account")
            .unwrap()
            .related
            .as_ref()
            .unwrap()
            .links;
        self.store.link(links, &t1, "A", "B", "PARTNER", true).unwrap();
        self.store.link(links, &t1, "C", "A", "VENDOR", true).unwrap();
        self.store.link(links, &t1, "A", "D", "PARTNER", false).unwrap();
        self.store.link(links, &t2, "A", "X", "PARTNER", true).unwrap();
    }

    pub fn search(
        &self,
        entity: &str,
        tenant: &TenantId,
        request: &SearchRequest,
    ) -> StoreResult<Page<Record>> {
        store::search(
            &self.store,
            &self.catalog,
            entity,
            tenant,
            request,
            &CompileOptions::default(),
        )
    }

    /// Ids of the matching page, in order.
    pub fn ids(&self, entity: &str, tenant: &TenantId, request: &SearchRequest) -> Vec<String> {
        self.search(entity, tenant, request)
            .unwrap()
            .items
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect()
    }
}

/// Sorted copy, for order-insensitive comparisons.
pub fn sorted(mut ids: Vec<String>) -> Vec<String> {
    ids.sort();
    ids
}
