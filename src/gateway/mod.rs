//! Structured Data Gateway
//!
//! Issues parameterized lookups against the operational record domains.
//! Every statement is a static SQL string; user-supplied values only ever
//! travel as bound parameters.

use crate::error::OrchestrationError;
use crate::models::{Domain, Record, RecordSet};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Default bound for time-ordered domains
pub const DEFAULT_RECORD_LIMIT: u32 = 5;
const MAX_RECORD_LIMIT: u32 = 100;

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

/// Parameterized statement for one domain fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub domain: Domain,
    pub sql: &'static str,
    pub params: Vec<SqlParam>,
}

/// Read-only access to the relational store
#[async_trait]
pub trait StructuredStore: Send + Sync {
    async fn execute(&self, query: &SqlQuery) -> Result<Vec<Record>>;
}

/// Store used when no database is configured. Every lookup is an outage.
pub struct DisconnectedStore;

#[async_trait]
impl StructuredStore for DisconnectedStore {
    async fn execute(&self, query: &SqlQuery) -> Result<Vec<Record>> {
        Err(OrchestrationError::DataSourceUnavailable(format!(
            "no structured store configured for {}",
            query.domain
        )))
    }
}

/// Optional restrictions for a domain fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchFilter {
    /// Restrict to one user (`userId`).
    pub subject: Option<String>,
    /// Restrict products to one category.
    pub category: Option<String>,
    /// Result-size bound for time-ordered domains.
    pub limit: Option<u32>,
}

impl FetchFilter {
    pub fn for_subject(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..Self::default()
        }
    }
}

// =============================
// Statements
// =============================

const USER_ACTIVE: &str = r#"SELECT * FROM tbl_user WHERE "isActive" = TRUE"#;
const USER_BY_ID: &str = r#"SELECT * FROM tbl_user WHERE "isActive" = TRUE AND "userId" = $1"#;

const WALLET_ACTIVE: &str =
    r#"SELECT "userId", name, "walletBal" FROM tbl_user WHERE "isActive" = TRUE"#;
const WALLET_BY_ID: &str =
    r#"SELECT "userId", name, "walletBal" FROM tbl_user WHERE "isActive" = TRUE AND "userId" = $1"#;

const KYC_ACTIVE: &str = r#"SELECT "userId", name, kyc_type, kyc_vfy, pan_vfy, aadhaar_vfy FROM tbl_user WHERE "isActive" = TRUE"#;
const KYC_BY_ID: &str = r#"SELECT "userId", name, kyc_type, kyc_vfy, pan_vfy, aadhaar_vfy FROM tbl_user WHERE "isActive" = TRUE AND "userId" = $1"#;

const TRANSACTIONS_RECENT: &str =
    r#"SELECT * FROM tbl_transactions ORDER BY "transactionDate" DESC LIMIT $1"#;
const TRANSACTIONS_BY_ID: &str =
    r#"SELECT * FROM tbl_transactions WHERE "userId" = $1 ORDER BY "transactionDate" DESC LIMIT $2"#;

const ORDERS_RECENT: &str = r#"SELECT * FROM tbl_orders ORDER BY "orderDate" DESC LIMIT $1"#;
const ORDERS_BY_ID: &str =
    r#"SELECT * FROM tbl_orders WHERE "userId" = $1 ORDER BY "orderDate" DESC LIMIT $2"#;

const PRODUCTS_ACTIVE: &str = r#"SELECT * FROM tbl_products WHERE "isActive" = TRUE"#;
const PRODUCTS_BY_CATEGORY: &str =
    r#"SELECT * FROM tbl_products WHERE "isActive" = TRUE AND category = $1"#;

/// Gateway over a [`StructuredStore`]
pub struct DataGateway {
    store: Arc<dyn StructuredStore>,
    default_limit: u32,
}

impl DataGateway {
    pub fn new(store: Arc<dyn StructuredStore>) -> Self {
        Self {
            store,
            default_limit: DEFAULT_RECORD_LIMIT,
        }
    }

    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit.clamp(1, MAX_RECORD_LIMIT);
        self
    }

    /// Build the statement for a domain fetch. Pure; no I/O.
    pub fn statement(&self, domain: Domain, filter: &FetchFilter) -> SqlQuery {
        let subject = filter
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let limit = filter
            .limit
            .unwrap_or(self.default_limit)
            .clamp(1, MAX_RECORD_LIMIT) as i64;

        let (sql, params) = match domain {
            Domain::User => by_subject(subject, USER_ACTIVE, USER_BY_ID),
            Domain::Wallet => by_subject(subject, WALLET_ACTIVE, WALLET_BY_ID),
            Domain::Kyc => by_subject(subject, KYC_ACTIVE, KYC_BY_ID),
            Domain::Transactions => {
                let (sql, mut params) = by_subject(subject, TRANSACTIONS_RECENT, TRANSACTIONS_BY_ID);
                params.push(SqlParam::Int(limit));
                (sql, params)
            }
            Domain::Orders => {
                let (sql, mut params) = by_subject(subject, ORDERS_RECENT, ORDERS_BY_ID);
                params.push(SqlParam::Int(limit));
                (sql, params)
            }
            Domain::Products => {
                let category = filter
                    .category
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty());
                by_subject(category, PRODUCTS_ACTIVE, PRODUCTS_BY_CATEGORY)
            }
        };

        SqlQuery { domain, sql, params }
    }

    /// Fetch one domain. Outages surface as `DataSourceUnavailable`.
    pub async fn fetch(&self, domain: Domain, filter: &FetchFilter) -> Result<RecordSet> {
        let query = self.statement(domain, filter);

        let records = self.store.execute(&query).await.map_err(|e| match e {
            OrchestrationError::DataSourceUnavailable(_) => e,
            other => OrchestrationError::DataSourceUnavailable(other.to_string()),
        })?;

        debug!(domain = %domain, rows = records.len(), "Domain fetch complete");

        Ok(RecordSet::new(domain, records))
    }

    pub async fn fetch_user(&self, subject: Option<&str>) -> Result<RecordSet> {
        self.fetch(Domain::User, &subject_filter(subject)).await
    }

    pub async fn fetch_wallet(&self, subject: Option<&str>) -> Result<RecordSet> {
        self.fetch(Domain::Wallet, &subject_filter(subject)).await
    }

    pub async fn fetch_kyc(&self, subject: Option<&str>) -> Result<RecordSet> {
        self.fetch(Domain::Kyc, &subject_filter(subject)).await
    }

    pub async fn fetch_transactions(
        &self,
        subject: Option<&str>,
        limit: Option<u32>,
    ) -> Result<RecordSet> {
        let filter = FetchFilter {
            limit,
            ..subject_filter(subject)
        };
        self.fetch(Domain::Transactions, &filter).await
    }

    pub async fn fetch_orders(&self, subject: Option<&str>, limit: Option<u32>) -> Result<RecordSet> {
        let filter = FetchFilter {
            limit,
            ..subject_filter(subject)
        };
        self.fetch(Domain::Orders, &filter).await
    }

    pub async fn fetch_products(&self, category: Option<&str>) -> Result<RecordSet> {
        let filter = FetchFilter {
            category: category.map(str::to_string),
            ..FetchFilter::default()
        };
        self.fetch(Domain::Products, &filter).await
    }
}

fn subject_filter(subject: Option<&str>) -> FetchFilter {
    FetchFilter {
        subject: subject.map(str::to_string),
        ..FetchFilter::default()
    }
}

fn by_subject(
    value: Option<&str>,
    unfiltered: &'static str,
    filtered: &'static str,
) -> (&'static str, Vec<SqlParam>) {
    match value {
        Some(v) => (filtered, vec![SqlParam::Text(v.to_string())]),
        None => (unfiltered, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Scalar;
    use tokio_test::{assert_err, assert_ok};

    fn gateway(store: InMemoryStore) -> DataGateway {
        DataGateway::new(Arc::new(store))
    }

    #[test]
    fn test_subject_is_bound_not_spliced() {
        let gw = gateway(InMemoryStore::new());
        let hostile = "U1' OR '1'='1";

        for domain in [Domain::User, Domain::Wallet, Domain::Kyc, Domain::Transactions, Domain::Orders] {
            let query = gw.statement(domain, &FetchFilter::for_subject(hostile));
            assert!(!query.sql.contains(hostile), "{} splices input", domain);
            assert_eq!(query.params[0], SqlParam::Text(hostile.to_string()));
        }
    }

    #[test]
    fn test_time_ordered_domains_default_limit() {
        let gw = gateway(InMemoryStore::new());

        let query = gw.statement(Domain::Transactions, &FetchFilter::default());
        assert!(query.sql.contains(r#"ORDER BY "transactionDate" DESC"#));
        assert_eq!(query.params, vec![SqlParam::Int(5)]);

        let query = gw.statement(Domain::Orders, &FetchFilter::for_subject("U7"));
        assert!(query.sql.contains(r#"ORDER BY "orderDate" DESC"#));
        assert_eq!(
            query.params,
            vec![SqlParam::Text("U7".to_string()), SqlParam::Int(5)]
        );
    }

    #[test]
    fn test_limit_is_clamped() {
        let gw = gateway(InMemoryStore::new()).with_default_limit(3);

        let query = gw.statement(Domain::Orders, &FetchFilter::default());
        assert_eq!(query.params, vec![SqlParam::Int(3)]);

        let filter = FetchFilter {
            limit: Some(10_000),
            ..FetchFilter::default()
        };
        let query = gw.statement(Domain::Transactions, &filter);
        assert_eq!(query.params, vec![SqlParam::Int(100)]);
    }

    #[test]
    fn test_blank_subject_means_unfiltered() {
        let gw = gateway(InMemoryStore::new());
        let query = gw.statement(Domain::Wallet, &FetchFilter::for_subject("   "));
        assert_eq!(query.sql, WALLET_ACTIVE);
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_products_filter_by_category() {
        let gw = gateway(InMemoryStore::new());
        let filter = FetchFilter {
            category: Some("gift-cards".to_string()),
            ..FetchFilter::default()
        };
        let query = gw.statement(Domain::Products, &filter);
        assert_eq!(query.sql, PRODUCTS_BY_CATEGORY);
        assert_eq!(query.params, vec![SqlParam::Text("gift-cards".to_string())]);
    }

    #[tokio::test]
    async fn test_fetch_wallet_returns_tagged_rows() {
        let store = InMemoryStore::new().with_rows(
            Domain::Wallet,
            vec![Record::new()
                .with("userId", "U1")
                .with("name", "Ann")
                .with("walletBal", 100i64)],
        );
        let gw = gateway(store);

        let set = assert_ok!(gw.fetch_wallet(None).await);
        assert_eq!(set.domain, Domain::Wallet);
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.records[0].get("walletBal"), Some(&Scalar::Int(100)));
    }

    #[tokio::test]
    async fn test_outage_is_data_source_unavailable() {
        let gw = gateway(InMemoryStore::new().with_outage(Domain::Transactions));

        let err = assert_err!(gw.fetch_transactions(Some("U1"), None).await);
        assert!(matches!(err, OrchestrationError::DataSourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_disconnected_store_is_outage() {
        let gw = DataGateway::new(Arc::new(DisconnectedStore));
        let err = assert_err!(gw.fetch_kyc(None).await);
        assert!(err.is_degradable());
    }
}
