//! In-memory structured store
//!
//! Serves canned rows per domain and emulates the bound parameters of the
//! gateway's statements (`userId` / `category` filters and `LIMIT`).
//! Used for tests and for running the service without a database.

use super::{SqlParam, SqlQuery, StructuredStore};
use crate::error::OrchestrationError;
use crate::models::{Domain, Record, Scalar};
use crate::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStore {
    rows: HashMap<Domain, Vec<Record>>,
    outages: HashSet<Domain>,
    executed: Arc<RwLock<Vec<SqlQuery>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows served for a domain, in the order the store would return them.
    pub fn with_rows(mut self, domain: Domain, rows: Vec<Record>) -> Self {
        self.rows.insert(domain, rows);
        self
    }

    /// Simulate an outage for every lookup against a domain.
    pub fn with_outage(mut self, domain: Domain) -> Self {
        self.outages.insert(domain);
        self
    }

    /// Statements executed so far, in call order.
    pub async fn executed(&self) -> Vec<SqlQuery> {
        self.executed.read().await.clone()
    }
}

#[async_trait::async_trait]
impl StructuredStore for InMemoryStore {
    async fn execute(&self, query: &SqlQuery) -> Result<Vec<Record>> {
        self.executed.write().await.push(query.clone());

        if self.outages.contains(&query.domain) {
            return Err(OrchestrationError::DataSourceUnavailable(format!(
                "simulated outage for {}",
                query.domain
            )));
        }

        let filter_field = match query.domain {
            Domain::Products => "category",
            _ => "userId",
        };

        let mut rows: Vec<Record> = self
            .rows
            .get(&query.domain)
            .cloned()
            .unwrap_or_default();

        for param in &query.params {
            match param {
                SqlParam::Text(value) => {
                    rows.retain(|r| r.get(filter_field) == Some(&Scalar::Text(value.clone())));
                }
                SqlParam::Int(limit) => {
                    rows.truncate((*limit).max(0) as usize);
                }
            }
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{DataGateway, FetchFilter};

    fn transactions() -> Vec<Record> {
        (1..=8)
            .map(|i| {
                Record::new()
                    .with("transactionId", format!("T{}", i))
                    .with("userId", if i % 2 == 0 { "U2" } else { "U1" })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_limit_and_subject_are_applied() {
        let store = Arc::new(InMemoryStore::new().with_rows(Domain::Transactions, transactions()));
        let gateway = DataGateway::new(store.clone());

        let set = gateway.fetch_transactions(None, None).await.unwrap();
        assert_eq!(set.records.len(), 5);

        let set = gateway.fetch_transactions(Some("U2"), Some(2)).await.unwrap();
        assert_eq!(set.records.len(), 2);
        assert!(set
            .records
            .iter()
            .all(|r| r.get("userId") == Some(&Scalar::Text("U2".to_string()))));

        assert_eq!(store.executed().await.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_domain_is_empty() {
        let store = InMemoryStore::new();
        let gateway = DataGateway::new(Arc::new(store));

        let set = gateway
            .fetch(Domain::Products, &FetchFilter::default())
            .await
            .unwrap();
        assert!(set.is_empty());
    }
}
