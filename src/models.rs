//! Core data models for the hybrid query orchestrator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Free-form metadata attached to an indexed document.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

//
// ================= Domain =================
//

/// A structured record family the gateway knows how to fetch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    User,
    Wallet,
    Kyc,
    Transactions,
    Orders,
    Products,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::User,
        Domain::Wallet,
        Domain::Kyc,
        Domain::Transactions,
        Domain::Orders,
        Domain::Products,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::User => "user",
            Domain::Wallet => "wallet",
            Domain::Kyc => "kyc",
            Domain::Transactions => "transactions",
            Domain::Orders => "orders",
            Domain::Products => "products",
        }
    }

    /// Prefix used when a record of this domain is rendered into a context line.
    pub fn label(&self) -> &'static str {
        match self {
            Domain::User => "USER",
            Domain::Wallet => "WALLET",
            Domain::Kyc => "KYC",
            Domain::Transactions => "TRANSACTIONS",
            Domain::Orders => "ORDERS",
            Domain::Products => "PRODUCTS",
        }
    }

    /// Time-ordered domains honour a result-size bound.
    pub fn is_time_ordered(&self) -> bool {
        matches!(self, Domain::Transactions | Domain::Orders)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//
// ================= Structured Records =================
//

/// A single column value as read from the structured store.
///
/// Serializes as the bare JSON value. Not deserializable: `Decimal` and
/// `Text` share a representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Arbitrary precision numbers keep their textual form.
    Decimal(String),
    Text(String),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Decimal(d) => write!(f, "{}", d),
            Scalar::Text(s) => write!(f, "{}", s),
            Scalar::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Scalar::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}

/// One row, fields kept in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    fields: Vec<(String, Scalar)>,
}

impl Record {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builder-style insert, used heavily by tests and the in-memory store.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Rows returned from one domain fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSet {
    pub domain: Domain,
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn new(domain: Domain, records: Vec<Record>) -> Self {
        Self { domain, records }
    }

    pub fn empty(domain: Domain) -> Self {
        Self {
            domain,
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

//
// ================= Semantic =================
//

/// A retrieved unit of semantic text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub document_id: String,
    pub text: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A document offered for indexing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Stable identifier. Supplying one makes repeated ingestion overwrite
    /// instead of adding a new entry.
    #[serde(default)]
    pub id: Option<String>,
}

//
// ================= Grounding & Answer =================
//

/// Serialized fusion of record sets and passages for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingContext(String);

impl GroundingContext {
    pub fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// SHA-256 hex of the serialized context.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl fmt::Display for GroundingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Final answer returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub domains: Vec<Domain>,
    pub passages: usize,
    pub context_fingerprint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_labels() {
        assert_eq!(Domain::Wallet.label(), "WALLET");
        assert_eq!(Domain::Transactions.to_string(), "transactions");
        assert!(Domain::Orders.is_time_ordered());
        assert!(!Domain::Kyc.is_time_ordered());
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Int(100).to_string(), "100");
        assert_eq!(Scalar::Float(12.5).to_string(), "12.5");
        assert_eq!(Scalar::Bool(true).to_string(), "true");
        assert_eq!(Scalar::from(None::<String>), Scalar::Null);
    }

    #[test]
    fn test_record_keeps_column_order() {
        let record = Record::new()
            .with("userId", "U1")
            .with("name", "Ann")
            .with("walletBal", 100i64);

        let names: Vec<&str> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["userId", "name", "walletBal"]);
        assert_eq!(record.get("name"), Some(&Scalar::Text("Ann".to_string())));
    }

    #[test]
    fn test_scalar_serializes_as_bare_value() {
        let record = Record::new()
            .with("name", "Ann")
            .with("walletBal", Scalar::Decimal("100.50".to_string()))
            .with("email", Scalar::Null);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "fields": [["name", "Ann"], ["walletBal", "100.50"], ["email", null]] })
        );
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = GroundingContext::new("WALLET: userId: U1".to_string());
        let b = GroundingContext::new("WALLET: userId: U1".to_string());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
