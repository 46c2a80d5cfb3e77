//! Topic Router
//!
//! Maps raw query text onto the structured domains it touches using
//! case-insensitive keyword matching. Matches are independent: a query
//! about "wallet balance and recent orders" routes to both domains.
//! Queries that match nothing fall back to the user domain.

use crate::models::Domain;

/// Static keyword table.
/// Row order is the fetch order, which fixes the fusion order downstream.
const KEYWORD_TABLE: &[(Domain, &[&str])] = &[
    (Domain::Wallet, &["wallet", "balance"]),
    (Domain::Kyc, &["kyc", "verification"]),
    (Domain::Transactions, &["transaction", "payment"]),
    (Domain::Orders, &["order", "purchase"]),
    (Domain::Products, &["product", "item"]),
];

const FALLBACK_DOMAIN: Domain = Domain::User;

/// Keyword-based topic router
pub struct TopicRouter;

impl TopicRouter {
    /// Route a query to its domains, in keyword-table order, without duplicates.
    pub fn route(query: &str) -> Vec<Domain> {
        let query = query.to_lowercase();

        let mut domains: Vec<Domain> = KEYWORD_TABLE
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|kw| query.contains(kw)))
            .map(|(domain, _)| *domain)
            .collect();

        if domains.is_empty() {
            domains.push(FALLBACK_DOMAIN);
        }

        domains
    }

    /// Keywords that select a domain. The fallback domain has none.
    pub fn keywords(domain: Domain) -> &'static [&'static str] {
        KEYWORD_TABLE
            .iter()
            .find(|(d, _)| *d == domain)
            .map(|(_, keywords)| *keywords)
            .unwrap_or(&[])
    }
}
