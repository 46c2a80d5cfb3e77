//! Hybrid Query Orchestrator
//!
//! Answers free-text questions about operational data (users, wallets,
//! KYC, transactions, orders, products) by combining:
//! - Structured lookups against the relational store, chosen by topic routing
//! - Semantic search over an embedded document corpus
//! - A generative model grounded on the fused result
//!
//! FLOW:
//! QUERY → ROUTE → (FETCH ∥ SEARCH) → FUSE → COMPOSE → ANSWER

pub mod agent;
pub mod api;
pub mod classifier;
pub mod composer;
pub mod config;
pub mod error;
pub mod fusion;
pub mod gateway;
pub mod gemini;
pub mod models;
pub mod semantic;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use agent::HybridOrchestrator;
pub use classifier::TopicRouter;
pub use error::OrchestrationError;
