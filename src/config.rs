//! Runtime settings
//!
//! Read from the process environment; binaries call `dotenv::dotenv()`
//! first so a local `.env` file is honoured.

use crate::error::OrchestrationError;
use crate::gateway::DEFAULT_RECORD_LIMIT;
use crate::gemini::DEFAULT_GEMINI_MODEL;
use crate::semantic::DEFAULT_TOP_K;
use crate::Result;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: Option<String>,
    pub db_max_connections: u32,

    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub embedding_model: String,
    pub embedding_dimensions: usize,

    pub pinecone_api_key: Option<String>,
    pub pinecone_index_host: Option<String>,
    pub pinecone_namespace: Option<String>,

    pub gemini_api_key: String,
    pub gemini_model: String,
    pub llm_timeout: Duration,

    pub search_top_k: usize,
    pub record_limit: u32,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            database_url: get("DATABASE_URL").or_else(|| get("POSTGRES_URL")),
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 5)?,

            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            embedding_model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            embedding_dimensions: parse_or(&get, "EMBEDDING_DIMENSIONS", 1024)?,

            pinecone_api_key: get("PINECONE_API_KEY"),
            pinecone_index_host: get("PINECONE_INDEX_HOST"),
            pinecone_namespace: get("PINECONE_NAMESPACE"),

            gemini_api_key: get("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            llm_timeout: Duration::from_secs(parse_or(&get, "LLM_TIMEOUT_SECS", 30)?),

            search_top_k: parse_or(&get, "SEARCH_TOP_K", DEFAULT_TOP_K)?,
            record_limit: parse_or(&get, "RECORD_LIMIT", DEFAULT_RECORD_LIMIT)?,
            port: match get("PORT") {
                Some(_) => parse_or(&get, "PORT", 8080)?,
                None => parse_or(&get, "API_PORT", 8080)?,
            },
        })
    }

    /// Key/value view used by tests and diagnostics. Secrets are masked.
    pub fn redacted(&self) -> HashMap<&'static str, String> {
        let mask = |v: &Option<String>| (if v.is_some() { "<set>" } else { "<unset>" }).to_string();

        let mut out = HashMap::new();
        out.insert("DATABASE_URL", mask(&self.database_url));
        out.insert("OPENAI_API_KEY", mask(&self.openai_api_key));
        out.insert("PINECONE_API_KEY", mask(&self.pinecone_api_key));
        out.insert(
            "GEMINI_API_KEY",
            mask(&Some(self.gemini_api_key.clone()).filter(|k| !k.is_empty())),
        );
        out.insert("EMBEDDING_MODEL", self.embedding_model.clone());
        out.insert("GEMINI_MODEL", self.gemini_model.clone());
        out.insert("SEARCH_TOP_K", self.search_top_k.to_string());
        out.insert("RECORD_LIMIT", self.record_limit.to_string());
        out.insert("PORT", self.port.to_string());
        out
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e| {
            OrchestrationError::ConfigError(format!("{} must be a number, got {:?}: {}", key, raw, e))
        }),
        None => Ok(default),
    }
}
