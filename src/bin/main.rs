use hybrid_query_orchestrator::{agent::Runtime, config::Settings, gateway::FetchFilter};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// One-shot query: `orchestrator "What is my wallet balance?"`
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if query.trim().is_empty() {
        eprintln!("usage: orchestrator <question>");
        std::process::exit(2);
    }

    let settings = Settings::from_env()?;
    let runtime = Runtime::from_settings(&settings)?;

    info!(query = %query, "Running orchestrator");

    let (retrieval, result) = runtime
        .orchestrator
        .answer_with_retrieval(&query, &FetchFilter::default())
        .await;
    runtime.shutdown().await;

    println!("\n=== GROUNDING ===");
    println!("Domains: {:?}", retrieval.domains);
    for diagnostic in &retrieval.diagnostics {
        println!("  degraded: {}", diagnostic);
    }

    match result {
        Ok(answer) => {
            println!("\n=== ANSWER ===");
            println!("{}", answer.text);
            println!("\nContext fingerprint: {}", answer.context_fingerprint);
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to process the query: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
