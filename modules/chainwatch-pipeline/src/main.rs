use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chainwatch_common::Config;
use chainwatch_graph::{migrate, GraphClient, GraphReader, GraphWriter};
use chainwatch_pipeline::assess::ClaudeRiskScorer;
use chainwatch_pipeline::run::Pipeline;
use chainwatch_pipeline::traits::{GraphStore, NewsApiSource};
use newsapi_client::NewsApiClient;

/// News-driven supply chain risk pipeline: fetch, assess, load-to-map.
#[derive(Parser)]
#[command(name = "chainwatch")]
struct Args {
    /// Free-text instruction, e.g.
    /// "Fetch 15 articles about semiconductor shortages in the last 30 days"
    #[arg(default_value = "Fetch new supply chain disruption events")]
    instruction: String,

    /// Print map entries as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("chainwatch_pipeline=info".parse()?)
                .add_directive("chainwatch_graph=info".parse()?),
        )
        .init();

    let args = Args::parse();

    info!("Chainwatch pipeline starting...");

    // Load config (fails fast on missing credentials)
    let config = Config::from_env();

    // Connect to Neo4j and run migrations
    let client =
        GraphClient::connect(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password)
            .await?;
    migrate(&client).await?;

    let store = GraphStore::new(
        GraphWriter::new(client.clone()),
        GraphReader::new(client.clone()),
    );
    let source = NewsApiSource::new(NewsApiClient::new(config.newsapi_api_key.clone()));
    let scorer = ClaudeRiskScorer::new(&config.anthropic_api_key);

    let pipeline = Pipeline::new(Box::new(source), Box::new(scorer), Box::new(store))
        .with_run_log();

    let outcome = pipeline.run(&args.instruction).await?;
    info!("Pipeline run complete. {}", outcome.summary);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.entries)?);
    }

    Ok(())
}
