use neo4rs::query;
use tracing::{info, warn};

use crate::GraphClient;

/// Run idempotent schema migrations: constraints, indexes.
/// Memgraph does not support IF NOT EXISTS — we ignore "already exists" errors.
pub async fn migrate(client: &GraphClient) -> Result<(), neo4rs::Error> {
    let g = &client.graph;

    info!("Running schema migrations...");

    let constraints = [
        "CREATE CONSTRAINT ON (n:Event) ASSERT n.id IS UNIQUE",
        "CREATE CONSTRAINT ON (n:Assessment) ASSERT n.event_id IS UNIQUE",
    ];

    for c in &constraints {
        run_ignoring_exists(g, c).await?;
    }
    info!("Uniqueness constraints created");

    let indexes = [
        "CREATE INDEX ON :Event(published_at)",
        "CREATE INDEX ON :Assessment(lat)",
        "CREATE INDEX ON :Assessment(lng)",
    ];

    for idx in &indexes {
        run_ignoring_exists(g, idx).await?;
    }
    info!("Property indexes created");

    Ok(())
}

async fn run_ignoring_exists(g: &neo4rs::Graph, cypher: &str) -> Result<(), neo4rs::Error> {
    match g.run(query(cypher)).await {
        Ok(_) => Ok(()),
        Err(e) => {
            let msg = e.to_string().to_lowercase();
            if msg.contains("already exists") || msg.contains("equivalent") {
                warn!(
                    statement = %cypher.chars().take(80).collect::<String>(),
                    "Schema object already exists, skipped"
                );
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}
