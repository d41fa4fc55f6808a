//! # Merkle App Demo
//!
//! Drives a replica through transactions, queries and commits, then brings
//! a second replica up to date from a snapshot.
//!
//! Usage: `merkle_app_demo [config.json]`

use anyhow::{bail, Context};
use bytes::Bytes;
use merkle_app::{MerkleApp, MerkleAppConfig, QueryRequest, StateMachine, Transaction};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => MerkleAppConfig::from_json_file(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => MerkleAppConfig::default(),
    };
    info!("Starting Merkle app demo with {:?}", config);

    let mut app = MerkleApp::new(config.clone());
    info!("{}", app.info());

    let commit = app.commit();
    info!("Commit on empty store: {}", commit);

    let commands: Vec<Bytes> = vec![
        Transaction::set("user:1:name", "Alice").encode(),
        Transaction::set("user:1:email", "alice@example.com").encode(),
        Transaction::set("user:2:name", "Bob").encode(),
        Bytes::from_static(&[0x09, 0x00]),
        Transaction::remove("user:1:email").encode(),
    ];

    info!("Applying {} transactions", commands.len());
    for (i, tx) in commands.into_iter().enumerate() {
        let checked = app.check_tx(&tx);
        let response = app.apply_command(tx).await;
        info!(
            "Tx {}: check={} append={}",
            i + 1,
            checked.code,
            response
        );
    }

    let queries = [
        QueryRequest::Size,
        QueryRequest::get_by_key("user:1:name"),
        QueryRequest::get_by_key("user:1:email"),
        QueryRequest::GetByIndex { index: 0 },
    ];
    for query in &queries {
        let result = app.query(&query.encode());
        info!("Query {}: {}", query.query_type(), result);
    }

    let commit = app.commit();
    info!("Commit: {}", commit);

    // State transfer to a fresh replica
    let snapshot = app.serialize_state()?;
    info!("State serialized to {} bytes", snapshot.len());

    let mut replica = MerkleApp::new(config);
    replica.deserialize_state(&snapshot)?;

    if replica.commit() != commit {
        bail!("restored replica committed a different hash");
    }
    info!("Replica restored with matching commit: {}", replica.info());

    info!("Merkle app demo completed");
    Ok(())
}
