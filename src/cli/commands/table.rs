//! Table command implementation
//!
//! - `stowage table import` applies a JSON array of entities as a chunked batch
//! - `stowage table query` reads a partition page by page
//! - `stowage table get` looks up a single entity

use super::{connect, report, EXIT_FATAL, EXIT_NOT_FOUND, EXIT_OK};
use crate::config::StowageConfig;
use crate::domain::{BatchKind, Comparison, ContinuationToken, Entity, StorageError, StowageError};
use crate::core::table::query::{range_query, segment_query};
use crate::core::table::TableStoreClient;
use clap::{Args, Subcommand};
use futures::TryStreamExt;
use serde_json::Value;
use std::path::PathBuf;
use std::pin::pin;
use tokio::sync::watch;

/// Arguments for the table command
#[derive(Args, Debug)]
pub struct TableArgs {
    #[command(subcommand)]
    pub command: TableCommand,
}

/// Table subcommands
#[derive(Subcommand, Debug)]
pub enum TableCommand {
    /// Apply a JSON array of entities as a batch
    Import(ImportArgs),

    /// Read entities of one partition
    Query(QueryArgs),

    /// Read a single entity
    Get(GetArgs),
}

/// Arguments for `table import`
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Table name
    pub table: String,

    /// JSON file holding an array of objects with PartitionKey and RowKey
    pub file: PathBuf,

    /// Operation applied to every entity (insert, upsert, replace, merge, delete)
    #[arg(short, long, default_value = "upsert")]
    pub kind: BatchKind,

    /// Create the table if it does not exist
    #[arg(long)]
    pub create_table: bool,
}

/// Arguments for `table query`
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Table name
    pub table: String,

    /// Partition key
    pub partition_key: String,

    /// Lower bound of an inclusive row key range
    #[arg(long, requires = "to", conflicts_with = "row_key")]
    pub from: Option<String>,

    /// Upper bound of an inclusive row key range
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Row key compared with --comparison
    #[arg(long)]
    pub row_key: Option<String>,

    /// Row key comparison (eq, ne, gt, ge, lt, le)
    #[arg(long, default_value = "eq")]
    pub comparison: Comparison,

    /// Entities per page (defaults to table.default_page_size)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Continuation token returned by a previous query
    #[arg(long)]
    pub token: Option<String>,

    /// Keep reading until the last page
    #[arg(long)]
    pub all: bool,
}

/// Arguments for `table get`
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Table name
    pub table: String,

    /// Partition key
    pub partition_key: String,

    /// Row key
    pub row_key: String,
}

impl TableArgs {
    /// Execute the table command
    pub async fn execute(
        &self,
        config: &StowageConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        match &self.command {
            TableCommand::Import(args) => args.execute(config, shutdown_signal).await,
            TableCommand::Query(args) => args.execute(config, shutdown_signal).await,
            TableCommand::Get(args) => args.execute(config, shutdown_signal).await,
        }
    }
}

/// Parses a JSON array of flat entity objects
fn parse_entities(json: &str) -> crate::domain::Result<Vec<Entity>> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    values.into_iter().map(Entity::from_json).collect()
}

impl ImportArgs {
    async fn execute(
        &self,
        config: &StowageConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(
            table = %self.table,
            file = %self.file.display(),
            kind = %self.kind,
            "Starting table import"
        );

        let json = match tokio::fs::read_to_string(&self.file).await {
            Ok(json) => json,
            Err(e) => {
                eprintln!("❌ Failed to read {}: {e}", self.file.display());
                return Ok(EXIT_FATAL);
            }
        };
        let entities = match parse_entities(&json) {
            Ok(entities) => entities,
            Err(e) => return Ok(report("Invalid entity file", &e)),
        };
        let total = entities.len();

        let connection = match connect(config, shutdown_signal).await {
            Ok(c) => c,
            Err(e) => return Ok(report("Failed to open storage", &e)),
        };

        let create = self.create_table || config.storage.create_if_absent;
        match connection
            .table_client()
            .batch_in(&self.table, entities, self.kind, create)
            .await
        {
            Ok(results) => {
                let failed = results.iter().filter(|r| !r.is_success()).count();
                println!(
                    "✅ Applied {} {} operation(s) to {} ({failed} unsuccessful)",
                    results.len(),
                    self.kind,
                    self.table
                );
                Ok(EXIT_OK)
            }
            Err(StowageError::Storage(StorageError::BatchAborted {
                completed,
                failed_chunk,
                source,
            })) => {
                eprintln!(
                    "❌ Import stopped at chunk {}: {} of {total} operation(s) committed",
                    failed_chunk + 1,
                    completed.len()
                );
                eprintln!("   Error: {source}");
                Ok(EXIT_FATAL)
            }
            Err(e) => Ok(report("Import failed", &e)),
        }
    }
}

impl QueryArgs {
    async fn execute(
        &self,
        config: &StowageConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let connection = match connect(config, shutdown_signal).await {
            Ok(c) => c,
            Err(e) => return Ok(report("Failed to open storage", &e)),
        };
        Ok(self
            .run(&connection.table_client(), config.table.default_page_size)
            .await)
    }

    /// Prints the requested entities as JSON lines and returns the exit code
    async fn run(&self, tables: &TableStoreClient, default_page_size: usize) -> i32 {
        let page_size = self.page_size.unwrap_or(default_page_size);
        let mut token = match ContinuationToken::from_optional_text(self.token.as_deref()) {
            Ok(token) => token,
            Err(e) => return report("Invalid continuation token", &e),
        };

        let table = match tables.table(&self.table, false).await {
            Ok(t) => t,
            Err(e) => return report("Failed to resolve table", &e),
        };

        let query = match (&self.from, &self.to) {
            (Some(from), Some(to)) => range_query(&self.partition_key, from, to, page_size),
            _ => segment_query(
                &self.partition_key,
                page_size,
                self.row_key.as_deref(),
                self.comparison,
            ),
        };
        let query = match query {
            Ok(q) => q,
            Err(e) => return report("Query failed", &e),
        };

        let mut returned = 0usize;
        if self.all {
            let mut entities = pin!(tables.query_stream_from(&table, &query, token.take()));
            loop {
                match entities.try_next().await {
                    Ok(Some(entity)) => {
                        returned += 1;
                        println!("{}", entity.to_json());
                    }
                    Ok(None) => break,
                    Err(e) => return report("Query failed", &e),
                }
            }
        } else {
            let segment = match tables.execute_query(&table, &query, token.as_ref()).await {
                Ok(s) => s,
                Err(e) => return report("Query failed", &e),
            };
            returned = segment.entities.len();
            for entity in &segment.entities {
                println!("{}", entity.to_json());
            }
            token = segment.continuation;
        }

        tracing::info!(table = %self.table, returned, "Query finished");
        if let Some(next) = token {
            eprintln!("Next page: --token {}", next.to_text());
        }
        EXIT_OK
    }
}

impl GetArgs {
    async fn execute(
        &self,
        config: &StowageConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let connection = match connect(config, shutdown_signal).await {
            Ok(c) => c,
            Err(e) => return Ok(report("Failed to open storage", &e)),
        };
        let tables = connection.table_client();
        let table = match tables.table(&self.table, false).await {
            Ok(t) => t,
            Err(e) => return Ok(report("Failed to resolve table", &e)),
        };

        let result = match tables
            .retrieve(&table, &self.partition_key, &self.row_key)
            .await
        {
            Ok(r) => r,
            Err(e) => return Ok(report("Lookup failed", &e)),
        };

        match result.into_entity() {
            Ok(entity) => {
                println!("{}", serde_json::to_string_pretty(&entity.to_json())?);
                Ok(EXIT_OK)
            }
            Err(status) => {
                eprintln!(
                    "❌ Entity ({}, {}) not found in {} (status {status})",
                    self.partition_key, self.row_key, self.table
                );
                Ok(EXIT_NOT_FOUND)
            }
        }
    }
}
