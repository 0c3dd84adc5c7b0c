//! Blob command implementation
//!
//! `stowage blob upload` and `stowage blob download` move a local file into
//! or out of a container.

use super::{connect, report, EXIT_FATAL, EXIT_OK};
use crate::config::StowageConfig;
use clap::{Args, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the blob command
#[derive(Args, Debug)]
pub struct BlobArgs {
    #[command(subcommand)]
    pub command: BlobCommand,
}

/// Blob subcommands
#[derive(Subcommand, Debug)]
pub enum BlobCommand {
    /// Upload a local file to a blob
    Upload(UploadArgs),

    /// Download a blob to a local file or stdout
    Download(DownloadArgs),
}

/// Arguments for `blob upload`
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Container name
    pub container: String,

    /// Blob name
    pub name: String,

    /// Local file to upload
    #[arg(short, long)]
    pub file: PathBuf,

    /// Replace the blob if it already exists
    #[arg(long)]
    pub overwrite: bool,

    /// Upload as a JSON document (content type application/json)
    #[arg(long)]
    pub json: bool,

    /// Create the container if it does not exist
    #[arg(long)]
    pub create_container: bool,
}

/// Arguments for `blob download`
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Container name
    pub container: String,

    /// Blob name
    pub name: String,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl BlobArgs {
    /// Execute the blob command
    pub async fn execute(
        &self,
        config: &StowageConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        match &self.command {
            BlobCommand::Upload(args) => args.execute(config, shutdown_signal).await,
            BlobCommand::Download(args) => args.execute(config, shutdown_signal).await,
        }
    }
}

impl UploadArgs {
    async fn execute(
        &self,
        config: &StowageConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(
            container = %self.container,
            blob = %self.name,
            file = %self.file.display(),
            overwrite = self.overwrite,
            "Starting blob upload"
        );

        let content = match tokio::fs::read(&self.file).await {
            Ok(content) => content,
            Err(e) => {
                eprintln!("❌ Failed to read {}: {e}", self.file.display());
                return Ok(EXIT_FATAL);
            }
        };

        let connection = match connect(config, shutdown_signal).await {
            Ok(c) => c,
            Err(e) => return Ok(report("Failed to open storage", &e)),
        };
        let blobs = connection.blob_client();

        let create = self.create_container || config.storage.create_if_absent;
        let container = match blobs.container(&self.container, create).await {
            Ok(c) => c,
            Err(e) => return Ok(report("Failed to resolve container", &e)),
        };

        let uploaded = if self.json {
            match String::from_utf8(content) {
                Ok(text) => {
                    blobs
                        .upload_json(&container, &self.name, &text, self.overwrite)
                        .await
                }
                Err(e) => {
                    eprintln!("❌ {} is not UTF-8 text: {e}", self.file.display());
                    return Ok(EXIT_FATAL);
                }
            }
        } else {
            blobs
                .upload(&container, &self.name, content, self.overwrite)
                .await
        };

        match uploaded {
            Ok(Some(blob)) => {
                println!("✅ Uploaded {}", blob.uri());
                Ok(EXIT_OK)
            }
            Ok(None) => {
                println!(
                    "⏭️  Skipped: {} already exists in {} (use --overwrite to replace)",
                    self.name, self.container
                );
                Ok(EXIT_OK)
            }
            Err(e) => Ok(report("Upload failed", &e)),
        }
    }
}

impl DownloadArgs {
    async fn execute(
        &self,
        config: &StowageConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(
            container = %self.container,
            blob = %self.name,
            "Starting blob download"
        );

        let connection = match connect(config, shutdown_signal).await {
            Ok(c) => c,
            Err(e) => return Ok(report("Failed to open storage", &e)),
        };

        let content = match connection
            .blob_client()
            .download(&self.container, &self.name)
            .await
        {
            Ok(cursor) => cursor.into_inner(),
            Err(e) => return Ok(report("Download failed", &e)),
        };

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, &content).await?;
                eprintln!("✅ Wrote {} bytes to {}", content.len(), path.display());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&content)?;
                stdout.flush()?;
            }
        }
        Ok(EXIT_OK)
    }
}
