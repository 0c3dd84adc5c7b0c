//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Stowage using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Stowage - blob and table storage client
#[derive(Parser, Debug)]
#[command(name = "stowage")]
#[command(version, about, long_about = None)]
#[command(author = "Stowage Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "stowage.toml", env = "STOWAGE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "STOWAGE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Upload and download blobs
    Blob(commands::blob::BlobArgs),

    /// Import, query and read table entities
    Table(commands::table::TableArgs),
}

impl Commands {
    /// Returns `true` if the command reads the configuration file before
    /// running
    pub fn needs_config(&self) -> bool {
        matches!(self, Commands::Blob(_) | Commands::Table(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BatchKind, Comparison};

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["stowage", "validate-config"]);
        assert_eq!(cli.config, "stowage.toml");
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
        assert!(!cli.command.needs_config());
    }

    #[test]
    fn test_cli_parse_with_config_and_level() {
        let cli = Cli::parse_from([
            "stowage",
            "--config",
            "custom.toml",
            "--log-level",
            "debug",
            "init",
        ]);
        assert_eq!(cli.config, "custom.toml");
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_cli_parse_blob_upload() {
        let cli = Cli::parse_from([
            "stowage",
            "blob",
            "upload",
            "media",
            "a.txt",
            "--file",
            "local.txt",
            "--overwrite",
        ]);
        assert!(cli.command.needs_config());
        let Commands::Blob(args) = cli.command else {
            panic!("expected blob command");
        };
        match args.command {
            commands::blob::BlobCommand::Upload(upload) => {
                assert_eq!(upload.container, "media");
                assert_eq!(upload.name, "a.txt");
                assert!(upload.overwrite);
                assert!(!upload.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_table_import_kind() {
        let cli = Cli::parse_from([
            "stowage", "table", "import", "Invites", "rows.json", "--kind", "merge",
        ]);
        let Commands::Table(args) = cli.command else {
            panic!("expected table command");
        };
        match args.command {
            commands::table::TableCommand::Import(import) => {
                assert_eq!(import.kind, BatchKind::Merge);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_table_query_comparison() {
        let cli = Cli::parse_from([
            "stowage",
            "table",
            "query",
            "Invites",
            "team-1",
            "--row-key",
            "m",
            "--comparison",
            "ge",
        ]);
        let Commands::Table(args) = cli.command else {
            panic!("expected table command");
        };
        match args.command {
            commands::table::TableCommand::Query(query) => {
                assert_eq!(query.comparison, Comparison::GreaterThanOrEqual);
                assert_eq!(query.row_key.as_deref(), Some("m"));
                assert!(query.page_size.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_kind() {
        let result = Cli::try_parse_from([
            "stowage", "table", "import", "Invites", "rows.json", "--kind", "upsertify",
        ]);
        assert!(result.is_err());
    }
}
