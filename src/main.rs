//! Binary entry point for chat-memory.
//!
//! Inspects and edits conversation histories stored by
//! [`chat_memory_redis::RedisChatMemoryStore`].

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr/print_stdout in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use chat_memory_redis::config::{AppConfig, RedisSettings};
use chat_memory_redis::observability::{self, LoggingConfig};
use chat_memory_redis::{
    ChatMemoryStore, ConversationId, RedisChatMemoryStore, messages_from_json, messages_to_json,
};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// chat-memory - inspect and edit chat histories stored in Redis.
#[derive(Parser)]
#[command(name = "chat-memory")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    redis: RedisArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Connection overrides; each wins over the config file and environment.
#[derive(clap::Args)]
struct RedisArgs {
    /// Redis server host.
    #[arg(long, global = true)]
    host: Option<String>,

    /// Redis server port.
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Redis ACL username (used only with --password).
    #[arg(long, global = true)]
    user: Option<String>,

    /// Redis password.
    #[arg(long, global = true)]
    password: Option<String>,

    /// Prefix prepended to conversation keys.
    #[arg(long, global = true)]
    key_prefix: Option<String>,

    /// Key expiration in seconds, applied on `put`.
    #[arg(long, global = true, allow_negative_numbers = true)]
    ttl: Option<i64>,
}

impl RedisArgs {
    fn apply(self, settings: &mut RedisSettings) {
        if let Some(host) = self.host {
            settings.host = Some(host);
        }
        if let Some(port) = self.port {
            settings.port = Some(port);
        }
        if let Some(user) = self.user {
            settings.user = Some(user);
        }
        if let Some(password) = self.password {
            settings.password = Some(password);
        }
        if let Some(prefix) = self.key_prefix {
            settings.key_prefix = Some(prefix);
        }
        if let Some(ttl) = self.ttl {
            settings.ttl = Some(ttl);
        }
    }
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Print a conversation as a JSON array of messages.
    Get {
        /// Conversation identifier.
        id: String,
    },

    /// Replace a conversation with a JSON array of messages.
    Put {
        /// Conversation identifier.
        id: String,

        /// File with the messages (default: stdin).
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Delete a conversation.
    Delete {
        /// Conversation identifier.
        id: String,
    },

    /// Show the effective configuration (password redacted).
    Config,
}

/// Main entry point.
fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(Some(&config.logging), cli.verbose);
    if let Err(e) = observability::init_logging(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, mut config: AppConfig) -> Result<()> {
    config.redis.apply_env_overrides()?;
    cli.redis.apply(&mut config.redis);

    match cli.command {
        Commands::Get { id } => cmd_get(config.redis, &id.into()),
        Commands::Put { id, file } => cmd_put(config.redis, &id.into(), file.as_deref()),
        Commands::Delete { id } => cmd_delete(config.redis, &id.into()),
        Commands::Config => {
            println!("{:#?}", config.redis);
            Ok(())
        },
    }
}

/// Loads configuration from an explicit path or the default locations.
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => AppConfig::load_default().context("loading default configuration"),
    }
}

fn connect(settings: RedisSettings) -> Result<RedisChatMemoryStore> {
    RedisChatMemoryStore::from_settings(settings).context("connecting to Redis")
}

fn cmd_get(settings: RedisSettings, id: &ConversationId) -> Result<()> {
    let store = connect(settings)?;
    let messages = store
        .get_messages(id)
        .with_context(|| format!("reading conversation '{id}'"))?;
    println!("{}", messages_to_json(&messages)?);
    Ok(())
}

fn cmd_put(settings: RedisSettings, id: &ConversationId, file: Option<&Path>) -> Result<()> {
    let input = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        },
    };
    let messages = messages_from_json(&input)?;

    let store = connect(settings)?;
    store
        .update_messages(id, &messages)
        .with_context(|| format!("writing conversation '{id}'"))?;
    eprintln!("Stored {} message(s) under {}", messages.len(), store.key_for(id));
    Ok(())
}

fn cmd_delete(settings: RedisSettings, id: &ConversationId) -> Result<()> {
    let store = connect(settings)?;
    store
        .delete_messages(id)
        .with_context(|| format!("deleting conversation '{id}'"))?;
    eprintln!("Deleted {}", store.key_for(id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::parse_from([
            "chat-memory",
            "--host",
            "redis.internal",
            "--ttl",
            "30",
            "get",
            "foo",
        ]);
        let mut settings = RedisSettings {
            host: Some("localhost".to_string()),
            port: Some(6379),
            ..RedisSettings::default()
        };
        cli.redis.apply(&mut settings);

        assert_eq!(settings.host.as_deref(), Some("redis.internal"));
        assert_eq!(settings.port, Some(6379));
        assert_eq!(settings.ttl, Some(30));
    }

    #[test]
    fn test_put_parses_file_flag() {
        let cli = Cli::parse_from(["chat-memory", "put", "foo", "--file", "messages.json"]);
        match cli.command {
            Commands::Put { id, file } => {
                assert_eq!(id, "foo");
                assert_eq!(file, Some(PathBuf::from("messages.json")));
            },
            _ => panic!("expected put"),
        }
    }
}
