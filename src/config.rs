//! Command line and environment configuration.

use crate::ai::{AIConfig, AIProvider};
use crate::db::ExecutionPolicy;
use crate::error::ConfigError;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Ask questions about the retail database in plain language.
#[derive(Parser, Debug, Clone)]
#[command(name = "sqlstudio", version)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the query page over HTTP
    Serve(ServeArgs),
    /// Create the tables and insert the sample rows
    InitDb(DbArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// SQLite database file
    #[arg(long = "database", env = "DATABASE_PATH", default_value = "retail_db.sqlite")]
    pub path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "127.0.0.1:8501")]
    pub listen: SocketAddr,

    /// Hosted model service that writes the SQL
    #[arg(long, env = "LLM_PROVIDER", value_enum, default_value_t = AIProvider::Gemini)]
    pub provider: AIProvider,

    /// Model name; defaults to the provider's default model
    #[arg(long, env = "LLM_MODEL")]
    pub model: Option<String>,

    /// API key; falls back to the provider's own variable (e.g. GOOGLE_API_KEY)
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Whether generated statements may modify the database
    #[arg(long, env = "EXECUTION_POLICY", value_enum, default_value_t = ExecutionPolicy::ReadOnly)]
    pub policy: ExecutionPolicy,
}

impl ServeArgs {
    pub fn ai_config(&self) -> Result<AIConfig, ConfigError> {
        self.ai_config_with(|name| std::env::var(name).ok())
    }

    fn ai_config_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<AIConfig, ConfigError> {
        let env_var = self.provider.api_key_env();
        let api_key = self
            .api_key
            .clone()
            .or_else(|| lookup(env_var))
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey {
                provider: self.provider.name(),
                env_var,
            })?;

        Ok(AIConfig {
            provider: self.provider,
            api_key,
            model: self
                .model
                .clone()
                .unwrap_or_else(|| self.provider.default_model().to_string()),
        })
    }
}
