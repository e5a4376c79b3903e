//! Error types, one enum per concern.

/// Failure while creating tables or inserting seed rows. Always fatal to
/// the bootstrap run.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to create table {table}: {source}")]
    Schema {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to seed {table}: {source}")]
    Seed {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("invalid seed date '{value}': {source}")]
    SeedDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Failure reaching the LLM service or reading its answer.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Failure connecting to the database, running a statement or reading rows.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("only read-only statements are allowed")]
    NotReadOnly,
    #[error("only one statement can be executed at a time")]
    MultipleStatements,
    #[error("query task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no API key for {provider}: set LLM_API_KEY or {env_var}")]
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },
}
