use crate::ai::{Generation, PromptBuilder, SqlGenerator};
use crate::db::{self, ExecutionPolicy, QueryOutcome, QueryResult};
use crate::error::QueryError;
use crate::schema::{TableContext, RETAIL_SCHEMA};
use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

const INDEX_HTML: &str = include_str!("page.html");

pub const MISSING_QUESTION: &str = "Please enter a question to generate SQL.";
pub const NO_RESULTS: &str = "No results found or the query did not return data.";

/// Everything a request needs, built once at startup.
pub struct AppState {
    pub prompt: PromptBuilder,
    pub generator: Arc<dyn SqlGenerator>,
    pub db_path: PathBuf,
    pub policy: ExecutionPolicy,
    /// Held for the whole of one question so interactions never overlap.
    interaction: Mutex<()>,
}

impl AppState {
    pub fn new(
        prompt: PromptBuilder,
        generator: Arc<dyn SqlGenerator>,
        db_path: PathBuf,
        policy: ExecutionPolicy,
    ) -> Self {
        Self {
            prompt,
            generator,
            db_path,
            policy,
            interaction: Mutex::new(()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

/// One of the page's result states.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AskResponse {
    MissingQuestion {
        message: &'static str,
    },
    Refusal {
        message: String,
    },
    GenerationFailed {
        message: String,
    },
    Scalar {
        sql: String,
        value: serde_json::Value,
        display: String,
    },
    Table {
        sql: String,
        result: QueryResult,
    },
    Empty {
        sql: String,
        message: &'static str,
        error: Option<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub text: String,
    pub tables: &'static [TableContext],
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn get_schema() -> Json<SchemaResponse> {
    Json(SchemaResponse {
        text: RETAIL_SCHEMA.display_text(),
        tables: RETAIL_SCHEMA.tables,
    })
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Json<AskResponse> {
    Json(answer_question(&state, &req.question).await)
}

/// Question in, page state out. Never fails: every error becomes a state.
pub async fn answer_question(state: &AppState, question: &str) -> AskResponse {
    let question = question.trim();
    if question.is_empty() {
        return AskResponse::MissingQuestion {
            message: MISSING_QUESTION,
        };
    }

    let _turn = state.interaction.lock().await;
    let payload = state.prompt.build(question);
    let text = match state.generator.generate(&payload).await {
        Ok(text) => text,
        Err(e) => {
            error!(error = %e, "SQL generation failed");
            return AskResponse::GenerationFailed {
                message: format!("Failed to generate SQL: {}", e),
            };
        }
    };

    match Generation::classify(text) {
        Generation::Refusal(message) => {
            info!(question, "model refused question");
            AskResponse::Refusal { message }
        }
        Generation::Candidate(sql) => {
            info!(question, sql = %sql, "executing generated SQL");
            let outcome = execute(state, sql.clone()).await;
            present(sql, outcome)
        }
    }
}

async fn execute(state: &AppState, sql: String) -> QueryOutcome {
    let path = state.db_path.clone();
    let policy = state.policy;
    match tokio::task::spawn_blocking(move || db::run_query(&sql, &path, policy)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "query task panicked");
            QueryOutcome::failed(QueryError::Join(e))
        }
    }
}

/// Pick the display state for an executed candidate.
pub fn present(sql: String, outcome: QueryOutcome) -> AskResponse {
    let QueryOutcome { result, error } = outcome;
    if result.is_empty() {
        return AskResponse::Empty {
            sql,
            message: NO_RESULTS,
            error,
        };
    }
    match result.scalar() {
        Some(value) => AskResponse::Scalar {
            sql,
            display: format!("Answer: {}", display_value(value)),
            value: value.clone(),
        },
        None => AskResponse::Table { sql, result },
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}
