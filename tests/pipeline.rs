use async_trait::async_trait;
use sqlstudio_lib::ai::{PromptBuilder, PromptPayload, SqlGenerator, REFUSAL_SENTINEL};
use sqlstudio_lib::commands::{answer_question, AppState, AskResponse, MISSING_QUESTION, NO_RESULTS};
use sqlstudio_lib::db::{initialize, ExecutionPolicy};
use sqlstudio_lib::error::GenerationError;
use sqlstudio_lib::schema::RETAIL_SCHEMA;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Replies with a canned answer and remembers what it was asked.
struct MockGenerator {
    reply: Option<String>,
    seen: Mutex<Vec<PromptPayload>>,
}

impl MockGenerator {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl SqlGenerator for MockGenerator {
    async fn generate(&self, payload: &PromptPayload) -> Result<String, GenerationError> {
        self.seen.lock().unwrap().push(payload.clone());
        self.reply
            .clone()
            .ok_or_else(|| GenerationError::Parse("service unavailable".into()))
    }
}

fn app(generator: Arc<MockGenerator>, policy: ExecutionPolicy) -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("retail_db.sqlite");
    initialize(&path).unwrap();
    let state = AppState::new(PromptBuilder::new(&RETAIL_SCHEMA), generator, path, policy);
    (dir, state)
}

#[tokio::test]
async fn blank_question_skips_generation() {
    let generator = MockGenerator::replying("SELECT 1");
    let (_dir, state) = app(generator.clone(), ExecutionPolicy::ReadOnly);

    let response = answer_question(&state, "   ").await;

    assert!(matches!(
        response,
        AskResponse::MissingQuestion { message } if message == MISSING_QUESTION
    ));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn question_travels_as_second_segment() {
    let generator = MockGenerator::replying("SELECT COUNT(*) FROM customers;");
    let (_dir, state) = app(generator.clone(), ExecutionPolicy::ReadOnly);

    answer_question(&state, "  How many customers?  ").await;

    let seen = generator.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].question, "How many customers?");
    assert_eq!(seen[0].instructions, state.prompt.instructions());
}

#[tokio::test]
async fn count_question_gives_scalar_answer() {
    let (_dir, state) = app(
        MockGenerator::replying("SELECT COUNT(*) FROM customers;"),
        ExecutionPolicy::ReadOnly,
    );

    match answer_question(&state, "How many customers are there?").await {
        AskResponse::Scalar { sql, display, .. } => {
            assert_eq!(sql, "SELECT COUNT(*) FROM customers;");
            assert_eq!(display, "Answer: 6");
        }
        other => panic!("expected scalar, got {:?}", other),
    }
}

#[tokio::test]
async fn grouped_question_gives_table() {
    let (_dir, state) = app(
        MockGenerator::replying("SELECT gender, COUNT(*) FROM customers GROUP BY gender;"),
        ExecutionPolicy::ReadOnly,
    );

    match answer_question(&state, "What is the male to female customer ratio?").await {
        AskResponse::Table { result, .. } => {
            assert_eq!(result.column_names(), vec!["gender", "COUNT(*)"]);
            assert_eq!(result.row_count, 2);
        }
        other => panic!("expected table, got {:?}", other),
    }
}

#[tokio::test]
async fn refusal_is_not_executed() {
    let (_dir, state) = app(
        MockGenerator::replying(REFUSAL_SENTINEL),
        ExecutionPolicy::ReadOnly,
    );

    match answer_question(&state, "What is the weather in Paris?").await {
        AskResponse::Refusal { message } => assert_eq!(message, REFUSAL_SENTINEL),
        other => panic!("expected refusal, got {:?}", other),
    }
}

#[tokio::test]
async fn broken_sql_reports_error_and_no_results() {
    let (_dir, state) = app(
        MockGenerator::replying("SELEC * FORM customers"),
        ExecutionPolicy::ReadOnly,
    );

    match answer_question(&state, "Show customers").await {
        AskResponse::Empty { message, error, .. } => {
            assert_eq!(message, NO_RESULTS);
            assert!(error.is_some());
        }
        other => panic!("expected empty, got {:?}", other),
    }
}

#[tokio::test]
async fn write_is_refused_by_default_policy() {
    let (_dir, state) = app(
        MockGenerator::replying("DELETE FROM orders;"),
        ExecutionPolicy::ReadOnly,
    );

    match answer_question(&state, "Remove all orders").await {
        AskResponse::Empty { error, .. } => {
            assert_eq!(
                error.as_deref(),
                Some("Error executing SQL: only read-only statements are allowed")
            );
        }
        other => panic!("expected empty, got {:?}", other),
    }
}

#[tokio::test]
async fn generation_failure_is_surfaced() {
    let (_dir, state) = app(MockGenerator::failing(), ExecutionPolicy::ReadOnly);

    match answer_question(&state, "How many orders?").await {
        AskResponse::GenerationFailed { message } => {
            assert!(message.contains("service unavailable"));
        }
        other => panic!("expected generation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn join_question_over_seed_data() {
    let (_dir, state) = app(
        MockGenerator::replying(
            "SELECT c.city, SUM(o.total_amount) AS spent FROM orders o \
             JOIN customers c ON c.customer_id = o.customer_id \
             WHERE o.status = 'completed' GROUP BY c.city ORDER BY spent DESC, c.city;",
        ),
        ExecutionPolicy::ReadOnly,
    );

    match answer_question(&state, "Completed spend by city").await {
        AskResponse::Table { result, .. } => {
            assert_eq!(result.rows[0][0], serde_json::json!("Chicago"));
            assert_eq!(result.rows[0][1].as_f64(), Some(300.0));
            assert_eq!(result.row_count, 4);
        }
        other => panic!("expected table, got {:?}", other),
    }
}
