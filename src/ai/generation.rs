/// The exact text the model is instructed to return for questions the
/// schema cannot answer.
pub const REFUSAL_SENTINEL: &str =
    "I cannot generate a SQL query for this question because it does not match the database schema.";

const REFUSAL_PREFIX: &str = "i cannot generate";

/// Outcome of one generation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// The model declined; nothing is executed.
    Refusal(String),
    /// SQL text to hand to the executor unmodified.
    Candidate(String),
}

impl Generation {
    /// Refusal iff the text starts with the sentinel prefix, ignoring case.
    pub fn classify(text: String) -> Self {
        let is_refusal = text
            .get(..REFUSAL_PREFIX.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(REFUSAL_PREFIX));
        if is_refusal {
            Generation::Refusal(text)
        } else {
            Generation::Candidate(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_refusal() {
        assert_eq!(
            Generation::classify(REFUSAL_SENTINEL.to_string()),
            Generation::Refusal(REFUSAL_SENTINEL.to_string())
        );
    }

    #[test]
    fn test_refusal_ignores_case() {
        let text = "I CANNOT GENERATE a SQL query for this.".to_string();
        assert!(matches!(Generation::classify(text), Generation::Refusal(_)));
    }

    #[test]
    fn test_select_is_candidate() {
        let sql = "SELECT * FROM customers;".to_string();
        assert_eq!(
            Generation::classify(sql.clone()),
            Generation::Candidate(sql)
        );
    }

    #[test]
    fn test_prefix_must_lead() {
        let text = "Sorry, I cannot generate that.".to_string();
        assert!(matches!(Generation::classify(text), Generation::Candidate(_)));
        assert!(matches!(
            Generation::classify("i cannot".to_string()),
            Generation::Candidate(_)
        ));
    }

    #[test]
    fn test_multibyte_head_does_not_panic() {
        let text = "ééééééééééééééééé".to_string();
        assert!(matches!(Generation::classify(text), Generation::Candidate(_)));
    }
}
