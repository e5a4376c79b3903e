use crate::ai::generation::REFUSAL_SENTINEL;
use crate::schema::SchemaContext;

/// Worked question/answer pairs that anchor the model's output style.
pub const WORKED_EXAMPLES: &[(&str, &str)] = &[
    (
        "Count new customers who joined last month.",
        "SELECT COUNT(*) FROM customers WHERE registration_date >= DATE('now', '-1 month');",
    ),
    (
        "What is the male to female customer ratio?",
        "SELECT gender, COUNT(*) FROM customers GROUP BY gender;",
    ),
    (
        "Show total sales for each month in 2023.",
        "SELECT strftime('%Y-%m', order_date) AS month, SUM(total_amount) AS total_sales FROM orders WHERE strftime('%Y', order_date) = '2023' GROUP BY month;",
    ),
    (
        "Find orders placed by customers in Mumbai.",
        "SELECT * FROM orders WHERE customer_id IN (SELECT customer_id FROM customers WHERE city = 'Mumbai');",
    ),
];

/// The two input segments of one generation request.
#[derive(Debug, Clone)]
pub struct PromptPayload {
    pub instructions: String,
    pub question: String,
}

/// Holds the instruction block, rendered once from the schema. Only the
/// question varies between calls.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    instructions: String,
}

impl PromptBuilder {
    pub fn new(schema: &SchemaContext) -> Self {
        Self {
            instructions: render_instructions(schema),
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn build(&self, question: &str) -> PromptPayload {
        PromptPayload {
            instructions: self.instructions.clone(),
            question: question.to_string(),
        }
    }
}

fn render_instructions(schema: &SchemaContext) -> String {
    let domain_rules: Vec<String> = schema
        .domains()
        .map(|(_, col)| {
            let values = col
                .domain
                .unwrap_or_default()
                .iter()
                .map(|v| format!("'{}'", v))
                .collect::<Vec<_>>()
                .join(", ");
            format!("- The '{}' column only holds {}.", col.name, values)
        })
        .collect();

    let examples: Vec<String> = WORKED_EXAMPLES
        .iter()
        .map(|(q, a)| format!("Q: {q}\nA: {a}"))
        .collect();

    format!(
        "You are an expert assistant for generating SQL queries.\n\n\
         ## Rules to Follow STRICTLY:\n\n\
         1. Only use the following database schema:\n\n\
         {schema}\n\
         NEVER use any table or column name that is not listed above. Do not assume column names that do not exist.\n\n\
         2. Dates are in 'YYYY-MM-DD' format. For monthly analysis, use:\n\
         - strftime('%Y-%m', <date column>)\n\
         For questions like \"last month\", compare the month of the date column with the previous month:\n\
         - WHERE strftime('%Y-%m', registration_date) = strftime('%Y-%m', 'now', '-1 month')\n\n\
         3. Enumerated columns:\n\
         {domains}\n\n\
         4. Your output must be ONLY the SQL query: NO explanations, NO formatting like ``` or the word SQL, NO comments.\n\n\
         5. The SQL must be compatible with SQLite.\n\n\
         6. If the question does not relate to this schema, respond with exactly:\n\
         \"{sentinel}\"\n\n\
         7. Use aliases and JOINs correctly when needed.\n\n\
         ## Examples for Guidance:\n\n\
         {examples}\n\n\
         Now generate only the SQL query for the user's question.\n",
        schema = schema.prompt_text(),
        domains = domain_rules.join("\n"),
        sentinel = REFUSAL_SENTINEL,
        examples = examples.join("\n\n"),
    )
}
