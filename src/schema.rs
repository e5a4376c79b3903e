use serde::Serialize;

/// The retail schema every other component reads from: prompt text,
/// the schema panel and the bootstrap DDL are all rendered from here.
pub static RETAIL_SCHEMA: SchemaContext = SchemaContext {
    tables: &[
        TableContext {
            name: "customers",
            columns: &[
                ColumnContext::key("customer_id"),
                ColumnContext::plain("registration_date", "DATE"),
                ColumnContext::plain("city", "VARCHAR(50)"),
                ColumnContext::plain("gender", "CHAR(1)").with_domain(Gender::VALUES),
            ],
        },
        TableContext {
            name: "orders",
            columns: &[
                ColumnContext::key("order_id"),
                ColumnContext::plain("customer_id", "INTEGER")
                    .references("customers", "customer_id"),
                ColumnContext::plain("order_date", "DATE"),
                ColumnContext::plain("total_amount", "DECIMAL(10,2)"),
                ColumnContext::plain("status", "VARCHAR(20)").with_domain(OrderStatus::VALUES),
            ],
        },
        TableContext {
            name: "order_items",
            columns: &[
                ColumnContext::key("item_id"),
                ColumnContext::plain("order_id", "INTEGER").references("orders", "order_id"),
                ColumnContext::plain("product_name", "VARCHAR(100)"),
                ColumnContext::plain("quantity", "INTEGER"),
                ColumnContext::plain("unit_price", "DECIMAL(10,2)"),
            ],
        },
    ],
};

#[derive(Debug, Serialize)]
pub struct SchemaContext {
    pub tables: &'static [TableContext],
}

#[derive(Debug, Serialize)]
pub struct TableContext {
    pub name: &'static str,
    pub columns: &'static [ColumnContext],
}

#[derive(Debug, Serialize)]
pub struct ColumnContext {
    pub name: &'static str,
    pub data_type: &'static str,
    pub is_primary_key: bool,
    pub foreign_ref: Option<ForeignRef>,
    /// Closed set of values the column may hold, if any.
    pub domain: Option<&'static [&'static str]>,
}

#[derive(Debug, Serialize)]
pub struct ForeignRef {
    pub table: &'static str,
    pub column: &'static str,
}

impl ColumnContext {
    const fn key(name: &'static str) -> Self {
        Self {
            name,
            data_type: "INTEGER",
            is_primary_key: true,
            foreign_ref: None,
            domain: None,
        }
    }

    const fn plain(name: &'static str, data_type: &'static str) -> Self {
        Self {
            name,
            data_type,
            is_primary_key: false,
            foreign_ref: None,
            domain: None,
        }
    }

    const fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.foreign_ref = Some(ForeignRef { table, column });
        self
    }

    const fn with_domain(mut self, values: &'static [&'static str]) -> Self {
        self.domain = Some(values);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const VALUES: &'static [&'static str] = &["M", "F"];

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => Self::VALUES[0],
            Gender::Female => Self::VALUES[1],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Completed,
    Pending,
}

impl OrderStatus {
    pub const VALUES: &'static [&'static str] = &["completed", "pending"];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Completed => Self::VALUES[0],
            OrderStatus::Pending => Self::VALUES[1],
        }
    }
}

impl SchemaContext {
    pub fn table(&self, name: &str) -> Option<&TableContext> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Columns that carry an enumerated domain, across all tables.
    pub fn domains(&self) -> impl Iterator<Item = (&TableContext, &ColumnContext)> {
        self.tables.iter().flat_map(|t| {
            t.columns
                .iter()
                .filter(|c| c.domain.is_some())
                .map(move |c| (t, c))
        })
    }

    /// Text for the collapsible schema panel.
    pub fn display_text(&self) -> String {
        let mut out = String::from("Tables and Columns:\n\n");
        for table in self.tables {
            out.push_str(&format!("• {} ({})", table.name, table.column_list()));
            let domains: Vec<String> = table
                .columns
                .iter()
                .filter_map(|c| c.domain.map(quote_domain))
                .collect();
            if !domains.is_empty() {
                out.push_str(&format!(" [{}]", domains.join("; ")));
            }
            out.push('\n');
        }
        out
    }

    /// Schema listing embedded in the LLM instructions. Domains are inlined
    /// next to the column they constrain.
    pub fn prompt_text(&self) -> String {
        let mut out = String::from("Tables and Columns:\n\n");
        for table in self.tables {
            let columns: Vec<String> = table
                .columns
                .iter()
                .map(|c| match c.domain {
                    Some(values) => format!("{} [{}]", c.name, quote_domain(values)),
                    None => c.name.to_string(),
                })
                .collect();
            out.push_str(&format!("- {} ({})\n", table.name, columns.join(", ")));
        }
        out
    }

    /// `CREATE TABLE IF NOT EXISTS` statements, parents before children.
    pub fn create_statements(&self) -> Vec<String> {
        self.tables.iter().map(TableContext::create_statement).collect()
    }
}

impl TableContext {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    fn column_list(&self) -> String {
        self.column_names().join(", ")
    }

    fn create_statement(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|col| {
                if col.is_primary_key {
                    format!("    {} {} PRIMARY KEY", col.name, col.data_type)
                } else {
                    format!("    {} {}", col.name, col.data_type)
                }
            })
            .collect();
        for col in self.columns {
            if let Some(ref fk) = col.foreign_ref {
                lines.push(format!(
                    "    FOREIGN KEY ({}) REFERENCES {}({})",
                    col.name, fk.table, fk.column
                ));
            }
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
            self.name,
            lines.join(",\n")
        )
    }
}

fn quote_domain(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("'{}'", v))
        .collect::<Vec<_>>()
        .join(" or ")
}
