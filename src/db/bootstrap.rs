use crate::error::BootstrapError;
use crate::schema::{Gender, OrderStatus, SchemaContext, RETAIL_SCHEMA};
use chrono::NaiveDate;
use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, info};

const CUSTOMERS: &[(i64, &str, &str, Gender)] = &[
    (1, "2023-01-01", "New York", Gender::Male),
    (2, "2023-01-02", "Los Angeles", Gender::Female),
    (3, "2023-01-03", "Chicago", Gender::Male),
    (4, "2023-01-04", "Houston", Gender::Female),
    (5, "2023-01-05", "Phoenix", Gender::Male),
    (6, "2025-05-06", "Philadelphia", Gender::Female),
];

const ORDERS: &[(i64, i64, &str, f64, OrderStatus)] = &[
    (1, 1, "2023-02-01", 100.00, OrderStatus::Completed),
    (2, 2, "2023-02-02", 150.00, OrderStatus::Pending),
    (3, 1, "2023-02-03", 200.00, OrderStatus::Completed),
    (4, 3, "2023-03-04", 300.00, OrderStatus::Completed),
    (5, 4, "2023-04-05", 250.00, OrderStatus::Pending),
    (6, 2, "2023-05-01", 180.00, OrderStatus::Completed),
    (7, 5, "2023-06-01", 220.00, OrderStatus::Completed),
];

const ORDER_ITEMS: &[(i64, i64, &str, i64, f64)] = &[
    (1, 1, "Widget", 2, 50.00),
    (2, 2, "Gadget", 3, 50.00),
    (3, 3, "Widget", 4, 50.00),
    (4, 4, "Device", 2, 150.00),
    (5, 5, "Gadget", 5, 50.00),
    (6, 6, "Widget", 2, 90.00),
    (7, 7, "Gadget", 4, 55.00),
];

impl ToSql for Gender {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl ToSql for OrderStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapReport {
    /// Seed rows written by this run; zero when everything already existed.
    pub inserted: usize,
    pub row_counts: Vec<(String, i64)>,
}

/// Create the retail tables and seed rows at `path`. Safe to run any
/// number of times: existing rows are never overwritten or duplicated.
pub fn initialize(path: impl AsRef<Path>) -> Result<BootstrapReport, BootstrapError> {
    let path = path.as_ref();
    let mut conn = open(path)?;

    create_tables(&conn, &RETAIL_SCHEMA)?;

    let tx = conn.transaction()?;
    let inserted = seed(&tx)?;
    tx.commit()?;

    let row_counts = count_rows(&conn, &RETAIL_SCHEMA)?;
    info!(path = %path.display(), inserted, "database initialized");
    Ok(BootstrapReport {
        inserted,
        row_counts,
    })
}

/// Read-write connection with foreign key enforcement switched on.
fn open(path: &Path) -> Result<Connection, BootstrapError> {
    let conn = Connection::open(path).map_err(|source| BootstrapError::Open {
        path: path.display().to_string(),
        source,
    })?;
    conn.pragma_update(None, "foreign_keys", true)?;
    Ok(conn)
}

fn create_tables(conn: &Connection, schema: &SchemaContext) -> Result<(), BootstrapError> {
    for (table, ddl) in schema.tables.iter().zip(schema.create_statements()) {
        debug!(table = table.name, "creating table");
        conn.execute_batch(&ddl)
            .map_err(|source| BootstrapError::Schema {
                table: table.name.to_string(),
                source,
            })?;
    }
    Ok(())
}

fn seed(conn: &Connection) -> Result<usize, BootstrapError> {
    let mut inserted = 0;

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO customers (customer_id, registration_date, city, gender)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (id, date, city, gender) in CUSTOMERS {
        inserted += stmt
            .execute(params![id, parse_date(date)?, city, gender])
            .map_err(seed_error("customers"))?;
    }

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO orders (order_id, customer_id, order_date, total_amount, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (id, customer_id, date, total, status) in ORDERS {
        inserted += stmt
            .execute(params![id, customer_id, parse_date(date)?, total, status])
            .map_err(seed_error("orders"))?;
    }

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO order_items (item_id, order_id, product_name, quantity, unit_price)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (id, order_id, product, quantity, price) in ORDER_ITEMS {
        inserted += stmt
            .execute(params![id, order_id, product, quantity, price])
            .map_err(seed_error("order_items"))?;
    }

    Ok(inserted)
}

fn parse_date(value: &str) -> Result<NaiveDate, BootstrapError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| BootstrapError::SeedDate {
        value: value.to_string(),
        source,
    })
}

fn seed_error(table: &'static str) -> impl Fn(rusqlite::Error) -> BootstrapError {
    move |source| BootstrapError::Seed {
        table: table.to_string(),
        source,
    }
}

fn count_rows(
    conn: &Connection,
    schema: &SchemaContext,
) -> Result<Vec<(String, i64)>, BootstrapError> {
    schema
        .tables
        .iter()
        .map(|t| -> Result<(String, i64), BootstrapError> {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", t.name), [], |row| {
                    row.get(0)
                })?;
            Ok((t.name.to_string(), count))
        })
        .collect()
}
