// postgres connection and query execution

use crate::Error;
use serde::Serialize;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row};

pub struct Db {
    pool: PgPool,
}

#[derive(Serialize, Debug)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

impl Db {
    pub async fn connect(url: &str) -> Result<Self, Error> {
        tracing::debug!("connecting to postgres");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(Error::Connection)?;

        tracing::debug!("postgres connection established");
        Ok(Self { pool })
    }

    /// Build the pool without touching the network. The first query pays
    /// the connection cost instead.
    pub fn connect_lazy(url: &str) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(url)
            .map_err(Error::Connection)?;

        Ok(Self { pool })
    }

    // get table and column info so the model knows what to query
    pub async fn schema(&self) -> Result<String, Error> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"SELECT table_name::text, column_name::text, data_type::text
               FROM information_schema.columns
               WHERE table_schema = 'public'
               ORDER BY table_name, ordinal_position"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Query)?;

        Ok(format_schema(rows))
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool, Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_name = $1)",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Query)
    }

    // run the sql and return results as json
    pub async fn execute(&self, sql: &str, params: &[serde_json::Value]) -> Result<QueryResult, Error> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_value(query, param);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(Error::Query)?;
        Ok(QueryResult::from_rows(&rows))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl QueryResult {
    pub fn empty() -> Self {
        Self {
            columns: vec![],
            rows: vec![],
            row_count: 0,
        }
    }

    pub fn from_rows(rows: &[PgRow]) -> Self {
        let Some(first) = rows.first() else {
            return Self::empty();
        };

        let columns: Vec<String> = first.columns().iter().map(|c| c.name().to_string()).collect();

        let json_rows: Vec<Vec<serde_json::Value>> = rows
            .iter()
            .map(|row| (0..columns.len()).map(|i| row_value_to_json(row, i)).collect())
            .collect();

        let row_count = json_rows.len();

        Self {
            columns,
            rows: json_rows,
            row_count,
        }
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

// bind a json scalar with the matching postgres type
fn bind_value<'q>(query: PgQuery<'q>, value: &'q serde_json::Value) -> PgQuery<'q> {
    use serde_json::Value;

    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) if n.is_i64() => query.bind(n.as_i64()),
        Value::Number(n) => query.bind(n.as_f64()),
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.to_string()),
    }
}

// turn schema rows into readable text for the model
fn format_schema(rows: Vec<(String, String, String)>) -> String {
    let mut result = String::new();
    let mut current_table = String::new();

    for (table, column, dtype) in rows {
        if table != current_table {
            if !current_table.is_empty() {
                result.push_str(")\n\n");
            }
            result.push_str(&format!("TABLE {table} (\n"));
            current_table = table;
        }
        result.push_str(&format!("  {column} {dtype}\n"));
    }

    if !current_table.is_empty() {
        result.push(')');
    }

    result
}

// convert postgres values to json, trying decodes from most to least common
fn row_value_to_json(row: &PgRow, index: usize) -> serde_json::Value {
    use sqlx::ValueRef;

    if row.try_get_raw(index).map(|v| v.is_null()).unwrap_or(true) {
        return serde_json::Value::Null;
    }

    if let Ok(v) = row.try_get::<String, _>(index) {
        return serde_json::Value::String(v);
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return serde_json::Value::Number(v.into());
    }
    if let Ok(v) = row.try_get::<i32, _>(index) {
        return serde_json::Value::Number(v.into());
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return serde_json::Number::from_f64(v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null);
    }
    if let Ok(v) = row.try_get::<bool, _>(index) {
        return serde_json::Value::Bool(v);
    }
    if let Ok(v) = row.try_get::<chrono::NaiveDate, _>(index) {
        return serde_json::Value::String(v.to_string());
    }
    if let Ok(v) = row.try_get::<chrono::NaiveTime, _>(index) {
        return serde_json::Value::String(v.to_string());
    }
    if let Ok(v) = row.try_get::<chrono::NaiveDateTime, _>(index) {
        return serde_json::Value::String(v.to_string());
    }
    if let Ok(v) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(index) {
        return serde_json::Value::String(v.to_rfc3339());
    }

    // some postgres types just don't have a clean json shape
    serde_json::Value::String("<unsupported>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_formatting() {
        let rows = vec![
            ("agenda".into(), "id".into(), "integer".into()),
            ("agenda".into(), "appointment_date".into(), "date".into()),
            ("patients".into(), "patient_number".into(), "text".into()),
        ];

        let schema = format_schema(rows);
        assert!(schema.starts_with("TABLE agenda (\n"));
        assert!(schema.contains("  appointment_date date\n"));
        assert!(schema.contains("TABLE patients (\n"));
        assert!(schema.ends_with(')'));
    }

    #[test]
    fn schema_formatting_empty() {
        assert_eq!(format_schema(vec![]), "");
    }
}
