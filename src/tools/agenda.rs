// appointment tools - the registry entries the dispatcher serves
//
// The agenda table keys into patients and appointment_types, so reads
// projecting explicit columns come back pre-joined with both.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde_json::{Value, json};

use super::handler::{ToolContext, ToolHandler, ToolOutput};
use super::registry::ToolRegistry;
use crate::core::{Guard, QueryResult};
use crate::Error;

const ASK: &str = "ask";

/// Build the registry every channel serves from.
pub fn default_registry() -> Result<ToolRegistry, Error> {
    let mut registry = ToolRegistry::new();

    registry.register(
        "list_tables",
        json!({
            "name": "list_tables",
            "description": "List all tables in the database, ordered by name",
            "input_schema": {"type": "object", "properties": {}}
        }),
        ListTables,
    )?;

    registry.register(
        "retrieve_all_data",
        json!({
            "name": "retrieve_all_data",
            "description": "Retrieve all rows from a table. The agenda table is joined with patients and appointment types.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "table_name": {"type": "string", "description": "Table to query, defaults to agenda"},
                    "columns": {"type": "array", "items": {"type": "string"}, "description": "Specific columns to retrieve; all columns when omitted"}
                }
            }
        }),
        RetrieveAllData,
    )?;

    registry.register(
        "retrieve_data_with_conditions",
        json!({
            "name": "retrieve_data_with_conditions",
            "description": "Retrieve rows from a table with optional filtering, ordering, and a row limit",
            "input_schema": {
                "type": "object",
                "properties": {
                    "table_name": {"type": "string", "description": "Table to query"},
                    "where_clause": {"type": "string", "description": "Filter predicate without the WHERE keyword"},
                    "order_by": {"type": "string", "description": "Ordering without the ORDER BY keywords"},
                    "limit": {"type": "integer", "description": "Maximum number of rows"},
                    "columns": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["table_name"]
            }
        }),
        RetrieveWithConditions,
    )?;

    registry.register(
        "create_appointment",
        json!({
            "name": "create_appointment",
            "description": "Create a new appointment, creating the patient and appointment type if needed",
            "input_schema": {
                "type": "object",
                "properties": {
                    "patient_name": {"type": "string"},
                    "appointment_date": {"type": "string", "description": "YYYY-MM-DD"},
                    "appointment_type": {"type": "string", "description": "Defaults to General Consultation"},
                    "start_time": {"type": "string", "description": "HH:MM"},
                    "duration": {"type": "integer", "description": "Minutes, defaults to 30"},
                    "patient_address": {"type": "string"},
                    "patient_phone": {"type": "string"}
                },
                "required": ["patient_name", "appointment_date", "start_time"]
            }
        }),
        CreateAppointment,
    )?;

    registry.register(
        "get_agenda_summary",
        json!({
            "name": "get_agenda_summary",
            "description": "Appointment and patient totals plus daily, weekly, and monthly appointment averages",
            "input_schema": {"type": "object", "properties": {}}
        }),
        AgendaSummary,
    )?;

    registry.register(
        ASK,
        json!({
            "name": ASK,
            "description": "Answer a natural-language question about the agenda, running a database tool when needed",
            "input_schema": {
                "type": "object",
                "properties": {
                    "question": {"type": "string"}
                },
                "required": ["question"]
            }
        }),
        Ask,
    )?;

    Ok(registry)
}

struct ListTables;

#[async_trait]
impl ToolHandler for ListTables {
    async fn call(&self, ctx: &ToolContext<'_>, _args: &Value) -> Result<ToolOutput, Error> {
        let result = ctx
            .db
            .execute(
                r#"SELECT table_name::text
                   FROM information_schema.tables
                   WHERE table_schema = 'public'
                   ORDER BY table_name"#,
                &[],
            )
            .await?;

        Ok(ToolOutput::rows(
            format!("{} tables", result.row_count),
            result,
        ))
    }
}

struct RetrieveAllData;

#[async_trait]
impl ToolHandler for RetrieveAllData {
    async fn call(&self, ctx: &ToolContext<'_>, args: &Value) -> Result<ToolOutput, Error> {
        let table = opt_str(args, "table_name").unwrap_or_else(|| "agenda".to_string());
        let columns = str_list(args, "columns")?;

        let sql = build_select(&table, columns.as_deref())?;
        let result = ctx.db.execute(&sql, &[]).await?;

        tracing::info!(table = %table, rows = result.row_count, "retrieved all data");
        Ok(ToolOutput::rows(
            format!("{} rows from {table}", result.row_count),
            result,
        ))
    }
}

struct RetrieveWithConditions;

#[async_trait]
impl ToolHandler for RetrieveWithConditions {
    async fn call(&self, ctx: &ToolContext<'_>, args: &Value) -> Result<ToolOutput, Error> {
        let table = req_str(args, "table_name")?;

        if !ctx.db.table_exists(&table).await? {
            return Err(Error::BadRequest(format!("table '{table}' does not exist")));
        }

        let columns = str_list(args, "columns")?;
        let mut sql = build_select(&table, columns.as_deref())?;

        if let Some(where_clause) = opt_str(args, "where_clause") {
            Guard::check_fragment(&where_clause)?;
            sql.push_str(&format!(" WHERE {where_clause}"));
        }

        if let Some(order_by) = opt_str(args, "order_by") {
            Guard::check_fragment(&order_by)?;
            sql.push_str(&format!(" ORDER BY {order_by}"));
        }

        if let Some(limit) = opt_i64(args, "limit") {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let result = ctx.db.execute(&sql, &[]).await?;

        tracing::info!(table = %table, rows = result.row_count, "retrieved with conditions");
        Ok(ToolOutput::rows(
            format!("{} rows from {table}", result.row_count),
            result,
        ))
    }
}

struct CreateAppointment;

#[async_trait]
impl ToolHandler for CreateAppointment {
    async fn call(&self, ctx: &ToolContext<'_>, args: &Value) -> Result<ToolOutput, Error> {
        let patient_name = req_str(args, "patient_name")?;
        let appointment_date = req_str(args, "appointment_date")?;
        let start_time = req_str(args, "start_time")?;
        let appointment_type =
            opt_str(args, "appointment_type").unwrap_or_else(|| "General Consultation".to_string());
        let duration = opt_i64(args, "duration").unwrap_or(30);
        let address = opt_str(args, "patient_address");
        let phone = opt_str(args, "patient_phone");

        let date = NaiveDate::parse_from_str(&appointment_date, "%Y-%m-%d")
            .map_err(|e| Error::BadRequest(format!("bad appointment_date: {e}")))?;
        let start = NaiveTime::parse_from_str(&start_time, "%H:%M")
            .map_err(|e| Error::BadRequest(format!("bad start_time: {e}")))?;
        let end = (date.and_time(start) + Duration::minutes(duration)).time();

        let mut tx = ctx.db.pool().begin().await.map_err(Error::Query)?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT patient_number FROM patients WHERE name = $1")
                .bind(&patient_name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Query)?;

        let patient_number = match existing {
            Some(number) => {
                tracing::info!(patient = %number, "found existing patient");
                number
            }
            None => {
                let last: Option<String> = sqlx::query_scalar(
                    "SELECT patient_number FROM patients ORDER BY patient_number DESC LIMIT 1",
                )
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Query)?;

                let number = next_patient_number(last.as_deref());
                let created: String = sqlx::query_scalar(
                    "INSERT INTO patients (patient_number, name, address, phonenumber)
                     VALUES ($1, $2, $3, $4) RETURNING patient_number",
                )
                .bind(&number)
                .bind(&patient_name)
                .bind(&address)
                .bind(&phone)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Query)?;

                tracing::info!(patient = %created, "created new patient");
                created
            }
        };

        let type_number: Option<i32> =
            sqlx::query_scalar("SELECT appointment_number FROM appointment_types WHERE name = $1")
                .bind(&appointment_type)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Query)?;

        let appointment_number = match type_number {
            Some(number) => number,
            None => sqlx::query_scalar(
                "INSERT INTO appointment_types (name) VALUES ($1) RETURNING appointment_number",
            )
            .bind(&appointment_type)
            .fetch_one(&mut *tx)
            .await
            .map_err(Error::Query)?,
        };

        let max_id: Option<i32> = sqlx::query_scalar("SELECT max(id) FROM agenda")
            .fetch_one(&mut *tx)
            .await
            .map_err(Error::Query)?;
        let id = max_id.unwrap_or(0) + 1;

        let row = sqlx::query(
            "INSERT INTO agenda (id, patient_number, appointment_type, appointment_date, start_hour, end_hour)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(id)
        .bind(&patient_number)
        .bind(appointment_number)
        .bind(date)
        .bind(start)
        .bind(end)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Query)?;

        tx.commit().await.map_err(Error::Query)?;

        tracing::info!(id, patient = %patient_number, "appointment created");
        Ok(ToolOutput::rows(
            format!("appointment {id} created for {patient_name} on {appointment_date} at {start_time}"),
            QueryResult::from_rows(std::slice::from_ref(&row)),
        ))
    }
}

struct AgendaSummary;

#[async_trait]
impl ToolHandler for AgendaSummary {
    async fn call(&self, ctx: &ToolContext<'_>, _args: &Value) -> Result<ToolOutput, Error> {
        let pool = ctx.db.pool();

        let total_appointments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agenda")
            .fetch_one(pool)
            .await
            .map_err(Error::Query)?;

        let total_patients: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patients")
            .fetch_one(pool)
            .await
            .map_err(Error::Query)?;

        let daily_avg: Option<f64> = sqlx::query_scalar(
            r#"SELECT ROUND(AVG(count), 2)::float8 FROM (
                   SELECT DATE(appointment_date), COUNT(*) as count
                   FROM agenda
                   WHERE appointment_date >= CURRENT_DATE - INTERVAL '30 days'
                   GROUP BY DATE(appointment_date)
               ) as daily"#,
        )
        .fetch_one(pool)
        .await
        .map_err(Error::Query)?;

        let weekly_avg: Option<f64> = sqlx::query_scalar(
            r#"SELECT ROUND(AVG(count), 2)::float8 FROM (
                   SELECT DATE_TRUNC('week', appointment_date), COUNT(*) as count
                   FROM agenda
                   WHERE appointment_date >= CURRENT_DATE - INTERVAL '12 weeks'
                   GROUP BY DATE_TRUNC('week', appointment_date)
               ) as weekly"#,
        )
        .fetch_one(pool)
        .await
        .map_err(Error::Query)?;

        let monthly_avg: Option<f64> = sqlx::query_scalar(
            r#"SELECT ROUND(AVG(count), 2)::float8 FROM (
                   SELECT DATE_TRUNC('month', appointment_date), COUNT(*) as count
                   FROM agenda
                   WHERE appointment_date >= CURRENT_DATE - INTERVAL '12 months'
                   GROUP BY DATE_TRUNC('month', appointment_date)
               ) as monthly"#,
        )
        .fetch_one(pool)
        .await
        .map_err(Error::Query)?;

        let result = QueryResult {
            columns: vec![
                "total_appointments".into(),
                "total_patients".into(),
                "daily_average".into(),
                "weekly_average".into(),
                "monthly_average".into(),
            ],
            rows: vec![vec![
                total_appointments.into(),
                total_patients.into(),
                json_f64(daily_avg),
                json_f64(weekly_avg),
                json_f64(monthly_avg),
            ]],
            row_count: 1,
        };

        Ok(ToolOutput::rows(
            format!("{total_appointments} appointments across {total_patients} patients"),
            result,
        ))
    }
}

struct Ask;

#[async_trait]
impl ToolHandler for Ask {
    async fn call(&self, ctx: &ToolContext<'_>, args: &Value) -> Result<ToolOutput, Error> {
        let ai = ctx.ai.ok_or(Error::MissingApiKey)?;
        let question = req_str(args, "question")?;

        // give the model the live schema plus every directly-invocable tool
        let schema = ctx.db.schema().await?;
        let system = format!(
            r#"You are the assistant for a medical appointment database. Answer questions about patients, appointment types, and the agenda.

Database schema:
{schema}

Rules:
- Use the provided tools for anything that needs live data
- Prefer retrieve_data_with_conditions over retrieve_all_data when a filter applies
- Dates are YYYY-MM-DD, times are HH:MM
- Answer briefly; the caller sees returned rows alongside your text"#
        );

        let tools = ctx.registry.schemas_except(ASK);
        let reply = ai.complete(&question, &system, &tools).await?;

        match reply.tool_call {
            Some(call) if call.name != ASK => {
                tracing::info!(tool = %call.name, "model selected tool");
                let output = ctx.registry.execute(&call.name, ctx, &call.arguments).await?;

                let text = if reply.text.is_empty() {
                    output.text
                } else {
                    format!("{}\n{}", reply.text, output.text)
                };

                Ok(ToolOutput {
                    text,
                    rows: output.rows,
                })
            }
            _ => Ok(ToolOutput::text(reply.text)),
        }
    }
}

// select statement shared by both retrieval tools; agenda reads with an
// explicit column list come back joined with patients and appointment_types,
// while a bare select stays on the table itself so the joined tables don't
// duplicate patient_number and name
fn build_select(table: &str, columns: Option<&[String]>) -> Result<String, Error> {
    let quoted_table = Guard::quote_ident(table)?;

    match columns {
        Some(cols) if !cols.is_empty() => {
            let quoted: Vec<String> = cols
                .iter()
                .map(|c| Guard::quote_ident(c))
                .collect::<Result<_, _>>()?;
            let column_list = quoted.join(", ");

            if table == "agenda" {
                Ok(format!(
                    "SELECT {column_list} FROM {quoted_table} as s1 \
                     LEFT JOIN \"patients\" as s2 ON s1.patient_number = s2.patient_number \
                     LEFT JOIN appointment_types as s3 ON s1.appointment_type = s3.appointment_number"
                ))
            } else {
                Ok(format!("SELECT {column_list} FROM {quoted_table}"))
            }
        }
        _ => Ok(format!("SELECT * FROM {quoted_table}")),
    }
}

// patient numbers run P001, P002, ...
fn next_patient_number(last: Option<&str>) -> String {
    let next = last
        .and_then(|n| n.get(1..))
        .and_then(|n| n.parse::<i32>().ok())
        .unwrap_or(0)
        + 1;
    format!("P{next:03}")
}

fn json_f64(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::from(0))
}

fn req_str(args: &Value, key: &str) -> Result<String, Error> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::BadRequest(format!("missing required field: {key}")))
}

fn opt_str(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

fn opt_i64(args: &Value, key: &str) -> Option<i64> {
    args.get(key).and_then(Value::as_i64)
}

fn str_list(args: &Value, key: &str) -> Result<Option<Vec<String>>, Error> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::BadRequest(format!("{key} must be an array of strings")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(Error::BadRequest(format!(
            "{key} must be an array of strings"
        ))),
    }
}
