use sqlgate_core::{split_statements, CellValue, GateError, FIELD_DELIMITER};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{BigDecimal, JsonValue};
use sqlx::{Column, Executor, Row, Statement, TypeInfo, ValueRef};
use std::time::Instant;
use tracing::info;

/// Executes a semicolon-delimited batch sequentially. The first failing
/// statement aborts the batch; later statements never start. Each statement
/// logs its text, elapsed time, a column-header line, and one line per row.
pub async fn execute_batch(conn: &mut MySqlConnection, raw_query: &str) -> Result<(), GateError> {
    for statement in split_statements(raw_query) {
        execute_statement(conn, &statement).await?;
    }
    Ok(())
}

async fn execute_statement(conn: &mut MySqlConnection, statement: &str) -> Result<(), GateError> {
    info!("{statement}");
    let started = Instant::now();

    // Column metadata comes from the prepared statement, so a query that
    // matches zero rows still logs its real header.
    let prepared = conn
        .prepare(statement)
        .await
        .map_err(|err| GateError::Execution(format!("{statement}: {err}")))?;
    let columns: Vec<String> = prepared
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();

    let rows = prepared
        .query()
        .fetch_all(&mut *conn)
        .await
        .map_err(|err| GateError::Execution(format!("{statement}: {err}")))?;

    info!("SQL query took {:?}", started.elapsed());
    info!("{}", format_fields(&columns));
    for row in &rows {
        info!("{}", row_line(row));
    }
    Ok(())
}

fn row_line(row: &MySqlRow) -> String {
    let cells = (0..row.columns().len())
        .map(|idx| decode_cell(row, idx).render())
        .collect::<Vec<_>>();
    format_fields(&cells)
}

pub(crate) fn format_fields(fields: &[String]) -> String {
    fields.join(FIELD_DELIMITER)
}

#[derive(Debug, PartialEq)]
pub(crate) enum TypeClass {
    Bool,
    Int,
    UInt,
    Float,
    Text,
    Bytes,
    Date,
    Time,
    DateTime,
    Timestamp,
    Decimal,
    Json,
    Other,
}

/// Maps a MySQL type name to the decode strategy for its cells. Temporal,
/// decimal, and JSON columns get dedicated decodes; anything unrecognized
/// goes through the generic fallback chain.
pub(crate) fn classify(type_name: &str) -> TypeClass {
    match type_name {
        "BOOLEAN" | "TINYINT(1)" => TypeClass::Bool,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => TypeClass::Int,
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => TypeClass::UInt,
        "FLOAT" | "DOUBLE" => TypeClass::Float,
        "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" => {
            TypeClass::Text
        }
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            TypeClass::Bytes
        }
        "DATE" => TypeClass::Date,
        "TIME" => TypeClass::Time,
        "DATETIME" => TypeClass::DateTime,
        "TIMESTAMP" => TypeClass::Timestamp,
        "DECIMAL" => TypeClass::Decimal,
        "JSON" => TypeClass::Json,
        _ => TypeClass::Other,
    }
}

/// Decodes one cell into a renderable value. Total: a cell no decode path
/// accepts renders from its raw wire bytes, and only a truly unreadable
/// cell collapses to NULL, so one odd value never aborts the batch.
pub(crate) fn decode_cell(row: &MySqlRow, idx: usize) -> CellValue {
    let Ok(raw) = row.try_get_raw(idx) else {
        return CellValue::Null;
    };
    if raw.is_null() {
        return CellValue::Null;
    }
    let type_name = raw.type_info().name().to_string();
    drop(raw);

    match classify(&type_name) {
        TypeClass::Bool => {
            if let Ok(Some(v)) = row.try_get::<Option<bool>, _>(idx) {
                return CellValue::Bool(v);
            }
        }
        TypeClass::Int => {
            if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
                return CellValue::Int(v);
            }
        }
        TypeClass::UInt => {
            if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(idx) {
                return CellValue::UInt(v);
            }
        }
        TypeClass::Float => {
            if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
                return CellValue::Float(v);
            }
        }
        TypeClass::Text => {
            if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
                return CellValue::Text(v);
            }
        }
        TypeClass::Bytes => {
            if let Ok(Some(v)) = row.try_get::<Option<Vec<u8>>, _>(idx) {
                return CellValue::Bytes(v);
            }
        }
        TypeClass::Date => {
            if let Ok(Some(v)) = row.try_get::<Option<NaiveDate>, _>(idx) {
                return CellValue::Text(v.to_string());
            }
        }
        TypeClass::Time => {
            if let Ok(Some(v)) = row.try_get::<Option<NaiveTime>, _>(idx) {
                return CellValue::Text(v.to_string());
            }
        }
        TypeClass::DateTime => {
            if let Ok(Some(v)) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
                return CellValue::Text(v.to_string());
            }
        }
        TypeClass::Timestamp => {
            if let Ok(Some(v)) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
                return CellValue::Text(v.to_string());
            }
        }
        TypeClass::Decimal => {
            if let Ok(Some(v)) = row.try_get::<Option<BigDecimal>, _>(idx) {
                return CellValue::Text(v.to_string());
            }
        }
        TypeClass::Json => {
            if let Ok(Some(v)) = row.try_get::<Option<JsonValue>, _>(idx) {
                return CellValue::Text(v.to_string());
            }
        }
        TypeClass::Other => {}
    }

    // Mismatched or unrecognized type: attempt the common decodes in turn.
    if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
        return CellValue::Text(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return CellValue::Bytes(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return CellValue::Int(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(idx) {
        return CellValue::UInt(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return CellValue::Float(v);
    }

    // Last resort: the raw wire bytes, rendered lossily.
    if let Ok(raw) = row.try_get_raw(idx) {
        if let Ok(bytes) = <&[u8] as sqlx::Decode<'_, sqlx::MySql>>::decode(raw) {
            return CellValue::Bytes(bytes.to_vec());
        }
    }
    CellValue::Null
}
