//! Linhas brutas e o adaptador tupla -> registro
//!
//! Um driver de cursor devolve tuplas posicionais com os nomes das colunas à
//! parte; um cliente REST devolve registros já nomeados. [`RawRow`] representa
//! as duas formas e [`adapt`] é a única conversão entre elas.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::error::DbError;
use crate::value::{Record, Value};

/// Linha retornada por uma consulta, em qualquer das duas formas
#[derive(Debug, Clone, PartialEq)]
pub enum RawRow {
    /// Tupla posicional + nomes das colunas (driver de cursor)
    Tuple { columns: Vec<String>, values: Vec<Value> },
    /// Registro nomeado (cliente REST)
    Record(Record),
}

impl RawRow {
    /// Converte para registro nomeado, sem alterar os valores
    pub fn into_record(self) -> Result<Record, DbError> {
        match self {
            RawRow::Tuple { columns, values } => adapt(&columns, values),
            RawRow::Record(record) => Ok(record),
        }
    }

    /// Decodifica uma linha do SQLite em tupla posicional
    pub fn from_sqlite_row(row: &SqliteRow) -> Result<Self, DbError> {
        let mut columns = Vec::with_capacity(row.columns().len());
        let mut values = Vec::with_capacity(row.columns().len());

        for (idx, column) in row.columns().iter().enumerate() {
            columns.push(column.name().to_string());
            values.push(decode_column(row, idx, column.type_info().name())?);
        }

        Ok(RawRow::Tuple { columns, values })
    }
}

/// Associa nomes de colunas aos valores posicionais de uma linha
///
/// Falha se as duas sequências tiverem tamanhos diferentes ou se um nome de
/// coluna se repetir; nunca trunca nem completa o registro.
pub fn adapt<S: AsRef<str>>(columns: &[S], values: Vec<Value>) -> Result<Record, DbError> {
    if columns.len() != values.len() {
        return Err(DbError::RowShape {
            columns: columns.len(),
            values: values.len(),
        });
    }

    let mut record = Record::with_capacity(columns.len());
    for (column, value) in columns.iter().zip(values) {
        let column = column.as_ref();
        if record.insert(column.to_string(), value).is_some() {
            return Err(DbError::DuplicateColumn(column.to_string()));
        }
    }
    Ok(record)
}

/// Decodifica todas as linhas de uma consulta em registros nomeados
pub fn records_from_rows(rows: &[SqliteRow]) -> Result<Vec<Record>, DbError> {
    rows.iter()
        .map(|row| RawRow::from_sqlite_row(row)?.into_record())
        .collect()
}

/// Move as colunas `<prefix>__<campo>` de um JOIN para um registro aninhado
///
/// Se todas as colunas movidas forem nulas (JOIN sem correspondência) o campo
/// aninhado fica nulo.
pub fn nest_prefixed(record: &mut Record, prefix: &str, into: &str) {
    let marker = format!("{}__", prefix);
    let keys: Vec<String> = record
        .keys()
        .filter(|k| k.starts_with(&marker))
        .cloned()
        .collect();

    let mut nested = Record::with_capacity(keys.len());
    for key in keys {
        if let Some(value) = record.shift_remove(&key) {
            nested.insert(key[marker.len()..].to_string(), value);
        }
    }

    let value = if nested.values().all(Value::is_null) {
        Value::Null
    } else {
        Value::Record(nested)
    };
    record.insert(into.to_string(), value);
}

fn decode_column(row: &SqliteRow, idx: usize, declared: &str) -> Result<Value, DbError> {
    let storage = {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_ascii_uppercase()
    };
    let declared = declared.to_ascii_uppercase();

    let value = match storage.as_str() {
        "REAL" => {
            let x: f64 = row.try_get_unchecked(idx)?;
            if declared == "NUMERIC" {
                Decimal::from_f64(x).map(Value::Decimal).unwrap_or(Value::Float(x))
            } else {
                Value::Float(x)
            }
        }
        "TEXT" => {
            let text: String = row.try_get_unchecked(idx)?;
            decode_text(text, &declared)
        }
        "BLOB" => Value::Bytes(row.try_get_unchecked(idx)?),
        _ => {
            // BOOLEAN continua inteiro 0/1; a conversão é do normalizador
            let i: i64 = row.try_get_unchecked(idx)?;
            if declared == "NUMERIC" {
                Value::Decimal(Decimal::from(i))
            } else {
                Value::Int(i)
            }
        }
    };
    Ok(value)
}

fn decode_text(text: String, declared: &str) -> Value {
    let parsed = match declared {
        "DATE" => NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok().map(Value::Date),
        "TIME" => parse_time(&text).map(Value::Time),
        "DATETIME" => parse_datetime(&text).map(Value::DateTime),
        "NUMERIC" => Decimal::from_str(&text).ok().map(Value::Decimal),
        _ => None,
    };
    parsed.unwrap_or(Value::Text(text))
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}
