//! Normalização de valores para transporte
//!
//! Reescreve recursivamente qualquer estrutura de listas e registros vinda do
//! banco de forma que toda folha seja número (`f64`), texto, booleano ou nulo,
//! pronta para virar JSON sem nenhum tratamento adicional no handler.
//!
//! A conversão de decimais para `f64` perde precisão de propósito: os valores
//! monetários só são exibidos com duas casas, e o ponto flutuante de 64 bits
//! cobre essa faixa com folga.

use std::collections::HashSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::value::{format_date, format_datetime, format_duration, format_time, Record, Value};

/// Campo booleano padrão do consultório (tratamentos concluídos)
pub const DEFAULT_BOOLEAN_FIELDS: &[&str] = &["completed"];

/// Normalizador de valores do banco
///
/// Os campos listados em `boolean_fields` são convertidos em booleano mesmo
/// quando o banco os armazena como inteiro 0/1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    boolean_fields: HashSet<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_BOOLEAN_FIELDS.iter().copied())
    }
}

impl Normalizer {
    pub fn new<I, S>(boolean_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            boolean_fields: boolean_fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn boolean_fields(&self) -> &HashSet<String> {
        &self.boolean_fields
    }

    /// Normaliza um valor qualquer, preservando a estrutura de listas e registros
    pub fn normalize(&self, value: Value) -> Value {
        match value {
            Value::List(items) => Value::List(items.into_iter().map(|v| self.normalize(v)).collect()),
            Value::Record(record) => Value::Record(self.normalize_record(record)),
            leaf => normalize_leaf(leaf),
        }
    }

    /// Normaliza os campos de um registro; as chaves não mudam
    pub fn normalize_record(&self, record: Record) -> Record {
        record
            .into_iter()
            .map(|(field, value)| {
                let value = if self.boolean_fields.contains(&field) {
                    coerce_bool(value)
                } else {
                    value
                };
                (field, self.normalize(value))
            })
            .collect()
    }

    /// Normaliza uma lista de registros (resultado típico de uma consulta)
    pub fn normalize_records(&self, records: Vec<Record>) -> Value {
        Value::List(
            records
                .into_iter()
                .map(|r| Value::Record(self.normalize_record(r)))
                .collect(),
        )
    }

    /// Normaliza um registro opcional; ausência vira nulo
    pub fn normalize_optional(&self, record: Option<Record>) -> Value {
        record
            .map(|r| Value::Record(self.normalize_record(r)))
            .unwrap_or(Value::Null)
    }
}

fn normalize_leaf(value: Value) -> Value {
    match value {
        Value::Decimal(d) => decimal_to_float(d),
        Value::Date(d) => Value::Text(format_date(&d)),
        Value::DateTime(dt) => Value::Text(format_datetime(&dt)),
        Value::Time(t) => Value::Text(format_time(&t)),
        Value::Duration(d) => Value::Text(format_duration(&d)),
        Value::Opaque(handle) => {
            #[cfg(debug_assertions)]
            tracing::debug!("Valor de tipo desconhecido mantido sem conversão");
            Value::Opaque(handle)
        }
        other => other,
    }
}

fn decimal_to_float(d: Decimal) -> Value {
    match d.to_f64() {
        Some(x) => Value::Float(x),
        None => Value::Decimal(d),
    }
}

/// Converte a representação numérica 0/1 em booleano; nulo continua nulo
fn coerce_bool(value: Value) -> Value {
    match value {
        Value::Int(i) => Value::Bool(i != 0),
        Value::Float(x) => Value::Bool(x != 0.0),
        Value::Decimal(d) => Value::Bool(!d.is_zero()),
        other => other,
    }
}
