//! Modelo dinâmico de valores vindos da camada de persistência
//!
//! Linhas do banco chegam com tipos heterogêneos por campo (decimais, datas,
//! horários, durações, inteiros usados como booleanos). Este módulo define o
//! [`Value`] que representa qualquer um deles e o [`Record`] que agrupa os
//! campos nomeados de uma linha.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Registro nomeado (campo -> valor), preservando a ordem das colunas
pub type Record = IndexMap<String, Value>;

const SECONDS_PER_DAY: i64 = 24 * 3600;

/// Valor arbitrário produzido pela camada de acesso a dados
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Decimal de precisão arbitrária (valores monetários)
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    /// Duração usada por alguns drivers para representar horários
    Duration(chrono::Duration),
    Bytes(Vec<u8>),
    /// Valor opaco de tipo desconhecido; atravessa a normalização intacto
    Opaque(Arc<dyn Any + Send + Sync>),
    List(Vec<Value>),
    Record(Record),
}

impl Value {
    /// Embala um valor qualquer como folha opaca
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Busca um campo quando o valor é um registro
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.as_record().and_then(|r| r.get(field))
    }
}

/// `YYYY-MM-DD`
pub(crate) fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DDTHH:MM:SS`, com fração de segundos apenas quando existir
pub(crate) fn format_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// `HH:MM:SS`, descartando frações de segundo
pub(crate) fn format_time(time: &NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

/// `HH:MM:SS` a partir do total de segundos, descartando dias inteiros
pub(crate) fn format_duration(duration: &chrono::Duration) -> String {
    let seconds = duration.num_seconds().rem_euclid(SECONDS_PER_DAY);
    let (hours, remainder) = (seconds / 3600, seconds % 3600);
    let (minutes, seconds) = (remainder / 60, remainder % 60);
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Text(s) => write!(f, "Text({:?})", s),
            Value::Decimal(d) => write!(f, "Decimal({})", d),
            Value::Date(d) => write!(f, "Date({})", d),
            Value::DateTime(dt) => write!(f, "DateTime({})", dt),
            Value::Time(t) => write!(f, "Time({})", t),
            Value::Duration(d) => write!(f, "Duration({}s)", d.num_seconds()),
            Value::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Value::Opaque(_) => write!(f, "Opaque(..)"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Record(record) => f.debug_map().entries(record.iter()).finish(),
        }
    }
}

/// Igualdade estrutural; valores opacos só são iguais quando apontam para o
/// mesmo objeto.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Opaque(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Decimal(d) => match d.to_f64() {
                Some(x) => serializer.serialize_f64(x),
                None => serializer.serialize_str(&d.to_string()),
            },
            Value::Date(d) => serializer.serialize_str(&format_date(d)),
            Value::DateTime(dt) => serializer.serialize_str(&format_datetime(dt)),
            Value::Time(t) => serializer.serialize_str(&format_time(t)),
            Value::Duration(d) => serializer.serialize_str(&format_duration(d)),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Record(record) => {
                let mut map = serializer.serialize_map(Some(record.len()))?;
                for (key, value) in record {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    Decimal => Decimal,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    NaiveTime => Time,
    chrono::Duration => Duration,
    Vec<u8> => Bytes,
    Vec<Value> => List,
    Record => Record,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Listagem de registros
impl From<Vec<Record>> for Value {
    fn from(records: Vec<Record>) -> Self {
        Value::List(records.into_iter().map(Value::Record).collect())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Value::DateTime(v.naive_utc())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Linhas no formato de cliente REST (lista de objetos JSON)
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Record(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}
