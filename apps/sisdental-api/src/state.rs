use std::sync::Arc;

use sisdental_db::{DocumentStore, Normalizer, Record, Value};
use sqlx::SqlitePool;

use crate::config::AppConfig;

/// Estado compartilhado entre os handlers (`State<AppState>`)
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    /// Construído uma vez a partir de `BOOLEAN_FIELDS`
    pub normalizer: Arc<Normalizer>,
    pub store: Arc<DocumentStore>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig, store: DocumentStore) -> Self {
        let normalizer = Normalizer::new(config.boolean_fields.iter().cloned());
        Self {
            pool,
            config: Arc::new(config),
            normalizer: Arc::new(normalizer),
            store: Arc::new(store),
        }
    }

    /// Normaliza uma listagem para a resposta
    pub fn rows(&self, records: Vec<Record>) -> Value {
        self.normalizer.normalize_records(records)
    }

    pub fn row(&self, record: Record) -> Value {
        Value::Record(self.normalizer.normalize_record(record))
    }

    /// Normaliza uma resposta composta (registro com listas aninhadas)
    pub fn compose<I>(&self, fields: I) -> Value
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        let record: Record = fields
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        self.normalizer.normalize(Value::Record(record))
    }
}
