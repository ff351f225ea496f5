//! Repositórios por tabela
//!
//! Cada repositório expõe funções assíncronas sobre um `&SqlitePool`. As
//! consultas de leitura devolvem [`Record`]s crus (decodificados via
//! [`RawRow`](crate::row::RawRow)); a normalização fica com quem consome.

use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::query::Query;
use sqlx::SqlitePool;

use crate::error::DbError;
use crate::row::{records_from_rows, RawRow};
use crate::value::Record;

mod appointments;
mod documents;
mod finances;
mod patients;
mod profiles;
mod treatments;

pub use appointments::{AppointmentFilter, AppointmentRepo};
pub use documents::DocumentRepo;
pub use finances::FinanceRepo;
pub use patients::PatientRepo;
pub use profiles::ProfileRepo;
pub use treatments::TreatmentRepo;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Executa a consulta e decodifica todas as linhas
async fn fetch_records(pool: &SqlitePool, query: SqliteQuery<'_>) -> Result<Vec<Record>, DbError> {
    let rows = query.fetch_all(pool).await?;
    records_from_rows(&rows)
}

/// Executa a consulta e decodifica a primeira linha, se houver
async fn fetch_record(pool: &SqlitePool, query: SqliteQuery<'_>) -> Result<Option<Record>, DbError> {
    match query.fetch_optional(pool).await? {
        Some(row) => Ok(Some(RawRow::from_sqlite_row(&row)?.into_record()?)),
        None => Ok(None),
    }
}

/// Padrão `LIKE` de substring, com `%`, `_` e `\` escapados (use `ESCAPE '\'`)
fn contains_pattern(search: Option<&str>) -> Option<String> {
    search.map(|term| {
        let mut pattern = String::with_capacity(term.len() + 2);
        pattern.push('%');
        for c in term.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    })
}

/// `-1` desliga o LIMIT no SQLite
fn limit_or_all(limit: Option<i64>) -> i64 {
    limit.unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern(None), None);
        assert_eq!(contains_pattern(Some("ana")).as_deref(), Some("%ana%"));
        assert_eq!(contains_pattern(Some("50%_a\\b")).as_deref(), Some("%50\\%\\_a\\\\b%"));
    }
}
