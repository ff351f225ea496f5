//! Repositório da tabela `profiles` (usuários da equipe)

use sqlx::SqlitePool;

use crate::error::DbError;
use crate::models::Profile;

pub struct ProfileRepo;

impl ProfileRepo {
    /// Cadastra um usuário; e-mail repetido vira [`DbError::ConstraintViolation`]
    pub async fn create(
        pool: &SqlitePool,
        email: &str,
        full_name: Option<&str>,
        role: &str,
        password_hash: &str,
    ) -> Result<i64, DbError> {
        let result = sqlx::query(
            "INSERT INTO profiles (email, full_name, role, password_hash) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(full_name)
        .bind(role)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Profile>, DbError> {
        Ok(sqlx::query_as::<_, Profile>(
            "SELECT id, email, full_name, role, password_hash FROM profiles WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_find() -> anyhow::Result<()> {
        let pool = crate::init_memory_pool().await?;
        let id = ProfileRepo::create(&pool, "dra@clinica.com", Some("Dra. Helena"), "staff", "h")
            .await?;

        let profile = ProfileRepo::find_by_email(&pool, "dra@clinica.com")
            .await?
            .expect("perfil");
        assert_eq!(profile.id, id);
        assert_eq!(profile.role, "staff");
        assert!(ProfileRepo::find_by_email(&pool, "outro@clinica.com").await?.is_none());

        let duplicate = ProfileRepo::create(&pool, "dra@clinica.com", None, "staff", "h").await;
        assert!(matches!(duplicate, Err(DbError::ConstraintViolation(_))));
        Ok(())
    }
}
