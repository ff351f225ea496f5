//! Sistema de migrações para banco de dados
//!
//! Este módulo gerencia as migrações do banco de dados SQLite do consultório

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{error, info};

/// Lista de migrações SQL a serem aplicadas
const MIGRATIONS: &[&str] = &[
    // 001_initial_schema.sql
    r#"
    -- Usuários da equipe
    CREATE TABLE IF NOT EXISTS profiles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        full_name TEXT,
        role TEXT NOT NULL DEFAULT 'staff',
        password_hash TEXT NOT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    -- Pacientes; password_hash só existe após o primeiro acesso ao portal
    CREATE TABLE IF NOT EXISTS patients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        cpf TEXT,
        phone TEXT,
        email TEXT,
        birth_date DATE,
        password_hash TEXT,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    -- Agendamentos
    CREATE TABLE IF NOT EXISTS appointments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id INTEGER NOT NULL,
        service TEXT NOT NULL,
        date DATE NOT NULL,
        time TIME NOT NULL,
        status TEXT NOT NULL DEFAULT 'Agendado',
        notes TEXT,
        FOREIGN KEY (patient_id) REFERENCES patients (id) ON DELETE CASCADE
    );

    -- Tratamentos do odontograma
    CREATE TABLE IF NOT EXISTS treatments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id INTEGER NOT NULL,
        tooth_number INTEGER NOT NULL,
        treatment_type TEXT NOT NULL,
        treatment_date DATE NOT NULL,
        notes TEXT,
        next_session_date DATE,
        amount NUMERIC,
        completed BOOLEAN NOT NULL DEFAULT 0,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (patient_id) REFERENCES patients (id) ON DELETE CASCADE
    );

    -- Lançamentos financeiros
    CREATE TABLE IF NOT EXISTS financial_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id INTEGER NOT NULL,
        treatment_id INTEGER,
        appointment_id INTEGER,
        description TEXT NOT NULL,
        amount NUMERIC NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('pendente', 'pago')),
        due_date DATE NOT NULL,
        paid_date DATE,
        FOREIGN KEY (patient_id) REFERENCES patients (id) ON DELETE CASCADE,
        FOREIGN KEY (treatment_id) REFERENCES treatments (id) ON DELETE SET NULL,
        FOREIGN KEY (appointment_id) REFERENCES appointments (id) ON DELETE SET NULL
    );

    -- Metadados de documentos; o conteúdo fica no armazenamento cifrado
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id INTEGER NOT NULL,
        document_type TEXT NOT NULL CHECK (document_type IN ('certificate', 'prescription')),
        generation_time DATETIME NOT NULL,
        file_name TEXT NOT NULL,
        storage_path TEXT NOT NULL,
        description TEXT,
        FOREIGN KEY (patient_id) REFERENCES patients (id) ON DELETE CASCADE
    );

    -- Índices para otimização
    CREATE INDEX IF NOT EXISTS idx_patients_name ON patients (name);
    CREATE INDEX IF NOT EXISTS idx_patients_cpf ON patients (cpf);
    CREATE INDEX IF NOT EXISTS idx_appointments_patient_id ON appointments (patient_id);
    CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments (date, time);
    CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments (status);
    CREATE INDEX IF NOT EXISTS idx_treatments_patient_id ON treatments (patient_id);
    CREATE INDEX IF NOT EXISTS idx_financial_entries_patient_id ON financial_entries (patient_id);
    CREATE INDEX IF NOT EXISTS idx_financial_entries_treatment_id ON financial_entries (treatment_id);
    CREATE INDEX IF NOT EXISTS idx_financial_entries_due_date ON financial_entries (due_date);
    CREATE INDEX IF NOT EXISTS idx_documents_patient_id ON documents (patient_id);
    "#,
];

/// Executa todas as migrações pendentes no banco de dados
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Aplicando migrações de banco de dados...");

    let version: i64 = match sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
    {
        Ok(v) => v,
        Err(e) => {
            // Pode ser a primeira execução
            error!("Erro ao obter versão do banco: {}", e);
            0
        }
    };

    info!("Versão atual do banco: {}", version);

    for (i, migration_sql) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as i64;

        if migration_version <= version {
            info!("Migração {} já aplicada", migration_version);
            continue;
        }

        info!("Aplicando migração {}...", migration_version);

        let mut transaction = pool.begin().await.with_context(|| {
            format!("Falha ao iniciar transação para migração {}", migration_version)
        })?;

        sqlx::query(migration_sql)
            .execute(&mut *transaction)
            .await
            .with_context(|| format!("Falha ao executar migração {}", migration_version))?;

        // PRAGMA não aceita parâmetros
        sqlx::query(&format!("PRAGMA user_version = {}", migration_version))
            .execute(&mut *transaction)
            .await
            .with_context(|| format!("Falha ao atualizar versão para {}", migration_version))?;

        transaction.commit().await.with_context(|| {
            format!("Falha ao confirmar transação para migração {}", migration_version)
        })?;

        info!("Migração {} aplicada com sucesso", migration_version);
    }

    info!("Migrações concluídas. Versão atual: {}", MIGRATIONS.len());
    Ok(())
}
