//! Modelos de dados do consultório
//!
//! As listagens trafegam como [`Record`](crate::value::Record) normalizados;
//! aqui ficam os enums de domínio, os dados de entrada das operações de
//! escrita e os poucos registros tipados usados na autenticação.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// Status possíveis de um agendamento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AppointmentStatus {
    /// Agendamento inicial
    #[default]
    #[serde(rename = "Agendado")]
    Scheduled,
    /// Confirmado pelo paciente
    #[serde(rename = "Confirmado")]
    Confirmed,
    /// Consulta realizada
    #[serde(rename = "Realizado")]
    Done,
    #[serde(rename = "Cancelado")]
    Canceled,
    /// Paciente não compareceu
    #[serde(rename = "Não Compareceu")]
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Done,
        AppointmentStatus::Canceled,
        AppointmentStatus::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Agendado",
            AppointmentStatus::Confirmed => "Confirmado",
            AppointmentStatus::Done => "Realizado",
            AppointmentStatus::Canceled => "Cancelado",
            AppointmentStatus::NoShow => "Não Compareceu",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Status de agendamento inválido: {}", s))
    }
}

/// Situação de um lançamento financeiro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pendente,
    Pago,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pendente => "pendente",
            PaymentStatus::Pago => "pago",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tipo de documento gerado para o paciente
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Atestado
    Certificate,
    /// Receita
    Prescription,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Certificate => "certificate",
            DocumentType::Prescription => "prescription",
        }
    }

    /// Prefixo usado no nome do arquivo
    pub fn file_prefix(&self) -> &'static str {
        match self {
            DocumentType::Certificate => "atestado",
            DocumentType::Prescription => "receita",
        }
    }

    /// Título impresso no documento
    pub fn title(&self) -> &'static str {
        match self {
            DocumentType::Certificate => "ATESTADO ODONTOLÓGICO",
            DocumentType::Prescription => "RECEITA",
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "certificate" | "atestado" => Ok(DocumentType::Certificate),
            "prescription" | "receita" => Ok(DocumentType::Prescription),
            _ => Err(format!("Tipo de documento inválido: {}", s)),
        }
    }
}

/// Dados de cadastro/edição de paciente
#[derive(Debug, Clone, Default)]
pub struct NewPatient {
    pub name: String,
    /// Apenas dígitos
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: i64,
    pub service: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewFinancialEntry {
    pub patient_id: i64,
    pub treatment_id: Option<i64>,
    pub appointment_id: Option<i64>,
    pub description: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewTreatment {
    pub patient_id: i64,
    pub tooth_number: i32,
    pub treatment_type: String,
    pub treatment_date: NaiveDate,
    pub notes: Option<String>,
    pub next_session_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub completed: bool,
}

impl NewTreatment {
    /// Descrição do lançamento criado automaticamente para o tratamento
    pub fn billing_description(&self) -> String {
        format!("Trat.: {} (Dente {})", self.treatment_type, self.tooth_number)
    }

    /// Valor a cobrar, quando positivo
    pub fn billable_amount(&self) -> Option<Decimal> {
        self.amount.filter(|a| a.is_sign_positive() && !a.is_zero())
    }
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub patient_id: i64,
    pub document_type: DocumentType,
    pub generation_time: chrono::NaiveDateTime,
    pub file_name: String,
    pub storage_path: String,
    pub description: Option<String>,
}

/// Localização de um documento armazenado, usada no download
#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub id: i64,
    pub patient_id: i64,
    pub file_name: String,
    pub storage_path: String,
}

impl FromRow<'_, SqliteRow> for DocumentFile {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            patient_id: row.try_get("patient_id")?,
            file_name: row.try_get("file_name")?,
            storage_path: row.try_get("storage_path")?,
        })
    }
}

/// Perfil de usuário da equipe (login)
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl FromRow<'_, SqliteRow> for Profile {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
            role: row.try_get("role")?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}

/// Credenciais de acesso ao portal do paciente
#[derive(Debug, Clone)]
pub struct PatientCredentials {
    pub id: i64,
    pub name: String,
    pub password_hash: Option<String>,
}

impl FromRow<'_, SqliteRow> for PatientCredentials {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}

/// Mantém apenas os dígitos de um CPF digitado com máscara
pub fn cpf_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Aceita `HH:MM` ou `HH:MM:SS`
pub fn parse_time_input(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .ok()
}
