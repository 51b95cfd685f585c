//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contacto_core::domain::{
    Category, NewSubmission, ResponseStatus, ResponseUpdate, Submission, User, UserCredentials,
};
use contacto_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct PgAdapter {
    pool: PgPool,
}

impl PgAdapter {
    /// Creates a new `PgAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn map_db_error(e: sqlx::Error, what: &str) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what.to_string()),
        other => PortError::Unexpected(other.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SubmissionRecord {
    id: i64,
    nombre: String,
    email: String,
    telefono: Option<String>,
    asunto: Option<String>,
    mensaje: String,
    referencia: Uuid,
    categoria: Option<String>,
    response_status: String,
    responded_by: Option<String>,
    response_date: Option<DateTime<Utc>>,
    response_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl SubmissionRecord {
    fn to_domain(self) -> Submission {
        Submission {
            id: self.id,
            nombre: self.nombre,
            email: self.email,
            telefono: self.telefono,
            asunto: self.asunto,
            mensaje: self.mensaje,
            referencia: self.referencia,
            // The intake flow only ever stores canonical labels, but rows
            // predating the closed enum may hold raw model text; the lenient
            // parse keeps those readable instead of failing the fetch.
            categoria: self.categoria.map(|c| Category::from_model_output(&c)),
            response_status: self
                .response_status
                .parse::<ResponseStatus>()
                .unwrap_or(ResponseStatus::Pendiente),
            responded_by: self.responded_by,
            response_date: self.response_date,
            response_message: self.response_message,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    email: String,
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct UserCredentialsRecord {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
}

impl UserCredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
        }
    }
}

const SUBMISSION_COLUMNS: &str = "id, nombre, email, telefono, asunto, mensaje, referencia, \
     categoria, response_status, responded_by, response_date, response_message, created_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for PgAdapter {
    async fn insert_submission(&self, new: NewSubmission) -> PortResult<Submission> {
        let sql = format!(
            "INSERT INTO clientes (nombre, email, telefono, asunto, mensaje, referencia) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {SUBMISSION_COLUMNS}"
        );
        let record = sqlx::query_as::<_, SubmissionRecord>(&sql)
            .bind(&new.nombre)
            .bind(&new.email)
            .bind(&new.telefono)
            .bind(&new.asunto)
            .bind(&new.mensaje)
            .bind(new.referencia)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.to_domain())
    }

    async fn set_category(&self, id: i64, category: Category) -> PortResult<()> {
        let result = sqlx::query("UPDATE clientes SET categoria = $1 WHERE id = $2")
            .bind(category.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Submission {} not found", id)));
        }
        Ok(())
    }

    async fn get_submission(&self, id: i64) -> PortResult<Submission> {
        let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM clientes WHERE id = $1");
        let record = sqlx::query_as::<_, SubmissionRecord>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(e, &format!("Submission {} not found", id)))?;

        Ok(record.to_domain())
    }

    async fn list_submissions(&self) -> PortResult<Vec<Submission>> {
        let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM clientes ORDER BY created_at DESC");
        let records = sqlx::query_as::<_, SubmissionRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(SubmissionRecord::to_domain).collect())
    }

    async fn update_response(&self, id: i64, update: ResponseUpdate) -> PortResult<Submission> {
        let sql = format!(
            "UPDATE clientes SET response_status = $1, responded_by = $2, response_date = $3, \
             response_message = COALESCE($4, response_message) \
             WHERE id = $5 RETURNING {SUBMISSION_COLUMNS}"
        );
        let record = sqlx::query_as::<_, SubmissionRecord>(&sql)
            .bind(update.response_status.as_str())
            .bind(&update.responded_by)
            .bind(update.response_date)
            .bind(&update.response_message)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(e, &format!("Submission {} not found", id)))?;

        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserCredentialsRecord>(
            "SELECT id, username, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, &format!("User with email {} not found", email)))?;

        Ok(record.to_domain())
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(UserRecord::to_domain).collect())
    }
}
