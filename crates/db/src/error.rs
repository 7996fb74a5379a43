//! Mapping of `SeaORM` errors onto [`AppError`].

use community_common::AppError;
use sea_orm::{DbErr, RuntimeErr, SqlErr, sqlx};

/// Classify a store error into the application taxonomy.
///
/// Foreign key failures become [`AppError::ReferenceViolation`], transport and
/// pool failures become [`AppError::StoreUnavailable`]. Everything else is
/// passed through as [`AppError::Database`].
#[must_use]
pub fn classify(err: DbErr) -> AppError {
    if let Some(SqlErr::ForeignKeyConstraintViolation(detail)) = err.sql_err() {
        return AppError::ReferenceViolation(detail);
    }

    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => unavailable(&err),
        DbErr::Exec(RuntimeErr::SqlxError(ref e)) | DbErr::Query(RuntimeErr::SqlxError(ref e))
            if is_transport_error(e) =>
        {
            unavailable(&err)
        }
        DbErr::RecordNotFound(detail) => AppError::NotFound(detail),
        DbErr::RecordNotUpdated => AppError::NotFound("Record not updated".to_string()),
        other => AppError::Database(other.to_string()),
    }
}

fn unavailable(err: &DbErr) -> AppError {
    tracing::warn!(error = %err, "Database unreachable");
    AppError::StoreUnavailable(err.to_string())
}

fn is_transport_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}
