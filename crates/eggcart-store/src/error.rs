//! Mapping from driver errors to the domain taxonomy.

use eggcart_core::error::DomainError;

/// SQLSTATE for `insufficient_privilege`, raised by row-level security.
const INSUFFICIENT_PRIVILEGE: &str = "42501";

pub(crate) fn db_error(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::RowNotFound => DomainError::NotFound(err.to_string()),
        sqlx::Error::Database(db) if db.code().as_deref() == Some(INSUFFICIENT_PRIVILEGE) => {
            DomainError::PermissionDenied(db.message().to_owned())
        }
        _ => DomainError::Infrastructure(err.to_string()),
    }
}

pub(crate) fn quantity_from_db(value: i32) -> Result<u32, DomainError> {
    u32::try_from(value)
        .map_err(|_| DomainError::Infrastructure(format!("negative quantity {value} in database")))
}

pub(crate) fn quantity_to_db(value: u32) -> Result<i32, DomainError> {
    i32::try_from(value)
        .map_err(|_| DomainError::Validation(format!("quantity {value} is too large")))
}
