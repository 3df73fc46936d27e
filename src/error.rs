use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DirectoryError>;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("{field} is {actual} characters long, the maximum is {max}")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    #[error(transparent)]
    Database(DbErr),
}

impl DirectoryError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn is_referential_integrity(&self) -> bool {
        matches!(self, Self::ReferentialIntegrity(_))
    }
}

impl From<DbErr> for DirectoryError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::ForeignKeyConstraintViolation(msg)) = err.sql_err() {
            return Self::ReferentialIntegrity(msg);
        }
        // Some drivers only report the constraint in the message text
        if err.to_string().contains("FOREIGN KEY constraint failed") {
            return Self::ReferentialIntegrity(err.to_string());
        }
        Self::Database(err)
    }
}
