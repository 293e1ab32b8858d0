use sea_orm::DbErr;

/// Failure of a service operation.
///
/// Only [`ServiceError::NotFound`] has a dedicated HTTP status; every other
/// variant is reported as an internal error by the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The entity to create already carries an identifier, a unique key is
    /// taken, or the supplied version is stale.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The operation is refused for the current request context.
    #[error("Operation not permitted: {0}")]
    NotPermitted(String),

    /// The request is missing a field the operation needs.
    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// A version-guarded update matched no row: someone else wrote first.
    pub(crate) fn from_update(e: DbErr, entity: &'static str, id: i32, what: &str) -> Self {
        match e {
            DbErr::RecordNotUpdated => {
                tracing::warn!(entity, id, "row changed by a concurrent update");
                Self::Conflict(format!("{entity} {id} was modified concurrently"))
            }
            e => Self::from_write(e, what),
        }
    }

    /// Map a write failure, turning unique-constraint violations into conflicts.
    pub(crate) fn from_write(e: DbErr, what: &str) -> Self {
        let msg = e.to_string();
        if msg.contains("UNIQUE") || msg.contains("unique") {
            Self::Conflict(format!("{what} already exists"))
        } else {
            Self::Db(e)
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_update_is_conflict() {
        let err = ServiceError::from_update(DbErr::RecordNotUpdated, "Account", 3, "Account username");
        assert!(matches!(err, ServiceError::Conflict(ref m) if m.contains("Account 3")));

        let err = ServiceError::from_update(
            DbErr::Custom("UNIQUE constraint failed: account.username".into()),
            "Account",
            3,
            "Account username",
        );
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == "Account username already exists"));

        let err = ServiceError::from_update(DbErr::Custom("disk full".into()), "Account", 3, "x");
        assert!(matches!(err, ServiceError::Db(_)));
    }
}
