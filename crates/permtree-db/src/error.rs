//! Database-specific error types and conversions.

use permtree_core::error::StoreError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique index violated on {entity}.{field}: {detail}")]
    UniqueViolation {
        entity: String,
        field: String,
        detail: String,
    },

    #[error("Malformed {entity} row: {detail}")]
    Malformed { entity: String, detail: String },
}

impl DbError {
    /// Classifies a failed write: unique index violations become
    /// [`DbError::UniqueViolation`], everything else [`DbError::Query`].
    pub(crate) fn from_write(entity: &str, err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::UniqueViolation {
                entity: entity.into(),
                field: violated_field(&message).to_string(),
                detail: message,
            }
        } else {
            DbError::Query(message)
        }
    }
}

/// Extracts the constrained attribute from a unique-index violation
/// message such as ``Database index `idx_resource_server_name` already
/// contains 'billing'``. Index names end in the attribute they guard.
fn violated_field(message: &str) -> &str {
    let index = message
        .split_once("index `")
        .and_then(|(_, rest)| rest.split_once('`'))
        .map(|(index, _)| index);
    match index {
        Some(index) if index.ends_with("_external_id") => "id",
        Some(index) => index.rsplit('_').next().unwrap_or(index),
        None => "unknown",
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            DbError::UniqueViolation {
                entity,
                field,
                detail,
            } => StoreError::Conflict {
                entity,
                field,
                detail,
            },
            DbError::Malformed { entity, detail } => {
                StoreError::Corrupt(format!("{entity}: {detail}"))
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violated_field_comes_from_the_index_name() {
        let message = "Database index `idx_resource_server_identifier` already contains \
                       'https://api', with record `resource_server:abc`";
        assert_eq!(violated_field(message), "identifier");
        assert_eq!(
            violated_field("Database index `idx_resource_sibling_handle` already contains 'x'"),
            "handle"
        );
        assert_eq!(
            violated_field("Database index `idx_action_external_id` already contains 'x'"),
            "id"
        );
        assert_eq!(violated_field("something else"), "unknown");
    }
}
