use thiserror::Error;

/// Business errors shared by the catalog and accounts workflows.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid credentials")]
    Unauthorized,
    #[error("database error: {0}")]
    Db(String),
    #[error("hashing error: {0}")]
    Hash(String),
    #[error("token error: {0}")]
    Token(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(entity.to_string())
    }

    /// Join field-level problems into one validation error, keeping the
    /// per-field detail in the message.
    pub fn fields(problems: Vec<(&'static str, &'static str)>) -> Self {
        let msg = problems
            .iter()
            .map(|(field, problem)| format!("{}: {}", field, problem))
            .collect::<Vec<_>>()
            .join("; ");
        Self::Validation(msg)
    }
}
