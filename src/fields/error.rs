use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldNameError {
    #[error("Field '{name}' cannot be given a unique name within {max_length} characters")]
    FieldNameCollision { name: String, max_length: usize },

    #[error("Field name length budget must be at least one character")]
    ZeroLength,

    #[error("Field '{0}' is not present in the table")]
    UnknownField(String),

    #[error("Field '{0}' already exists in the table")]
    DuplicateField(String),
}
