use crate::storage::error::StorageError;
use crate::storage::tuple::FieldId;
use crate::storage::types::FieldType;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RelOpsError {
    /// Predicate or field lists of the wrong shape, or naming fields the
    /// relation does not have.
    #[error("mismatched fields: {0}")]
    MismatchedFields(String),
    #[error("invalid index relation: {0}")]
    InvalidIndexRelation(String),
    #[error("field {field} is {expected} but the literal is {found}")]
    TypeMismatch {
        field: FieldId,
        expected: FieldType,
        found: FieldType,
    },
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, RelOpsError>;
