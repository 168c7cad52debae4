use crate::storage::tuple::{FileId, RecordId};
use crate::storage::tuple_serde::SerdeError;
use crate::storage::types::FieldType;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StorageError {
    #[error("no such file {0}")]
    NoSuchFile(FileId),
    #[error("no such field {0}")]
    NoSuchField(usize),
    #[error("no such record {0:?}")]
    NoSuchRecord(RecordId),
    #[error("resource [{0:?}] already exists")]
    AlreadyExists(String),
    #[error("{0} is not a hash index")]
    NotAnIndex(FileId),
    /// The file is already borrowed in a conflicting way, e.g. read and
    /// written by the same operator.
    #[error("{0} is in use")]
    FileBusy(FileId),
    #[error("field {field} expects {expected} but got {found}")]
    TypeMismatch {
        field: usize,
        expected: FieldType,
        found: FieldType,
    },
    #[error("expected {expected} values but got {found}")]
    WrongArity { expected: usize, found: usize },
    #[error("record of {size} bytes does not fit in a {page_size} byte page")]
    RecordTooLarge { size: usize, page_size: usize },
    #[error("{0}")]
    TupleSerde(#[from] SerdeError),
}

pub type Result<T> = std::result::Result<T, StorageError>;
