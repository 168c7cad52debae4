#[cfg(test)]
#[macro_use]
extern crate assert_matches;

pub mod config;
pub mod execution;
pub mod storage;

pub use config::Config;
pub use execution::{JoinKind, Operation, RelOpsError, RelOpsManager, SelectKind};
pub use storage::catalog::Catalog;
pub use storage::record::Comp;
pub use storage::tuple::{FieldId, FileId};
pub use storage::types::{FieldEntry, FieldType, Schema, Value};
