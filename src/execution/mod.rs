pub mod error;
mod file_scan;
mod index_scan;
pub mod join;
mod manager;
mod operation;
pub mod predicate;
mod project;
mod select;
mod state;

pub use error::{RelOpsError, Result};
pub use file_scan::FileScan;
pub use index_scan::IndexScan;
pub use join::{Join, JoinKind};
pub use manager::{RelOpsManager, SelectKind};
pub use operation::{Operation, Operator};
pub use project::Project;
pub use select::Select;
pub use state::{FileState, ResultState, SourceState};
