use crate::execution::error::Result;
use crate::execution::file_scan::FileScan;
use crate::execution::index_scan::IndexScan;
use crate::execution::join::Join;
use crate::execution::project::Project;
use crate::storage::tuple::FileId;

/// A relational operator bound to its source relations and a freshly created
/// result relation.
pub trait Operation {
    fn result_id(&self) -> FileId;

    /// Populates the result relation and returns how many records were
    /// written. Consumes the operator, so every operator runs at most once.
    fn run_operation(self) -> Result<usize>;
}

pub enum Operator<'c> {
    FileScan(FileScan<'c>),
    IndexScan(IndexScan<'c>),
    Project(Project<'c>),
    Join(Join<'c>),
}

impl<'c> Operation for Operator<'c> {
    fn result_id(&self) -> FileId {
        match self {
            Operator::FileScan(op) => op.result_id(),
            Operator::IndexScan(op) => op.result_id(),
            Operator::Project(op) => op.result_id(),
            Operator::Join(op) => op.result_id(),
        }
    }

    fn run_operation(self) -> Result<usize> {
        match self {
            Operator::FileScan(op) => op.run_operation(),
            Operator::IndexScan(op) => op.run_operation(),
            Operator::Project(op) => op.run_operation(),
            Operator::Join(op) => op.run_operation(),
        }
    }
}
