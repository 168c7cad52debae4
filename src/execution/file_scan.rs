use crate::execution::error::Result;
use crate::execution::operation::Operation;
use crate::execution::select::Select;
use crate::storage::catalog::Catalog;
use crate::storage::record::Comp;
use crate::storage::tuple::{FieldId, FileId};
use crate::storage::types::Value;
use tracing::debug;

/// Selection by a full sequential scan of the source relation.
pub struct FileScan<'c> {
    select: Select<'c>,
}

impl<'c> FileScan<'c> {
    pub fn new(
        catalog: &'c Catalog,
        rel_id: FileId,
        result_id: FileId,
        fields: Vec<FieldId>,
        comps: Vec<Comp>,
        values: Vec<Value>,
    ) -> Result<Self> {
        Ok(FileScan {
            select: Select::new(catalog, rel_id, result_id, fields, comps, values)?,
        })
    }
}

impl<'c> Operation for FileScan<'c> {
    fn result_id(&self) -> FileId {
        self.select.result_id()
    }

    fn run_operation(self) -> Result<usize> {
        let Select {
            mut result,
            mut source,
            predicate,
        } = self.select;

        let mut produced = 0;
        let mut scanner = source.file.scanner();
        while let Some(id) = scanner.get_next(&mut source.record)? {
            source.record_id = Some(id);
            if predicate.matches(&source.record) {
                result.file.insert_record(&source.record)?;
                produced += 1;
            }
        }

        debug!(source = %source.file_id, result = %result.file_id, produced, "file scan finished");
        Ok(produced)
    }
}
