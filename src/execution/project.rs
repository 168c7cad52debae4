use crate::execution::error::Result;
use crate::execution::operation::Operation;
use crate::execution::predicate::validate_fields;
use crate::execution::state::{ResultState, SourceState};
use crate::storage::catalog::Catalog;
use crate::storage::tuple::{FieldId, FileId};
use tracing::debug;

/// Copies `fields` of every source record, in the given order, into the
/// result relation. One result row per source row; nothing is deduplicated.
pub struct Project<'c> {
    result: ResultState<'c>,
    source: SourceState<'c>,
    fields: Vec<FieldId>,
}

impl<'c> Project<'c> {
    /// The result relation's schema must already be the projected schema.
    pub fn new(catalog: &'c Catalog, rel_id: FileId, result_id: FileId, fields: Vec<FieldId>) -> Result<Self> {
        let result = ResultState::open(catalog, result_id)?;
        let source = SourceState::open(catalog, rel_id, &fields)?;
        validate_fields(&source.schema, &fields)?;

        Ok(Project {
            result,
            source,
            fields,
        })
    }
}

impl<'c> Operation for Project<'c> {
    fn result_id(&self) -> FileId {
        self.result.file_id
    }

    fn run_operation(self) -> Result<usize> {
        let Project {
            mut result,
            mut source,
            fields,
        } = self;

        let mut produced = 0;
        let mut scanner = source.file.scanner();
        while scanner.get_next(&mut source.record)?.is_some() {
            source.record.copy_fields_into(&fields, &mut result.record);
            result.insert_scratch()?;
            produced += 1;
        }

        debug!(source = %source.file_id, result = %result.file_id, produced, "project finished");
        Ok(produced)
    }
}
