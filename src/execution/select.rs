use crate::execution::error::Result;
use crate::execution::predicate::Predicate;
use crate::execution::state::{ResultState, SourceState};
use crate::storage::catalog::Catalog;
use crate::storage::record::Comp;
use crate::storage::tuple::{FieldId, FileId};
use crate::storage::types::Value;

/// Shared part of the selection operators: the predicate plus the states of
/// the relation being filtered and the result it is filtered into.
pub struct Select<'c> {
    pub(crate) result: ResultState<'c>,
    pub(crate) source: SourceState<'c>,
    pub(crate) predicate: Predicate,
}

impl<'c> Select<'c> {
    /// Fails with `MismatchedFields` when the three lists differ in length or
    /// name a field the relation lacks. Any state opened so far is released
    /// before the error is returned.
    pub fn new(
        catalog: &'c Catalog,
        rel_id: FileId,
        result_id: FileId,
        fields: Vec<FieldId>,
        comps: Vec<Comp>,
        values: Vec<Value>,
    ) -> Result<Self> {
        let result = ResultState::open(catalog, result_id)?;
        let source = SourceState::open(catalog, rel_id, &fields)?;
        let predicate = Predicate::new(&source.schema, fields, comps, values)?;

        Ok(Select {
            result,
            source,
            predicate,
        })
    }

    pub fn result_id(&self) -> FileId {
        self.result.file_id
    }
}
