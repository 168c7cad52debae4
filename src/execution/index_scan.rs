use crate::execution::error::{RelOpsError, Result};
use crate::execution::operation::Operation;
use crate::execution::select::Select;
use crate::execution::state::open_index;
use crate::storage::catalog::Catalog;
use crate::storage::hash_index::HashIndexFile;
use crate::storage::record::Comp;
use crate::storage::tuple::{FieldId, FileId, RecordId};
use crate::storage::types::Value;
use std::cell::Ref;
use tracing::{debug, trace};

/// Selection that lets a hash index on exactly the predicate's fields pick
/// the candidate records, then re-checks every candidate against the whole
/// predicate.
pub struct IndexScan<'c> {
    select: Select<'c>,
    index: Ref<'c, HashIndexFile>,
}

impl<'c> IndexScan<'c> {
    /// Besides the `Select` checks, fails with `InvalidIndexRelation` when
    /// `index_id` is not an index over `rel_id`, and with `MismatchedFields`
    /// when the index key is not the selection's field list, in order.
    pub fn new(
        catalog: &'c Catalog,
        rel_id: FileId,
        index_id: FileId,
        result_id: FileId,
        fields: Vec<FieldId>,
        comps: Vec<Comp>,
        values: Vec<Value>,
    ) -> Result<Self> {
        let select = Select::new(catalog, rel_id, result_id, fields, comps, values)?;

        let index = open_index(catalog, index_id, rel_id)?;
        if index.key_format().field_list() != select.source.key.format().field_list() {
            return Err(RelOpsError::MismatchedFields(format!(
                "index key {:?} does not match selection fields {:?}",
                index.key_format().field_list(),
                select.source.key.format().field_list()
            )));
        }

        Ok(IndexScan { select, index })
    }
}

impl<'c> Operation for IndexScan<'c> {
    fn result_id(&self) -> FileId {
        self.select.result_id()
    }

    fn run_operation(self) -> Result<usize> {
        let IndexScan { select, index } = self;
        let Select {
            mut result,
            mut source,
            predicate,
        } = select;

        // Probing only finds keys equal to the literals, which is the whole
        // candidate set only when every conjunct is an equality.
        let probe = predicate.conjuncts().iter().all(|c| c.comp == Comp::Equal);
        let candidates: Box<dyn Iterator<Item = RecordId> + '_> = if probe {
            source.key.set_from_values(&predicate.values())?;
            Box::new(index.scanner(&source.key))
        } else {
            Box::new(index.entries())
        };

        let mut produced = 0;
        for id in candidates {
            source.file.get_record(id, &mut source.record)?;
            source.record_id = Some(id);
            if predicate.matches(&source.record) {
                trace!(?id, "admitted");
                result.file.insert_record(&source.record)?;
                produced += 1;
            } else {
                trace!(?id, "rejected");
            }
        }

        debug!(
            source = %source.file_id,
            index = %index.file_id(),
            result = %result.file_id,
            probe,
            produced,
            "index scan finished"
        );
        Ok(produced)
    }
}
