use crate::execution::error::{RelOpsError, Result};
use crate::storage::catalog::Catalog;
use crate::storage::error::StorageError;
use crate::storage::hash_index::{HashIndexFile, SearchKey, SearchKeyFormat};
use crate::storage::heap_file::HeapFile;
use crate::storage::record::Record;
use crate::storage::tuple::{FieldId, FileId, RecordId};
use crate::storage::types::Schema;
use std::cell::{Ref, RefMut};
use std::ops::Deref;
use std::rc::Rc;

/// Scratch resources an operator holds for one relation: the borrowed file,
/// its schema, a reusable record and a reusable search key. Everything is
/// acquired in the constructor and released when the state is dropped.
pub struct FileState<F> {
    pub file: F,
    pub file_id: FileId,
    pub schema: Rc<Schema>,
    pub record: Record,
    pub record_id: Option<RecordId>,
    pub key: SearchKey,
}

/// State of a relation an operator reads from.
pub type SourceState<'c> = FileState<Ref<'c, HeapFile>>;
/// State of the relation an operator writes its result into.
pub type ResultState<'c> = FileState<RefMut<'c, HeapFile>>;

impl<F: Deref<Target = HeapFile>> FileState<F> {
    fn from_file(file: F, file_id: FileId, key_fields: &[FieldId]) -> Self {
        let schema = file.schema().clone();
        let record = Record::new(&schema);
        let key = SearchKey::new(SearchKeyFormat::new(key_fields, &schema));
        FileState {
            file,
            file_id,
            schema,
            record,
            record_id: None,
            key,
        }
    }
}

impl<'c> SourceState<'c> {
    /// `key_fields` must be in range for the relation's schema when the key
    /// is going to be used; out-of-range ids are simply left out of the key.
    pub fn open(catalog: &'c Catalog, file_id: FileId, key_fields: &[FieldId]) -> Result<Self> {
        let file = catalog.heap_file(file_id)?;
        Ok(Self::from_file(file, file_id, key_fields))
    }
}

impl<'c> ResultState<'c> {
    pub fn open(catalog: &'c Catalog, file_id: FileId) -> Result<Self> {
        let file = catalog.heap_file_mut(file_id)?;
        Ok(Self::from_file(file, file_id, &[]))
    }

    /// Appends the state's scratch record to the result relation.
    pub fn insert_scratch(&mut self) -> Result<RecordId> {
        let id = self.file.insert_record(&self.record)?;
        self.record_id = Some(id);
        Ok(id)
    }
}

/// Borrows the hash index `index_id`, which must have been built over
/// `relation_id`.
pub(crate) fn open_index(catalog: &Catalog, index_id: FileId, relation_id: FileId) -> Result<Ref<'_, HashIndexFile>> {
    let index = catalog.hash_index(index_id).map_err(|err| match err {
        StorageError::NotAnIndex(_) => {
            RelOpsError::InvalidIndexRelation(format!("{} is not a hash index", index_id))
        }
        other => other.into(),
    })?;
    if index.relation_id() != relation_id {
        return Err(RelOpsError::InvalidIndexRelation(format!(
            "{} indexes {}, not {}",
            index_id,
            index.relation_id(),
            relation_id
        )));
    }
    Ok(index)
}
