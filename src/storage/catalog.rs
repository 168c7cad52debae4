use crate::config::StorageConfig;
use crate::storage::error::{Result, StorageError};
use crate::storage::hash_index::{HashIndexFile, SearchKey, SearchKeyFormat};
use crate::storage::heap_file::HeapFile;
use crate::storage::record::Record;
use crate::storage::tuple::{FieldId, FileId, RecordId};
use crate::storage::types::{Schema, Value};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Registry of every relation and index. Files sit behind their own `RefCell`
/// so a reader of one relation can coexist with a writer of another.
pub struct Catalog {
    config: StorageConfig,
    next_file_id: FileId,
    file_ids: HashMap<String, FileId>,
    file_names: HashMap<FileId, String>,
    relations: HashMap<FileId, RefCell<HeapFile>>,
    indexes: HashMap<FileId, RefCell<HashIndexFile>>,
    relation_indexes: HashMap<FileId, Vec<FileId>>,
}

impl Catalog {
    pub fn new(config: StorageConfig) -> Self {
        Catalog {
            config,
            next_file_id: FileId(0),
            file_ids: HashMap::new(),
            file_names: HashMap::new(),
            relations: HashMap::new(),
            indexes: HashMap::new(),
            relation_indexes: HashMap::new(),
        }
    }

    pub fn create_relation(&mut self, name: &str, schema: Schema) -> Result<FileId> {
        let file_id = self.register_name(name)?;
        self.relations.insert(
            file_id,
            RefCell::new(HeapFile::new(file_id, Rc::new(schema), self.config.page_size)),
        );
        debug!(name, %file_id, "created relation");
        Ok(file_id)
    }

    /// Creates a hash index on `fields` of `relation` and loads the records
    /// already stored there.
    pub fn create_hash_index(&mut self, name: &str, relation: FileId, fields: &[FieldId]) -> Result<FileId> {
        let format = {
            let heap = self.heap_file(relation)?;
            if let Some(field) = fields.iter().find(|id| **id >= heap.schema().field_count()) {
                return Err(StorageError::NoSuchField(*field));
            }
            SearchKeyFormat::new(fields, heap.schema())
        };

        let file_id = self.register_name(name)?;
        let mut index = HashIndexFile::new(file_id, relation, format, self.config.index_buckets);
        if let Err(err) = self.load_index(relation, &mut index) {
            self.forget_name(file_id);
            return Err(err);
        }
        debug!(name, %file_id, %relation, entries = index.entry_count(), "created hash index");
        self.indexes.insert(file_id, RefCell::new(index));
        self.relation_indexes
            .entry(relation)
            .or_insert_with(Vec::new)
            .push(file_id);
        Ok(file_id)
    }

    /// Appends a row to `relation` and every index defined on it.
    pub fn insert_record(&self, relation: FileId, values: Vec<Value>) -> Result<RecordId> {
        let mut heap = self.heap_file_mut(relation)?;
        let record = Record::from_values(heap.schema(), values)?;
        let mut indexes = Vec::new();
        for index_id in self.relation_indexes.get(&relation).into_iter().flatten() {
            if let Some(index) = self.indexes.get(index_id) {
                indexes.push(index.try_borrow_mut().map_err(|_| StorageError::FileBusy(*index_id))?);
            }
        }

        let id = heap.insert_record(&record)?;
        for index in indexes.iter_mut() {
            let mut key = SearchKey::new(index.key_format().clone());
            key.set_from_record(&record);
            index.insert(&key, id);
        }
        Ok(id)
    }

    /// Removes a relation together with the indexes built on it.
    pub fn drop_relation(&mut self, relation: FileId) -> Result<()> {
        self.relations
            .remove(&relation)
            .ok_or(StorageError::NoSuchFile(relation))?;
        self.forget_name(relation);
        for index_id in self.relation_indexes.remove(&relation).unwrap_or_default() {
            self.indexes.remove(&index_id);
            self.forget_name(index_id);
        }
        debug!(%relation, "dropped relation");
        Ok(())
    }

    pub fn get_file_id(&self, name: &str) -> Option<FileId> {
        self.file_ids.get(name).copied()
    }

    pub fn get_file_name(&self, id: FileId) -> Option<&str> {
        self.file_names.get(&id).map(String::as_str)
    }

    pub fn get_schema(&self, relation: FileId) -> Result<Rc<Schema>> {
        Ok(self.heap_file(relation)?.schema().clone())
    }

    /// The relation an index was built over.
    pub fn relation_file_id(&self, index: FileId) -> Result<FileId> {
        Ok(self.hash_index(index)?.relation_id())
    }

    /// Fails with `FileBusy` while the relation is borrowed for writing.
    pub fn heap_file(&self, relation: FileId) -> Result<Ref<'_, HeapFile>> {
        self.relations
            .get(&relation)
            .ok_or(StorageError::NoSuchFile(relation))?
            .try_borrow()
            .map_err(|_| StorageError::FileBusy(relation))
    }

    /// Fails with `FileBusy` while the relation is borrowed at all.
    pub fn heap_file_mut(&self, relation: FileId) -> Result<RefMut<'_, HeapFile>> {
        self.relations
            .get(&relation)
            .ok_or(StorageError::NoSuchFile(relation))?
            .try_borrow_mut()
            .map_err(|_| StorageError::FileBusy(relation))
    }

    pub fn hash_index(&self, index: FileId) -> Result<Ref<'_, HashIndexFile>> {
        self.indexes
            .get(&index)
            .ok_or(StorageError::NotAnIndex(index))?
            .try_borrow()
            .map_err(|_| StorageError::FileBusy(index))
    }

    pub fn record_count(&self, relation: FileId) -> Result<usize> {
        Ok(self.heap_file(relation)?.record_count())
    }

    /// Every row of `relation`, decoded, in scan order.
    pub fn records(&self, relation: FileId) -> Result<Vec<Vec<Value>>> {
        let heap = self.heap_file(relation)?;
        let mut scratch = Record::new(heap.schema());
        let mut scanner = heap.scanner();
        let mut rows = Vec::with_capacity(heap.record_count());
        while scanner.get_next(&mut scratch)?.is_some() {
            rows.push(scratch.values().to_vec());
        }
        Ok(rows)
    }

    fn load_index(&self, relation: FileId, index: &mut HashIndexFile) -> Result<()> {
        let heap = self.heap_file(relation)?;
        let mut key = SearchKey::new(index.key_format().clone());
        let mut scratch = Record::new(heap.schema());
        let mut scanner = heap.scanner();
        while let Some(id) = scanner.get_next(&mut scratch)? {
            key.set_from_record(&scratch);
            index.insert(&key, id);
        }
        Ok(())
    }

    fn register_name(&mut self, name: &str) -> Result<FileId> {
        if self.file_ids.contains_key(name) {
            return Err(StorageError::AlreadyExists(name.to_owned()));
        }
        let file_id = self.next_file_id;
        self.next_file_id = FileId(file_id.0 + 1);
        self.file_ids.insert(name.to_owned(), file_id);
        self.file_names.insert(file_id, name.to_owned());
        Ok(file_id)
    }

    fn forget_name(&mut self, id: FileId) {
        if let Some(name) = self.file_names.remove(&id) {
            self.file_ids.remove(&name);
        }
    }
}

#[cfg(test)]
mod test {
    use crate::config::StorageConfig;
    use crate::storage::catalog::Catalog;
    use crate::storage::error::StorageError;
    use crate::storage::hash_index::SearchKey;
    use crate::storage::tuple::FileId;
    use crate::storage::types::{FieldEntry, FieldType, Schema, Value};

    fn people(catalog: &mut Catalog) -> FileId {
        catalog
            .create_relation(
                "people",
                Schema::new(vec![
                    FieldEntry::new("id", FieldType::Integer),
                    FieldEntry::new("name", FieldType::Text),
                ]),
            )
            .unwrap()
    }

    #[test]
    fn create_and_insert() -> Result<(), StorageError> {
        let mut catalog = Catalog::new(StorageConfig::default());
        let people = people(&mut catalog);
        assert_eq!(catalog.get_file_id("people"), Some(people));
        assert_eq!(catalog.get_file_name(people), Some("people"));

        catalog.insert_record(people, vec![1.into(), "ann".into()])?;
        catalog.insert_record(people, vec![2.into(), "bob".into()])?;
        assert_eq!(catalog.record_count(people)?, 2);
        assert_eq!(
            catalog.records(people)?,
            vec![
                vec![Value::Integer(1), Value::Text("ann".to_owned())],
                vec![Value::Integer(2), Value::Text("bob".to_owned())],
            ]
        );

        assert_matches!(
            catalog.insert_record(people, vec!["3".into(), "cy".into()]),
            Err(StorageError::TypeMismatch { field: 0, .. })
        );
        assert_matches!(
            catalog.create_relation("people", Schema::default()),
            Err(StorageError::AlreadyExists(_))
        );
        Ok(())
    }

    #[test]
    fn index_is_loaded_and_maintained() -> Result<(), StorageError> {
        let mut catalog = Catalog::new(StorageConfig::default());
        let people = people(&mut catalog);
        catalog.insert_record(people, vec![1.into(), "ann".into()])?;

        let index_id = catalog.create_hash_index("people_name", people, &[1])?;
        catalog.insert_record(people, vec![2.into(), "ann".into()])?;
        catalog.insert_record(people, vec![3.into(), "bob".into()])?;
        assert_eq!(catalog.relation_file_id(index_id)?, people);

        {
            let index = catalog.hash_index(index_id).unwrap();
            assert_eq!(index.entry_count(), 3);
            let mut key = SearchKey::new(index.key_format().clone());
            key.set_from_values(&["ann".into()])?;
            assert_eq!(index.scanner(&key).count(), 2);
        }

        assert_matches!(
            catalog.create_hash_index("bad", people, &[2]),
            Err(StorageError::NoSuchField(2))
        );
        Ok(())
    }

    #[test]
    fn drop_relation_removes_indexes() -> Result<(), StorageError> {
        let mut catalog = Catalog::new(StorageConfig::default());
        let people = people(&mut catalog);
        let index_id = catalog.create_hash_index("people_id", people, &[0])?;

        catalog.drop_relation(people)?;
        assert_eq!(catalog.get_file_id("people"), None);
        assert_eq!(catalog.get_file_id("people_id"), None);
        assert_matches!(catalog.hash_index(index_id).err(), Some(StorageError::NotAnIndex(_)));
        assert_matches!(catalog.heap_file(people).err(), Some(StorageError::NoSuchFile(_)));
        assert_matches!(catalog.relation_file_id(index_id), Err(StorageError::NotAnIndex(_)));
        Ok(())
    }

    #[test]
    fn conflicting_borrows_are_errors() -> Result<(), StorageError> {
        let mut catalog = Catalog::new(StorageConfig::default());
        let people = people(&mut catalog);
        let index_id = catalog.create_hash_index("people_id", people, &[0])?;

        {
            let _writer = catalog.heap_file_mut(people)?;
            assert_matches!(catalog.heap_file(people).err(), Some(StorageError::FileBusy(_)));
            assert_matches!(catalog.heap_file_mut(people).err(), Some(StorageError::FileBusy(_)));
        }
        {
            let _reader = catalog.heap_file(people)?;
            assert!(catalog.heap_file(people).is_ok());
            assert_matches!(
                catalog.insert_record(people, vec![1.into(), "ann".into()]),
                Err(StorageError::FileBusy(_))
            );
        }
        {
            // an index being read keeps inserts out without touching the heap
            let _index = catalog.hash_index(index_id)?;
            assert_matches!(
                catalog.insert_record(people, vec![1.into(), "ann".into()]),
                Err(StorageError::FileBusy(id)) if id == index_id
            );
        }
        assert_eq!(catalog.record_count(people)?, 0);
        Ok(())
    }
}
