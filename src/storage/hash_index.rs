use crate::storage::error::{Result, StorageError};
use crate::storage::record::Record;
use crate::storage::tuple::{FieldId, FileId, RecordId};
use crate::storage::tuple_serde;
use crate::storage::types::{FieldType, Schema, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Ordered list of the fields a search key is built from.
#[derive(Debug, Eq, PartialEq, Clone, Default)]
pub struct SearchKeyFormat {
    fields: Vec<FieldId>,
    types: Vec<FieldType>,
}

impl SearchKeyFormat {
    /// Callers guarantee every id is in range for `schema`.
    pub fn new(fields: &[FieldId], schema: &Schema) -> Self {
        SearchKeyFormat {
            fields: fields.to_vec(),
            types: fields
                .iter()
                .filter_map(|id| schema.field(*id).map(|entry| entry.field_type))
                .collect(),
        }
    }

    pub fn field_list(&self) -> &[FieldId] {
        &self.fields
    }

    pub fn field_types(&self) -> &[FieldType] {
        &self.types
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Default)]
pub struct SearchKey {
    format: SearchKeyFormat,
    data: Vec<u8>,
}

impl SearchKey {
    pub fn new(format: SearchKeyFormat) -> Self {
        SearchKey {
            format,
            data: Vec::new(),
        }
    }

    pub fn format(&self) -> &SearchKeyFormat {
        &self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encodes literal values, one per key field, in key order.
    pub fn set_from_values(&mut self, values: &[Value]) -> Result<()> {
        if values.len() != self.format.types.len() {
            return Err(StorageError::WrongArity {
                expected: self.format.types.len(),
                found: values.len(),
            });
        }
        for (i, (value, expected)) in values.iter().zip(&self.format.types).enumerate() {
            if value.field_type() != *expected {
                return Err(StorageError::TypeMismatch {
                    field: self.format.fields[i],
                    expected: *expected,
                    found: value.field_type(),
                });
            }
        }
        encode_key(values.iter(), &mut self.data);
        Ok(())
    }

    /// Encodes the key fields of `record`, which must follow the key's schema.
    pub fn set_from_record(&mut self, record: &Record) {
        encode_fields(record, &self.format.fields, &mut self.data);
    }

    /// Encodes `record[fields[i]]` as key component i.
    pub fn set_from_fields(&mut self, record: &Record, fields: &[FieldId]) {
        encode_fields(record, fields, &mut self.data);
    }

    pub fn bucket(&self, num_buckets: usize) -> usize {
        bucket_for(&self.data, num_buckets)
    }
}

fn encode_fields(record: &Record, fields: &[FieldId], data: &mut Vec<u8>) {
    encode_key(fields.iter().filter_map(|id| record.field(*id)), data);
}

/// Key bytes for `values`. Values that compare equal must encode equally, so
/// `-0.0` is stored as `0.0`.
fn encode_key<'v>(values: impl Iterator<Item = &'v Value>, data: &mut Vec<u8>) {
    let values = values
        .map(|value| match value {
            Value::Float(f) if *f == 0.0 => Value::Float(0.0),
            other => other.clone(),
        })
        .collect::<Vec<_>>();
    tuple_serde::serialize_into(&values, data);
}

pub fn bucket_for(key: &[u8], num_buckets: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % num_buckets as u64) as usize
}

/// A static hash index over one relation.
pub struct HashIndexFile {
    file_id: FileId,
    relation_id: FileId,
    key_format: SearchKeyFormat,
    buckets: Vec<Vec<(Vec<u8>, RecordId)>>,
    entry_count: usize,
}

impl HashIndexFile {
    pub fn new(file_id: FileId, relation_id: FileId, key_format: SearchKeyFormat, num_buckets: usize) -> Self {
        HashIndexFile {
            file_id,
            relation_id,
            key_format,
            buckets: (0..num_buckets.max(1)).map(|_| Vec::new()).collect(),
            entry_count: 0,
        }
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn relation_id(&self) -> FileId {
        self.relation_id
    }

    pub fn key_format(&self) -> &SearchKeyFormat {
        &self.key_format
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn insert(&mut self, key: &SearchKey, id: RecordId) {
        let bucket = key.bucket(self.buckets.len());
        self.buckets[bucket].push((key.data().to_vec(), id));
        self.entry_count += 1;
    }

    pub fn scanner<'index>(&'index self, key: &'index SearchKey) -> HashIndexScanner<'index> {
        HashIndexScanner {
            entries: &self.buckets[key.bucket(self.buckets.len())],
            key: key.data(),
            position: 0,
        }
    }

    /// Every indexed record id, bucket by bucket.
    pub fn entries(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.buckets.iter().flatten().map(|(_, id)| *id)
    }
}

/// Enumerates the record ids stored under one search key.
pub struct HashIndexScanner<'index> {
    entries: &'index [(Vec<u8>, RecordId)],
    key: &'index [u8],
    position: usize,
}

impl<'index> HashIndexScanner<'index> {
    pub fn get_next(&mut self) -> Option<RecordId> {
        while self.position < self.entries.len() {
            let (key, id) = &self.entries[self.position];
            self.position += 1;
            if key.as_slice() == self.key {
                return Some(*id);
            }
        }
        None
    }
}

impl<'index> Iterator for HashIndexScanner<'index> {
    type Item = RecordId;

    fn next(&mut self) -> Option<RecordId> {
        self.get_next()
    }
}

#[cfg(test)]
mod test {
    use crate::storage::error::StorageError;
    use crate::storage::hash_index::{HashIndexFile, SearchKey, SearchKeyFormat};
    use crate::storage::record::Record;
    use crate::storage::tuple::{FileId, RecordId};
    use crate::storage::types::{FieldEntry, FieldType, Schema, Value};

    fn schema() -> Schema {
        Schema::new(vec![
            FieldEntry::new("id", FieldType::Integer),
            FieldEntry::new("dept", FieldType::Text),
        ])
    }

    #[test]
    fn lookup() -> Result<(), StorageError> {
        let schema = schema();
        let format = SearchKeyFormat::new(&[1], &schema);
        let mut index = HashIndexFile::new(FileId(1), FileId(0), format.clone(), 4);

        let mut key = SearchKey::new(format.clone());
        for (slot, dept) in ["cs", "math", "cs", "bio"].iter().enumerate() {
            let rec = Record::from_values(&schema, vec![Value::Integer(slot as i32), (*dept).into()])?;
            key.set_from_record(&rec);
            index.insert(&key, RecordId { page: 0, slot: slot as u32 });
        }
        assert_eq!(index.entry_count(), 4);

        let mut probe = SearchKey::new(format);
        probe.set_from_values(&["cs".into()])?;
        let mut found = index.scanner(&probe).collect::<Vec<_>>();
        found.sort();
        assert_eq!(
            found,
            vec![RecordId { page: 0, slot: 0 }, RecordId { page: 0, slot: 2 }]
        );

        probe.set_from_values(&["physics".into()])?;
        assert_eq!(index.scanner(&probe).get_next(), None);
        Ok(())
    }

    #[test]
    fn signed_zeros_share_a_key() -> Result<(), StorageError> {
        let schema = Schema::new(vec![FieldEntry::new("f", FieldType::Float)]);
        let format = SearchKeyFormat::new(&[0], &schema);
        let mut index = HashIndexFile::new(FileId(1), FileId(0), format.clone(), 8);
        let mut key = SearchKey::new(format.clone());
        for (slot, f) in [-0.0f32, 0.0, 1.0].iter().enumerate() {
            key.set_from_record(&Record::from_values(&schema, vec![Value::Float(*f)])?);
            index.insert(&key, RecordId { page: 0, slot: slot as u32 });
        }

        let mut probe = SearchKey::new(format);
        probe.set_from_values(&[Value::Float(0.0)])?;
        assert_eq!(index.scanner(&probe).count(), 2);
        probe.set_from_values(&[Value::Float(-0.0)])?;
        assert_eq!(index.scanner(&probe).count(), 2);
        Ok(())
    }

    #[test]
    fn key_values_are_type_checked() {
        let mut key = SearchKey::new(SearchKeyFormat::new(&[0], &schema()));
        assert_matches!(
            key.set_from_values(&["1".into()]),
            Err(StorageError::TypeMismatch { field: 0, .. })
        );
        assert_matches!(
            key.set_from_values(&[1.into(), 2.into()]),
            Err(StorageError::WrongArity { expected: 1, found: 2 })
        );
    }
}
