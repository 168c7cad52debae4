use crate::storage::error::{Result, StorageError};
use crate::storage::record::Record;
use crate::storage::tuple::{FileId, PageIndex, RecordId, SlotIndex, TupleRecord};
use crate::storage::types::Schema;
use std::rc::Rc;

/// Bytes charged per slot on top of the record payload.
pub const SLOT_OVERHEAD: usize = 4;

#[derive(Debug, Default)]
struct HeapPage {
    records: Vec<TupleRecord>,
    used: usize,
}

impl HeapPage {
    fn free_space(&self, page_size: usize) -> usize {
        page_size - self.used
    }
}

pub struct HeapFile {
    file_id: FileId,
    schema: Rc<Schema>,
    page_size: usize,
    pages: Vec<HeapPage>,
    record_count: usize,
    // encoding buffer reused across inserts
    buf: Vec<u8>,
}

impl HeapFile {
    pub fn new(file_id: FileId, schema: Rc<Schema>, page_size: usize) -> Self {
        HeapFile {
            file_id,
            schema,
            page_size,
            pages: Vec::new(),
            record_count: 0,
            buf: Vec::new(),
        }
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn schema(&self) -> &Rc<Schema> {
        &self.schema
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn insert_record(&mut self, record: &Record) -> Result<RecordId> {
        record.encode_into(&mut self.buf);
        let needed = self.buf.len() + SLOT_OVERHEAD;
        if needed > self.page_size {
            return Err(StorageError::RecordTooLarge {
                size: self.buf.len(),
                page_size: self.page_size,
            });
        }

        let fits = self
            .pages
            .last()
            .map_or(false, |page| page.free_space(self.page_size) >= needed);
        if !fits {
            self.pages.push(HeapPage::default());
        }

        let page_index = self.pages.len() - 1;
        let page = &mut self.pages[page_index];
        let id = RecordId {
            page: page_index as PageIndex,
            slot: page.records.len() as SlotIndex,
        };
        page.records.push(TupleRecord(self.buf.clone()));
        page.used += needed;
        self.record_count += 1;
        Ok(id)
    }

    pub fn get_record(&self, id: RecordId, out: &mut Record) -> Result<()> {
        let tuple = self
            .pages
            .get(id.page as usize)
            .and_then(|page| page.records.get(id.slot as usize))
            .ok_or(StorageError::NoSuchRecord(id))?;
        out.decode_from(&tuple.0, &self.schema)
    }

    pub fn scanner(&self) -> HeapFileScanner<'_> {
        HeapFileScanner::new(self)
    }

    /// Scanner restricted to pages `[first_page, first_page + page_count)`.
    pub fn block_scanner(&self, first_page: usize, page_count: usize) -> HeapFileScanner<'_> {
        HeapFileScanner {
            file: self,
            page: first_page,
            slot: 0,
            end_page: (first_page + page_count).min(self.pages.len()),
        }
    }
}

/// Visits every record of a heap file exactly once in (page, slot) order.
pub struct HeapFileScanner<'file> {
    file: &'file HeapFile,
    page: usize,
    slot: usize,
    end_page: usize,
}

impl<'file> HeapFileScanner<'file> {
    pub fn new(file: &'file HeapFile) -> Self {
        HeapFileScanner {
            file,
            page: 0,
            slot: 0,
            end_page: file.pages.len(),
        }
    }

    /// Decodes the next record into `out`. `None` marks the end of the scan.
    pub fn get_next(&mut self, out: &mut Record) -> Result<Option<RecordId>> {
        while self.page < self.end_page {
            let page = &self.file.pages[self.page];
            if self.slot < page.records.len() {
                let id = RecordId {
                    page: self.page as PageIndex,
                    slot: self.slot as SlotIndex,
                };
                out.decode_from(&page.records[self.slot].0, &self.file.schema)?;
                self.slot += 1;
                return Ok(Some(id));
            }
            self.page += 1;
            self.slot = 0;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod test {
    use crate::storage::error::StorageError;
    use crate::storage::heap_file::HeapFile;
    use crate::storage::record::Record;
    use crate::storage::tuple::{FileId, RecordId};
    use crate::storage::types::{FieldEntry, FieldType, Schema, Value};
    use std::rc::Rc;

    fn schema() -> Rc<Schema> {
        Rc::new(Schema::new(vec![
            FieldEntry::new("id", FieldType::Integer),
            FieldEntry::new("name", FieldType::Text),
        ]))
    }

    #[test]
    fn scan() -> Result<(), StorageError> {
        let schema = schema();
        // 8 byte records plus slot overhead: two per page
        let mut file = HeapFile::new(FileId(0), schema.clone(), 30);
        for i in 0..5 {
            let rec = Record::from_values(&schema, vec![Value::Integer(i), Value::Text(String::new())])?;
            file.insert_record(&rec)?;
        }
        assert_eq!(file.record_count(), 5);
        assert_eq!(file.page_count(), 3);

        let mut scratch = Record::new(&schema);
        let mut scanner = file.scanner();
        let mut seen = Vec::new();
        while let Some(id) = scanner.get_next(&mut scratch)? {
            seen.push((id, scratch.values()[0].clone()));
        }
        assert_eq!(
            seen,
            (0..5)
                .map(|i| (
                    RecordId {
                        page: (i / 2) as u32,
                        slot: (i % 2) as u32
                    },
                    Value::Integer(i)
                ))
                .collect::<Vec<_>>()
        );

        let mut block = Vec::new();
        let mut scanner = file.block_scanner(1, 5);
        while let Some(_) = scanner.get_next(&mut scratch)? {
            block.push(scratch.values()[0].clone());
        }
        assert_eq!(block, vec![Value::Integer(2), Value::Integer(3), Value::Integer(4)]);

        Ok(())
    }

    #[test]
    fn empty_scan() -> Result<(), StorageError> {
        let schema = schema();
        let file = HeapFile::new(FileId(0), schema.clone(), 4096);
        let mut scratch = Record::new(&schema);
        assert_eq!(file.scanner().get_next(&mut scratch)?, None);
        Ok(())
    }

    #[test]
    fn get_record() -> Result<(), StorageError> {
        let schema = schema();
        let mut file = HeapFile::new(FileId(0), schema.clone(), 4096);
        let rec = Record::from_values(&schema, vec![7.into(), "seven".into()])?;
        let id = file.insert_record(&rec)?;

        let mut out = Record::new(&schema);
        file.get_record(id, &mut out)?;
        assert_eq!(out, rec);

        let missing = RecordId { page: 3, slot: 0 };
        assert_eq!(file.get_record(missing, &mut out), Err(StorageError::NoSuchRecord(missing)));
        Ok(())
    }

    #[test]
    fn record_too_large() {
        let schema = schema();
        let mut file = HeapFile::new(FileId(0), schema.clone(), 16);
        let rec = Record::from_values(&schema, vec![1.into(), "far too long for the page".into()]).unwrap();
        assert_matches!(file.insert_record(&rec), Err(StorageError::RecordTooLarge { .. }));
        assert_eq!(file.record_count(), 0);
    }
}
