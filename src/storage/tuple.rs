use std::fmt;

#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// Zero-based position of a field within a schema.
pub type FieldId = usize;

pub type PageIndex = u32;
pub type SlotIndex = u32;

#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct RecordId {
    pub page: PageIndex,
    pub slot: SlotIndex,
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct TupleRecord(pub Vec<u8>);
