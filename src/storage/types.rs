use crate::storage::tuple::FieldId;
use std::fmt;

#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub enum FieldType {
    Integer,
    Float,
    Text,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// A field value carrying its own type tag.
#[derive(Debug, PartialEq, PartialOrd, Clone)]
pub enum Value {
    Integer(i32),
    Float(f32),
    Text(String),
}

impl Value {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Integer(_) => FieldType::Integer,
            Self::Float(_) => FieldType::Float,
            Self::Text(_) => FieldType::Text,
        }
    }

    /// Placeholder used to size scratch records before anything is read into them.
    pub fn default_for(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Integer => Self::Integer(0),
            FieldType::Float => Self::Float(0.0),
            FieldType::Text => Self::Text(String::new()),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct FieldEntry {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldEntry {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        FieldEntry {
            name: name.to_owned(),
            field_type,
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldEntry>,
}

impl Schema {
    pub fn new(fields: Vec<FieldEntry>) -> Self {
        Schema { fields }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldEntry> {
        self.fields.get(id)
    }

    pub fn fields(&self) -> &[FieldEntry] {
        &self.fields
    }

    pub fn field_types(&self) -> impl Iterator<Item = FieldType> + '_ {
        self.fields.iter().map(|entry| entry.field_type)
    }

    /// Picks the named fields in the given order. Callers validate the ids.
    pub fn project(&self, fields: &[FieldId]) -> Schema {
        Schema {
            fields: fields.iter().map(|id| self.fields[*id].clone()).collect(),
        }
    }

    pub fn concat(&self, other: &Schema) -> Schema {
        Schema {
            fields: self
                .fields
                .iter()
                .chain(other.fields.iter())
                .cloned()
                .collect(),
        }
    }
}
