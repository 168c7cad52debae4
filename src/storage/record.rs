use crate::storage::error::{Result, StorageError};
use crate::storage::tuple::FieldId;
use crate::storage::tuple_serde;
use crate::storage::types::{Schema, Value};
use std::cmp::Ordering;

#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub enum Comp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comp {
    /// `None` means the operands are unordered (NaN); only `NotEqual` holds then.
    pub fn holds(self, ordering: Option<Ordering>) -> bool {
        match ordering {
            None => self == Comp::NotEqual,
            Some(ordering) => match self {
                Comp::Equal => ordering == Ordering::Equal,
                Comp::NotEqual => ordering != Ordering::Equal,
                Comp::Less => ordering == Ordering::Less,
                Comp::LessOrEqual => ordering != Ordering::Greater,
                Comp::Greater => ordering == Ordering::Greater,
                Comp::GreaterOrEqual => ordering != Ordering::Less,
            },
        }
    }
}

/// A record sized to a schema. Operators keep one around as scratch space and
/// overwrite it on every fetch.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(schema: &Schema) -> Self {
        Record {
            values: schema.field_types().map(Value::default_for).collect(),
        }
    }

    /// Builds a record after checking `values` against `schema`.
    pub fn from_values(schema: &Schema, values: Vec<Value>) -> Result<Self> {
        if values.len() != schema.field_count() {
            return Err(StorageError::WrongArity {
                expected: schema.field_count(),
                found: values.len(),
            });
        }
        for (field, (value, expected)) in values.iter().zip(schema.field_types()).enumerate() {
            if value.field_type() != expected {
                return Err(StorageError::TypeMismatch {
                    field,
                    expected,
                    found: value.field_type(),
                });
            }
        }
        Ok(Record { values })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn field(&self, id: FieldId) -> Option<&Value> {
        self.values.get(id)
    }

    pub fn compare_field_to_value(&self, field: FieldId, value: &Value, comp: Comp) -> bool {
        match (self.values.get(field), value) {
            (Some(Value::Integer(left)), Value::Integer(right)) => comp.holds(Some(left.cmp(right))),
            (Some(Value::Float(left)), Value::Float(right)) => comp.holds(left.partial_cmp(right)),
            (Some(Value::Text(left)), Value::Text(right)) => comp.holds(Some(left.cmp(right))),
            _ => false,
        }
    }

    /// True when `self[left_fields[i]] == other[right_fields[i]]` for every i.
    pub fn fields_equal(&self, left_fields: &[FieldId], other: &Record, right_fields: &[FieldId]) -> bool {
        left_fields.iter().zip(right_fields).all(|(l, r)| {
            match other.values.get(*r) {
                Some(value) => self.compare_field_to_value(*l, value, Comp::Equal),
                None => false,
            }
        })
    }

    /// Writes `self[fields[k]]` into slot `k` of `dest`.
    pub fn copy_fields_into(&self, fields: &[FieldId], dest: &mut Record) {
        dest.values.clear();
        dest.values
            .extend(fields.iter().map(|id| self.values[*id].clone()));
    }

    pub fn set_from_concat(&mut self, left: &Record, right: &Record) {
        self.values.clear();
        self.values.extend(left.values.iter().cloned());
        self.values.extend(right.values.iter().cloned());
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        tuple_serde::serialize_into(&self.values, buf);
    }

    pub(crate) fn decode_from(&mut self, bytes: &[u8], schema: &Schema) -> Result<()> {
        tuple_serde::deserialize_into(bytes, schema.field_types(), &mut self.values)?;
        Ok(())
    }
}
