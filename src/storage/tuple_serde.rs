use crate::storage::types::{FieldType, Value};
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum SerdeError {
    #[error("unable to deserialize {0:?}")]
    EOF(String),
    #[error("invalid utf-8 in text field")]
    InvalidText,
}

pub fn serialized_size(values: &[Value]) -> usize {
    values.iter().fold(0, |size, value| {
        size + match value {
            Value::Integer(_) => 4,
            Value::Float(_) => 4,
            Value::Text(s) => 4 + s.len(),
        }
    })
}

pub fn serialize_into(values: &[Value], buf: &mut Vec<u8>) {
    buf.clear();
    buf.resize(serialized_size(values), 0);

    let mut i = 0;
    for value in values {
        match value {
            Value::Integer(value) => {
                BigEndian::write_i32(&mut buf[i..i + 4], *value);
                i += 4;
            }
            Value::Float(value) => {
                BigEndian::write_f32(&mut buf[i..i + 4], *value);
                i += 4;
            }
            Value::Text(value) => {
                let bytes = value.as_bytes();
                BigEndian::write_u32(&mut buf[i..i + 4], bytes.len() as u32);
                i += 4;
                buf[i..i + bytes.len()].copy_from_slice(bytes);
                i += bytes.len();
            }
        }
    }
}

/// Decodes `tuple` into `values`, reusing the existing slots.
pub fn deserialize_into<I>(tuple: &[u8], schema: I, values: &mut Vec<Value>) -> Result<(), SerdeError>
where
    I: Iterator<Item = FieldType>,
{
    values.clear();
    let mut i = 0;
    for field_type in schema {
        let (read_bytes, value) = match field_type {
            FieldType::Integer => read_integer(&tuple[i..])?,
            FieldType::Float => read_float(&tuple[i..])?,
            FieldType::Text => read_text(&tuple[i..])?,
        };
        i += read_bytes;
        values.push(value);
    }
    Ok(())
}

fn read_integer(mut tuple: &[u8]) -> Result<(usize, Value), SerdeError> {
    let value = tuple
        .read_i32::<BigEndian>()
        .map_err(|_| SerdeError::EOF("integer".to_owned()))?;
    Ok((4, Value::Integer(value)))
}

fn read_float(mut tuple: &[u8]) -> Result<(usize, Value), SerdeError> {
    let value = tuple
        .read_f32::<BigEndian>()
        .map_err(|_| SerdeError::EOF("float".to_owned()))?;
    Ok((4, Value::Float(value)))
}

fn read_text(mut tuple: &[u8]) -> Result<(usize, Value), SerdeError> {
    let text_size = tuple
        .read_u32::<BigEndian>()
        .map_err(|_| SerdeError::EOF("text size".to_owned()))? as usize;
    if tuple.len() < text_size {
        return Err(SerdeError::EOF("text".to_owned()));
    }
    let text = String::from_utf8(tuple[..text_size].to_vec()).map_err(|_| SerdeError::InvalidText)?;

    Ok((4 + text_size, Value::Text(text)))
}
