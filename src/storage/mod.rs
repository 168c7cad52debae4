pub mod catalog;
pub mod error;
pub mod hash_index;
pub mod heap_file;
pub mod record;
pub mod tuple;
pub mod tuple_serde;
pub mod types;
