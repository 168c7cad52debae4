use crate::execution::error::{RelOpsError, Result};
use crate::execution::operation::Operation;
use crate::execution::predicate::validate_fields;
use crate::execution::state::{open_index, ResultState, SourceState};
use crate::storage::catalog::Catalog;
use crate::storage::hash_index::{bucket_for, HashIndexFile, SearchKey, SearchKeyFormat};
use crate::storage::record::Record;
use crate::storage::tuple::{FieldId, FileId};
use crate::storage::types::Schema;
use rayon::prelude::*;
use std::cell::Ref;
use std::collections::HashMap;
use tracing::debug;

/// Join algorithm together with its tuning parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    TupleNested,
    /// Outer relation read `block_size` pages at a time.
    BlockNested { block_size: u32 },
    /// Probes a hash index over the inner relation's join fields.
    IndexNested { inner_index: FileId },
    Hash { num_buckets: u32 },
    ParallelHash { num_buckets: u32, num_threads: u32 },
}

impl JoinKind {
    pub fn validate(&self) -> Result<()> {
        let zero = match *self {
            JoinKind::BlockNested { block_size: 0 } => Some("block size"),
            JoinKind::Hash { num_buckets: 0 } | JoinKind::ParallelHash { num_buckets: 0, .. } => {
                Some("bucket count")
            }
            JoinKind::ParallelHash { num_threads: 0, .. } => Some("thread count"),
            _ => None,
        };
        match zero {
            Some(what) => Err(RelOpsError::UnsupportedOperation(format!(
                "{:?} with a {} of zero",
                self, what
            ))),
            None => Ok(()),
        }
    }
}

/// Checks that the join columns pair up: same count, at least one, in range,
/// and of the same type on both sides.
pub fn validate_join_fields(
    outer: &Schema,
    inner: &Schema,
    outer_fields: &[FieldId],
    inner_fields: &[FieldId],
) -> Result<()> {
    if outer_fields.is_empty() || outer_fields.len() != inner_fields.len() {
        return Err(RelOpsError::MismatchedFields(format!(
            "{} outer and {} inner join fields",
            outer_fields.len(),
            inner_fields.len()
        )));
    }
    validate_fields(outer, outer_fields)?;
    validate_fields(inner, inner_fields)?;

    for (o, i) in outer_fields.iter().zip(inner_fields) {
        let (o_type, i_type) = (outer.fields()[*o].field_type, inner.fields()[*i].field_type);
        if o_type != i_type {
            return Err(RelOpsError::MismatchedFields(format!(
                "outer field {} is {} but inner field {} is {}",
                o, o_type, i, i_type
            )));
        }
    }
    Ok(())
}

/// Equi-join of two relations writing `outer ++ inner` rows into a result
/// whose schema is the concatenation of the two input schemas.
pub struct Join<'c> {
    kind: JoinKind,
    result: ResultState<'c>,
    outer: SourceState<'c>,
    inner: SourceState<'c>,
    outer_fields: Vec<FieldId>,
    inner_fields: Vec<FieldId>,
    index: Option<Ref<'c, HashIndexFile>>,
}

impl<'c> Join<'c> {
    pub fn new(
        catalog: &'c Catalog,
        kind: JoinKind,
        outer_id: FileId,
        inner_id: FileId,
        result_id: FileId,
        outer_fields: Vec<FieldId>,
        inner_fields: Vec<FieldId>,
    ) -> Result<Self> {
        kind.validate()?;
        let result = ResultState::open(catalog, result_id)?;
        let outer = SourceState::open(catalog, outer_id, &outer_fields)?;
        let inner = SourceState::open(catalog, inner_id, &inner_fields)?;
        validate_join_fields(&outer.schema, &inner.schema, &outer_fields, &inner_fields)?;

        let index = match kind {
            JoinKind::IndexNested { inner_index } => {
                let index = open_index(catalog, inner_index, inner_id)?;
                if index.key_format().field_list() != inner_fields.as_slice() {
                    return Err(RelOpsError::MismatchedFields(format!(
                        "index key {:?} does not match inner join fields {:?}",
                        index.key_format().field_list(),
                        inner_fields
                    )));
                }
                Some(index)
            }
            _ => None,
        };

        Ok(Join {
            kind,
            result,
            outer,
            inner,
            outer_fields,
            inner_fields,
            index,
        })
    }
}

impl<'c> Operation for Join<'c> {
    fn result_id(&self) -> FileId {
        self.result.file_id
    }

    fn run_operation(self) -> Result<usize> {
        let Join {
            kind,
            mut result,
            mut outer,
            mut inner,
            outer_fields,
            inner_fields,
            index,
        } = self;
        let on = JoinColumns {
            outer: &outer_fields,
            inner: &inner_fields,
        };

        let produced = match (kind, index) {
            (JoinKind::TupleNested, _) => tuple_nested(&mut outer, &mut inner, &mut result, on)?,
            (JoinKind::BlockNested { block_size }, _) => {
                block_nested(&mut outer, &mut inner, &mut result, on, block_size as usize)?
            }
            (JoinKind::IndexNested { .. }, Some(index)) => {
                index_nested(&mut outer, &mut inner, &index, &mut result, on)?
            }
            (JoinKind::IndexNested { inner_index }, None) => {
                return Err(RelOpsError::InvalidIndexRelation(format!(
                    "{} was not resolved",
                    inner_index
                )))
            }
            (JoinKind::Hash { num_buckets }, _) => {
                let (outer_parts, inner_parts) =
                    partition_both(&mut outer, &mut inner, on, num_buckets as usize)?;
                let rows = outer_parts
                    .iter()
                    .zip(&inner_parts)
                    .flat_map(|(o, i)| join_bucket(o, i, on))
                    .collect::<Vec<_>>();
                insert_all(&mut result, rows)?
            }
            (JoinKind::ParallelHash { num_buckets, num_threads }, _) => {
                let (outer_parts, inner_parts) =
                    partition_both(&mut outer, &mut inner, on, num_buckets as usize)?;
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads as usize)
                    .build()
                    .map_err(|err| RelOpsError::UnsupportedOperation(err.to_string()))?;
                let buckets: Vec<Vec<Record>> = pool.install(|| {
                    outer_parts
                        .par_iter()
                        .zip(inner_parts.par_iter())
                        .map(|(o, i)| join_bucket(o, i, on))
                        .collect()
                });
                insert_all(&mut result, buckets.into_iter().flatten().collect())?
            }
        };

        debug!(
            ?kind,
            outer = %outer.file_id,
            inner = %inner.file_id,
            result = %result.file_id,
            produced,
            "join finished"
        );
        Ok(produced)
    }
}

#[derive(Clone, Copy)]
struct JoinColumns<'a> {
    outer: &'a [FieldId],
    inner: &'a [FieldId],
}

impl<'a> JoinColumns<'a> {
    fn matches(&self, outer: &Record, inner: &Record) -> bool {
        outer.fields_equal(self.outer, inner, self.inner)
    }
}

fn emit(result: &mut ResultState<'_>, outer: &Record, inner: &Record) -> Result<()> {
    result.record.set_from_concat(outer, inner);
    result.insert_scratch()?;
    Ok(())
}

fn tuple_nested(
    outer: &mut SourceState<'_>,
    inner: &mut SourceState<'_>,
    result: &mut ResultState<'_>,
    on: JoinColumns<'_>,
) -> Result<usize> {
    let mut produced = 0;
    let mut outer_scan = outer.file.scanner();
    while outer_scan.get_next(&mut outer.record)?.is_some() {
        let mut inner_scan = inner.file.scanner();
        while inner_scan.get_next(&mut inner.record)?.is_some() {
            if on.matches(&outer.record, &inner.record) {
                emit(result, &outer.record, &inner.record)?;
                produced += 1;
            }
        }
    }
    Ok(produced)
}

fn block_nested(
    outer: &mut SourceState<'_>,
    inner: &mut SourceState<'_>,
    result: &mut ResultState<'_>,
    on: JoinColumns<'_>,
    block_size: usize,
) -> Result<usize> {
    let mut produced = 0;
    let mut block = Vec::new();
    let mut first_page = 0;
    while first_page < outer.file.page_count() {
        block.clear();
        let mut outer_scan = outer.file.block_scanner(first_page, block_size);
        while outer_scan.get_next(&mut outer.record)?.is_some() {
            block.push(outer.record.clone());
        }

        let mut inner_scan = inner.file.scanner();
        while inner_scan.get_next(&mut inner.record)?.is_some() {
            for outer_record in &block {
                if on.matches(outer_record, &inner.record) {
                    emit(result, outer_record, &inner.record)?;
                    produced += 1;
                }
            }
        }
        first_page += block_size;
    }
    Ok(produced)
}

fn index_nested(
    outer: &mut SourceState<'_>,
    inner: &mut SourceState<'_>,
    index: &HashIndexFile,
    result: &mut ResultState<'_>,
    on: JoinColumns<'_>,
) -> Result<usize> {
    let mut produced = 0;
    let mut key = SearchKey::new(index.key_format().clone());
    let mut outer_scan = outer.file.scanner();
    while outer_scan.get_next(&mut outer.record)?.is_some() {
        key.set_from_fields(&outer.record, on.outer);
        for id in index.scanner(&key) {
            inner.file.get_record(id, &mut inner.record)?;
            inner.record_id = Some(id);
            if on.matches(&outer.record, &inner.record) {
                emit(result, &outer.record, &inner.record)?;
                produced += 1;
            }
        }
    }
    Ok(produced)
}

/// Records of one relation split by the hash of their join key. Each entry
/// keeps the encoded key next to the record.
type Partitions = Vec<Vec<(Vec<u8>, Record)>>;

fn partition(state: &mut SourceState<'_>, fields: &[FieldId], num_buckets: usize) -> Result<Partitions> {
    let mut parts: Partitions = (0..num_buckets).map(|_| Vec::new()).collect();
    let mut key = SearchKey::new(SearchKeyFormat::new(fields, &state.schema));
    let mut scanner = state.file.scanner();
    while scanner.get_next(&mut state.record)?.is_some() {
        key.set_from_fields(&state.record, fields);
        let bucket = bucket_for(key.data(), num_buckets);
        parts[bucket].push((key.data().to_vec(), state.record.clone()));
    }
    Ok(parts)
}

fn partition_both(
    outer: &mut SourceState<'_>,
    inner: &mut SourceState<'_>,
    on: JoinColumns<'_>,
    num_buckets: usize,
) -> Result<(Partitions, Partitions)> {
    Ok((
        partition(outer, on.outer, num_buckets)?,
        partition(inner, on.inner, num_buckets)?,
    ))
}

/// Builds on the outer bucket and probes with the inner one.
fn join_bucket(outer: &[(Vec<u8>, Record)], inner: &[(Vec<u8>, Record)], on: JoinColumns<'_>) -> Vec<Record> {
    let mut table: HashMap<&[u8], Vec<&Record>> = HashMap::new();
    for (key, record) in outer {
        table.entry(key.as_slice()).or_insert_with(Vec::new).push(record);
    }

    let mut joined = Vec::new();
    for (key, inner_record) in inner {
        for outer_record in table.get(key.as_slice()).into_iter().flatten() {
            if on.matches(outer_record, inner_record) {
                let mut row = Record::default();
                row.set_from_concat(outer_record, inner_record);
                joined.push(row);
            }
        }
    }
    joined
}

fn insert_all(result: &mut ResultState<'_>, rows: Vec<Record>) -> Result<usize> {
    let produced = rows.len();
    for row in rows {
        result.file.insert_record(&row)?;
    }
    Ok(produced)
}
