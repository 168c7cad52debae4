use crate::config::{Config, RelOpsConfig};
use crate::execution::error::{RelOpsError, Result};
use crate::execution::file_scan::FileScan;
use crate::execution::index_scan::IndexScan;
use crate::execution::join::{validate_join_fields, Join, JoinKind};
use crate::execution::operation::{Operation, Operator};
use crate::execution::predicate::{validate_fields, Predicate};
use crate::execution::project::Project;
use crate::storage::catalog::Catalog;
use crate::storage::record::Comp;
use crate::storage::tuple::{FieldId, FileId};
use crate::storage::types::{Schema, Value};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectKind {
    FileScan,
    /// Requires the id of a hash index over the selection's fields.
    Index,
}

/// Entry point for relational operations. Every call creates a fresh result
/// relation in the owned catalog, runs one operator into it and returns its id.
///
/// Result names come from a counter owned by the manager, so two managers
/// never see each other's names. Nothing here is synchronized; callers that
/// share a manager across threads must wrap it themselves.
pub struct RelOpsManager {
    catalog: Catalog,
    config: RelOpsConfig,
    result_num: u64,
}

impl RelOpsManager {
    pub fn new(catalog: Catalog, config: RelOpsConfig) -> Self {
        RelOpsManager {
            catalog,
            config,
            result_num: 0,
        }
    }

    pub fn from_config(config: Config) -> Self {
        RelOpsManager::new(Catalog::new(config.storage), config.relops)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Copies the given columns, in the given order, of every record of
    /// `rel_id`. Fails before creating anything when `fields` is empty or out
    /// of range.
    #[instrument(level = "debug", skip(self))]
    pub fn project(&mut self, rel_id: FileId, fields: &[FieldId]) -> Result<FileId> {
        let schema = self.catalog.get_schema(rel_id)?;
        if fields.is_empty() {
            return Err(RelOpsError::MismatchedFields("projection needs at least one field".to_owned()));
        }
        validate_fields(&schema, fields)?;

        let result_id = self.create_result_file(schema.project(fields))?;
        let outcome =
            Project::new(&self.catalog, rel_id, result_id, fields.to_vec()).map(|op| Operator::Project(op).run_operation());
        self.finish(result_id, outcome)
    }

    /// Copies every record of `rel_id` satisfying all of the conjuncts
    /// `fields[i] comps[i] values[i]`. `index_id` is only read for
    /// `SelectKind::Index`.
    #[instrument(level = "debug", skip(self))]
    pub fn select(
        &mut self,
        kind: SelectKind,
        rel_id: FileId,
        fields: Vec<FieldId>,
        comps: Vec<Comp>,
        values: Vec<Value>,
        index_id: Option<FileId>,
    ) -> Result<FileId> {
        let schema = self.catalog.get_schema(rel_id)?;
        Predicate::new(&schema, fields.clone(), comps.clone(), values.clone())?;
        let index_id = match (kind, index_id) {
            (SelectKind::Index, None) => {
                return Err(RelOpsError::InvalidIndexRelation(
                    "index selection without an index".to_owned(),
                ))
            }
            (_, index_id) => index_id,
        };

        let result_id = self.create_result_file(Schema::clone(&schema))?;
        let catalog = &self.catalog;
        let operator = match (kind, index_id) {
            (SelectKind::Index, Some(index_id)) => {
                IndexScan::new(catalog, rel_id, index_id, result_id, fields, comps, values).map(Operator::IndexScan)
            }
            _ => FileScan::new(catalog, rel_id, result_id, fields, comps, values).map(Operator::FileScan),
        };
        let outcome = operator.map(Operator::run_operation);
        self.finish(result_id, outcome)
    }

    /// Joins `outer_id` with `inner_id` on `outer_fields[i] == inner_fields[i]`
    /// into a result whose schema is the outer schema followed by the inner one.
    #[instrument(level = "debug", skip(self))]
    pub fn join(
        &mut self,
        kind: JoinKind,
        outer_id: FileId,
        inner_id: FileId,
        outer_fields: Vec<FieldId>,
        inner_fields: Vec<FieldId>,
    ) -> Result<FileId> {
        kind.validate()?;
        let outer_schema = self.catalog.get_schema(outer_id)?;
        let inner_schema = self.catalog.get_schema(inner_id)?;
        validate_join_fields(&outer_schema, &inner_schema, &outer_fields, &inner_fields)?;

        let result_id = self.create_result_file(outer_schema.concat(&inner_schema))?;
        let outcome = Join::new(&self.catalog, kind, outer_id, inner_id, result_id, outer_fields, inner_fields)
            .map(|op| Operator::Join(op).run_operation());
        self.finish(result_id, outcome)
    }

    /// Whether the two relations hold the same set of rows.
    ///
    /// Both relations must be free of duplicate rows; this is assumed, not
    /// checked. The answer comes from counting the rows of a join on every
    /// column, so with duplicates it can be wrong: a relation missing one
    /// distinct row but repeating another may still compare equal.
    /// Relations whose column types differ are never equal.
    #[instrument(level = "debug", skip(self))]
    pub fn check_files_equal(&mut self, first: FileId, second: FileId) -> Result<bool> {
        let count = self.catalog.record_count(first)?;
        if count != self.catalog.record_count(second)? {
            return Ok(false);
        }
        let first_schema = self.catalog.get_schema(first)?;
        let second_schema = self.catalog.get_schema(second)?;
        if first_schema.field_count() != second_schema.field_count() {
            return Ok(false);
        }
        if !first_schema.field_types().eq(second_schema.field_types()) {
            return Ok(false);
        }
        if first_schema.field_count() == 0 {
            return Ok(true);
        }

        let fields = (0..first_schema.field_count()).collect::<Vec<_>>();
        let kind = JoinKind::BlockNested {
            block_size: self.config.equality_block_size,
        };
        let joined = self.join(kind, first, second, fields.clone(), fields)?;
        let matched = self.catalog.record_count(joined)?;
        self.catalog.drop_relation(joined)?;

        debug!(count, matched, "compared relations");
        Ok(matched == count)
    }

    /// Creates an empty relation named `<n><suffix>` for the next unused n.
    fn create_result_file(&mut self, schema: Schema) -> Result<FileId> {
        loop {
            let name = format!("{}{}", self.result_num, self.config.result_suffix);
            self.result_num += 1;
            if self.catalog.get_file_id(&name).is_none() {
                let id = self.catalog.create_relation(&name, schema)?;
                debug!(%id, %name, "created result relation");
                return Ok(id);
            }
        }
    }

    /// Drops the result when the operator could not be built; a failed run
    /// keeps whatever it wrote.
    fn finish(&mut self, result_id: FileId, outcome: Result<Result<usize>>) -> Result<FileId> {
        match outcome {
            Ok(run) => {
                let produced = run?;
                debug!(result = %result_id, produced, "operation finished");
                Ok(result_id)
            }
            Err(err) => {
                self.catalog.drop_relation(result_id)?;
                Err(err)
            }
        }
    }
}
