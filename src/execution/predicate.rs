use crate::execution::error::{RelOpsError, Result};
use crate::storage::record::{Comp, Record};
use crate::storage::tuple::FieldId;
use crate::storage::types::{Schema, Value};

/// Checks that every id names a field of `schema`.
pub fn validate_fields(schema: &Schema, fields: &[FieldId]) -> Result<()> {
    match fields.iter().find(|id| **id >= schema.field_count()) {
        Some(id) => Err(RelOpsError::MismatchedFields(format!(
            "field {} out of range for a schema with {} fields",
            id,
            schema.field_count()
        ))),
        None => Ok(()),
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Conjunct {
    pub field: FieldId,
    pub comp: Comp,
    pub value: Value,
}

/// Conjunction of `(field, comparator, literal)` terms. An empty predicate
/// admits every record.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Predicate {
    conjuncts: Vec<Conjunct>,
}

impl Predicate {
    /// Lines the three lists up into conjuncts after checking they have one
    /// entry each per conjunct, name fields of `schema`, and carry literals
    /// of the field's type.
    pub fn new(schema: &Schema, fields: Vec<FieldId>, comps: Vec<Comp>, values: Vec<Value>) -> Result<Self> {
        if fields.len() != comps.len() || fields.len() != values.len() {
            return Err(RelOpsError::MismatchedFields(format!(
                "{} fields, {} comparators and {} values",
                fields.len(),
                comps.len(),
                values.len()
            )));
        }
        validate_fields(schema, &fields)?;

        let conjuncts = fields
            .into_iter()
            .zip(comps)
            .zip(values)
            .map(|((field, comp), value)| Conjunct { field, comp, value })
            .collect::<Vec<_>>();

        for conjunct in &conjuncts {
            let expected = schema.fields()[conjunct.field].field_type;
            if conjunct.value.field_type() != expected {
                return Err(RelOpsError::TypeMismatch {
                    field: conjunct.field,
                    expected,
                    found: conjunct.value.field_type(),
                });
            }
        }

        Ok(Predicate { conjuncts })
    }

    pub fn conjuncts(&self) -> &[Conjunct] {
        &self.conjuncts
    }

    pub fn values(&self) -> Vec<Value> {
        self.conjuncts.iter().map(|c| c.value.clone()).collect()
    }

    /// Stops at the first conjunct the record fails.
    pub fn matches(&self, record: &Record) -> bool {
        self.conjuncts
            .iter()
            .all(|c| record.compare_field_to_value(c.field, &c.value, c.comp))
    }
}

#[cfg(test)]
mod test {
    use crate::execution::error::RelOpsError;
    use crate::execution::predicate::{validate_fields, Predicate};
    use crate::storage::record::{Comp, Record};
    use crate::storage::types::{FieldEntry, FieldType, Schema, Value};

    fn schema() -> Schema {
        Schema::new(vec![
            FieldEntry::new("id", FieldType::Integer),
            FieldEntry::new("name", FieldType::Text),
            FieldEntry::new("score", FieldType::Float),
        ])
    }

    fn record(id: i32, name: &str, score: f32) -> Record {
        Record::from_values(&schema(), vec![id.into(), name.into(), score.into()]).unwrap()
    }

    #[test]
    fn conjunction() {
        let p = Predicate::new(
            &schema(),
            vec![0, 1],
            vec![Comp::GreaterOrEqual, Comp::Equal],
            vec![2.into(), "A".into()],
        )
        .unwrap();

        assert!(!p.matches(&record(1, "A", 10.0)));
        assert!(p.matches(&record(2, "A", 20.0)));
        assert!(!p.matches(&record(3, "B", 30.0)));

        // order of conjuncts does not change the outcome
        let reversed = Predicate::new(
            &schema(),
            vec![1, 0],
            vec![Comp::Equal, Comp::GreaterOrEqual],
            vec!["A".into(), 2.into()],
        )
        .unwrap();
        for r in &[record(1, "A", 1.0), record(2, "A", 1.0), record(3, "B", 1.0)] {
            assert_eq!(p.matches(r), reversed.matches(r));
        }
    }

    #[test]
    fn empty_predicate_admits_everything() {
        let p = Predicate::new(&schema(), vec![], vec![], vec![]).unwrap();
        assert!(p.conjuncts().is_empty());
        assert!(p.matches(&record(1, "x", 0.0)));
    }

    #[test]
    fn shape_errors() {
        assert_matches!(
            Predicate::new(&schema(), vec![0, 1], vec![Comp::Equal], vec![1.into(), "a".into()]),
            Err(RelOpsError::MismatchedFields(_))
        );
        assert_matches!(
            Predicate::new(&schema(), vec![0], vec![Comp::Equal], vec![]),
            Err(RelOpsError::MismatchedFields(_))
        );
        assert_matches!(
            Predicate::new(&schema(), vec![3], vec![Comp::Equal], vec![1.into()]),
            Err(RelOpsError::MismatchedFields(_))
        );
        assert_matches!(validate_fields(&schema(), &[0, 2, 1]), Ok(()));
    }

    #[test]
    fn literal_types_checked_up_front() {
        assert_matches!(
            Predicate::new(&schema(), vec![2], vec![Comp::Less], vec![Value::Integer(3)]),
            Err(RelOpsError::TypeMismatch {
                field: 2,
                expected: FieldType::Float,
                found: FieldType::Integer,
            })
        );
    }
}
