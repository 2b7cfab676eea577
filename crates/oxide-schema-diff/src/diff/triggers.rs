//! Trigger strategy.
//!
//! Triggers are never altered: a changed trigger is dropped in the structure
//! stage and created again once its table and function are in place.

use tracing::debug;

use crate::error::{DiffError, Result};
use crate::ident::eq_ignore_case;
use crate::schema::{Schema, Trigger};
use crate::stage::{Stage, StageWriter};

use super::{DiffContext, SchemaPair};

/// Checks that every trigger of `schema` is attached to one of its tables
/// and fires on at least one event.
pub(crate) fn validate(schema: &Schema, dialect: &'static str) -> Result<()> {
    for trigger in &schema.triggers {
        if schema.get_table(&trigger.table).is_none() {
            return Err(DiffError::MissingTriggerTable {
                schema: schema.name.to_string(),
                trigger: trigger.name.to_string(),
                table: trigger.table.to_string(),
            });
        }
        if trigger.events().next().is_none() {
            return Err(DiffError::MissingTriggerAttribute {
                schema: schema.name.to_string(),
                trigger: trigger.name.to_string(),
                attribute: "event",
                dialect,
            });
        }
    }
    Ok(())
}

/// Event order and case don't matter, nor does the case of the function.
fn same_definition(a: &Trigger, b: &Trigger) -> bool {
    a.name == b.name
        && a.table == b.table
        && a.timing == b.timing
        && a.for_each == b.for_each
        && eq_ignore_case(&a.function, &b.function)
        && a.event_set() == b.event_set()
}

fn unchanged_in(schema: Option<&Schema>, trigger: &Trigger) -> bool {
    schema
        .and_then(|s| s.get_trigger(&trigger.name))
        .is_some_and(|other| same_definition(trigger, other))
}

pub(crate) fn drop(
    ctx: &DiffContext<'_>,
    pair: &SchemaPair<'_>,
    out: &mut dyn StageWriter,
) -> Result<()> {
    let Some(old_schema) = pair.old else {
        return Ok(());
    };
    for trigger in &old_schema.triggers {
        if unchanged_in(pair.new, trigger) {
            continue;
        }
        debug!(schema = %pair.name, trigger = %trigger.name, "dropping trigger");
        let statements = ctx.dialect.drop_trigger(pair.name, trigger)?;
        out.write_all(Stage::Structure, &statements)?;
    }
    Ok(())
}

pub(crate) fn create(
    ctx: &DiffContext<'_>,
    pair: &SchemaPair<'_>,
    out: &mut dyn StageWriter,
) -> Result<()> {
    let Some(new_schema) = pair.new else {
        return Ok(());
    };
    for trigger in &new_schema.triggers {
        if unchanged_in(pair.old, trigger) {
            continue;
        }
        debug!(schema = %pair.name, trigger = %trigger.name, "creating trigger");
        let statements = ctx.dialect.create_trigger(pair.name, trigger)?;
        out.write_all(Stage::Dependents, &statements)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, Table, TriggerTiming};

    #[test]
    fn test_validate_requires_trigger_table() {
        let schema = Schema::new("public")
            .table(Table::new("orders").column(Column::new("id", "int")))
            .trigger(Trigger::new(
                "audit",
                "invoices",
                TriggerTiming::After,
                "INSERT",
                "log_change()",
            ));
        let err = validate(&schema, "pgsql8").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to find trigger table invoices for trigger audit in schema public"
        );
    }

    #[test]
    fn test_validate_requires_an_event() {
        for event in ["", "  ", " OR , "] {
            let schema = Schema::new("public")
                .table(Table::new("orders").column(Column::new("id", "int")))
                .trigger(Trigger::new(
                    "audit",
                    "orders",
                    TriggerTiming::After,
                    event,
                    "log_change()",
                ));
            let err = validate(&schema, "mysql5").unwrap_err();
            assert_eq!(
                err.to_string(),
                "Trigger audit in schema public must define 'event' for mysql5 triggers"
            );
        }
    }

    #[test]
    fn test_same_definition_ignores_event_order() {
        let a = Trigger::new("t", "tbl", TriggerTiming::After, "INSERT, UPDATE", "f()");
        let b = Trigger::new("t", "tbl", TriggerTiming::After, "UPDATE OR INSERT", "F()");
        assert!(same_definition(&a, &b));

        let c = Trigger::new("t", "tbl", TriggerTiming::Before, "INSERT, UPDATE", "f()");
        assert!(!same_definition(&a, &c));
    }
}
