//! MySQL table and column diffing, with every identifier quoted.

mod common;

use common::{mysql, stage, upgrade, upgrade_err};
use oxide_schema_diff::prelude::*;

fn public(tables: Vec<Table>) -> Database {
    let schema = tables
        .into_iter()
        .fold(Schema::new("public").owner("ROLE_OWNER"), Schema::table);
    Database::new()
        .roles(RoleMap {
            owner: Some("the_owner".to_string()),
            ..RoleMap::default()
        })
        .schema(schema)
}

fn table(name: &str, columns: Vec<Column>) -> Table {
    columns
        .into_iter()
        .fold(Table::new(name).owner("ROLE_OWNER"), Table::column)
        .primary_key(["id"])
}

fn id_and_col() -> Vec<Column> {
    vec![Column::new("id", "int"), Column::new("col", "text")]
}

fn single_col(col: Column) -> Database {
    public(vec![table("table", vec![Column::new("id", "int"), col])])
}

// =============================================================================
// Table drops and renames
// =============================================================================

#[test]
fn unchanged_tables_produce_nothing() {
    let old = public(vec![table("table", id_and_col())]);
    let empty = public(vec![]);

    assert!(upgrade(&mysql(), &old, &old).is_empty());
    assert!(upgrade(&mysql(), &empty, &empty).is_empty());
}

#[test]
fn dropped_table() {
    let old = public(vec![table("table", id_and_col())]);
    let new = public(vec![]);

    let out = upgrade(&mysql(), &old, &new);
    assert_eq!(stage(&out, Stage::Structure), "");
    assert_eq!(
        stage(&out, Stage::Constraints),
        "DROP TABLE `public`.`table`;"
    );
}

#[test]
fn renamed_table_is_not_dropped() {
    let old = public(vec![table("table", id_and_col())]);
    let new = public(vec![table("newtable", id_and_col()).renamed_from("table")]);

    let out = upgrade(&mysql(), &old, &new);
    assert_eq!(
        stage(&out, Stage::Structure),
        "RENAME TABLE `public`.`table` TO `public`.`newtable`;"
    );
    assert_eq!(
        stage(&out, Stage::Constraints),
        "-- DROP TABLE `public`.`table` omitted: new table `public`.`newtable` indicates it is its replacement"
    );

    // Backwards, the renamed table is dropped and the original recreated.
    let out = upgrade(&mysql(), &new, &old);
    assert_eq!(
        stage(&out, Stage::Constraints),
        "DROP TABLE `public`.`newtable`;"
    );
    assert!(stage(&out, Stage::Structure).starts_with("CREATE TABLE `public`.`table` ("));
}

#[test]
fn renaming_a_table_to_itself_is_rejected() {
    let doc = public(vec![table("newtable", id_and_col()).renamed_from("newtable")]);
    let err = upgrade_err(&mysql(), &doc, &doc);
    assert!(
        matches!(err, DiffError::SelfRename { kind: "table", .. }),
        "unexpected error: {err}"
    );
}

// =============================================================================
// Table creation
// =============================================================================

#[test]
fn created_table() {
    let old = public(vec![table("old", id_and_col())]);
    let new = public(vec![table("table", id_and_col())]);

    let out = upgrade(&mysql(), &old, &new);
    assert_eq!(
        stage(&out, Stage::Structure),
        "CREATE TABLE `public`.`table` (\n  `id` int,\n  `col` text,\n  PRIMARY KEY (`id`)\n);"
    );
    assert_eq!(stage(&out, Stage::Constraints), "DROP TABLE `public`.`old`;");
}

// =============================================================================
// Columns
// =============================================================================

#[test]
fn added_and_dropped_columns() {
    let old = public(vec![table("table", id_and_col())]);
    let new = public(vec![table(
        "table",
        vec![
            Column::new("id", "int"),
            Column::new("col", "text"),
            Column::new("newcol", "int"),
            Column::new("newcol2", "int"),
        ],
    )]);

    let out = upgrade(&mysql(), &old, &new);
    assert_eq!(
        stage(&out, Stage::Structure),
        "ALTER TABLE `public`.`table`\n  ADD COLUMN `newcol` int AFTER `col`,\n  ADD COLUMN `newcol2` int AFTER `newcol`;"
    );
    assert_eq!(stage(&out, Stage::Constraints), "");

    let out = upgrade(&mysql(), &new, &old);
    assert_eq!(stage(&out, Stage::Structure), "");
    assert_eq!(
        stage(&out, Stage::Constraints),
        "ALTER TABLE `public`.`table`\n  DROP COLUMN `newcol`,\n  DROP COLUMN `newcol2`;"
    );
}

#[test]
fn renamed_column() {
    let old = public(vec![table("table", id_and_col())]);
    let new = public(vec![table(
        "table",
        vec![
            Column::new("id", "int"),
            Column::new("diff", "text").renamed_from("col"),
        ],
    )]);

    let out = upgrade(&mysql(), &old, &new);
    assert_eq!(
        stage(&out, Stage::Structure),
        "ALTER TABLE `public`.`table`\n  CHANGE COLUMN `col` `diff` text;"
    );
    assert_eq!(stage(&out, Stage::Constraints), "");

    // Backwards, the rename is a drop and an add.
    let out = upgrade(&mysql(), &new, &old);
    assert_eq!(
        stage(&out, Stage::Structure),
        "ALTER TABLE `public`.`table`\n  ADD COLUMN `col` text AFTER `id`;"
    );
    assert_eq!(
        stage(&out, Stage::Constraints),
        "ALTER TABLE `public`.`table`\n  DROP COLUMN `diff`;"
    );
}

// =============================================================================
// Nullability and defaults
// =============================================================================

#[test]
fn default_only_changes() {
    let with_default = single_col(Column::new("col", "text").default("'xyz'"));
    let without_default = single_col(Column::new("col", "text"));

    let out = upgrade(&mysql(), &with_default, &without_default);
    assert_eq!(
        stage(&out, Stage::Structure),
        "ALTER TABLE `public`.`table`\n  ALTER COLUMN `col` DROP DEFAULT;"
    );

    let out = upgrade(&mysql(), &without_default, &with_default);
    assert_eq!(
        stage(&out, Stage::Structure),
        "ALTER TABLE `public`.`table`\n  ALTER COLUMN `col` SET DEFAULT 'xyz';"
    );
}

#[test]
fn null_to_not_null_without_backfill() {
    let nullable = single_col(Column::new("col", "text").nullable());
    let not_nullable = single_col(Column::new("col", "text").not_null());
    let generator = Generator::new(
        DialectKind::Mysql,
        DiffOptions::new()
            .quoting(QuotePolicy::all())
            .add_defaults(false),
    );

    let out = upgrade(&generator, &nullable, &not_nullable);
    assert_eq!(stage(&out, Stage::Structure), "");
    assert_eq!(stage(&out, Stage::Data), "");
    assert_eq!(
        stage(&out, Stage::Constraints),
        "ALTER TABLE `public`.`table`\n  MODIFY COLUMN `col` text NOT NULL;"
    );

    let out = upgrade(&generator, &not_nullable, &nullable);
    assert_eq!(
        stage(&out, Stage::Structure),
        "ALTER TABLE `public`.`table`\n  MODIFY COLUMN `col` text;"
    );
    assert_eq!(stage(&out, Stage::Constraints), "");
}

#[test]
fn null_to_not_null_backfills_zero_value() {
    let nullable = single_col(Column::new("col", "text"));
    let not_nullable = single_col(Column::new("col", "text").not_null());

    let out = upgrade(&mysql(), &nullable, &not_nullable);
    assert_eq!(
        stage(&out, Stage::Data),
        "UPDATE `public`.`table` SET `col` = '' WHERE `col` IS NULL;"
    );
    assert_eq!(
        stage(&out, Stage::Constraints),
        "ALTER TABLE `public`.`table`\n  MODIFY COLUMN `col` text NOT NULL;"
    );
}

#[test]
fn null_to_not_null_backfills_default() {
    let nullable = single_col(Column::new("col", "text").nullable().default("'xyz'"));
    let not_nullable = single_col(Column::new("col", "text").not_null().default("'xyz'"));

    let out = upgrade(&mysql(), &nullable, &not_nullable);
    assert_eq!(stage(&out, Stage::Structure), "");
    assert_eq!(
        stage(&out, Stage::Data),
        "UPDATE `public`.`table` SET `col` = 'xyz' WHERE `col` IS NULL;"
    );
    assert_eq!(
        stage(&out, Stage::Constraints),
        "ALTER TABLE `public`.`table`\n  MODIFY COLUMN `col` text NOT NULL DEFAULT 'xyz';"
    );

    let out = upgrade(&mysql(), &not_nullable, &nullable);
    assert_eq!(
        stage(&out, Stage::Structure),
        "ALTER TABLE `public`.`table`\n  MODIFY COLUMN `col` text DEFAULT 'xyz';"
    );
    assert_eq!(stage(&out, Stage::Data), "");
    assert_eq!(stage(&out, Stage::Constraints), "");
}

#[test]
fn null_with_default_to_not_null_without_default() {
    let nullable_with_default = single_col(Column::new("col", "text").default("'xyz'"));
    let not_nullable = single_col(Column::new("col", "text").not_null());

    // The redefinition in the constraints stage drops the default too.
    let out = upgrade(&mysql(), &nullable_with_default, &not_nullable);
    assert_eq!(stage(&out, Stage::Structure), "");
    assert_eq!(
        stage(&out, Stage::Data),
        "UPDATE `public`.`table` SET `col` = '' WHERE `col` IS NULL;"
    );
    assert_eq!(
        stage(&out, Stage::Constraints),
        "ALTER TABLE `public`.`table`\n  MODIFY COLUMN `col` text NOT NULL;"
    );

    let out = upgrade(&mysql(), &not_nullable, &nullable_with_default);
    assert_eq!(
        stage(&out, Stage::Structure),
        "ALTER TABLE `public`.`table`\n  MODIFY COLUMN `col` text DEFAULT 'xyz';"
    );
    assert_eq!(stage(&out, Stage::Constraints), "");
}

// =============================================================================
// Serial columns
// =============================================================================

#[test]
fn serial_columns() {
    let none = public(vec![]);
    let one = public(vec![table("table", vec![Column::new("id", "serial")])]);

    let out = upgrade(&mysql(), &none, &one);
    assert_eq!(
        stage(&out, Stage::Structure),
        "CREATE TABLE `public`.`table` (\n  `id` int NOT NULL AUTO_INCREMENT,\n  PRIMARY KEY (`id`)\n);"
    );

    let out = upgrade(&mysql(), &one, &none);
    assert_eq!(stage(&out, Stage::Structure), "");
    assert_eq!(
        stage(&out, Stage::Constraints),
        "DROP TABLE `public`.`table`;"
    );
}

#[test]
fn renamed_serial_column_keeps_its_definition() {
    let one = public(vec![table("table", vec![Column::new("id", "serial")])]);
    let renamed = public(vec![Table::new("table")
        .owner("ROLE_OWNER")
        .column(Column::new("new_id", "serial").renamed_from("id"))
        .primary_key(["new_id"])]);

    let out = upgrade(&mysql(), &one, &renamed);
    assert_eq!(
        stage(&out, Stage::Structure),
        "ALTER TABLE `public`.`table`\n  CHANGE COLUMN `id` `new_id` int NOT NULL AUTO_INCREMENT;"
    );
    assert_eq!(stage(&out, Stage::Constraints), "");
}

#[test]
fn serial_and_int_are_interchangeable() {
    let serial = public(vec![table("table", vec![Column::new("id", "serial")])]);
    let int = public(vec![table("table", vec![Column::new("id", "int")])]);

    assert!(upgrade(&mysql(), &serial, &int).is_empty());
    assert!(upgrade(&mysql(), &int, &serial).is_empty());
}
