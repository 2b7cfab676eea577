#![allow(dead_code)]

use oxide_schema_diff::prelude::*;

pub fn generator(kind: DialectKind) -> Generator {
    Generator::new(kind, DiffOptions::default())
}

/// MySQL with every identifier quoted.
pub fn mysql() -> Generator {
    Generator::new(
        DialectKind::Mysql,
        DiffOptions::new().quoting(QuotePolicy::all()),
    )
}

pub fn database(schema: Schema) -> Database {
    Database::new().schema(schema)
}

pub fn build(generator: &Generator, new: &Database) -> StagedOutput {
    let mut out = StagedOutput::new();
    generator
        .build(new, &mut out)
        .unwrap_or_else(|e| panic!("build failed: {e}"));
    out
}

pub fn upgrade(generator: &Generator, old: &Database, new: &Database) -> StagedOutput {
    let mut out = StagedOutput::new();
    generator
        .upgrade(old, new, &mut out)
        .unwrap_or_else(|e| panic!("upgrade failed: {e}"));
    out
}

pub fn upgrade_err(generator: &Generator, old: &Database, new: &Database) -> DiffError {
    let mut out = StagedOutput::new();
    match generator.upgrade(old, new, &mut out) {
        Ok(()) => panic!("expected an error, got:\n{}", out.render()),
        Err(e) => e,
    }
}

/// Statements of one stage joined by newlines, the way a stage file reads.
pub fn stage(out: &StagedOutput, stage: Stage) -> String {
    out.stage(stage).join("\n")
}
