//! Staged statement output.
//!
//! Generated statements are appended to one of four ordered stages. A stage
//! always runs entirely before the next, whatever order the strategies wrote
//! in.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

/// An output stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Drops of dependents, creates, renames and relaxing alterations.
    Structure,
    /// Row backfills.
    Data,
    /// NOT NULL tightening, key additions and deferred drops.
    Constraints,
    /// View and trigger creation.
    Dependents,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [
        Stage::Structure,
        Stage::Data,
        Stage::Constraints,
        Stage::Dependents,
    ];

    /// Zero-based position.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short name used in file names and headers.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Data => "data",
            Self::Constraints => "constraints",
            Self::Dependents => "dependents",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} ({})", self.index() + 1, self.name())
    }
}

/// Sink for generated statements.
pub trait StageWriter {
    /// Appends one complete statement (or comment) to `stage`.
    fn write_stage(&mut self, stage: Stage, sql: &str) -> Result<()>;

    /// Appends several statements to `stage`, in order.
    fn write_all(&mut self, stage: Stage, statements: &[String]) -> Result<()> {
        for sql in statements {
            self.write_stage(stage, sql)?;
        }
        Ok(())
    }
}

/// In-memory staged output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedOutput {
    stages: [Vec<String>; 4],
}

impl StagedOutput {
    /// Creates empty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements written to `stage`, in order.
    #[must_use]
    pub fn stage(&self, stage: Stage) -> &[String] {
        &self.stages[stage.index()]
    }

    /// Whether every stage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(Vec::is_empty)
    }

    /// Total number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    /// All statements concatenated in stage order.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().flatten().map(String::as_str)
    }

    /// Renders the output as one script with a header per non-empty stage.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for stage in Stage::ALL {
            let statements = self.stage(stage);
            if statements.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("-- {stage}\n"));
            for sql in statements {
                out.push_str(sql);
                out.push('\n');
            }
        }
        out
    }
}

impl StageWriter for StagedOutput {
    fn write_stage(&mut self, stage: Stage, sql: &str) -> Result<()> {
        self.stages[stage.index()].push(sql.to_string());
        Ok(())
    }
}

/// File-backed staged output, one `.sql` file per stage.
///
/// Files are flushed by [`StageFiles::finish`], and on drop for every other
/// exit path.
pub struct StageFiles {
    paths: Vec<PathBuf>,
    files: Vec<BufWriter<File>>,
    finished: bool,
}

impl StageFiles {
    /// Creates `<dir>/<prefix>_stage<N>_<name>.sql` for every stage.
    pub fn create(dir: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let mut paths = Vec::with_capacity(Stage::ALL.len());
        let mut files = Vec::with_capacity(Stage::ALL.len());
        for stage in Stage::ALL {
            let path = dir.join(format!(
                "{prefix}_stage{}_{}.sql",
                stage.index() + 1,
                stage.name()
            ));
            files.push(BufWriter::new(File::create(&path)?));
            debug!(path = %path.display(), "opened stage file");
            paths.push(path);
        }
        Ok(Self {
            paths,
            files,
            finished: false,
        })
    }

    /// Paths of the stage files, in stage order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Flushes every stage file.
    pub fn finish(mut self) -> Result<Vec<PathBuf>> {
        self.flush_all()?;
        self.finished = true;
        Ok(std::mem::take(&mut self.paths))
    }

    fn flush_all(&mut self) -> Result<()> {
        for file in &mut self.files {
            file.flush()?;
        }
        Ok(())
    }
}

impl StageWriter for StageFiles {
    fn write_stage(&mut self, stage: Stage, sql: &str) -> Result<()> {
        let file = &mut self.files[stage.index()];
        file.write_all(sql.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}

impl Drop for StageFiles {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.flush_all() {
                warn!(error = %e, "failed to flush stage files");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_orders_stages() {
        let mut out = StagedOutput::new();
        out.write_stage(Stage::Dependents, "CREATE VIEW v AS SELECT 1;")
            .unwrap();
        out.write_stage(Stage::Structure, "CREATE TABLE t (id int);")
            .unwrap();
        out.write_stage(Stage::Data, "UPDATE t SET id = 0 WHERE id IS NULL;")
            .unwrap();

        let statements: Vec<&str> = out.statements().collect();
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE t (id int);",
                "UPDATE t SET id = 0 WHERE id IS NULL;",
                "CREATE VIEW v AS SELECT 1;",
            ]
        );
        assert_eq!(
            out.render(),
            "-- stage 1 (structure)\nCREATE TABLE t (id int);\n\n\
             -- stage 2 (data)\nUPDATE t SET id = 0 WHERE id IS NULL;\n\n\
             -- stage 4 (dependents)\nCREATE VIEW v AS SELECT 1;\n"
        );
    }

    #[test]
    fn test_empty_output() {
        let out = StagedOutput::new();
        assert!(out.is_empty());
        assert_eq!(out.len(), 0);
        assert_eq!(out.render(), "");
    }

    #[test]
    fn test_stage_files_finish() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = StageFiles::create(dir.path(), "app").unwrap();
        files
            .write_stage(Stage::Constraints, "DROP TABLE t;")
            .unwrap();
        let paths = files.finish().unwrap();

        assert_eq!(paths.len(), 4);
        assert!(paths[2].ends_with("app_stage3_constraints.sql"));
        assert_eq!(std::fs::read_to_string(&paths[2]).unwrap(), "DROP TABLE t;\n");
        assert_eq!(std::fs::read_to_string(&paths[0]).unwrap(), "");
    }

    #[test]
    fn test_stage_files_flush_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let mut files = StageFiles::create(dir.path(), "early").unwrap();
            files.write_stage(Stage::Structure, "-- partial").unwrap();
            files.paths()[0].clone()
        };
        assert_eq!(std::fs::read_to_string(path).unwrap(), "-- partial\n");
    }
}
