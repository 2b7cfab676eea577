//! oxide-schema-diff CLI
//!
//! Command-line tool for generating staged DDL from schema documents.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use oxide_schema_diff::prelude::*;

/// Declarative schema diffing and staged DDL generation.
#[derive(Parser)]
#[command(name = "oxide-schema-diff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the DDL building a schema from nothing.
    Build {
        /// New schema document.
        #[arg(long)]
        new: PathBuf,

        #[command(flatten)]
        generation: GenerationArgs,
    },

    /// Generate the DDL upgrading one schema to another.
    Upgrade {
        /// Old schema document.
        #[arg(long)]
        old: PathBuf,

        /// New schema document.
        #[arg(long)]
        new: PathBuf,

        #[command(flatten)]
        generation: GenerationArgs,
    },
}

/// Target SQL format.
#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// PostgreSQL 8 and later.
    Pgsql8,
    /// MySQL 5 and later.
    Mysql5,
    /// SQL Server 2008 and later.
    Mssql10,
}

impl From<Format> for DialectKind {
    fn from(format: Format) -> Self {
        match format {
            Format::Pgsql8 => Self::Postgres,
            Format::Mysql5 => Self::Mysql,
            Format::Mssql10 => Self::Mssql,
        }
    }
}

#[derive(Args)]
struct GenerationArgs {
    /// Target SQL format.
    #[arg(short, long, value_enum, default_value = "pgsql8")]
    format: Format,

    /// Always quote schema names.
    #[arg(long)]
    quote_schema_names: bool,

    /// Always quote table names.
    #[arg(long)]
    quote_table_names: bool,

    /// Always quote column names.
    #[arg(long)]
    quote_column_names: bool,

    /// Always quote function names.
    #[arg(long)]
    quote_function_names: bool,

    /// Always quote other object names.
    #[arg(long)]
    quote_object_names: bool,

    /// Always quote every name.
    #[arg(long)]
    quote_all_names: bool,

    /// Drop and recreate every view, changed or not.
    #[arg(long)]
    always_recreate_views: bool,

    /// Don't backfill NULL rows before NOT NULL is applied.
    #[arg(long)]
    no_add_defaults: bool,

    /// Ignore declared old names; renames become drop and create.
    #[arg(long)]
    ignore_old_names: bool,

    /// Write one file per stage into this directory instead of stdout.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// File name prefix for stage files.
    #[arg(long, default_value = "schema")]
    output_prefix: String,
}

impl GenerationArgs {
    fn options(&self) -> DiffOptions {
        let quoting = if self.quote_all_names {
            QuotePolicy::all()
        } else {
            QuotePolicy {
                schema: self.quote_schema_names,
                table: self.quote_table_names,
                column: self.quote_column_names,
                function: self.quote_function_names,
                object: self.quote_object_names,
            }
        };
        DiffOptions::new()
            .quoting(quoting)
            .always_recreate_views(self.always_recreate_views)
            .add_defaults(!self.no_add_defaults)
            .ignore_old_names(self.ignore_old_names)
    }
}

fn run(old: Option<&Database>, new: &Database, args: &GenerationArgs) -> anyhow::Result<()> {
    let generator = Generator::new(args.format.into(), args.options());
    match &args.output_dir {
        Some(dir) => {
            let mut files = StageFiles::create(dir, &args.output_prefix)?;
            generator.diff(old, new, &mut files)?;
            for path in files.finish()? {
                info!("Wrote {}", path.display());
            }
        }
        None => {
            let mut out = StagedOutput::new();
            generator.diff(old, new, &mut out)?;
            print!("{}", out.render());
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout carries the SQL.
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build { new, generation } => {
            let new = load_database(&new)?;
            run(None, &new, &generation)?;
        }

        Commands::Upgrade {
            old,
            new,
            generation,
        } => {
            let old = load_database(&old)?;
            let new = load_database(&new)?;
            run(Some(&old), &new, &generation)?;
        }
    }

    Ok(())
}
