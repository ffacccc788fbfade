use anyhow::{Context, Result, bail};
use clap::Parser;
use schemerd::mermaid::WATERMARK;
use schemerd::render_sql_files;
use schemerd::sql::{Dialect, SourceFile};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "schemerd")]
#[command(about = "Render SQL migrations as a Mermaid ER diagram", long_about = None)]
#[command(version)]
struct Cli {
    /// SQL files or directories of migrations
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Relationship annotation file (default: first .dbml found in the inputs)
    #[arg(short, long)]
    relations: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// SQL dialect: auto, postgres, mysql, sqlite
    #[arg(short, long, default_value = "auto")]
    dialect: String,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Settings resolved from the command line.
struct Options {
    dialect: Option<Dialect>,
    relations: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl Options {
    fn from_cli(cli: &Cli) -> Result<Self> {
        let dialect = match cli.dialect.as_str() {
            "auto" => None,
            name => match Dialect::from_str(name) {
                Some(dialect) => Some(dialect),
                None => bail!("Invalid dialect: {name}"),
            },
        };

        Ok(Self {
            dialect,
            relations: cli.relations.clone(),
            output: cli.output.clone(),
        })
    }
}

/// Inputs gathered from the filesystem, in enumeration order.
#[derive(Default)]
struct Inputs {
    sql_files: Vec<PathBuf>,
    annotation: Option<PathBuf>,
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// `relations` takes precedence over any `.dbml` file found under `paths`.
fn collect_inputs(paths: &[PathBuf], relations: Option<&Path>) -> Result<Inputs> {
    let mut inputs = Inputs {
        annotation: relations.map(Path::to_path_buf),
        ..Inputs::default()
    };

    for path in paths {
        if !path.exists() {
            bail!("No such file or directory: {}", path.display());
        }

        if path.is_file() {
            if has_extension(path, "dbml") {
                inputs.annotation.get_or_insert_with(|| path.clone());
            } else {
                inputs.sql_files.push(path.clone());
            }
            continue;
        }

        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
            let file = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if has_extension(file, "sql") {
                inputs.sql_files.push(file.to_path_buf());
            } else if has_extension(file, "dbml") && inputs.annotation.is_none() {
                inputs.annotation = Some(file.to_path_buf());
            }
        }
    }

    Ok(inputs)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = Options::from_cli(&cli)?;
    let inputs = collect_inputs(&cli.paths, options.relations.as_deref())?;

    let files = inputs
        .sql_files
        .iter()
        .map(|path| Ok(SourceFile::new(path.display().to_string(), read(path)?)))
        .collect::<Result<Vec<_>>>()?;

    let annotations = inputs.annotation.as_deref().map(read).transpose()?;
    if let Some(path) = &inputs.annotation {
        debug!(path = %path.display(), "using relationship annotations");
    }

    info!(files = files.len(), "rendering schema");
    let diagram = render_sql_files(&files, annotations.as_deref(), options.dialect);

    match options.output {
        Some(path) => {
            let contents = format!("{diagram}{WATERMARK}\n");
            fs::write(&path, contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => print!("{}", diagram),
    }

    Ok(())
}
