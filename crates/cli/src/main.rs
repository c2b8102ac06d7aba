use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crossbuild_compose::{CompositionWriter, Runner, RunnerConfig};
use crossbuild_core::Composition;
use crossbuild_schema::{FieldPath, KnownPaths, ObjectShape};
use crossbuild_write::{DirectoryWriter, StreamWriter};
use k8s_openapi::api::rbac::v1::ClusterRole;
use serde::Serialize;
use tracing::info;

mod demo;

#[derive(Parser, Debug)]
#[command(name = "crossbuild", version, about = "Generate and check Crossplane Compositions")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Target {
    /// The bundled XExample composite
    Composite,
    /// rbac.authorization.k8s.io/v1 ClusterRole
    ClusterRole,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build all bundled compositions and write them out
    Generate {
        /// Write one <name>.yaml per composition here instead of stdout
        #[arg(long = "out-dir", env = "CROSSBUILD_OUT_DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Build all bundled compositions without writing
    Check,
    /// Resolve field paths against a bundled shape
    Paths {
        #[arg(value_enum)]
        target: Target,
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn init_tracing() {
    let env = std::env::var("CROSSBUILD_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { out_dir } => {
            let writer: Box<dyn CompositionWriter> = match &out_dir {
                Some(dir) => Box::new(DirectoryWriter::new(dir)),
                None => Box::new(StreamWriter::stdout()),
            };
            info!(out_dir = ?out_dir, "generate invoked");
            let mut runner = Runner::new(RunnerConfig { builders: demo::builders(), writer });
            let written = runner.build().context("generating compositions")?;
            if let Some(dir) = out_dir {
                eprintln!("wrote {} composition(s) to {}", written, dir.display());
            }
        }
        Commands::Check => {
            let docs = check_all().context("checking compositions")?;
            match cli.output {
                Output::Human => {
                    for doc in &docs {
                        println!(
                            "{} • {} • {} resource(s)",
                            doc.name(),
                            doc.spec.composite_type_ref.kind,
                            doc.spec.resources.len()
                        );
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&docs)?),
            }
        }
        Commands::Paths { target, paths } => {
            let reports = check_paths(target, &paths)?;
            match cli.output {
                Output::Human => {
                    for r in &reports {
                        match (&r.found, &r.error) {
                            (Some(found), _) => println!("ok   {} ({})", r.path, found),
                            (None, Some(err)) => println!("err  {}: {}", r.path, err),
                            (None, None) => println!("ok   {}", r.path),
                        }
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
            }
            let failed = reports.iter().filter(|r| r.error.is_some()).count();
            if failed > 0 {
                bail!("{} of {} path(s) failed to resolve", failed, reports.len());
            }
        }
    }
    Ok(())
}

/// Finalize the bundled builders without writing anything.
fn check_all() -> Result<Vec<Composition>, crossbuild_compose::RunError> {
    let runner = Runner::new(RunnerConfig { builders: demo::builders(), writer: Vec::<Composition>::new() });
    runner.check()
}

#[derive(Debug, Serialize)]
struct PathReport {
    path: String,
    /// Node type at the end of the path; `known` for registered paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    found: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn check_paths(target: Target, paths: &[String]) -> Result<Vec<PathReport>> {
    let (shape, known) = match target {
        Target::Composite => (ObjectShape::of::<demo::XExample>()?, KnownPaths::composite_defaults()),
        Target::ClusterRole => (ObjectShape::of::<ClusterRole>()?, KnownPaths::resource_defaults()),
    };
    let reports = paths
        .iter()
        .map(|raw| {
            let outcome = FieldPath::parse(raw).and_then(|p| {
                if known.contains(&p) {
                    Ok("known".to_string())
                } else {
                    shape.describe(&p)
                }
            });
            match outcome {
                Ok(found) => PathReport { path: raw.clone(), found: Some(found), error: None },
                Err(e) => PathReport { path: raw.clone(), found: None, error: Some(e.to_string()) },
            }
        })
        .collect();
    Ok(reports)
}
