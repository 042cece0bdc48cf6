use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use notebook_core::analysis;
use notebook_core::backend::QueryBackend;
use notebook_core::dispatch::LocalService;
use notebook_core::language::Language;
use notebook_core::profiles;
use notebook_core::session::{CellType, NotebookSession};
use notebook_core::sql;
use notebook_core::store;
use notebook_core::table::render_table;

#[derive(Parser, Debug)]
#[command(version, about = "Strata — notebook execution console for the data platform")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the execution endpoints over HTTP
    Serve,
    /// Run every code/sql cell of a notebook document, top to bottom
    Run {
        #[arg(long)]
        path: PathBuf,
    },
    /// Push one snippet through a single language handler
    Exec {
        #[arg(long)]
        language: Language,
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_tracing();
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => notebook_server::serve().await,
        Commands::Run { path } => cmd_run(path).await,
        Commands::Exec { language, file } => cmd_exec(language, file).await,
    }
}

fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

async fn cmd_run(path: PathBuf) -> Result<()> {
    let notebook = store::load_notebook(&path)?;
    let backend = notebook_server::open_default_backend();
    let mut session = NotebookSession::new(notebook, LocalService::new(backend));
    session.execute_all().await;

    for (index, cell) in session.notebook.cells.iter().enumerate() {
        if cell.cell_type == CellType::Markdown || cell.content.trim().is_empty() {
            continue;
        }
        println!("=== cell {} [{}] ===", index + 1, cell.cell_type.as_str());
        if let Some(output) = &cell.output {
            println!("{output}");
        }
        if let Some(error) = &cell.error {
            eprintln!("error: {error}");
        }
        if let Some(ms) = cell.execution_time_ms {
            println!("({ms} ms)");
        }
    }
    Ok(())
}

async fn cmd_exec(language: Language, file: PathBuf) -> Result<()> {
    let source = std::fs::read_to_string(&file)
        .with_context(|| format!("reading {}", file.display()))?;
    let backend = notebook_server::open_default_backend();

    match language {
        Language::Sql => {
            let outcome = sql::run_sql(backend.as_ref(), &source);
            if let Some(data) = outcome.data {
                println!("{}", render_table(&data.rows));
            }
            if let Some(error) = outcome.error {
                anyhow::bail!(error);
            }
        }
        other => {
            let profile = profiles::profile_for(other)
                .context("no handler registered for this language")?;
            let result = analysis::analyze(profile, &source);
            println!("{}", result.output);
            if let Some(error) = result.error {
                anyhow::bail!(error);
            }
        }
    }
    Ok(())
}
