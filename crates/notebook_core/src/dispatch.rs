//! Routing of cells to language handlers and normalization of the
//! response envelope onto the cell.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::analysis::{self, ExecutionResult};
use crate::backend::QueryBackend;
use crate::language::Language;
use crate::profiles;
use crate::session::{Cell, CellType};
use crate::sql::{self, SqlOutcome};
use crate::table::render_table;

/// What a handler sees. Keyed only by (notebook, cell), so concurrent
/// invocations share nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub source: String,
    pub notebook_id: String,
    pub cell_id: String,
}

/// Where cell executions are sent: in-process handlers or the deployed
/// HTTP endpoints. Implementations must be stateless per invocation.
#[allow(async_fn_in_trait)]
pub trait ExecutionService {
    async fn execute_code(
        &self,
        language: Language,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult>;

    async fn execute_sql(&self, request: &ExecutionRequest) -> Result<SqlOutcome>;
}

/// In-process execution: handlers run directly against a query backend.
pub struct LocalService<B: QueryBackend> {
    backend: B,
}

impl<B: QueryBackend> LocalService<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: QueryBackend> ExecutionService for LocalService<B> {
    async fn execute_code(
        &self,
        language: Language,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult> {
        let profile = profiles::profile_for(language)
            .ok_or_else(|| anyhow::anyhow!("no handler registered for {language}"))?;
        Ok(analysis::analyze(profile, &request.source))
    }

    async fn execute_sql(&self, request: &ExecutionRequest) -> Result<SqlOutcome> {
        Ok(sql::run_sql(&self.backend, &request.source))
    }
}

/// Normalized outcome applied to a cell after dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct CellResult {
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
    pub execution_time_ms: Option<u64>,
}

/// `sql` cells always go to the SQL handler; `code` cells route by the
/// notebook's declared language; `markdown` cells are never dispatched.
pub fn resolve_language(cell_type: CellType, notebook_language: &str) -> Result<Option<Language>> {
    match cell_type {
        CellType::Markdown => Ok(None),
        CellType::Sql => Ok(Some(Language::Sql)),
        CellType::Code => Ok(Some(notebook_language.parse()?)),
    }
}

pub struct Dispatcher<S> {
    service: S,
}

impl<S: ExecutionService> Dispatcher<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Route one cell and normalize the response. `Ok(None)` means the cell
    /// is not executable (markdown). `Err` covers unsupported languages and
    /// transport failures; the session converts those into a synthetic
    /// cell-level error.
    #[tracing::instrument(skip_all, fields(cell = %cell.id))]
    pub async fn dispatch(
        &self,
        notebook_id: &str,
        notebook_language: &str,
        cell: &Cell,
    ) -> Result<Option<CellResult>> {
        let Some(language) = resolve_language(cell.cell_type, notebook_language)? else {
            return Ok(None);
        };
        let request = ExecutionRequest {
            source: cell.content.clone(),
            notebook_id: notebook_id.to_string(),
            cell_id: cell.id.clone(),
        };
        let result = if language == Language::Sql {
            normalize_sql(self.service.execute_sql(&request).await?)
        } else {
            normalize_code(self.service.execute_code(language, &request).await?)
        };
        Ok(Some(result))
    }
}

fn normalize_code(result: ExecutionResult) -> CellResult {
    if result.success {
        CellResult {
            success: true,
            output: Some(if result.output.is_empty() {
                "Execution completed successfully".to_string()
            } else {
                result.output
            }),
            error: None,
            execution_time_ms: Some(result.execution_time_ms),
        }
    } else {
        let error = result
            .error
            .unwrap_or_else(|| "Execution failed".to_string());
        CellResult {
            success: false,
            output: Some(if result.output.is_empty() {
                error.clone()
            } else {
                result.output
            }),
            error: Some(error),
            execution_time_ms: None,
        }
    }
}

fn normalize_sql(outcome: SqlOutcome) -> CellResult {
    if outcome.success {
        let (rows, row_count, simulated) = outcome
            .data
            .map(|d| (d.rows, d.row_count, d.simulated.unwrap_or(false)))
            .unwrap_or_default();
        let output = if simulated || !rows.is_empty() {
            render_table(&rows)
        } else {
            format!("Query executed successfully.\nRows affected: {row_count}")
        };
        CellResult {
            success: true,
            output: Some(output),
            error: None,
            execution_time_ms: Some(outcome.execution_time_ms),
        }
    } else {
        let error = outcome
            .error
            .unwrap_or_else(|| "Execution failed".to_string());
        CellResult {
            success: false,
            output: Some(error.clone()),
            error: Some(error),
            execution_time_ms: None,
        }
    }
}
