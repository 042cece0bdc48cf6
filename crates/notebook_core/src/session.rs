//! Client-visible notebook state: the ordered cell sequence and the
//! operations that mutate it, including single-cell and run-all execution.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::dispatch::{Dispatcher, ExecutionService};

/// Pause inserted after each executed cell under run-all.
pub const RUN_ALL_PAUSE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Code,
    Sql,
    Markdown,
}

impl CellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Code => "code",
            CellType::Sql => "sql",
            CellType::Markdown => "markdown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: String,
    #[serde(rename = "type")]
    pub cell_type: CellType,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing)]
    pub executing: bool,
    #[serde(
        default,
        rename = "executionTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub execution_time_ms: Option<u64>,
}

impl Cell {
    pub fn new(cell_type: CellType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            cell_type,
            content: String::new(),
            output: None,
            error: None,
            executing: false,
            execution_time_ms: None,
        }
    }

    pub fn status(&self) -> CellStatus {
        if self.executing {
            CellStatus::Executing
        } else if self.error.is_some() {
            CellStatus::Failed
        } else if self.output.is_some() {
            CellStatus::Succeeded
        } else {
            CellStatus::Idle
        }
    }

    fn is_runnable(&self) -> bool {
        matches!(self.cell_type, CellType::Code | CellType::Sql)
            && !self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Idle,
    Executing,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// A notebook owns its cells exclusively; order defines run order. The
/// declared language stays loosely typed text until dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    pub id: String,
    pub language: String,
    pub cells: Vec<Cell>,
}

impl Notebook {
    /// Opening a notebook with no saved cells seeds a single empty code
    /// cell, so the editor always has somewhere to type.
    pub fn open(id: impl Into<String>, language: impl Into<String>, mut cells: Vec<Cell>) -> Self {
        if cells.is_empty() {
            cells.push(Cell::new(CellType::Code));
        }
        Self {
            id: id.into(),
            language: language.into(),
            cells,
        }
    }
}

pub struct NotebookSession<S> {
    pub notebook: Notebook,
    dispatcher: Dispatcher<S>,
}

impl<S: ExecutionService> NotebookSession<S> {
    pub fn new(notebook: Notebook, service: S) -> Self {
        Self {
            notebook,
            dispatcher: Dispatcher::new(service),
        }
    }

    /// Insert a new empty cell after `index`, returning its id.
    pub fn insert_cell(&mut self, index: usize, cell_type: CellType) -> String {
        let cell = Cell::new(cell_type);
        let id = cell.id.clone();
        let at = (index + 1).min(self.notebook.cells.len());
        self.notebook.cells.insert(at, cell);
        id
    }

    /// Deleting the last remaining cell is a no-op; a notebook always keeps
    /// at least one cell.
    pub fn delete_cell(&mut self, index: usize) -> bool {
        if self.notebook.cells.len() == 1 || index >= self.notebook.cells.len() {
            return false;
        }
        self.notebook.cells.remove(index);
        true
    }

    pub fn update_content(&mut self, index: usize, content: impl Into<String>) {
        if let Some(cell) = self.notebook.cells.get_mut(index) {
            cell.content = content.into();
        }
    }

    /// Changing type discards any previous result.
    pub fn change_cell_type(&mut self, index: usize, cell_type: CellType) {
        if let Some(cell) = self.notebook.cells.get_mut(index) {
            cell.cell_type = cell_type;
            cell.output = None;
            cell.error = None;
        }
    }

    pub fn move_cell(&mut self, index: usize, direction: MoveDirection) -> bool {
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1),
        };
        match target {
            Some(target) if index < self.notebook.cells.len() && target < self.notebook.cells.len() => {
                self.notebook.cells.swap(index, target);
                true
            }
            _ => false,
        }
    }

    /// Execute one cell: `idle/succeeded/failed → executing → succeeded |
    /// failed`. Transport failures become a synthetic cell error; the
    /// session itself never fails.
    pub async fn execute_cell(&mut self, index: usize) {
        let Some(cell) = self.notebook.cells.get_mut(index) else {
            return;
        };
        if cell.cell_type == CellType::Markdown {
            return;
        }
        cell.executing = true;
        cell.error = None;
        cell.output = None;
        let snapshot = cell.clone();

        let outcome = self
            .dispatcher
            .dispatch(&self.notebook.id, &self.notebook.language, &snapshot)
            .await;

        let cell = &mut self.notebook.cells[index];
        cell.executing = false;
        match outcome {
            Ok(Some(result)) => {
                cell.output = result.output;
                cell.error = result.error;
                if let Some(ms) = result.execution_time_ms {
                    cell.execution_time_ms = Some(ms);
                }
            }
            Ok(None) => {}
            Err(err) => {
                cell.error = Some(err.to_string());
                cell.output = Some(format!(
                    "Error: {err}\n\nPlease check your code and try again."
                ));
            }
        }
    }

    /// Execute the cell, then insert a new cell of the same type right
    /// after it, returning the new cell's id ("run and advance").
    pub async fn run_and_advance(&mut self, index: usize) -> Option<String> {
        let cell_type = self.notebook.cells.get(index)?.cell_type;
        if cell_type == CellType::Markdown {
            return None;
        }
        self.execute_cell(index).await;
        Some(self.insert_cell(index, cell_type))
    }

    /// Execute the cell without creating a new one ("run in place").
    pub async fn run_in_place(&mut self, index: usize) {
        self.execute_cell(index).await;
    }

    /// Run every executable cell top to bottom, strictly sequentially, with
    /// a fixed pause after each completion. Markdown and blank cells are
    /// skipped.
    pub async fn execute_all(&mut self) {
        for index in 0..self.notebook.cells.len() {
            if self.notebook.cells[index].is_runnable() {
                self.execute_cell(index).await;
                tokio::time::sleep(RUN_ALL_PAUSE).await;
            }
        }
    }
}
