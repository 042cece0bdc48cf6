//! Notebook documents in the record-store row shape, persisted to local
//! JSON files. The remote store itself is someone else's problem; this is
//! just enough to load and save what it would hand us.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::session::{Cell, Notebook};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotebookDocument {
    pub id: String,
    pub name: String,
    pub language: String,
    #[serde(default)]
    pub content: NotebookContent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotebookContent {
    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl NotebookDocument {
    pub fn from_notebook(name: impl Into<String>, notebook: &Notebook) -> Self {
        Self {
            id: notebook.id.clone(),
            name: name.into(),
            language: notebook.language.clone(),
            content: NotebookContent {
                cells: notebook.cells.clone(),
            },
        }
    }
}

pub fn load_notebook(path: &Path) -> Result<Notebook> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading notebook document {}", path.display()))?;
    let doc: NotebookDocument =
        serde_json::from_str(&raw).context("parsing notebook document")?;
    Ok(Notebook::open(doc.id, doc.language, doc.content.cells))
}

pub fn save_notebook(path: &Path, doc: &NotebookDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(doc)?)
        .with_context(|| format!("writing notebook document {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CellType;
    use tempfile::tempdir;

    #[test]
    fn round_trips_a_notebook_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analysis.notebook.json");

        let notebook = Notebook::open("nb-7", "scala", vec![]);
        let doc = NotebookDocument::from_notebook("Weekly metrics", &notebook);
        save_notebook(&path, &doc).unwrap();

        let loaded = load_notebook(&path).unwrap();
        assert_eq!(loaded.id, "nb-7");
        assert_eq!(loaded.language, "scala");
        assert_eq!(loaded.cells.len(), 1);
    }

    #[test]
    fn a_document_without_cells_opens_with_one_seeded_cell() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.notebook.json");
        fs::write(
            &path,
            r#"{"id":"nb-9","name":"Blank","language":"python","content":{"cells":[]}}"#,
        )
        .unwrap();
        let loaded = load_notebook(&path).unwrap();
        assert_eq!(loaded.cells.len(), 1);
        assert_eq!(loaded.cells[0].cell_type, CellType::Code);
    }
}
