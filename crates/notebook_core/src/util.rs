use anyhow::Result;
use directories::ProjectDirs;
use std::{env, fs, path::PathBuf};

pub fn app_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "Strata", "Strata")
        .ok_or_else(|| anyhow::anyhow!("ProjectDirs unavailable"))
}

/// Location of the local analytics store, overridable with STRATA_DB_PATH.
pub fn default_db_path() -> Result<PathBuf> {
    if let Ok(custom) = env::var("STRATA_DB_PATH") {
        let path = PathBuf::from(custom);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        return Ok(path);
    }

    let pd = app_dirs()?;
    let dir = pd.data_dir().to_path_buf();
    fs::create_dir_all(&dir)?;
    Ok(dir.join("warehouse.duckdb"))
}
