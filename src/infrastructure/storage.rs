use std::fs;
use std::path::{Path, PathBuf};

pub fn ensure_data_dir(data_dir: &Path) -> std::io::Result<PathBuf> {
    ensure_dir(data_dir)?;
    Ok(data_dir.to_path_buf())
}

/// Per-project export folder, e.g. `<exports>/<project id>/`.
pub fn ensure_project_exports_dir(exports_dir: &Path, project_id: &str) -> std::io::Result<PathBuf> {
    let project_dir = exports_dir.join(project_id);
    ensure_dir(&project_dir)?;
    Ok(project_dir)
}

/// File-system friendly stem derived from a project name.
pub fn export_file_stem(project_name: &str) -> String {
    let stem: String = project_name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let collapsed = stem
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if collapsed.is_empty() {
        "validation_project".to_string()
    } else {
        collapsed
    }
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
