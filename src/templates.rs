use std::path::{Path, PathBuf};
use tera::Tera;
use tracing::warn;

/// Load every `.html` file in `template_dir`, registered under its file name.
pub fn load(template_dir: &Path) -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    if !template_dir.exists() {
        warn!("Template directory {} not found", template_dir.display());
        return Ok(tera);
    }

    let files: Vec<(PathBuf, Option<String>)> = std::fs::read_dir(template_dir)
        .map_err(|e| tera::Error::msg(format!("{}: {}", template_dir.display(), e)))?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "html"))
        .filter_map(|p| {
            let name = p.file_name()?.to_str()?.to_string();
            Some((p, Some(name)))
        })
        .collect();

    tera.add_template_files(files)?;
    Ok(tera)
}
