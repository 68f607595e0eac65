use otdr_core::config::AppConfig;
use otdr_core::error::OtdrError;
use otdr_core::model::WavelengthSet;
use otdr_core::template::scaffold::scaffold;
use otdr_core::template::{Template, DEFAULT_FILES, SHEET_NAME};
use std::path::{Path, PathBuf};

/// Write the four standard templates into `dir` (default: the configured
/// template directory). Existing files are kept unless `force` is set.
pub fn init(config: &AppConfig, dir: Option<PathBuf>, force: bool) -> Result<(), OtdrError> {
    let dir = dir.unwrap_or_else(|| config.templates.dir.clone());
    std::fs::create_dir_all(&dir)?;

    for (key, file) in DEFAULT_FILES {
        let path = dir.join(file);
        if path.exists() && !force {
            println!("  {:<32} exists, kept", file);
            continue;
        }
        let wavelengths: WavelengthSet = key.parse()?;
        std::fs::write(&path, scaffold(&wavelengths)?)?;
        println!("  {:<32} written ({})", file, wavelengths.label());
    }

    println!("\nTemplates in {}", dir.display());
    Ok(())
}

/// Show each configured template and whether it is usable.
pub fn list(config: &AppConfig) -> Result<(), OtdrError> {
    let templates = config.template_set()?;

    println!("Templates (sheet '{SHEET_NAME}'):\n");
    for (key, path) in templates.entries() {
        let label = key
            .parse::<WavelengthSet>()
            .map(|w| w.label())
            .unwrap_or_else(|_| key.to_string());
        println!("  {:<26} {}", label, path.display());
        println!("  {:<26} {}", "", status(path));
    }
    Ok(())
}

fn status(path: &Path) -> String {
    match Template::load(path).and_then(|t| t.validate()) {
        Ok(()) => "ok".to_string(),
        Err(OtdrError::TemplateNotFound { .. }) => {
            "missing (run `otdr templates init`)".to_string()
        }
        Err(e) => format!("unusable: {e}"),
    }
}
