use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::OtdrError;
use crate::extraction::Backend;
use crate::template::TemplateSet;

/// Config file read when no path is given and `OTDR_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "otdr.toml";

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Shared password. When unset, access is not gated.
    pub password: Option<String>,
    pub extractor: Backend,
    pub templates: TemplatesConfig,
    pub server: ServerConfig,
    pub interactive: InteractiveConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Directory holding the standard `OTDR_Template_*.xlsx` files.
    pub dir: PathBuf,
    /// Per-variant overrides, keyed like "1310,1550". Relative paths are
    /// resolved against `dir`.
    pub files: BTreeMap<String, PathBuf>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        TemplatesConfig {
            dir: PathBuf::from("templates"),
            files: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    /// Per-file upload limit in bytes.
    pub max_file_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "127.0.0.1".into(),
            port: 8080,
            allowed_origins: vec![
                "https://slcotdr.com".into(),
                "https://www.slcotdr.com".into(),
                "https://otdr-results-extract.vercel.app".into(),
                "http://localhost:3000".into(),
            ],
            max_file_size: 30 * MIB,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractiveConfig {
    /// Per-file limit in bytes for the interactive tool.
    pub max_file_size: u64,
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        InteractiveConfig {
            max_file_size: 10 * MIB,
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `OTDR_CONFIG` is used if
    /// set, then `otdr.toml` in the working directory if present, else the
    /// defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<AppConfig, OtdrError> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("OTDR_CONFIG").map(PathBuf::from));

        let mut config = match explicit {
            Some(p) => AppConfig::from_file(&p)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    AppConfig::from_file(default)?
                } else {
                    log::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    AppConfig::default()
                }
            }
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<AppConfig, OtdrError> {
        let content = std::fs::read_to_string(path).map_err(|e| OtdrError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = AppConfig::from_toml_str(&content, path)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str, source: &Path) -> Result<AppConfig, OtdrError> {
        let config: AppConfig = toml::from_str(content).map_err(|e| OtdrError::ConfigLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
        // Surface bad template keys at load time rather than mid-batch.
        config.template_set().map_err(|e| OtdrError::ConfigLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Apply `OTDR_PASSWORD`, `OTDR_TEMPLATES_DIR`, `BIND_ADDR` and `PORT`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(password) = lookup("OTDR_PASSWORD").filter(|p| !p.is_empty()) {
            self.password = Some(password);
        }
        if let Some(dir) = lookup("OTDR_TEMPLATES_DIR") {
            self.templates.dir = PathBuf::from(dir);
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => log::warn!("ignoring invalid PORT '{port}'"),
            }
        }
    }

    /// Resolve the template map: standard files in `templates.dir`, then the
    /// configured overrides.
    pub fn template_set(&self) -> Result<TemplateSet, OtdrError> {
        let mut set = TemplateSet::in_dir(&self.templates.dir);
        let resolved: Vec<(&str, PathBuf)> = self
            .templates
            .files
            .iter()
            .map(|(key, path)| (key.as_str(), self.templates.dir.join(path)))
            .collect();
        set.merge(TemplateSet::from_entries(
            resolved.iter().map(|(key, path)| (*key, path.as_path())),
        )?);
        Ok(set)
    }

    /// Whether `supplied` unlocks access. Always true without a password.
    pub fn is_authorized(&self, supplied: Option<&str>) -> bool {
        match self.password.as_deref() {
            None => true,
            Some(expected) => supplied == Some(expected),
        }
    }
}
