pub mod fill;
pub mod scaffold;

use calamine::{Reader, Xlsx};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::error::OtdrError;
use crate::model::WavelengthSet;

/// Sheet the results are written to.
pub const SHEET_NAME: &str = "OTDR_Data";

/// Cell receiving the first column of the first record.
pub const ANCHOR_CELL: &str = "A2";

/// Template file names shipped for each wavelength key.
pub const DEFAULT_FILES: [(&str, &str); 4] = [
    ("1310,1550", "OTDR_Template_1310_1550.xlsx"),
    ("1550,1625", "OTDR_Template_1550_1625.xlsx"),
    ("1310,1625", "OTDR_Template_1310_1625.xlsx"),
    ("1310,1550,1625", "OTDR_Template_All.xlsx"),
];

/// A 1-based spreadsheet coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub col: u32,
    pub row: u32,
}

impl CellRef {
    /// Parse an A1-style reference such as "A2" or "AB17".
    pub fn parse(s: &str) -> Result<CellRef, OtdrError> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| OtdrError::InvalidCellRef(s.to_string()))?;
        let (letters, digits) = s.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(OtdrError::InvalidCellRef(s.to_string()));
        }

        let col = letters.chars().try_fold(0u32, |acc, c| {
            let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
            acc.checked_mul(26)?.checked_add(digit)
        });
        let row = digits.parse::<u32>().ok().filter(|&r| r > 0);

        match (col, row) {
            (Some(col), Some(row)) => Ok(CellRef { col, row }),
            _ => Err(OtdrError::InvalidCellRef(s.to_string())),
        }
    }

    pub fn offset(self, rows: u32, cols: u32) -> CellRef {
        CellRef {
            col: self.col + cols,
            row: self.row + rows,
        }
    }
}

/// An in-memory copy of a template workbook. The file it came from is
/// never written to.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    bytes: Vec<u8>,
}

impl Template {
    pub fn load(path: &Path) -> Result<Template, OtdrError> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OtdrError::TemplateNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                OtdrError::TemplateRead(format!("{}: {e}", path.display()))
            }
        })?;
        log::debug!("loaded template {} ({} bytes)", path.display(), bytes.len());
        Ok(Template {
            name: path.display().to_string(),
            bytes,
        })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Template {
        Template {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Check that the workbook opens and contains the results sheet.
    pub fn validate(&self) -> Result<(), OtdrError> {
        let workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(self.bytes.as_slice()))
            .map_err(|e| OtdrError::TemplateRead(format!("{}: {e}", self.name)))?;

        if workbook.sheet_names().iter().any(|s| s == SHEET_NAME) {
            Ok(())
        } else {
            Err(OtdrError::SheetNotFound {
                sheet: SHEET_NAME.to_string(),
            })
        }
    }
}

/// Mapping from wavelength key (see [`WavelengthSet::key`]) to template file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSet {
    paths: BTreeMap<String, PathBuf>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four standard variants inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        let paths = DEFAULT_FILES
            .iter()
            .map(|(key, file)| (key.to_string(), dir.join(file)))
            .collect();
        TemplateSet { paths }
    }

    /// Build from configured entries. Keys may list wavelengths in any
    /// order ("1550,1310" and "1310nm & 1550nm" are the same variant).
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a Path)>,
    ) -> Result<Self, OtdrError> {
        let mut set = TemplateSet::new();
        for (key, path) in entries {
            let wavelengths: WavelengthSet = key.parse()?;
            set.insert(&wavelengths, path.to_path_buf());
        }
        Ok(set)
    }

    pub fn insert(&mut self, wavelengths: &WavelengthSet, path: PathBuf) {
        self.paths.insert(wavelengths.key(), path);
    }

    /// Entries of `other` replace entries with the same key.
    pub fn merge(&mut self, other: TemplateSet) {
        self.paths.extend(other.paths);
    }

    pub fn path_for(&self, wavelengths: &WavelengthSet) -> Result<&Path, OtdrError> {
        let key = wavelengths.key();
        self.paths
            .get(&key)
            .map(PathBuf::as_path)
            .ok_or(OtdrError::TemplateNotConfigured { key })
    }

    /// Load and validate the template for `wavelengths`.
    pub fn load(&self, wavelengths: &WavelengthSet) -> Result<Template, OtdrError> {
        let template = Template::load(self.path_for(wavelengths)?)?;
        template.validate()?;
        Ok(template)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.paths.iter().map(|(k, p)| (k.as_str(), p.as_path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_anchor() {
        assert_eq!(CellRef::parse("A2").unwrap(), CellRef { col: 1, row: 2 });
        assert_eq!(CellRef::parse("ab17").unwrap(), CellRef { col: 28, row: 17 });
    }

    #[test]
    fn test_parse_invalid_refs() {
        assert!(CellRef::parse("2").is_err());
        assert!(CellRef::parse("A").is_err());
        assert!(CellRef::parse("A0").is_err());
        assert!(CellRef::parse("A-1").is_err());
        assert!(CellRef::parse("1A").is_err());
    }

    #[test]
    fn test_in_dir_covers_presets() {
        let set = TemplateSet::in_dir(Path::new("templates"));
        for preset in WavelengthSet::presets() {
            assert!(set.path_for(&preset).is_ok(), "missing {}", preset);
        }
        let all = WavelengthSet::from_nm(&[1625, 1550, 1310]).unwrap();
        assert_eq!(
            set.path_for(&all).unwrap(),
            Path::new("templates/OTDR_Template_All.xlsx")
        );
    }

    #[test]
    fn test_single_wavelength_has_no_template() {
        let set = TemplateSet::in_dir(Path::new("templates"));
        let single = WavelengthSet::from_nm(&[1310]).unwrap();
        let err = set.path_for(&single).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_from_entries_normalizes_keys() {
        let set = TemplateSet::from_entries([(
            "1550nm & 1310nm",
            Path::new("custom.xlsx"),
        )])
        .unwrap();
        let wl = WavelengthSet::from_nm(&[1310, 1550]).unwrap();
        assert_eq!(set.path_for(&wl).unwrap(), Path::new("custom.xlsx"));
    }

    #[test]
    fn test_missing_template_file() {
        let set = TemplateSet::in_dir(Path::new("/nonexistent/otdr-templates"));
        let wl = WavelengthSet::from_nm(&[1310, 1550]).unwrap();
        assert!(matches!(
            set.load(&wl),
            Err(OtdrError::TemplateNotFound { .. })
        ));
    }

    #[test]
    fn test_garbage_template_is_configuration_error() {
        let template = Template::from_bytes("broken.xlsx", b"not a workbook".to_vec());
        let err = template.validate().unwrap_err();
        assert!(matches!(err, OtdrError::TemplateRead(_)));
        assert!(err.is_configuration());
    }
}
