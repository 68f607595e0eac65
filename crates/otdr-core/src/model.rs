use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OtdrError;

/// A test wavelength supported by the report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Wavelength {
    Nm1310,
    Nm1550,
    Nm1625,
}

impl Wavelength {
    pub const ALL: [Wavelength; 3] = [Wavelength::Nm1310, Wavelength::Nm1550, Wavelength::Nm1625];

    pub fn nm(self) -> u16 {
        match self {
            Wavelength::Nm1310 => 1310,
            Wavelength::Nm1550 => 1550,
            Wavelength::Nm1625 => 1625,
        }
    }

    pub fn from_nm(nm: u16) -> Option<Wavelength> {
        Wavelength::ALL.into_iter().find(|w| w.nm() == nm)
    }

    /// Column header used for this wavelength's span loss.
    pub fn loss_header(self) -> String {
        format!("Span Loss {}nm (dB)", self.nm())
    }
}

impl fmt::Display for Wavelength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}nm", self.nm())
    }
}

impl TryFrom<u16> for Wavelength {
    type Error = OtdrError;

    fn try_from(nm: u16) -> Result<Self, Self::Error> {
        Wavelength::from_nm(nm).ok_or_else(|| {
            OtdrError::InvalidWavelengths(format!(
                "{nm} is not a supported wavelength (expected 1310, 1550 or 1625)"
            ))
        })
    }
}

impl From<Wavelength> for u16 {
    fn from(w: Wavelength) -> u16 {
        w.nm()
    }
}

/// Ordered wavelengths active for one batch.
///
/// The order is the order in which the reports print their span-loss
/// values. Extracted values are bound to wavelengths by position in this
/// sequence, never by a wavelength printed in the report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Wavelength>", into = "Vec<Wavelength>")]
pub struct WavelengthSet(Vec<Wavelength>);

impl WavelengthSet {
    /// The four selections offered by the tool, in menu order.
    pub const PRESETS: [&'static [Wavelength]; 4] = [
        &[Wavelength::Nm1310, Wavelength::Nm1550],
        &[Wavelength::Nm1550, Wavelength::Nm1625],
        &[Wavelength::Nm1310, Wavelength::Nm1625],
        &[Wavelength::Nm1310, Wavelength::Nm1550, Wavelength::Nm1625],
    ];

    pub fn new(wavelengths: Vec<Wavelength>) -> Result<Self, OtdrError> {
        if wavelengths.is_empty() {
            return Err(OtdrError::InvalidWavelengths(
                "at least one wavelength is required".into(),
            ));
        }
        for (i, w) in wavelengths.iter().enumerate() {
            if wavelengths[..i].contains(w) {
                return Err(OtdrError::InvalidWavelengths(format!(
                    "{w} is listed more than once"
                )));
            }
        }
        Ok(WavelengthSet(wavelengths))
    }

    pub fn from_nm(values: &[u16]) -> Result<Self, OtdrError> {
        let wavelengths = values
            .iter()
            .map(|&nm| Wavelength::try_from(nm))
            .collect::<Result<Vec<_>, _>>()?;
        WavelengthSet::new(wavelengths)
    }

    pub fn presets() -> Vec<WavelengthSet> {
        WavelengthSet::PRESETS
            .iter()
            .map(|p| WavelengthSet(p.to_vec()))
            .collect()
    }

    pub fn as_slice(&self) -> &[Wavelength] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Wavelength> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Order-insensitive key used to look up the template variant,
    /// e.g. `"1310,1550"`.
    pub fn key(&self) -> String {
        let mut sorted = self.0.clone();
        sorted.sort();
        sorted
            .iter()
            .map(|w| w.nm().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Human label, e.g. `"1310nm & 1550nm"` or `"1310nm, 1550nm & 1625nm"`.
    pub fn label(&self) -> String {
        let names: Vec<String> = self.0.iter().map(|w| w.to_string()).collect();
        match names.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{} & {}", rest.join(", "), last),
            Some((last, _)) => last.clone(),
            None => String::new(),
        }
    }
}

impl fmt::Display for WavelengthSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl TryFrom<Vec<Wavelength>> for WavelengthSet {
    type Error = OtdrError;

    fn try_from(wavelengths: Vec<Wavelength>) -> Result<Self, Self::Error> {
        WavelengthSet::new(wavelengths)
    }
}

impl From<WavelengthSet> for Vec<Wavelength> {
    fn from(set: WavelengthSet) -> Vec<Wavelength> {
        set.0
    }
}

impl FromStr for WavelengthSet {
    type Err = OtdrError;

    /// Accepts the menu labels ("1310nm & 1550nm") as well as plain lists
    /// ("1310,1550", "1310 1550", "1310nm,1550nm").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(|c: char| c == ',' || c == '&' || c.is_whitespace())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| {
                let digits = t
                    .strip_suffix("nm")
                    .or_else(|| t.strip_suffix("NM"))
                    .unwrap_or(t);
                digits.parse::<u16>().map_err(|_| {
                    OtdrError::InvalidWavelengths(format!("'{s}' is not a wavelength selection"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        WavelengthSet::from_nm(&values)
    }
}

/// A single cell of the output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(n) => CellValue::Number(n),
            None => CellValue::Empty,
        }
    }
}

/// Span loss for one wavelength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpanLoss {
    pub wavelength: Wavelength,
    pub db: Option<f64>,
}

/// Measurements extracted from one page. Every requested wavelength has an
/// entry, found or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub span_length_ft: Option<f64>,
    pub span_loss: Vec<SpanLoss>,
}

impl Measurements {
    pub fn is_empty(&self) -> bool {
        self.span_length_ft.is_none() && self.span_loss.iter().all(|l| l.db.is_none())
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Display name of the originating report.
    pub source: String,
    /// Fiber/page number, continuous across the whole batch.
    pub sequence: u32,
    pub span_length_ft: Option<f64>,
    pub span_loss: Vec<SpanLoss>,
}

impl Record {
    pub fn new(source: impl Into<String>, sequence: u32, measurements: Measurements) -> Self {
        Record {
            source: source.into(),
            sequence,
            span_length_ft: measurements.span_length_ft,
            span_loss: measurements.span_loss,
        }
    }

    pub fn loss(&self, wavelength: Wavelength) -> Option<f64> {
        self.span_loss
            .iter()
            .find(|l| l.wavelength == wavelength)
            .and_then(|l| l.db)
    }

    /// Cells in output column order: source, sequence, span length, then
    /// losses in the order given by `wavelengths`.
    pub fn cells(&self, wavelengths: &WavelengthSet) -> Vec<CellValue> {
        let mut cells = Vec::with_capacity(3 + wavelengths.len());
        cells.push(CellValue::Text(self.source.clone()));
        cells.push(CellValue::Number(f64::from(self.sequence)));
        cells.push(self.span_length_ft.into());
        for w in wavelengths.iter() {
            cells.push(self.loss(w).into());
        }
        cells
    }
}

pub const SOURCE_HEADER: &str = "PDF File Name";
pub const SEQUENCE_HEADER: &str = "Fiber #/Page #";
pub const SPAN_LENGTH_HEADER: &str = "Span Length (ft)";

/// Ordered records of one batch with a fixed column layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub wavelengths: WavelengthSet,
    pub records: Vec<Record>,
}

impl ResultTable {
    pub fn new(wavelengths: WavelengthSet) -> Self {
        ResultTable {
            wavelengths,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![
            SOURCE_HEADER.to_string(),
            SEQUENCE_HEADER.to_string(),
            SPAN_LENGTH_HEADER.to_string(),
        ];
        headers.extend(self.wavelengths.iter().map(Wavelength::loss_header));
        headers
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<CellValue>> + '_ {
        self.records.iter().map(|r| r.cells(&self.wavelengths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_menu_label() {
        let set: WavelengthSet = "1310nm, 1550nm & 1625nm".parse().unwrap();
        assert_eq!(
            set.as_slice(),
            &[Wavelength::Nm1310, Wavelength::Nm1550, Wavelength::Nm1625]
        );
    }

    #[test]
    fn test_parse_comma_list_keeps_order() {
        let set: WavelengthSet = "1550,1310".parse().unwrap();
        assert_eq!(set.as_slice(), &[Wavelength::Nm1550, Wavelength::Nm1310]);
        assert_eq!(set.key(), "1310,1550");
        assert_eq!(set.label(), "1550nm & 1310nm");
    }

    #[test]
    fn test_unknown_wavelength_rejected() {
        assert!("1310,1490".parse::<WavelengthSet>().is_err());
        assert!("".parse::<WavelengthSet>().is_err());
        assert!("abc".parse::<WavelengthSet>().is_err());
    }

    #[test]
    fn test_duplicate_wavelength_rejected() {
        assert!(WavelengthSet::from_nm(&[1310, 1310]).is_err());
    }

    #[test]
    fn test_preset_labels() {
        let labels: Vec<String> = WavelengthSet::presets().iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec![
                "1310nm & 1550nm",
                "1550nm & 1625nm",
                "1310nm & 1625nm",
                "1310nm, 1550nm & 1625nm",
            ]
        );
    }

    #[test]
    fn test_record_cells_follow_wavelength_order() {
        let set = WavelengthSet::from_nm(&[1550, 1310]).unwrap();
        let record = Record::new(
            "a.pdf",
            4,
            Measurements {
                span_length_ft: None,
                span_loss: vec![
                    SpanLoss {
                        wavelength: Wavelength::Nm1550,
                        db: Some(0.2),
                    },
                    SpanLoss {
                        wavelength: Wavelength::Nm1310,
                        db: Some(0.3),
                    },
                ],
            },
        );
        assert_eq!(
            record.cells(&set),
            vec![
                CellValue::Text("a.pdf".into()),
                CellValue::Number(4.0),
                CellValue::Empty,
                CellValue::Number(0.2),
                CellValue::Number(0.3),
            ]
        );
    }

    #[test]
    fn test_table_headers() {
        let table = ResultTable::new(WavelengthSet::from_nm(&[1310, 1625]).unwrap());
        assert_eq!(
            table.headers(),
            vec![
                "PDF File Name",
                "Fiber #/Page #",
                "Span Length (ft)",
                "Span Loss 1310nm (dB)",
                "Span Loss 1625nm (dB)",
            ]
        );
    }

    #[test]
    fn test_wavelength_set_json_is_list_of_numbers() {
        let set = WavelengthSet::from_nm(&[1310, 1550]).unwrap();
        assert_eq!(serde_json::to_string(&set).unwrap(), "[1310,1550]");
        let back: WavelengthSet = serde_json::from_str("[1550,1625]").unwrap();
        assert_eq!(back.key(), "1550,1625");
    }
}
