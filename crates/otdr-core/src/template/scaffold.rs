use crate::error::OtdrError;
use crate::model::{ResultTable, WavelengthSet};
use crate::template::fill::write_workbook;
use crate::template::SHEET_NAME;

/// Build a blank template for `wavelengths`: a single `OTDR_Data` sheet with
/// a bold header row above the anchor cell.
pub fn scaffold(wavelengths: &WavelengthSet) -> Result<Vec<u8>, OtdrError> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let sheet = book
        .new_sheet(SHEET_NAME)
        .map_err(|e| OtdrError::WorkbookWrite(e.to_string()))?;

    let headers = ResultTable::new(wavelengths.clone()).headers();
    for (i, header) in headers.iter().enumerate() {
        let cell = sheet.get_cell_mut((i as u32 + 1, 1));
        cell.set_value_string(header.clone());
        cell.get_style_mut().get_font_mut().set_bold(true);
    }

    write_workbook(&book)
}
