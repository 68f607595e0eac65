use std::io::Cursor;

use umya_spreadsheet::Spreadsheet;

use crate::error::OtdrError;
use crate::model::{CellValue, ResultTable};
use crate::template::{CellRef, Template, ANCHOR_CELL, SHEET_NAME};

/// Write `table` into a copy of `template` and return the new workbook.
///
/// Row `idx` of the table lands on sheet `OTDR_Data` at row `A2.row + idx`,
/// one column per field in table column order. Only cell values are set;
/// styles, other cells and other sheets come through unchanged. An empty
/// table yields an unmodified copy.
pub fn fill(template: &Template, table: &ResultTable) -> Result<Vec<u8>, OtdrError> {
    fill_at(template, table, SHEET_NAME, ANCHOR_CELL)
}

/// [`fill`] with an explicit sheet and anchor.
pub fn fill_at(
    template: &Template,
    table: &ResultTable,
    sheet_name: &str,
    anchor: &str,
) -> Result<Vec<u8>, OtdrError> {
    let origin = CellRef::parse(anchor)?;
    let mut book = read_template(template)?;

    let sheet = book
        .get_sheet_by_name_mut(sheet_name)
        .ok_or_else(|| OtdrError::SheetNotFound {
            sheet: sheet_name.to_string(),
        })?;

    for (idx, row) in table.rows().enumerate() {
        for (col_idx, value) in row.into_iter().enumerate() {
            let target = origin.offset(idx as u32, col_idx as u32);
            let cell = sheet.get_cell_mut((target.col, target.row));
            match value {
                CellValue::Text(s) => {
                    cell.set_value_string(s);
                }
                CellValue::Number(n) => {
                    cell.set_value_number(n);
                }
                CellValue::Empty => {
                    cell.set_blank();
                }
            }
        }
    }

    log::debug!(
        "wrote {} row(s) to '{}' starting at {}",
        table.len(),
        sheet_name,
        anchor
    );

    write_workbook(&book)
}

fn read_template(template: &Template) -> Result<Spreadsheet, OtdrError> {
    umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(template.bytes()), true)
        .map_err(|e| OtdrError::TemplateRead(format!("{}: {e}", template.name())))
}

pub(crate) fn write_workbook(book: &Spreadsheet) -> Result<Vec<u8>, OtdrError> {
    let mut out = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(book, &mut out)
        .map_err(|e| OtdrError::WorkbookWrite(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Measurements, Record, SpanLoss, Wavelength, WavelengthSet};
    use crate::template::scaffold::scaffold;
    use calamine::{Data, Reader, Xlsx};

    fn wavelengths() -> WavelengthSet {
        WavelengthSet::from_nm(&[1310, 1550]).unwrap()
    }

    fn template() -> Template {
        Template::from_bytes("test.xlsx", scaffold(&wavelengths()).unwrap())
    }

    fn record(source: &str, seq: u32, length: Option<f64>, losses: [Option<f64>; 2]) -> Record {
        Record::new(
            source,
            seq,
            Measurements {
                span_length_ft: length,
                span_loss: vec![
                    SpanLoss {
                        wavelength: Wavelength::Nm1310,
                        db: losses[0],
                    },
                    SpanLoss {
                        wavelength: Wavelength::Nm1550,
                        db: losses[1],
                    },
                ],
            },
        )
    }

    fn read_sheet(bytes: &[u8]) -> calamine::Range<Data> {
        let mut wb: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        wb.worksheet_range(SHEET_NAME).unwrap()
    }

    fn is_blank(cell: Option<&Data>) -> bool {
        matches!(cell, None | Some(Data::Empty))
    }

    #[test]
    fn test_rows_written_from_anchor() {
        let mut table = ResultTable::new(wavelengths());
        table.push(record("a.pdf", 1, Some(1200.0), [Some(0.25), Some(0.31)]));
        table.push(record("a.pdf", 2, Some(980.5), [Some(0.22), None]));

        let out = fill(&template(), &table).unwrap();
        let sheet = read_sheet(&out);

        assert_eq!(
            sheet.get_value((1, 0)),
            Some(&Data::String("a.pdf".into()))
        );
        assert_eq!(sheet.get_value((1, 1)), Some(&Data::Float(1.0)));
        assert_eq!(sheet.get_value((1, 2)), Some(&Data::Float(1200.0)));
        assert_eq!(sheet.get_value((1, 3)), Some(&Data::Float(0.25)));
        assert_eq!(sheet.get_value((1, 4)), Some(&Data::Float(0.31)));
        assert_eq!(sheet.get_value((2, 2)), Some(&Data::Float(980.5)));
        assert!(is_blank(sheet.get_value((2, 4))));
    }

    #[test]
    fn test_header_row_preserved() {
        let mut table = ResultTable::new(wavelengths());
        table.push(record("a.pdf", 1, None, [None, None]));

        let out = fill(&template(), &table).unwrap();
        let sheet = read_sheet(&out);
        assert_eq!(
            sheet.get_value((0, 0)),
            Some(&Data::String("PDF File Name".into()))
        );
        assert_eq!(
            sheet.get_value((0, 4)),
            Some(&Data::String("Span Loss 1550nm (dB)".into()))
        );
    }

    #[test]
    fn test_empty_table_returns_copy() {
        let table = ResultTable::new(wavelengths());
        let out = fill(&template(), &table).unwrap();
        let sheet = read_sheet(&out);
        assert!(is_blank(sheet.get_value((1, 0))));
    }

    #[test]
    fn test_missing_sheet() {
        let mut table = ResultTable::new(wavelengths());
        table.push(record("a.pdf", 1, None, [None, None]));
        let err = fill_at(&template(), &table, "Results", ANCHOR_CELL).unwrap_err();
        assert!(matches!(err, OtdrError::SheetNotFound { ref sheet } if sheet == "Results"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_custom_anchor() {
        let mut table = ResultTable::new(wavelengths());
        table.push(record("b.pdf", 7, Some(10.0), [None, None]));
        let out = fill_at(&template(), &table, SHEET_NAME, "C5").unwrap();
        let mut wb: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(out)).unwrap();
        let sheet = wb.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(
            sheet.get_value((4, 2)),
            Some(&Data::String("b.pdf".into()))
        );
        assert_eq!(sheet.get_value((4, 3)), Some(&Data::Float(7.0)));
    }

    #[test]
    fn test_styles_and_other_sheets_untouched() {
        let mut book = read_template(&template()).unwrap();
        book.new_sheet("Notes")
            .unwrap()
            .get_cell_mut("A1")
            .set_value("route 9 splice log");
        let style = book
            .get_sheet_by_name_mut(SHEET_NAME)
            .unwrap()
            .get_style_mut("C2");
        style.get_number_format_mut().set_format_code("0.000");
        style.get_font_mut().set_bold(true);
        let styled = Template::from_bytes("styled.xlsx", write_workbook(&book).unwrap());

        let mut table = ResultTable::new(wavelengths());
        table.push(record("a.pdf", 1, Some(1200.0), [Some(0.25), Some(0.31)]));
        let out = fill(&styled, &table).unwrap();
        assert_eq!(read_sheet(&out).get_value((1, 2)), Some(&Data::Float(1200.0)));

        let filled = read_template(&Template::from_bytes("out.xlsx", out)).unwrap();
        let notes = filled.get_sheet_by_name("Notes").unwrap();
        assert_eq!(notes.get_value("A1"), "route 9 splice log");

        let sheet = filled.get_sheet_by_name(SHEET_NAME).unwrap();
        let style = sheet.get_style("C2");
        assert_eq!(
            style.get_number_format().unwrap().get_format_code(),
            "0.000"
        );
        assert!(style.get_font().unwrap().get_bold().clone());
    }
}
