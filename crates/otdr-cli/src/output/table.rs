use otdr_core::batch::SkippedPage;
use otdr_core::model::ResultTable;

/// Rows shown in a preview before the remainder is summarised.
pub const PREVIEW_ROWS: usize = 20;

/// Render the first `limit` rows of `table` as aligned text columns.
pub fn format_table(table: &ResultTable, limit: usize) -> String {
    let headers = table.headers();
    let rows: Vec<Vec<String>> = table
        .rows()
        .take(limit)
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].len())
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&format_row(&headers, &widths));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for row in &rows {
        out.push_str(&format_row(row, &widths));
        out.push('\n');
    }

    if table.len() > limit {
        out.push_str(&format!("... {} more row(s)\n", table.len() - limit));
    }
    out
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{c:<w$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Print one warning line per skipped page to stderr.
pub fn print_skipped(skipped: &[SkippedPage]) {
    for page in skipped {
        eprintln!(
            "  warning: no text found on page {} of {}, skipped",
            page.page_number, page.source
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otdr_core::model::{Measurements, Record, SpanLoss, Wavelength, WavelengthSet};

    fn table(rows: u32) -> ResultTable {
        let wavelengths = WavelengthSet::from_nm(&[1310, 1550]).unwrap();
        let mut table = ResultTable::new(wavelengths);
        for seq in 1..=rows {
            table.push(Record::new(
                "a.pdf",
                seq,
                Measurements {
                    span_length_ft: Some(100.0),
                    span_loss: vec![
                        SpanLoss {
                            wavelength: Wavelength::Nm1310,
                            db: Some(0.25),
                        },
                        SpanLoss {
                            wavelength: Wavelength::Nm1550,
                            db: None,
                        },
                    ],
                },
            ));
        }
        table
    }

    #[test]
    fn test_headers_and_rows() {
        let out = format_table(&table(2), PREVIEW_ROWS);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("PDF File Name  Fiber #/Page #"));
        assert!(lines[0].ends_with("Span Loss 1550nm (dB)"));
        assert_eq!(lines.len(), 4);
        assert!(lines[3].contains("0.25"));
    }

    #[test]
    fn test_preview_truncates() {
        let out = format_table(&table(25), PREVIEW_ROWS);
        assert!(out.ends_with("... 5 more row(s)\n"));
        assert_eq!(out.lines().count(), 2 + PREVIEW_ROWS + 1);
    }
}
