#[cfg(test)]
#[path = "table_test.rs"]
mod tests;

use std::io::Cursor;

use anyhow::bail;
use anyhow::Result;
use calamine::open_workbook_auto_from_rs;
use calamine::Reader;

/// Tabular content parsed from a CSV file or a worksheet. The first record is
/// always treated as the header row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Table> {
        if headers.is_empty() {
            bail!("No columns to parse from file");
        }

        return Ok(Table { headers, rows });
    }

    pub fn from_csv(bytes: &[u8]) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let headers = reader
            .headers()?
            .iter()
            .map(|header| return header.to_string())
            .collect::<Vec<String>>();

        let mut rows = vec![];
        for record in reader.records() {
            rows.push(
                record?
                    .iter()
                    .map(|cell| return cell.to_string())
                    .collect::<Vec<String>>(),
            );
        }

        return Table::new(headers, rows);
    }

    /// Reads the first worksheet of an xlsx, xlsm, xlsb, xls or ods workbook.
    pub fn from_spreadsheet(bytes: &[u8]) -> Result<Table> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range?,
            None => bail!("Workbook has no worksheets"),
        };

        let mut rows = range.rows().map(|row| {
            return row
                .iter()
                .map(|cell| return cell.to_string())
                .collect::<Vec<String>>();
        });

        let headers = rows.next().unwrap_or_default();
        return Table::new(headers, rows.collect());
    }

    /// Column-aligned rendering: a row index column, then every column right
    /// aligned to its widest cell, two spaces apart.
    pub fn to_text(&self) -> String {
        if self.rows.is_empty() {
            return format!("Empty table\nColumns: [{}]", self.headers.join(", "));
        }

        let index_width = (self.rows.len() - 1).to_string().len();
        let widths = self
            .headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let widest_cell = self
                    .rows
                    .iter()
                    .map(|row| return Table::cell(row, idx).chars().count())
                    .max()
                    .unwrap_or(0);
                return widest_cell.max(header.chars().count());
            })
            .collect::<Vec<usize>>();

        let mut lines: Vec<String> = vec![];

        let mut header_line = " ".repeat(index_width);
        for (header, width) in self.headers.iter().zip(widths.iter().copied()) {
            header_line += &format!("  {header:>width$}");
        }
        lines.push(header_line);

        for (row_idx, row) in self.rows.iter().enumerate() {
            let mut line = format!("{row_idx:<index_width$}");
            for (idx, width) in widths.iter().copied().enumerate() {
                line += &format!("  {:>width$}", Table::cell(row, idx));
            }
            lines.push(line);
        }

        return lines.join("\n");
    }

    fn cell(row: &[String], idx: usize) -> &str {
        return row.get(idx).map(|cell| return cell.as_str()).unwrap_or("");
    }
}
